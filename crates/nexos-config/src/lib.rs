// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Nexos chat-bot gateway.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and Elm-style diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use nexos_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Bridge: {}", config.bridge.url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::NexosConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the TOML sources are re-read so miette can point at
/// the offending key.
pub fn load_and_validate() -> Result<NexosConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<NexosConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<NexosConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

fn finish(
    loaded: Result<NexosConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<NexosConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => match validation::validate_config(&config) {
            Ok(()) => Ok(config),
            Err(mut errors) => {
                diagnostic::attach_sources(&mut errors, &sources());
                Err(errors)
            }
        },
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads the hierarchy's TOML files for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let cwd = std::env::current_dir().unwrap_or_default();
    loader::config_files()
        .into_iter()
        .map(|path| cwd.join(path))
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
