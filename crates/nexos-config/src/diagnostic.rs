// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics rendered with miette.
//!
//! Figment errors (unknown keys, wrong types) and validation errors both end
//! up as [`ConfigError`], pointed at the TOML file and table that set the
//! offending key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::model::SECTION_KEYS;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key the table does not declare.
    #[error("unknown key `{key}` in {table}")]
    #[diagnostic(
        code(nexos::config::unknown_key),
        help("{}", unknown_key_help(key, suggestion.as_deref(), moved_to.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Table header as written in TOML, e.g. `[groups.overrides."1203@g.us"]`.
        table: String,
        key: String,
        /// Closest declared key of the same table.
        suggestion: Option<String>,
        /// Another section that does declare `key`.
        moved_to: Option<String>,
        valid_keys: String,
        #[label("not a key of this table")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}, expected {expected}")]
    #[diagnostic(code(nexos::config::invalid_type))]
    InvalidType {
        /// Dotted key path, e.g. `health.port`.
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but breaks a rule of its section.
    #[error("invalid `{section}.{key}`: {message}")]
    #[diagnostic(code(nexos::config::validation))]
    Validation {
        section: &'static str,
        key: &'static str,
        message: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(nexos::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(section: &'static str, key: &'static str, message: String) -> Self {
        ConfigError::Validation {
            section,
            key,
            message,
            span: None,
            src: None,
        }
    }
}

fn unknown_key_help(
    key: &str,
    suggestion: Option<&str>,
    moved_to: Option<&str>,
    valid_keys: &str,
) -> String {
    match (moved_to, suggestion) {
        (Some(section), _) => format!("`{key}` belongs in {section}"),
        (None, Some(s)) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        (None, None) => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error inside a `figment::Error`.
///
/// `sources` holds `(path, content)` for each TOML layer in merge order;
/// spans are resolved against them.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let file = error.metadata.as_ref().and_then(|m| match &m.source {
                Some(figment::Source::File(path)) => Some(path.display().to_string()),
                _ => None,
            });

            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    // Figment may or may not append the field to the path.
                    let table_path = match error.path.split_last() {
                        Some((last, parent)) if last == field => parent,
                        _ => error.path.as_slice(),
                    };
                    let (span, src) = locate(sources, file.as_deref(), table_path, field);
                    ConfigError::UnknownKey {
                        table: table_display(table_path),
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        moved_to: owning_section(field, table_path).map(|s| format!("[{s}]")),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let (span, src) = match error.path.split_last() {
                        Some((field, table_path)) => {
                            locate(sources, file.as_deref(), table_path, field)
                        }
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        key: error.path.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Points validation errors at the layer that set the rejected key.
pub fn attach_sources(errors: &mut [ConfigError], sources: &[(String, String)]) {
    for error in errors {
        if let ConfigError::Validation {
            section,
            key,
            span,
            src,
            ..
        } = error
        {
            (*span, *src) = locate(sources, None, &[section.to_string()], *key);
        }
    }
}

/// Finds `field` under `table_path`, in `file` when known, else in the
/// highest-precedence source that sets it.
fn locate(
    sources: &[(String, String)],
    file: Option<&str>,
    table_path: &[String],
    field: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let named = file.and_then(|file| sources.iter().find(|(path, _)| path == file));
    let candidates: Vec<&(String, String)> = match named {
        Some(source) => vec![source],
        None => sources.iter().rev().collect(),
    };

    candidates
        .into_iter()
        .find_map(|(path, content)| {
            find_key_offset(content, table_path, field).map(|offset| {
                (
                    Some(SourceSpan::new(offset.into(), field.len())),
                    Some(NamedSource::new(path, content.clone())),
                )
            })
        })
        .unwrap_or((None, None))
}

/// TOML header for a table path, quoting segments that are not bare keys.
///
/// `["groups", "overrides", "1203@g.us"]` gives `[groups.overrides."1203@g.us"]`.
pub fn table_header(table_path: &[String]) -> String {
    let segments: Vec<String> = table_path
        .iter()
        .map(|segment| {
            let bare = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if bare {
                segment.clone()
            } else {
                format!("\"{}\"", segment.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect();
    format!("[{}]", segments.join("."))
}

fn table_display(table_path: &[String]) -> String {
    if table_path.is_empty() {
        "the top level".to_string()
    } else {
        table_header(table_path)
    }
}

/// Byte offset of `field = ...` inside the table at `table_path`.
///
/// Only keys directly under the matching header count; an empty path means
/// the keys before the first header.
pub fn find_key_offset(content: &str, table_path: &[String], field: &str) -> Option<usize> {
    let wanted = (!table_path.is_empty()).then(|| table_header(table_path));
    let mut current: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            let header = trimmed.split('#').next().unwrap_or_default().trim_end();
            current = Some(header);
        } else if current == wanted.as_deref()
            && let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Section that declares `key`, when it is not the table the key was found in.
fn owning_section(key: &str, table_path: &[String]) -> Option<&'static str> {
    let current = table_path.first().map(String::as_str);
    SECTION_KEYS
        .iter()
        .find(|(section, keys)| Some(*section) != current && keys.contains(&key))
        .map(|(section, _)| *section)
}

/// Renders each error with miette's graphical handler on stderr.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    eprintln!("nexos: {} configuration error(s)", errors.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggests_closest_reconnect_key() {
        let valid = &["delays_secs", "max_delay_secs", "jitter_ms", "flap_delay_secs"];
        assert_eq!(suggest_key("delay_secs", valid).as_deref(), Some("delays_secs"));
        assert_eq!(suggest_key("jiter_ms", valid).as_deref(), Some("jitter_ms"));
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn key_in_wrong_section_names_its_home() {
        assert_eq!(owning_section("port", &path(&["bot"])), Some("health"));
        assert_eq!(owning_section("bot_token", &[]), Some("telegram"));
        assert_eq!(owning_section("naem", &path(&["bot"])), None);
        assert_eq!(owning_section("port", &path(&["health"])), None);

        let help = unknown_key_help("port", Some("name"), Some("[health]"), "name");
        assert_eq!(help, "`port` belongs in [health]");
    }

    #[test]
    fn override_headers_are_quoted() {
        assert_eq!(table_header(&path(&["reconnect"])), "[reconnect]");
        assert_eq!(
            table_header(&path(&["groups", "overrides", "120363@g.us"])),
            "[groups.overrides.\"120363@g.us\"]"
        );
        assert_eq!(table_display(&[]), "the top level");
    }

    #[test]
    fn finds_key_in_group_override_table() {
        let content = "[groups]\nwelcom = true\n\n[groups.overrides.\"120363@g.us\"]\nwelcom = false\n";
        let offset = find_key_offset(
            content,
            &path(&["groups", "overrides", "120363@g.us"]),
            "welcom",
        )
        .unwrap();
        assert_eq!(&content[offset..offset + 6], "welcom");
        assert!(offset > content.find("[groups.overrides").unwrap());
    }

    #[test]
    fn key_lookup_stays_inside_its_table() {
        let content = "[bot]\nname = \"x\"\n[health]  # liveness\nport = 1\n";
        assert_eq!(find_key_offset(content, &path(&["bot"]), "port"), None);
        let offset = find_key_offset(content, &path(&["health"]), "port").unwrap();
        assert_eq!(&content[offset..offset + 4], "port");
        assert_eq!(find_key_offset("bogus = 1\n[bot]\n", &[], "bogus"), Some(0));
        assert_eq!(find_key_offset("[bot]\nbogus = 1\n", &[], "bogus"), None);
    }

    #[test]
    fn validation_errors_point_at_the_last_layer_setting_the_key() {
        let sources = vec![
            ("/etc/nexos/nexos.toml".to_string(), "[health]\nport = 0\n".to_string()),
            ("nexos.toml".to_string(), "[health]\nport = 0\n".to_string()),
            ("other.toml".to_string(), "[bot]\nname = \"x\"\n".to_string()),
        ];
        let mut errors = vec![ConfigError::validation("health", "port", "must not be 0".into())];

        attach_sources(&mut errors, &sources);

        match &errors[0] {
            ConfigError::Validation { span, src, .. } => {
                assert_eq!(span.map(|s| s.offset()), Some(9));
                assert_eq!(src.as_ref().map(|s| s.name()), Some("nexos.toml"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(errors[0].to_string(), "invalid `health.port`: must not be 0");
    }
}
