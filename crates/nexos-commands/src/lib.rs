// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands for the Nexos gateway.
//!
//! A command is contributed as a [`CommandModule`] in one of several shapes,
//! normalized into a [`CommandDefinition`], and indexed by the
//! [`CommandRegistry`] under every spelling it answers to.

pub mod builtin;
pub mod context;
pub mod module;
pub mod registry;

pub use context::{CommandContext, CommandHandler, handler_fn};
pub use module::{CommandDefinition, CommandModule, CommandShape, ModuleError};
pub use registry::CommandRegistry;
