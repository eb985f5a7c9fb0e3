// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message dispatch.
//!
//! The [`MessageRouter`] takes one inbound message at a time through
//! filtering, admin overrides, the mute list, command resolution, keyword
//! replies and finally the throttled onboarding hint.

pub mod admin;
pub mod router;
pub mod throttle;

pub use router::{MessageRouter, RouteOutcome, RouterSettings};
pub use throttle::HintThrottle;
