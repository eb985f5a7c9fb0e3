// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Out-of-band admin channel used for login challenges and alerts.

use async_trait::async_trait;

use crate::error::NexosError;

/// Delivers operator-facing notifications outside WhatsApp.
///
/// Implementations are bound to one admin destination at construction time.
#[async_trait]
pub trait AdminRelay: Send + Sync {
    /// Sends an image (e.g. a rendered QR code) with a caption.
    async fn send_image(&self, image: Vec<u8>, caption: &str) -> Result<(), NexosError>;

    async fn send_text(&self, text: &str) -> Result<(), NexosError>;
}
