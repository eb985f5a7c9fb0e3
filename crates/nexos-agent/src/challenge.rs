// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login challenge (QR code) rendering and relay.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Luma};
use nexos_core::{AdminRelay, NexosError};
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use tracing::{error, info};

/// Caption attached to the relayed QR image.
pub const QR_CAPTION: &str = "📱 امسح هذا الكود لتسجيل الدخول في واتساب";

const MIN_DIMENSION: u32 = 300;

fn encode(payload: &str) -> Result<QrCode, NexosError> {
    QrCode::new(payload.as_bytes()).map_err(|e| NexosError::Relay {
        message: format!("failed to encode login challenge: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Renders the challenge payload as a PNG image.
pub fn render_png(payload: &str) -> Result<Vec<u8>, NexosError> {
    let code = encode(payload)?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| NexosError::Relay {
            message: format!("failed to write QR png: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(bytes)
}

/// Renders the challenge payload for a terminal.
pub fn render_unicode(payload: &str) -> Result<String, NexosError> {
    Ok(encode(payload)?
        .render::<Dense1x2>()
        .quiet_zone(true)
        .build())
}

/// Delivers a challenge to the admin, or logs it when no relay is configured.
///
/// Failures are logged and never returned.
pub async fn deliver(relay: Option<Arc<dyn AdminRelay>>, payload: String) {
    let Some(relay) = relay else {
        match render_unicode(&payload) {
            Ok(qr) => info!("scan this QR code to log in to WhatsApp:\n{qr}"),
            Err(e) => error!(error = %e, "failed to render login challenge"),
        }
        return;
    };

    let png = match render_png(&payload) {
        Ok(png) => png,
        Err(e) => {
            error!(error = %e, "failed to render login challenge");
            return;
        }
    };
    match relay.send_image(png, QR_CAPTION).await {
        Ok(()) => info!("login challenge relayed to admin"),
        Err(e) => error!(error = %e, "failed to relay login challenge"),
    }
}

#[cfg(test)]
mod tests {
    use nexos_test_utils::MockRelay;

    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn png_has_signature_and_decodes() {
        let png = render_png("2@abc,def,ghi").unwrap();
        assert!(png.starts_with(PNG_MAGIC));
        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.width() >= MIN_DIMENSION);
    }

    #[test]
    fn unicode_rendering_is_multiline() {
        let qr = render_unicode("hello").unwrap();
        assert!(qr.lines().count() > 5);
    }

    #[tokio::test]
    async fn deliver_sends_png_with_caption() {
        let relay = Arc::new(MockRelay::new());
        deliver(Some(relay.clone() as Arc<dyn AdminRelay>), "payload".into()).await;

        let images = relay.images().await;
        assert_eq!(images.len(), 1);
        assert!(images[0].0.starts_with(PNG_MAGIC));
        assert_eq!(images[0].1, QR_CAPTION);
    }

    #[tokio::test]
    async fn relay_failure_is_swallowed() {
        let relay = Arc::new(MockRelay::new());
        relay.fail_all(true);
        deliver(Some(relay.clone() as Arc<dyn AdminRelay>), "payload".into()).await;
        assert!(relay.images().await.is_empty());
    }

    #[tokio::test]
    async fn without_relay_nothing_is_sent() {
        deliver(None, "payload".into()).await;
    }
}
