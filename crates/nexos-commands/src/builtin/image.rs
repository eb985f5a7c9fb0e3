// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `!صورة <url>`: downloads an image and sends it back to the chat.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, ImageResult};
use nexos_core::{NexosError, OutboundContent};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::context::{CommandContext, CommandHandler};

pub const USAGE: &str =
    "⚠️ الصيغة الصحيحة: `!صورة <رابط_الصورة>` (يجب أن يبدأ بـ http أو https)";
pub const CAPTION: &str = "🖼️ هذه هي الصورة المطلوبة";
pub const FETCH_FAILED: &str = "❌ لم أتمكن من تحميل الصورة. تأكد أن الرابط مباشر وقابل للوصول.";

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

pub struct ImageCommand {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ImageCommand {
    pub fn new(max_bytes: u64, timeout: Duration) -> Result<Self, NexosError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NexosError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, max_bytes })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Strips the `<...>` WhatsApp puts around links, zero-width spaces, and
/// repeated whitespace.
pub fn clean_url(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .replace('\u{200B}', "");
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decodes and rotates the pixels upright according to the EXIF orientation.
fn decode_upright(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

/// Re-encodes as JPEG for compatibility, falling back to PNG, and finally to
/// the original bytes when they cannot be decoded at all.
pub fn transcode(bytes: Vec<u8>) -> Vec<u8> {
    let decoded = match decode_upright(&bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "image not decodable, sending as downloaded");
            return bytes;
        }
    };

    let mut jpeg = Vec::new();
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    match rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)) {
        Ok(()) => return jpeg,
        Err(e) => warn!(error = %e, "JPEG encode failed, trying PNG"),
    }

    let mut png = Cursor::new(Vec::new());
    match decoded.write_to(&mut png, ImageFormat::Png) {
        Ok(()) => png.into_inner(),
        Err(e) => {
            warn!(error = %e, "PNG encode failed, sending as downloaded");
            bytes
        }
    }
}

#[async_trait]
impl CommandHandler for ImageCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        let url = clean_url(&ctx.raw_args());
        if url.is_empty() || !is_http_url(&url) {
            ctx.reply_text(USAGE).await?;
            return Ok(());
        }

        let bytes = match self.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, url = %url, "image download failed");
                ctx.reply_text(FETCH_FAILED).await?;
                return Ok(());
            }
        };
        debug!(url = %url, size = bytes.len(), "image downloaded");

        let bytes = match tokio::task::spawn_blocking(move || transcode(bytes)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, url = %url, "image transcode task failed");
                ctx.reply_text(FETCH_FAILED).await?;
                return Ok(());
            }
        };

        let sent = ctx
            .reply(OutboundContent::Image {
                bytes,
                caption: Some(CAPTION.to_string()),
            })
            .await;
        if let Err(e) = sent {
            error!(error = %e, url = %url, "image send failed");
            ctx.reply_text(FETCH_FAILED).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_url_strips_wrappers() {
        assert_eq!(
            clean_url("  <https://example.com/a.png>  "),
            "https://example.com/a.png"
        );
        assert_eq!(
            clean_url("https://exa\u{200B}mple.com/a.png"),
            "https://example.com/a.png"
        );
        assert_eq!(clean_url("a \t  b"), "a b");
        assert_eq!(clean_url(""), "");
    }

    #[test]
    fn scheme_check_is_case_insensitive() {
        assert!(is_http_url("HTTPS://example.com"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn transcode_produces_jpeg() {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 255]));
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let out = transcode(png.into_inner());
        assert_eq!(&out[..2], &[0xFF, 0xD8], "expected a JPEG header");
    }

    /// A JPEG with an APP1 segment holding only the orientation tag.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 10]));
        let mut plain = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut plain, 90))
            .unwrap();

        let mut exif = b"Exif\0\0".to_vec();
        // Big-endian TIFF header, one IFD entry: 0x0112 SHORT x1.
        exif.extend_from_slice(b"MM\0\x2a\0\0\0\x08");
        exif.extend_from_slice(&[0x00, 0x01]);
        exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        exif.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let segment_len = u16::try_from(exif.len() + 2).unwrap();
        let mut out = plain[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&exif);
        out.extend_from_slice(&plain[2..]);
        out
    }

    #[test]
    fn transcode_applies_exif_rotation() {
        let rotated = jpeg_with_orientation(4, 2, 6);
        let out = transcode(rotated);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 4));

        let upright = jpeg_with_orientation(4, 2, 1);
        let decoded = image::load_from_memory(&transcode(upright)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn undecodable_bytes_pass_through() {
        let garbage = b"definitely not an image".to_vec();
        assert_eq!(transcode(garbage.clone()), garbage);
    }
}
