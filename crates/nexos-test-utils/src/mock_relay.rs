// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin relay double.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use nexos_core::{AdminRelay, NexosError};

#[derive(Default)]
pub struct MockRelay {
    images: Mutex<Vec<(Vec<u8>, String)>>,
    texts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Captions of relayed images.
    pub async fn image_captions(&self) -> Vec<String> {
        self.images.lock().await.iter().map(|(_, c)| c.clone()).collect()
    }

    pub async fn images(&self) -> Vec<(Vec<u8>, String)> {
        self.images.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.texts.lock().await.clone()
    }

    fn check(&self) -> Result<(), NexosError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NexosError::Relay {
                message: "mock relay failure".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AdminRelay for MockRelay {
    async fn send_image(&self, image: Vec<u8>, caption: &str) -> Result<(), NexosError> {
        self.check()?;
        self.images.lock().await.push((image, caption.to_string()));
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NexosError> {
        self.check()?;
        self.texts.lock().await.push(text.to_string());
        Ok(())
    }
}
