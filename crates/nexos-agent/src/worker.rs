// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential message worker.
//!
//! Inbound messages and group updates are processed one at a time in
//! delivery order, off the event loop, so a slow command never holds up
//! connection handling.

use std::sync::Arc;

use nexos_core::types::GroupParticipantsUpdate;
use nexos_core::{InboundMessage, Transport};
use nexos_router::MessageRouter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::groups::GroupGreeter;

/// One unit of work, bound to the session it arrived on.
pub enum Work {
    Message {
        transport: Arc<dyn Transport>,
        message: InboundMessage,
    },
    Group {
        transport: Arc<dyn Transport>,
        update: GroupParticipantsUpdate,
    },
}

/// Spawns the worker. It exits once every sender is dropped and the queue is empty.
pub fn spawn(
    router: Arc<MessageRouter>,
    greeter: Arc<GroupGreeter>,
    mut queue: mpsc::UnboundedReceiver<Work>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(work) = queue.recv().await {
            match work {
                Work::Message { transport, message } => {
                    router.handle(&transport, &message).await;
                }
                Work::Group { transport, update } => {
                    if let Err(e) = greeter.handle(&transport, &update).await {
                        error!(group_id = %update.id, error = %e, "group greeting failed");
                    }
                }
            }
        }
        debug!("message worker finished");
    })
}
