// Copyright 2025 Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::data::Row;
use itertools::Itertools;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The sink accepts at most this many rows per delivery.
pub const MAX_BATCH_SIZE: usize = 3;

/// One delivery to the gateway: the producing parser's tag and at most
/// [`MAX_BATCH_SIZE`] rows, in source order.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub parser_tag: String,
    pub batch: Vec<Row>,
}

/// The in-process FIFO between workers and the sink gateway.
///
/// Unbounded: sink pacing is the gateway's job, back-pressure would only
/// stall workers that should keep their cadence.
#[derive(Debug)]
pub struct MessageBus {
    sender: mpsc::UnboundedSender<BusMessage>,
    queued: AtomicUsize,
    publishing: AtomicUsize,
}

impl MessageBus {
    /// Creates the bus and its single subscription.
    pub fn channel() -> (Arc<Self>, BusSubscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let bus = Arc::new(Self {
            sender,
            queued: AtomicUsize::new(0),
            publishing: AtomicUsize::new(0),
        });
        (
            bus.clone(),
            BusSubscription {
                receiver,
                bus,
            },
        )
    }

    /// Splits `rows` into batches of at most [`MAX_BATCH_SIZE`] and
    /// enqueues them in order.
    pub fn publish(&self, parser_tag: &str, rows: Vec<Row>) {
        self.publishing.fetch_add(1, Ordering::SeqCst);
        for batch in &rows.into_iter().chunks(MAX_BATCH_SIZE) {
            let message = BusMessage {
                parser_tag: parser_tag.to_string(),
                batch: batch.collect(),
            };
            self.queued.fetch_add(1, Ordering::SeqCst);
            if self.sender.send(message).is_err() {
                log::warn!("bus has no consumer, dropping batch from {parser_tag}");
                self.queued.fetch_sub(1, Ordering::SeqCst);
            }
        }
        self.publishing.fetch_sub(1, Ordering::SeqCst);
    }

    /// Queue empty and nobody inside [`Self::publish`].
    pub fn is_drained(&self) -> bool {
        self.queued.load(Ordering::SeqCst) == 0 && self.publishing.load(Ordering::SeqCst) == 0
    }
}

/// The consuming end of the bus; exactly one exists.
#[derive(Debug)]
pub struct BusSubscription {
    receiver: mpsc::UnboundedReceiver<BusMessage>,
    bus: Arc<MessageBus>,
}

impl BusSubscription {
    /// The next message in FIFO order; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        let message = self.receiver.recv().await;
        if message.is_some() {
            self.bus.queued.fetch_sub(1, Ordering::SeqCst);
        }
        message
    }
}
