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

use crate::bus::{BusMessage, BusSubscription, MessageBus};
use crate::data::Row;
use crate::runtime::Shutdown;
use crate::sink::{NotionClient, SinkRecord, WriteOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Spacing between writes of one batch.
const WRITE_SPACING: Duration = Duration::from_millis(350);
/// Extra pause before the third write while the cleaner is deleting,
/// keeping combined traffic under the sink's per-second ceiling.
const CLEANER_PAUSE: Duration = Duration::from_secs(1);
/// Each batch occupies at least this much of the clock.
const BATCH_BUDGET: Duration = Duration::from_secs(1);
const MIN_BATCH_SLEEP: Duration = Duration::from_millis(500);

/// The single consumer of the bus.
///
/// Validates each row, paces writes under the sink's rate ceiling
/// (switching to a reduced-rate pattern while the housekeeper deletes),
/// and re-publishes conflicted records for an optimistic retry.
pub struct SinkGateway {
    notion: Arc<NotionClient>,
    bus: Arc<MessageBus>,
    cleaner_active: Arc<AtomicBool>,
}

impl SinkGateway {
    pub fn new(
        notion: Arc<NotionClient>,
        bus: Arc<MessageBus>,
        cleaner_active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            notion,
            bus,
            cleaner_active,
        }
    }

    /// Consumes the bus until shutdown. The in-flight batch completes
    /// before the loop exits.
    pub async fn run(self, mut subscription: BusSubscription, shutdown: Shutdown) {
        loop {
            let message = tokio::select! {
                message = subscription.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
                _ = shutdown.wait() => break,
            };
            self.deliver(message).await;
        }
        log::info!("sink gateway stopped");
    }

    pub async fn deliver(&self, message: BusMessage) {
        let validated: Vec<(&Row, SinkRecord)> = message
            .batch
            .iter()
            .filter_map(|row| match SinkRecord::from_row(row) {
                Some(record) => Some((row, record)),
                None => {
                    log::warn!(
                        "{} --- dropping row without usable company/position",
                        message.parser_tag
                    );
                    None
                }
            })
            .collect();

        let started = Instant::now();
        if self.cleaner_active.load(Ordering::Relaxed) {
            for (index, entry) in validated.iter().take(2).enumerate() {
                if index > 0 {
                    tokio::time::sleep(WRITE_SPACING).await;
                }
                self.write(&message.parser_tag, entry).await;
            }
            if let Some(third) = validated.get(2) {
                tokio::time::sleep(CLEANER_PAUSE).await;
                self.write(&message.parser_tag, third).await;
            }
        } else {
            for (index, entry) in validated.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(WRITE_SPACING).await;
                }
                self.write(&message.parser_tag, entry).await;
            }
        }

        let elapsed = started.elapsed();
        let pause = BATCH_BUDGET
            .checked_sub(elapsed)
            .unwrap_or(Duration::ZERO)
            .max(MIN_BATCH_SLEEP);
        tokio::time::sleep(pause).await;
    }

    async fn write(&self, parser_tag: &str, (row, record): &(&Row, SinkRecord)) {
        match self.notion.create_page(record).await {
            WriteOutcome::Created => {}
            WriteOutcome::Conflict => {
                // Optimistic retry: by the next pass the downstream
                // state has resolved.
                self.bus.publish(parser_tag, vec![(*row).clone()]);
            }
            WriteOutcome::Dropped => {}
        }
    }
}
