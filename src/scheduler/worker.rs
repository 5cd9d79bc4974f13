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

use crate::bus::MessageBus;
use crate::config::{ResolvedFilters, SiteConfig};
use crate::parser::SiteParser;
use crate::runtime::Shutdown;
use crate::scheduler::SchedulerState;
use crate::sink::Housekeeper;
use rand::Rng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Cadence jitter, plus or minus.
const JITTER: Duration = Duration::from_secs(45 * 60);
/// Poll interval while the quiet window is active.
const QUIET_POLL: Duration = Duration::from_secs(12 * 60);
/// Poll interval while waiting for the bus to drain.
const DRAIN_POLL: Duration = Duration::from_secs(5 * 60);

/// The long-lived loop driving one site: parse, publish, sleep with
/// jitter, back off on empty cycles, honor the quiet window, and
/// trigger the duplicate purge when the whole system goes idle.
pub struct SiteWorker {
    site: SiteConfig,
    filters: ResolvedFilters,
    parser: SiteParser,
    bus: Arc<MessageBus>,
    state: Arc<SchedulerState>,
    housekeeper: Arc<Housekeeper>,
}

impl SiteWorker {
    pub fn new(
        site: SiteConfig,
        filters: ResolvedFilters,
        parser: SiteParser,
        bus: Arc<MessageBus>,
        state: Arc<SchedulerState>,
        housekeeper: Arc<Housekeeper>,
    ) -> Self {
        Self {
            site,
            filters,
            parser,
            bus,
            state,
            housekeeper,
        }
    }

    pub async fn run(self, shutdown: Shutdown) {
        let mut cycle_empty = false;
        log::info!("{} --- worker started", self.site.site_id);

        while !shutdown.is_shutdown() {
            if cycle_empty {
                log::info!("SLEEPING: {}", self.site.url);
                if shutdown.sleep(jittered(self.site.cadence)).await {
                    break;
                }
                cycle_empty = false;
            }

            // The database is being cleaned up, wait it out.
            while self.state.quiet.load(Ordering::Relaxed) {
                if shutdown.sleep(QUIET_POLL).await {
                    log::info!("{} --- worker stopped", self.site.site_id);
                    return;
                }
            }

            self.state.active.fetch_add(1, Ordering::SeqCst);
            let rows = self.parser.parse(&self.site, &self.filters).await;
            match rows {
                None => {
                    self.state.active.fetch_sub(1, Ordering::SeqCst);
                    cycle_empty = true;
                    continue;
                }
                Some(rows) => {
                    self.bus.publish(self.parser.parser_tag(), rows);
                    self.state.active.fetch_sub(1, Ordering::SeqCst);
                }
            }

            if self.state.active.load(Ordering::SeqCst) == 0 {
                if self.await_drain_and_purge(&shutdown).await {
                    break;
                }
            }

            if shutdown.sleep(jittered(self.site.cadence)).await {
                break;
            }
        }
        log::info!("{} --- worker stopped", self.site.site_id);
    }

    /// Waits for the bus to drain, then runs the duplicate purge inside
    /// the quiet window. `true` means shutdown interrupted the wait.
    async fn await_drain_and_purge(&self, shutdown: &Shutdown) -> bool {
        while !self.bus.is_drained() {
            if shutdown.sleep(DRAIN_POLL).await {
                return true;
            }
        }

        self.state.quiet.store(true, Ordering::Relaxed);
        log::info!("CLEARING: duplicates");
        self.housekeeper.purge_duplicates().await;
        log::info!("FINISH CLEARING: duplicates");
        self.state.quiet.store(false, Ordering::Relaxed);
        false
    }
}

/// The cadence offset by up to [`JITTER`] in either direction, floored
/// at zero for short test cadences.
fn jittered(cadence: Duration) -> Duration {
    let jitter = JITTER.as_secs() as i64;
    let offset = rand::thread_rng().gen_range(-jitter..=jitter);
    let seconds = (cadence.as_secs() as i64 + offset).max(0);
    Duration::from_secs(seconds as u64)
}
