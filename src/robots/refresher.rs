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

use crate::robots::RobotsAdvisor;
use crate::runtime::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::yield_now;

/// Periodically revalidates every cached robots verdict, evicting
/// entries whose fresh verdict is a deny (or whose revalidation fails).
#[derive(Debug)]
pub struct RobotsRefresher {
    advisor: Arc<RobotsAdvisor>,
    interval: Duration,
}

impl RobotsRefresher {
    pub fn new(advisor: Arc<RobotsAdvisor>, interval: Duration) -> Self {
        Self { advisor, interval }
    }

    /// Runs until shutdown. Stops within one revalidation step of the
    /// signal.
    pub async fn run(self, shutdown: Shutdown) {
        loop {
            if shutdown.sleep(self.interval).await {
                break;
            }
            self.refresh_once(&shutdown).await;
        }
        log::info!("robots refresher stopped");
    }

    /// One full pass over the cache, yielding between entries so workers
    /// are not starved.
    pub async fn refresh_once(&self, shutdown: &Shutdown) {
        let cache = self.advisor.cache();
        let entries: Vec<_> = cache
            .iter()
            .map(|(url, verdict)| (url.as_ref().clone(), verdict))
            .collect();

        log::info!("revalidating {} robots entries", entries.len());
        for (request_url, verdict) in entries {
            if shutdown.is_shutdown() {
                return;
            }
            if !self.advisor.revalidate(verdict.as_ref(), &request_url).await {
                log::info!("robots revalidation evicted {request_url}");
                cache.invalidate(&request_url).await;
            }
            yield_now().await;
        }
    }
}
