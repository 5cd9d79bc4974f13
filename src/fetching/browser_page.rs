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

use crate::browser::{BrowserPool, PAGE_LOAD_TIMEOUT};
use crate::config::SiteConfig;
use crate::fetching::gate::respect_robots;
use crate::fetching::Payload;
use crate::robots::RobotsAdvisor;
use std::sync::Arc;
use std::time::Duration;

/// How long a rendered page gets to populate its content after the
/// navigation settles.
const CONTENT_WAIT: Duration = Duration::from_secs(10);

/// Fetches JavaScript-rendered pages through a pooled browser.
///
/// The returned payload keeps the lease; the DOM extractor reads the live
/// page and the lease goes back to the pool when the payload drops.
#[derive(Debug)]
pub struct BrowserPageFetcher {
    pool: Arc<BrowserPool>,
    advisor: Arc<RobotsAdvisor>,
}

impl BrowserPageFetcher {
    pub fn new(pool: Arc<BrowserPool>, advisor: Arc<RobotsAdvisor>) -> Self {
        Self { pool, advisor }
    }

    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        let user_agent = ua_generator::ua::spoof_ua();
        if !respect_robots(site, user_agent, &self.advisor).await {
            return None;
        }

        let lease = match self.pool.acquire().await {
            Ok(lease) => lease,
            Err(error) => {
                log::error!("{} --- no browser available: {error}", site.url);
                return None;
            }
        };

        // Failures after this point drop the lease, releasing the instance.
        let page = match lease.new_page().await {
            Ok(page) => page,
            Err(error) => {
                log::error!("{} --- failed to open page: {error}", site.url);
                return None;
            }
        };

        let navigation = tokio::time::timeout(PAGE_LOAD_TIMEOUT, page.goto(site.url.as_str())).await;
        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(error)) => {
                log::error!("{} --- navigation failed: {error}", site.url);
                let _ = page.close().await;
                return None;
            }
            Err(_) => {
                log::error!("{} --- navigation timed out", site.url);
                let _ = page.close().await;
                return None;
            }
        }

        tokio::time::sleep(CONTENT_WAIT).await;
        log::info!("{} --- fetched rendered page", site.url);
        Some(Payload::Dom { lease, page })
    }
}
