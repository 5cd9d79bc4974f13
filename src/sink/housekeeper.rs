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

use crate::runtime::Shutdown;
use crate::sink::NotionClient;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// How often old entries are cleaned, and how old they may get.
const OLD_ENTRY_INTERVAL: Duration = Duration::from_secs(2 * 24 * 60 * 60);
const OLD_ENTRY_MAX_AGE: time::Duration = time::Duration::days(2);

/// Old-entry deletes run at most once per second; duplicate deletes at
/// most twice per second.
const OLD_DELETE_SPACING: Duration = Duration::from_secs(1);
const DUPLICATE_DELETE_SPACING: Duration = Duration::from_millis(500);

/// Periodic sink hygiene: age-based deletion on a timer, duplicate
/// purging when the scheduler reports an idle system.
pub struct Housekeeper {
    notion: Arc<NotionClient>,
    cleaner_active: Arc<AtomicBool>,
}

impl Housekeeper {
    pub fn new(notion: Arc<NotionClient>, cleaner_active: Arc<AtomicBool>) -> Self {
        Self {
            notion,
            cleaner_active,
        }
    }

    /// Runs the age-based cleaner until shutdown, one pass every two
    /// days.
    pub async fn run_old_entry_cleaner(&self, shutdown: Shutdown) {
        loop {
            if shutdown.sleep(OLD_ENTRY_INTERVAL).await {
                break;
            }
            self.delete_old_entries().await;
        }
        log::info!("old-entry cleaner stopped");
    }

    /// Deletes records older than the cutoff. While this runs the
    /// gateway throttles to its reduced-rate pattern.
    pub async fn delete_old_entries(&self) {
        self.cleaner_active.store(true, Ordering::Relaxed);
        log::info!("cleaning old sink entries");

        let pages = match self.notion.query_all().await {
            Ok(pages) => pages,
            Err(error) => {
                // Abort the pass; the next tick retries.
                log::error!("old-entry query failed: {error}");
                self.cleaner_active.store(false, Ordering::Relaxed);
                return;
            }
        };

        let cutoff = OffsetDateTime::now_utc() - OLD_ENTRY_MAX_AGE;
        let mut deleted = 0usize;
        for page in &pages {
            let Some(created) = created_time(page) else {
                continue;
            };
            if created >= cutoff {
                continue;
            }
            if let Some(id) = page.get("id").and_then(Value::as_str) {
                if let Err(error) = self.notion.archive_page(id).await {
                    log::error!("failed to delete {id}: {error}");
                } else {
                    deleted += 1;
                }
                tokio::time::sleep(OLD_DELETE_SPACING).await;
            }
        }

        log::info!("deleted {deleted} old entries");
        self.cleaner_active.store(false, Ordering::Relaxed);
    }

    /// Deletes every record sharing `(company_name, position)` with an
    /// earlier one, keeping the first.
    pub async fn purge_duplicates(&self) {
        let pages = match self.notion.query_all().await {
            Ok(pages) => pages,
            Err(error) => {
                log::error!("duplicate query failed: {error}");
                return;
            }
        };

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut duplicates = Vec::new();
        for page in &pages {
            let (Some(company), Some(position)) = (company_name(page), position(page)) else {
                continue;
            };
            if !seen.insert((company, position)) {
                if let Some(id) = page.get("id").and_then(Value::as_str) {
                    duplicates.push(id.to_string());
                }
            }
        }

        log::info!("purging {} duplicate entries", duplicates.len());
        for id in duplicates {
            if let Err(error) = self.notion.archive_page(&id).await {
                log::error!("failed to delete duplicate {id}: {error}");
            }
            tokio::time::sleep(DUPLICATE_DELETE_SPACING).await;
        }
    }
}

fn created_time(page: &Value) -> Option<OffsetDateTime> {
    let raw = page["properties"]["Created time"]["created_time"]
        .as_str()
        .or_else(|| page["created_time"].as_str())?;
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

fn company_name(page: &Value) -> Option<String> {
    page["properties"]["Company Name"]["title"][0]["text"]["content"]
        .as_str()
        .map(str::to_string)
}

fn position(page: &Value) -> Option<String> {
    page["properties"]["Position"]["multi_select"][0]["name"]
        .as_str()
        .map(str::to_string)
}
