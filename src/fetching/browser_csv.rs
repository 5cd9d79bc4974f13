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
use crate::fetching::Payload;
use chromiumoxide::{Element, Page};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Settle time after navigation before the export menu exists.
const PAGE_WAIT: Duration = Duration::from_secs(10);
/// Settle time after opening the menu.
const MENU_WAIT: Duration = Duration::from_secs(2);
/// How long an element may take to become present.
const CLICKABLE_TIMEOUT: Duration = Duration::from_secs(30);
/// How long the export may take to land in the download directory.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// The export menu button; the menu entry is matched in English and
/// French, the two languages the vendor serves.
const MENU_XPATH: &str = "//div[contains(@class, 'viewMenuButton')]";
const DOWNLOAD_XPATH: &str =
    "//*[contains(text(), 'Download') or contains(text(), 'Télécharger')]";

/// Fetches an interactive CSV export by clicking through the vendor UI
/// in a pooled browser and reading the downloaded file.
#[derive(Debug)]
pub struct BrowserCsvFetcher {
    pool: Arc<BrowserPool>,
}

impl BrowserCsvFetcher {
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self { pool }
    }

    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        let lease = match self.pool.acquire().await {
            Ok(lease) => lease,
            Err(error) => {
                log::error!("{} --- no browser available: {error}", site.url);
                return None;
            }
        };

        log::info!("{} --- opening browser for export", site.url);
        let page = match lease.new_page().await {
            Ok(page) => page,
            Err(error) => {
                log::error!("{} --- failed to open page: {error}", site.url);
                return None;
            }
        };

        let content = self
            .download_csv(site, &page, lease.download_dir())
            .await;
        let _ = page.close().await;
        // Dropping the lease clears the download directory.
        drop(lease);

        content.map(Payload::Csv)
    }

    async fn download_csv(&self, site: &SiteConfig, page: &Page, download_dir: &Path) -> Option<String> {
        if let Err(error) =
            tokio::time::timeout(PAGE_LOAD_TIMEOUT, page.goto(site.url.as_str()))
                .await
                .map_err(|_| "navigation timed out".to_string())
                .and_then(|r| r.map(|_| ()).map_err(|e| e.to_string()))
        {
            log::error!("{} --- {error}", site.url);
            return None;
        }
        tokio::time::sleep(PAGE_WAIT).await;

        let menu = wait_clickable(page, MENU_XPATH).await?;
        if let Err(error) = menu.click().await {
            log::error!("{} --- failed to open export menu: {error}", site.url);
            return None;
        }
        tokio::time::sleep(MENU_WAIT).await;

        let download = wait_clickable(page, DOWNLOAD_XPATH).await?;
        if let Err(error) = download.click().await {
            log::error!("{} --- failed to click download: {error}", site.url);
            return None;
        }

        let path = wait_for_csv(download_dir, DOWNLOAD_TIMEOUT).await?;
        log::info!("{} --- downloaded {}", site.url, path.display());

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) => {
                log::error!("{} --- failed to read export: {error}", site.url);
                return None;
            }
        };
        let _ = tokio::fs::remove_file(&path).await;
        Some(content)
    }
}

/// Polls for an element until it exists or the timeout elapses.
async fn wait_clickable(page: &Page, xpath: &str) -> Option<Element> {
    let deadline = tokio::time::Instant::now() + CLICKABLE_TIMEOUT;
    loop {
        match page.find_xpath(xpath).await {
            Ok(element) => return Some(element),
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(error) => {
                log::error!("element never became clickable ({xpath}): {error}");
                return None;
            }
        }
    }
}

/// Polls the download directory until a finished `.csv` exists: no
/// `.crdownload` may linger. `None` on timeout.
async fn wait_for_csv(download_dir: &Path, timeout: Duration) -> Option<PathBuf> {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Some(found) = scan_for_csv(download_dir) {
            return Some(found);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    log::error!("download timed out in {}", download_dir.display());
    None
}

fn scan_for_csv(download_dir: &Path) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = std::fs::read_dir(download_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect();

    let still_downloading = entries.iter().any(|path| {
        path.extension()
            .map(|ext| ext == "crdownload")
            .unwrap_or(false)
    });
    if still_downloading {
        return None;
    }
    entries
        .into_iter()
        .find(|path| path.extension().map(|ext| ext == "csv").unwrap_or(false))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scan_ignores_partial_downloads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("export.csv"), "a,b").unwrap();
        std::fs::write(dir.path().join("export.csv.crdownload"), "").unwrap();
        assert!(scan_for_csv(dir.path()).is_none());
    }

    #[test]
    fn scan_finds_a_finished_csv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("export.csv"), "a,b").unwrap();
        assert_eq!(
            scan_for_csv(dir.path()),
            Some(dir.path().join("export.csv"))
        );
    }

    #[tokio::test]
    async fn wait_for_csv_times_out_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(wait_for_csv(dir.path(), Duration::from_millis(50)).await.is_none());
    }
}
