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

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Upper bound on a page navigation; pages that load longer than this are
/// treated as failed fetches.
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to configure browser: {0}")]
    Config(String),
    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("browser pool is closed")]
    PoolClosed,
}

/// One pooled headless browser with its event handler task and private
/// scratch directories.
#[derive(Debug)]
pub struct BrowserInstance {
    id: usize,
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
    download_dir: PathBuf,
}

impl BrowserInstance {
    async fn launch(id: usize, headless: bool, scratch: &Path) -> Result<Self, BrowserError> {
        let user_data_dir = scratch.join(format!("profile_{id}"));
        let download_dir = scratch.join(format!("downloads_{id}"));
        std::fs::create_dir_all(&user_data_dir)?;
        std::fs::create_dir_all(&download_dir)?;

        let mut config = BrowserConfig::builder()
            .request_timeout(PAGE_LOAD_TIMEOUT)
            .window_size(1920, 1080)
            .user_data_dir(&user_data_dir)
            .no_sandbox()
            .arg(format!("--user-agent={}", ua_generator::ua::spoof_ua()))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !headless {
            config = config.with_head();
        }
        let config = config.build().map_err(BrowserError::Config)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(error) = event {
                    log::debug!("browser {id} handler: {error}");
                }
            }
        });

        // Route downloads into this instance's private directory.
        browser
            .execute(
                SetDownloadBehaviorParams::builder()
                    .behavior(SetDownloadBehaviorBehavior::Allow)
                    .download_path(download_dir.to_string_lossy().into_owned())
                    .build()
                    .map_err(BrowserError::Config)?,
            )
            .await?;

        log::info!("launched browser instance {id}");
        Ok(Self {
            id,
            browser,
            handler,
            user_data_dir,
            download_dir,
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Opens a blank page on this instance.
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// Removes everything inside the download directory, leaving the
    /// directory itself in place.
    fn clear_download_dir(&self) {
        clear_dir(&self.download_dir);
    }

    async fn close(mut self) {
        if let Err(error) = self.browser.close().await {
            log::warn!("failed to close browser {}: {error}", self.id);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        let _ = std::fs::remove_dir_all(&self.user_data_dir);
        let _ = std::fs::remove_dir_all(&self.download_dir);
    }
}

fn clear_dir(directory: &Path) {
    let Ok(entries) = std::fs::read_dir(directory) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(error) = result {
            log::warn!("failed to clean up {}: {error}", path.display());
        }
    }
}

/// A bounded pool of headless browser instances.
///
/// Instances travel through a channel: acquiring takes one out, releasing
/// (or dropping a [`BrowserLease`]) puts it back with a cleared download
/// directory. At most `size` instances exist, so acquisition waits when
/// all are in use.
#[derive(Debug)]
pub struct BrowserPool {
    size: usize,
    returns: mpsc::UnboundedSender<BrowserInstance>,
    idle: Mutex<mpsc::UnboundedReceiver<BrowserInstance>>,
    _scratch: tempfile::TempDir,
}

impl BrowserPool {
    pub async fn launch(size: usize, headless: bool) -> Result<Arc<Self>, BrowserError> {
        let scratch = tempfile::TempDir::with_prefix("opilio_browser_")?;
        let (returns, idle) = mpsc::unbounded_channel();
        for id in 0..size {
            let instance = BrowserInstance::launch(id, headless, scratch.path()).await?;
            returns.send(instance).map_err(|_| BrowserError::PoolClosed)?;
        }
        log::info!("browser pool ready with {size} instances");
        Ok(Arc::new(Self {
            size,
            returns,
            idle: Mutex::new(idle),
            _scratch: scratch,
        }))
    }

    /// Takes an instance out of the pool, waiting until one is idle. The
    /// lease returns it on drop, whatever the exit path.
    pub async fn acquire(self: &Arc<Self>) -> Result<BrowserLease, BrowserError> {
        let instance = self.acquire_raw().await?;
        Ok(BrowserLease {
            pool: self.clone(),
            instance: Some(instance),
        })
    }

    async fn acquire_raw(&self) -> Result<BrowserInstance, BrowserError> {
        let mut idle = self.idle.lock().await;
        idle.recv().await.ok_or(BrowserError::PoolClosed)
    }

    fn release(&self, instance: BrowserInstance) {
        instance.clear_download_dir();
        if self.returns.send(instance).is_err() {
            log::warn!("browser released into a closed pool");
        }
    }

    /// Waits for every instance to come back, then closes them all.
    pub async fn close(&self) {
        let mut idle = self.idle.lock().await;
        for _ in 0..self.size {
            match idle.recv().await {
                Some(instance) => instance.close().await,
                None => break,
            }
        }
        log::info!("browser pool closed");
    }
}

/// RAII lease on a pooled browser instance.
pub struct BrowserLease {
    pool: Arc<BrowserPool>,
    instance: Option<BrowserInstance>,
}

impl Deref for BrowserLease {
    type Target = BrowserInstance;

    fn deref(&self) -> &Self::Target {
        self.instance.as_ref().expect("lease already released")
    }
}

impl Drop for BrowserLease {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.release(instance);
        }
    }
}

impl std::fmt::Debug for BrowserLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserLease")
            .field("instance", &self.instance.as_ref().map(|i| i.id))
            .finish()
    }
}
