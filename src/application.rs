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

use crate::browser::BrowserPool;
use crate::bus::MessageBus;
use crate::client::HttpClient;
use crate::config::{Configs, ParserKind};
use crate::parser::ParserBuilder;
use crate::robots::{RobotsAdvisor, RobotsRefresher};
use crate::runtime::graceful_shutdown;
use crate::scheduler::{SchedulerState, SiteWorker};
use crate::sink::{Housekeeper, NotionClient, SinkGateway};
use crate::tracker::ChangeTracker;
use anyhow::Context;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// The application: owns every once-per-process resource as an explicit
/// dependency and passes it down, spawns the long-lived tasks, and
/// drives cooperative shutdown on SIGINT.
pub struct Opilio {
    configs: Configs,
}

impl Opilio {
    pub fn new(configs: Configs) -> Self {
        Self { configs }
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let Configs {
            system,
            sites,
            filters,
            sink,
        } = self.configs;

        let (signal, shutdown, mut barrier) = graceful_shutdown();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, shutting down");
            }
            signal.cancel();
        });

        let client = HttpClient::new().context("failed to build the HTTP session")?;
        let tracker = Arc::new(ChangeTracker::new());
        let advisor = Arc::new(RobotsAdvisor::new(
            client.clone(),
            system.robots_cache_size,
        ));

        let needs_browsers = sites.iter().any(|site| {
            matches!(site.parser_kind, ParserKind::Js | ParserKind::SelDownload)
        });
        let pool = if needs_browsers {
            Some(
                BrowserPool::launch(system.browser_instances, system.headless)
                    .await
                    .context("failed to launch the browser pool")?,
            )
        } else {
            None
        };

        let (bus, subscription) = MessageBus::channel();
        let cleaner_active = Arc::new(AtomicBool::new(false));
        let notion = Arc::new(NotionClient::new(client.clone(), sink.clone()));
        let housekeeper = Arc::new(Housekeeper::new(notion.clone(), cleaner_active.clone()));
        let state = Arc::new(SchedulerState::new());
        let builder = ParserBuilder::new(
            client,
            advisor.clone(),
            pool.clone(),
            tracker,
            sink.hirebase_api_key.clone(),
        );

        let mut tasks = JoinSet::new();

        let gateway = SinkGateway::new(notion, bus.clone(), cleaner_active);
        tasks.spawn(gateway.run(subscription, shutdown.clone()));

        let refresher = RobotsRefresher::new(
            advisor,
            Duration::from_secs(system.robots_refresh_hours * 60 * 60),
        );
        tasks.spawn(refresher.run(shutdown.clone()));

        let cleaner = housekeeper.clone();
        let cleaner_shutdown = shutdown.clone();
        tasks.spawn(async move { cleaner.run_old_entry_cleaner(cleaner_shutdown).await });

        for site in sites {
            let parser = builder
                .build(site.parser_kind)
                .with_context(|| format!("failed to build the parser for {}", site.site_id))?;
            let resolved = filters.resolve(&site.site_id);
            log::debug!("spawning worker for {}", site.site_id);
            let worker = SiteWorker::new(
                site,
                resolved,
                parser,
                bus.clone(),
                state.clone(),
                housekeeper.clone(),
            );
            tasks.spawn(worker.run(shutdown.clone()));
        }
        drop(shutdown);

        while let Some(finished) = tasks.join_next().await {
            if let Err(error) = finished {
                log::error!("task ended abnormally: {error}");
            }
        }

        // Browsers are released last, after every worker is gone.
        if let Some(pool) = pool {
            pool.close().await;
        }
        barrier.wait().await;
        Ok(())
    }
}
