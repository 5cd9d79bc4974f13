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

use crate::client::HttpClient;
use crate::config::SiteConfig;
use crate::fetching::gate::respect_robots;
use crate::fetching::Payload;
use crate::robots::RobotsAdvisor;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::sync::Arc;

const DEFAULT_ACCEPT: &str = "text/html";

/// Fetches static HTML over HTTP, robots-gated, with a spoofed
/// User-Agent per call.
#[derive(Debug)]
pub struct HttpTextFetcher {
    client: HttpClient,
    advisor: Arc<RobotsAdvisor>,
}

impl HttpTextFetcher {
    pub fn new(client: HttpClient, advisor: Arc<RobotsAdvisor>) -> Self {
        Self { client, advisor }
    }

    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        let user_agent = ua_generator::ua::spoof_ua();
        if !respect_robots(site, user_agent, &self.advisor).await {
            return None;
        }

        let accept = site.accept.as_deref().unwrap_or(DEFAULT_ACCEPT);
        log::info!("{} --- fetching content", site.url);
        let result = self
            .client
            .get(&site.url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, accept)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(response) => match response.text().await {
                Ok(text) => Some(Payload::Text(text)),
                Err(error) => {
                    log::error!("{} --- error reading body: {error}", site.url);
                    None
                }
            },
            Err(error) => {
                log::error!("{} --- error fetching: {error}", site.url);
                None
            }
        }
    }
}
