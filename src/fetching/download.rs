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
use crate::fetching::Payload;
use reqwest::header::{ACCEPT, USER_AGENT};

const DEFAULT_ACCEPT: &str = "text/csv";

/// Fetches a vendor-approved CSV export over HTTP. Robots are not
/// consulted for these endpoints.
#[derive(Debug)]
pub struct DownloadFetcher {
    client: HttpClient,
}

impl DownloadFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        let accept = site.accept.as_deref().unwrap_or(DEFAULT_ACCEPT);
        log::info!("{} --- fetching download", site.url);

        // If the page is no longer accessible the download should not work.
        let result = self
            .client
            .get(&site.url)
            .header(USER_AGENT, ua_generator::ua::spoof_ua())
            .header(ACCEPT, accept)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(response) => match response.text().await {
                Ok(content) => Some(Payload::Csv(content)),
                Err(error) => {
                    log::error!("{} --- error reading download: {error}", site.url);
                    None
                }
            },
            Err(error) => {
                log::error!("{} --- error fetching download: {error}", site.url);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, ParserKind};
    use indexmap::IndexMap;
    use std::time::Duration;

    fn site(url: String) -> SiteConfig {
        SiteConfig {
            site_id: "dl".into(),
            url,
            parser_kind: ParserKind::Download,
            base_url: None,
            robots_url: None,
            accept: Some("text/csv".into()),
            date_format: DateFormat::Relative("{n}d".into()),
            selectors: IndexMap::new(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    #[tokio::test]
    async fn downloads_csv_without_robots() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .match_header("accept", "text/csv")
            .with_body("Company,Role\nAcme,Eng\n")
            .create_async()
            .await;

        let fetcher = DownloadFetcher::new(HttpClient::new().unwrap());
        match fetcher.fetch(&site(format!("{}/export.csv", server.url()))).await {
            Some(Payload::Csv(content)) => assert!(content.starts_with("Company,Role")),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gone_page_skips_the_cycle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = DownloadFetcher::new(HttpClient::new().unwrap());
        assert!(fetcher
            .fetch(&site(format!("{}/export.csv", server.url())))
            .await
            .is_none());
    }
}
