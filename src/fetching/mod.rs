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

mod browser_csv;
mod browser_page;
mod download;
mod gate;
mod http;
mod json_api;
mod payload;

pub use browser_csv::BrowserCsvFetcher;
pub use browser_page::BrowserPageFetcher;
pub use download::DownloadFetcher;
pub use http::HttpTextFetcher;
pub use json_api::JsonApiFetcher;
pub use payload::Payload;

use crate::config::SiteConfig;

/// The closed set of content fetchers.
///
/// `fetch` returns `None` for "skip this cycle": robots denial, network
/// trouble, download timeouts. None of these propagate as errors.
#[derive(Debug)]
pub enum Fetcher {
    HttpText(HttpTextFetcher),
    Download(DownloadFetcher),
    BrowserPage(BrowserPageFetcher),
    BrowserCsv(BrowserCsvFetcher),
    JsonApi(JsonApiFetcher),
}

impl Fetcher {
    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        match self {
            Fetcher::HttpText(fetcher) => fetcher.fetch(site).await,
            Fetcher::Download(fetcher) => fetcher.fetch(site).await,
            Fetcher::BrowserPage(fetcher) => fetcher.fetch(site).await,
            Fetcher::BrowserCsv(fetcher) => fetcher.fetch(site).await,
            Fetcher::JsonApi(fetcher) => fetcher.fetch(site).await,
        }
    }
}
