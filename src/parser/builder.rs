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
use crate::client::HttpClient;
use crate::config::ParserKind;
use crate::extraction::{CsvExtractor, DomExtractor, Extractor, HtmlExtractor, JsonExtractor};
use crate::fetching::{
    BrowserCsvFetcher, BrowserPageFetcher, DownloadFetcher, Fetcher, HttpTextFetcher,
    JsonApiFetcher,
};
use crate::parser::SiteParser;
use crate::processing::ProcessingPipeline;
use crate::robots::RobotsAdvisor;
use crate::tracker::ChangeTracker;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("parser kind {0} needs a browser pool, but none was started")]
    NoBrowserPool(ParserKind),
}

/// Maps a parser kind to its (fetcher, extractor, pipeline) triple,
/// sharing one HTTP session, robots advisor, tracker and pipeline across
/// all parsers.
pub struct ParserBuilder {
    client: HttpClient,
    advisor: Arc<RobotsAdvisor>,
    pool: Option<Arc<BrowserPool>>,
    pipeline: Arc<ProcessingPipeline>,
    hirebase_api_key: Option<String>,
}

impl ParserBuilder {
    pub fn new(
        client: HttpClient,
        advisor: Arc<RobotsAdvisor>,
        pool: Option<Arc<BrowserPool>>,
        tracker: Arc<ChangeTracker>,
        hirebase_api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            advisor,
            pool,
            pipeline: Arc::new(ProcessingPipeline::standard(tracker)),
            hirebase_api_key,
        }
    }

    pub fn build(&self, kind: ParserKind) -> Result<SiteParser, BuildError> {
        log::info!("building {} parser", kind);
        let (fetcher, extractor) = match kind {
            ParserKind::Download => (
                Fetcher::Download(DownloadFetcher::new(self.client.clone())),
                Extractor::Csv(CsvExtractor::new()),
            ),
            ParserKind::SelDownload => (
                Fetcher::BrowserCsv(BrowserCsvFetcher::new(self.pool(kind)?)),
                Extractor::Csv(CsvExtractor::new()),
            ),
            ParserKind::Static => (
                Fetcher::HttpText(HttpTextFetcher::new(
                    self.client.clone(),
                    self.advisor.clone(),
                )),
                Extractor::Html(HtmlExtractor::new()),
            ),
            ParserKind::Js => (
                Fetcher::BrowserPage(BrowserPageFetcher::new(
                    self.pool(kind)?,
                    self.advisor.clone(),
                )),
                Extractor::Dom(DomExtractor::new()),
            ),
            ParserKind::HireBase => (
                Fetcher::JsonApi(JsonApiFetcher::new(
                    self.client.clone(),
                    self.hirebase_api_key.clone(),
                )),
                Extractor::Json(JsonExtractor::new()),
            ),
        };
        Ok(SiteParser::new(
            fetcher,
            extractor,
            self.pipeline.clone(),
            kind.tag(),
        ))
    }

    fn pool(&self, kind: ParserKind) -> Result<Arc<BrowserPool>, BuildError> {
        self.pool.clone().ok_or(BuildError::NoBrowserPool(kind))
    }
}
