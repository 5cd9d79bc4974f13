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

mod builder;

pub use builder::{BuildError, ParserBuilder};

use crate::config::{ResolvedFilters, SiteConfig};
use crate::data::{Frame, Row};
use crate::extraction::Extractor;
use crate::fetching::Fetcher;
use crate::processing::{ProcessingContext, ProcessingPipeline};
use std::sync::Arc;

/// The composition of one fetcher, one extractor and the pipeline.
///
/// `parse` never propagates fetch, extraction or pipeline failures:
/// every failure path logs and yields `None`, which a worker reads as
/// "skip this cycle".
pub struct SiteParser {
    fetcher: Fetcher,
    extractor: Extractor,
    pipeline: Arc<ProcessingPipeline>,
    parser_tag: &'static str,
}

impl SiteParser {
    pub fn new(
        fetcher: Fetcher,
        extractor: Extractor,
        pipeline: Arc<ProcessingPipeline>,
        parser_tag: &'static str,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            pipeline,
            parser_tag,
        }
    }

    pub fn parser_tag(&self) -> &'static str {
        self.parser_tag
    }

    /// One full acquisition pass: fetch, extract, process. `None` means
    /// nothing new this cycle.
    pub async fn parse(
        &self,
        site: &SiteConfig,
        filters: &ResolvedFilters,
    ) -> Option<Vec<Row>> {
        // Guarded at startup; a site without selectors cannot extract.
        if site.selectors.is_empty() {
            log::error!("{} --- no selectors configured", site.site_id);
            return None;
        }

        let payload = self.fetcher.fetch(site).await?;

        let extracted = match self.extractor.extract(payload, site).await {
            Ok(extracted) => extracted,
            Err(error) => {
                log::error!("{} --- extraction failed: {error}", site.site_id);
                return None;
            }
        };
        if extracted.is_empty() || extracted.values().all(Vec::is_empty) {
            return None;
        }

        let frame = match Frame::from_extraction(extracted) {
            Ok(frame) => frame,
            Err(error) => {
                log::error!("{} --- extraction misaligned: {error}", site.site_id);
                return None;
            }
        };

        let ctx = ProcessingContext {
            site,
            filters,
            parser_tag: self.parser_tag,
        };
        let frame = match self.pipeline.execute(frame, &ctx) {
            Ok(frame) => frame,
            Err(error) => {
                log::warn!("{} --- pipeline aborted: {error}", site.site_id);
                return None;
            }
        };
        if frame.is_empty() {
            return None;
        }

        Some(frame.rows())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::client::HttpClient;
    use crate::config::{DateFormat, ParserKind};
    use crate::data::LogicalField::*;
    use crate::extraction::CsvExtractor;
    use crate::fetching::DownloadFetcher;
    use crate::tracker::ChangeTracker;
    use indexmap::IndexMap;
    use std::time::Duration;

    fn download_site(url: String) -> SiteConfig {
        let mut selectors = IndexMap::new();
        selectors.insert(CompanyName, "Company".to_string());
        selectors.insert(Position, "Role".to_string());
        selectors.insert(Date, "Posted".to_string());
        SiteConfig {
            site_id: "dl".into(),
            url,
            parser_kind: ParserKind::Download,
            base_url: None,
            robots_url: None,
            accept: Some("text/csv".into()),
            date_format: DateFormat::Relative("{n}d".into()),
            selectors,
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    fn csv_parser(tracker: Arc<ChangeTracker>) -> SiteParser {
        SiteParser::new(
            Fetcher::Download(DownloadFetcher::new(HttpClient::new().unwrap())),
            Extractor::Csv(CsvExtractor::new()),
            Arc::new(ProcessingPipeline::standard(tracker)),
            ParserKind::Download.tag(),
        )
    }

    #[tokio::test]
    async fn first_sighting_happy_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .with_body("Company,Role,Posted\nAcme,Eng,0d\nGlobex,Ops,0d\nInitech,QA,1d\nOld,One,3d\n")
            .create_async()
            .await;

        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker.clone());
        let site = download_site(format!("{}/export.csv", server.url()));

        let rows = parser
            .parse(&site, &ResolvedFilters::default())
            .await
            .expect("three fresh rows");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get(CompanyName), Some("Acme"));
        assert_eq!(rows[2].get(CompanyName), Some("Initech"));
        // Fingerprint of the frame as extracted, before the date filter.
        assert!(tracker.has(&site.url));
    }

    #[tokio::test]
    async fn unchanged_since_last_poll_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .with_body("Company,Role,Posted\nAcme,Eng,0d\n")
            .expect(2)
            .create_async()
            .await;

        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker.clone());
        let site = download_site(format!("{}/export.csv", server.url()));

        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_some());
        let fingerprint = tracker.get(&site.url);
        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_none());
        assert_eq!(tracker.get(&site.url), fingerprint);
    }

    #[tokio::test]
    async fn all_rows_stale_still_advances_the_tracker() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .with_body("Company,Role,Posted\nAcme,Eng,5d\n")
            .create_async()
            .await;

        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker.clone());
        let site = download_site(format!("{}/export.csv", server.url()));

        // Date filter empties the frame, but the top row was still seen.
        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_none());
        assert!(tracker.has(&site.url));
    }

    #[tokio::test]
    async fn fetch_failure_returns_none() {
        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker);
        let site = download_site("http://127.0.0.1:1/export.csv".into());
        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_none());
    }

    #[tokio::test]
    async fn empty_extraction_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export.csv")
            .with_body("Other,Headers\n")
            .create_async()
            .await;

        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker);
        let site = download_site(format!("{}/export.csv", server.url()));
        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_none());
    }

    #[tokio::test]
    async fn no_selectors_returns_none() {
        let tracker = Arc::new(ChangeTracker::new());
        let parser = csv_parser(tracker);
        let mut site = download_site("https://x.test/export.csv".into());
        site.selectors.clear();
        assert!(parser.parse(&site, &ResolvedFilters::default()).await.is_none());
    }
}
