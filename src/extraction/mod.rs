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

mod csv;
mod dom;
mod html;
mod json;

pub use csv::CsvExtractor;
pub use dom::DomExtractor;
pub use html::HtmlExtractor;
pub use json::JsonExtractor;

use crate::config::SiteConfig;
use crate::data::RawExtraction;
use crate::fetching::Payload;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("csv could not be parsed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("invalid css selector {0:?}")]
    Selector(String),
    #[error("extractor got a payload it cannot handle")]
    WrongPayload,
}

/// The closed set of extractors. Each consumes a fetcher payload and
/// produces column-oriented records keyed by logical field.
#[derive(Debug)]
pub enum Extractor {
    Csv(CsvExtractor),
    Html(HtmlExtractor),
    Dom(DomExtractor),
    Json(JsonExtractor),
}

impl Extractor {
    pub async fn extract(
        &self,
        payload: Payload,
        site: &SiteConfig,
    ) -> Result<RawExtraction, ExtractionError> {
        match self {
            Extractor::Csv(extractor) => extractor.extract(payload, site),
            Extractor::Html(extractor) => extractor.extract(payload, site),
            Extractor::Dom(extractor) => extractor.extract(payload, site).await,
            Extractor::Json(extractor) => extractor.extract(payload, site),
        }
    }
}
