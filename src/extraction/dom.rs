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

use crate::config::SiteConfig;
use crate::data::{LogicalField, RawExtraction};
use crate::extraction::ExtractionError;
use crate::fetching::Payload;
use chromiumoxide::Page;

/// Extracts logical fields from the live DOM of a rendered page, with
/// the same selection semantics as the static HTML extractor.
///
/// A failing selector records an empty column so the other fields still
/// emit. The payload's browser lease is released when the payload drops
/// at the end of extraction, whatever the outcome.
#[derive(Debug, Default)]
pub struct DomExtractor;

impl DomExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(
        &self,
        payload: Payload,
        site: &SiteConfig,
    ) -> Result<RawExtraction, ExtractionError> {
        let Payload::Dom { lease, page } = payload else {
            return Err(ExtractionError::WrongPayload);
        };
        log::info!("{} --- extracting {} selectors from dom", site.url, site.selectors.len());

        let mut extracted = RawExtraction::new();
        for (field, selector) in &site.selectors {
            let values = match select_column(&page, *field, selector).await {
                Ok(values) => values,
                Err(error) => {
                    log::warn!("{} --- selector {selector:?} failed: {error}", site.url);
                    Vec::new()
                }
            };
            extracted.insert(*field, values);
            tokio::task::yield_now().await;
        }

        let _ = page.close().await;
        drop(lease);
        Ok(extracted)
    }
}

async fn select_column(
    page: &Page,
    field: LogicalField,
    selector: &str,
) -> Result<Vec<String>, chromiumoxide::error::CdpError> {
    let elements = page.find_elements(selector).await?;
    let mut values = Vec::with_capacity(elements.len());

    for element in elements {
        if field == LogicalField::ApplicationLink {
            let href = element.attribute("href").await?;
            match href {
                Some(href) if !href.is_empty() => values.push(href),
                _ => values.push(inner_text(&element).await?),
            }
        } else {
            let text = inner_text(&element).await?;
            if !text.is_empty() {
                values.push(text);
            }
        }
    }
    Ok(values)
}

async fn inner_text(
    element: &chromiumoxide::Element,
) -> Result<String, chromiumoxide::error::CdpError> {
    Ok(element
        .inner_text()
        .await?
        .map(|text| text.trim().to_string())
        .unwrap_or_default())
}
