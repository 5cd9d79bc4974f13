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
use scraper::{Html, Selector};

/// CSS-selects logical fields out of static HTML. `application_link`
/// prefers the element's href and falls back to its trimmed text; other
/// fields use the trimmed text. Selectors matching nothing are skipped.
#[derive(Debug, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        payload: Payload,
        site: &SiteConfig,
    ) -> Result<RawExtraction, ExtractionError> {
        let Payload::Text(content) = payload else {
            return Err(ExtractionError::WrongPayload);
        };
        log::info!("{} --- extracting {} selectors from html", site.url, site.selectors.len());

        let document = Html::parse_document(&content);
        let mut extracted = RawExtraction::new();

        for (field, selector) in &site.selectors {
            let selector = Selector::parse(selector)
                .map_err(|_| ExtractionError::Selector(selector.clone()))?;
            let elements: Vec<_> = document.select(&selector).collect();
            if elements.is_empty() {
                continue;
            }

            let values = elements
                .into_iter()
                .map(|element| {
                    if *field == LogicalField::ApplicationLink {
                        element
                            .value()
                            .attr("href")
                            .map(str::to_string)
                            .unwrap_or_else(|| collect_text(&element))
                    } else {
                        collect_text(&element)
                    }
                })
                .collect();
            extracted.insert(*field, values);
        }

        Ok(extracted)
    }
}

fn collect_text(element: &scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, ParserKind};
    use crate::data::LogicalField::*;
    use indexmap::IndexMap;
    use std::time::Duration;

    const PAGE: &str = r#"
<html><body>
  <div class="job">
    <span class="company"> Acme </span>
    <span class="role">Engineer</span>
    <a class="apply" href="https://acme.test/apply">Apply</a>
    <span class="posted">0 days ago</span>
  </div>
  <div class="job">
    <span class="company">Globex</span>
    <span class="role">Analyst</span>
    <a class="apply">Apply by mail</a>
    <span class="posted">1 day ago</span>
  </div>
</body></html>"#;

    fn site(selectors: Vec<(crate::data::LogicalField, &str)>) -> SiteConfig {
        SiteConfig {
            site_id: "html".into(),
            url: "https://x.test/jobs".into(),
            parser_kind: ParserKind::Static,
            base_url: Some("https://x.test".into()),
            robots_url: None,
            accept: None,
            date_format: DateFormat::Relative("{n} days ago".into()),
            selectors: selectors
                .into_iter()
                .map(|(f, s)| (f, s.to_string()))
                .collect::<IndexMap<_, _>>(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    #[test]
    fn selects_trimmed_text() {
        let site = site(vec![(CompanyName, ".company"), (Position, ".role")]);
        let extracted = HtmlExtractor::new()
            .extract(Payload::Text(PAGE.into()), &site)
            .unwrap();
        assert_eq!(extracted[&CompanyName], vec!["Acme", "Globex"]);
        assert_eq!(extracted[&Position], vec!["Engineer", "Analyst"]);
    }

    #[test]
    fn application_link_prefers_href_falls_back_to_text() {
        let site = site(vec![(ApplicationLink, "a.apply")]);
        let extracted = HtmlExtractor::new()
            .extract(Payload::Text(PAGE.into()), &site)
            .unwrap();
        assert_eq!(
            extracted[&ApplicationLink],
            vec!["https://acme.test/apply", "Apply by mail"]
        );
    }

    #[test]
    fn unmatched_selector_is_skipped() {
        let site = site(vec![(CompanyName, ".company"), (CompanySize, ".size")]);
        let extracted = HtmlExtractor::new()
            .extract(Payload::Text(PAGE.into()), &site)
            .unwrap();
        assert!(extracted.contains_key(&CompanyName));
        assert!(!extracted.contains_key(&CompanySize));
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let site = site(vec![(CompanyName, ":::nope")]);
        assert!(matches!(
            HtmlExtractor::new().extract(Payload::Text(PAGE.into()), &site),
            Err(ExtractionError::Selector(_))
        ));
    }
}
