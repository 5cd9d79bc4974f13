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

use crate::data::{Frame, LogicalField};
use crate::processing::{Applicability, ProcessingContext, ProcessingError, Processor};

/// The comma variants the sink's option names cannot contain.
const COMMA_VARIANTS: [char; 3] = [',', '，', '、'];

/// Replaces every comma variant with `" -"`. The sink stores these
/// fields as multi-select options, where a comma would split the value.
pub fn normalize_commas(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for ch in text.chars() {
        if COMMA_VARIANTS.contains(&ch) {
            normalized.push_str(" -");
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

/// Normalizes the `position` column; frames without one pass through.
pub struct PositionNormalization {
    applicability: Applicability,
}

impl PositionNormalization {
    pub fn new() -> Self {
        Self {
            applicability: Applicability::all(),
        }
    }

    #[allow(dead_code)]
    pub fn with_applicability(applicability: Applicability) -> Self {
        Self { applicability }
    }
}

impl Default for PositionNormalization {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for PositionNormalization {
    fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    fn process(
        &self,
        mut frame: Frame,
        _ctx: &ProcessingContext<'_>,
    ) -> Result<Frame, ProcessingError> {
        if let Some(column) = frame.column_mut(LogicalField::Position) {
            for cell in column.iter_mut() {
                if let Some(value) = cell {
                    *cell = Some(normalize_commas(value));
                }
            }
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, ParserKind, ResolvedFilters, SiteConfig};
    use crate::data::test_support::frame;
    use crate::data::LogicalField::*;
    use indexmap::IndexMap;
    use std::time::Duration;

    fn run(input: Frame) -> Frame {
        let site = SiteConfig {
            site_id: "pn".into(),
            url: "https://x.test/jobs".into(),
            parser_kind: ParserKind::Static,
            base_url: Some("https://x.test".into()),
            robots_url: None,
            accept: None,
            date_format: DateFormat::Relative("{n}d".into()),
            selectors: IndexMap::new(),
            cadence: Duration::from_secs(60),
            queries: None,
        };
        let filters = ResolvedFilters::default();
        let ctx = ProcessingContext {
            site: &site,
            filters: &filters,
            parser_tag: "STATIC_PARSER",
        };
        PositionNormalization::new().process(input, &ctx).unwrap()
    }

    #[test]
    fn replaces_all_three_comma_variants() {
        assert_eq!(normalize_commas("a,b，c、d"), "a -b -c -d");
    }

    #[test]
    fn normalizes_the_position_column_only() {
        let input = frame(vec![
            (CompanyName, vec!["Acme, Inc"]),
            (Position, vec!["Engineer, Backend"]),
        ]);
        let out = run(input);
        assert_eq!(out.row(0).get(Position), Some("Engineer - Backend"));
        assert_eq!(out.row(0).get(CompanyName), Some("Acme, Inc"));
    }

    #[test]
    fn missing_position_column_passes_through() {
        let input = frame(vec![(CompanyName, vec!["Acme"])]);
        let out = run(input.clone());
        assert_eq!(out, input);
    }
}
