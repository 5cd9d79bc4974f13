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

use crate::data::Frame;
use crate::processing::{Applicability, ProcessingContext, ProcessingError, Processor};

/// Applies the resolved filter lists: first `ignore` (drop rows whose
/// column contains a listed term), then `scrub` (null out listed
/// literals and forward-fill, propagating the last seen value down
/// grouped rows).
pub struct FilterProcessor {
    applicability: Applicability,
}

impl FilterProcessor {
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

impl Default for FilterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for FilterProcessor {
    fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    fn process(
        &self,
        mut frame: Frame,
        ctx: &ProcessingContext<'_>,
    ) -> Result<Frame, ProcessingError> {
        if frame.is_empty() || ctx.filters.is_empty() {
            return Ok(frame);
        }

        for (field, terms) in &ctx.filters.ignore {
            if !frame.has_column(*field) || terms.is_empty() {
                continue;
            }
            log::info!("{} --- dropping rows by {field} ignore list", ctx.site.site_id);
            let column = frame.column(*field).map(<[_]>::to_vec).unwrap_or_default();
            frame = frame.retain_rows(|index| {
                let Some(cell) = column[index].as_deref() else {
                    return true;
                };
                let lowered = cell.to_lowercase();
                !terms.iter().any(|term| lowered.contains(term))
            });
            if frame.is_empty() {
                return Ok(frame);
            }
        }

        for (field, terms) in &ctx.filters.scrub {
            let Some(column) = frame.column_mut(*field) else {
                continue;
            };
            if terms.is_empty() {
                continue;
            }
            log::info!("{} --- scrubbing {field} and forward-filling", ctx.site.site_id);
            let mut last_seen: Option<String> = None;
            for cell in column.iter_mut() {
                let scrubbed = cell
                    .as_deref()
                    .map(|value| terms.contains(&value.trim().to_lowercase()))
                    .unwrap_or(false);
                if scrubbed {
                    *cell = None;
                }
                match cell {
                    Some(value) => last_seen = Some(value.clone()),
                    None => *cell = last_seen.clone(),
                }
            }
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, FiltersConfig, ParserKind, ResolvedFilters, SiteConfig};
    use crate::data::test_support::frame;
    use crate::data::LogicalField::*;
    use indexmap::IndexMap;
    use std::time::Duration;

    fn site() -> SiteConfig {
        SiteConfig {
            site_id: "acme_jobs".into(),
            url: "https://x.test/jobs".into(),
            parser_kind: ParserKind::Static,
            base_url: Some("https://x.test".into()),
            robots_url: None,
            accept: None,
            date_format: DateFormat::Relative("{n}d".into()),
            selectors: IndexMap::new(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    fn resolved(yaml: &str) -> ResolvedFilters {
        let config: FiltersConfig = serde_yaml::from_str(yaml).unwrap();
        config.resolve("acme_jobs")
    }

    fn run(filters: &ResolvedFilters, input: Frame) -> Frame {
        let site = site();
        let ctx = ProcessingContext {
            site: &site,
            filters,
            parser_tag: "STATIC_PARSER",
        };
        FilterProcessor::new().process(input, &ctx).unwrap()
    }

    #[test]
    fn ignore_drops_case_insensitive_substring_matches() {
        let filters = resolved("general:\n  ignore:\n    position: [senior]\n");
        let input = frame(vec![
            (CompanyName, vec!["a", "b", "c"]),
            (Position, vec!["Senior Engineer", "engineer", "SENIOR analyst"]),
        ]);
        let out = run(&filters, input);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.row(0).get(Position), Some("engineer"));
    }

    #[test]
    fn scrub_nulls_and_forward_fills() {
        let filters = resolved("general:\n  scrub:\n    company_name: [\"↳\"]\n");
        let input = frame(vec![
            (CompanyName, vec!["Acme", "↳", "↳", "Globex"]),
            (Position, vec!["Eng", "Ops", "QA", "Eng"]),
        ]);
        let out = run(&filters, input);
        assert_eq!(out.row_count(), 4);
        assert_eq!(out.row(1).get(CompanyName), Some("Acme"));
        assert_eq!(out.row(2).get(CompanyName), Some("Acme"));
        assert_eq!(out.row(3).get(CompanyName), Some("Globex"));
    }

    #[test]
    fn scrub_before_any_value_leaves_null() {
        let filters = resolved("general:\n  scrub:\n    company_name: [\"↳\"]\n");
        let input = frame(vec![(CompanyName, vec!["↳", "Acme"])]);
        let out = run(&filters, input);
        assert_eq!(out.row(0).get(CompanyName), None);
        assert_eq!(out.row(1).get(CompanyName), Some("Acme"));
    }

    #[test]
    fn missing_columns_are_ignored() {
        let filters = resolved(
            "general:\n  ignore:\n    company_size: [unknown]\n  scrub:\n    description: [n/a]\n",
        );
        let input = frame(vec![(CompanyName, vec!["a"])]);
        let out = run(&filters, input);
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn empty_filter_lists_pass_through() {
        let input = frame(vec![(CompanyName, vec!["a"])]);
        let out = run(&ResolvedFilters::default(), input.clone());
        assert_eq!(out, input);
    }
}
