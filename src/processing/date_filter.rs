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

use crate::config::DateFormat;
use crate::data::{Frame, LogicalField};
use crate::processing::{Applicability, ProcessingContext, ProcessingError, Processor};
use regex::Regex;
use time::{Date, OffsetDateTime};

/// Keeps rows posted today or yesterday.
///
/// Relative formats (`--relative <template with {n}>`) extract the day
/// count from each cell and keep n ∈ {0, 1}. Absolute formats parse the
/// cell with the configured format description and compare against the
/// local calendar.
pub struct DateFilter {
    applicability: Applicability,
}

impl DateFilter {
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

impl Default for DateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for DateFilter {
    fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    fn process(
        &self,
        frame: Frame,
        ctx: &ProcessingContext<'_>,
    ) -> Result<Frame, ProcessingError> {
        if frame.is_empty() {
            return Ok(frame);
        }

        let site = &ctx.site.site_id;
        let column = frame
            .column(LogicalField::Date)
            .ok_or_else(|| ProcessingError::MissingColumn {
                site: site.clone(),
                column: LogicalField::Date,
            })?
            .to_vec();

        match &ctx.site.date_format {
            DateFormat::Relative(template) => {
                log::info!("{site} --- filtering on relative dates");
                let pattern = relative_pattern(template);
                let regex =
                    Regex::new(&pattern).map_err(|error| ProcessingError::DateFormat {
                        site: site.clone(),
                        reason: error.to_string(),
                    })?;
                let keep: Vec<bool> = column
                    .iter()
                    .map(|cell| {
                        cell.as_deref()
                            .and_then(|cell| extract_days(&regex, cell))
                            .map(|days| days <= 1)
                            .unwrap_or(false)
                    })
                    .collect();
                Ok(frame.retain_rows(|index| keep[index]))
            }
            DateFormat::Absolute(format) => {
                log::info!("{site} --- filtering on absolute dates");
                let format = time::format_description::parse_owned::<2>(format).map_err(
                    |error| ProcessingError::DateFormat {
                        site: site.clone(),
                        reason: error.to_string(),
                    },
                )?;
                let today = local_today();
                let yesterday = today.previous_day().unwrap_or(today);

                let mut keep = Vec::with_capacity(column.len());
                for cell in &column {
                    let value = cell.as_deref().unwrap_or("");
                    let date = Date::parse(value.trim(), &format).map_err(|_| {
                        ProcessingError::DateParse {
                            site: site.clone(),
                            value: value.to_string(),
                        }
                    })?;
                    keep.push(date == today || date == yesterday);
                }
                Ok(frame.retain_rows(|index| keep[index]))
            }
        }
    }
}

/// Turns a relative template into a regex: literal characters are
/// escaped, the `{n}` placeholder becomes a digit capture, and spaces
/// become `\s*` so "0 days" and "0days" both match.
fn relative_pattern(template: &str) -> String {
    let escaped = regex::escape(template)
        .replace(r"\{n\}", r"(\d+)")
        .replace(' ', r"\s*");
    format!("(?i){escaped}")
}

fn extract_days(regex: &Regex, cell: &str) -> Option<i64> {
    regex
        .captures(cell.trim())
        .and_then(|captures| captures.get(1))
        .and_then(|group| group.as_str().parse().ok())
}

/// Today in the local zone, falling back to UTC when the local offset
/// cannot be determined.
fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{ParserKind, ResolvedFilters, SiteConfig};
    use crate::data::test_support::frame;
    use crate::data::LogicalField::*;
    use indexmap::IndexMap;
    use std::time::Duration;
    use time::macros::format_description;

    fn site(date_format: DateFormat) -> SiteConfig {
        SiteConfig {
            site_id: "df".into(),
            url: "https://x.test/jobs".into(),
            parser_kind: ParserKind::Static,
            base_url: Some("https://x.test".into()),
            robots_url: None,
            accept: None,
            date_format,
            selectors: IndexMap::new(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    fn run(date_format: DateFormat, input: Frame) -> Result<Frame, ProcessingError> {
        let site = site(date_format);
        let filters = ResolvedFilters::default();
        let ctx = ProcessingContext {
            site: &site,
            filters: &filters,
            parser_tag: "STATIC_PARSER",
        };
        DateFilter::new().process(input, &ctx)
    }

    #[test]
    fn relative_keeps_today_and_yesterday() {
        let input = frame(vec![
            (CompanyName, vec!["a", "b", "c", "d"]),
            (Date, vec!["0 days ago", "1 day ago", "2 days ago", "14 days ago"]),
        ]);
        let out = run(DateFormat::Relative("{n} days ago".into()), input).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.row(1).get(CompanyName), Some("b"));
    }

    #[test]
    fn relative_matches_loosely_on_spacing_and_case() {
        let input = frame(vec![
            (CompanyName, vec!["a", "b"]),
            (Date, vec!["  0DAYS AGO ", "Posted"]),
        ]);
        let out = run(DateFormat::Relative("{n} days ago".into()), input).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.row(0).get(CompanyName), Some("a"));
    }

    #[test]
    fn relative_template_with_punctuation_is_escaped() {
        let input = frame(vec![
            (CompanyName, vec!["a", "b"]),
            (Date, vec!["(1d)", "(3d)"]),
        ]);
        let out = run(DateFormat::Relative("({n}d)".into()), input).unwrap();
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn absolute_keeps_today_and_yesterday() {
        let format = format_description!("[year]-[month]-[day]");
        let today = local_today();
        let yesterday = today.previous_day().unwrap();
        let old = today - time::Duration::days(30);

        let input = frame(vec![
            (CompanyName, vec!["a", "b", "c"]),
            (
                Date,
                vec![
                    &today.format(&format).unwrap(),
                    &yesterday.format(&format).unwrap(),
                    &old.format(&format).unwrap(),
                ],
            ),
        ]);
        let out = run(DateFormat::Absolute("[year]-[month]-[day]".into()), input).unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn missing_date_column_fails() {
        let input = frame(vec![(CompanyName, vec!["a"])]);
        assert!(matches!(
            run(DateFormat::Relative("{n}d".into()), input),
            Err(ProcessingError::MissingColumn { column: Date, .. })
        ));
    }

    #[test]
    fn unparseable_absolute_date_fails() {
        let input = frame(vec![
            (CompanyName, vec!["a"]),
            (Date, vec!["not a date"]),
        ]);
        assert!(matches!(
            run(DateFormat::Absolute("[year]-[month]-[day]".into()), input),
            Err(ProcessingError::DateParse { .. })
        ));
    }
}
