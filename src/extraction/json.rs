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
use crate::data::RawExtraction;
use crate::extraction::ExtractionError;
use crate::fetching::Payload;
use itertools::Itertools;
use serde_json::Value;

/// The list each API response carries its postings under.
const JOBS_KEY: &str = "jobs";

/// Extracts logical fields from API response documents: every job in
/// every response contributes one row, each field plucked by dotted
/// path. Columns always come out equal length.
#[derive(Debug, Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        payload: Payload,
        site: &SiteConfig,
    ) -> Result<RawExtraction, ExtractionError> {
        let Payload::Json(documents) = payload else {
            return Err(ExtractionError::WrongPayload);
        };

        let mut extracted: RawExtraction = site
            .selectors
            .keys()
            .map(|field| (*field, Vec::new()))
            .collect();

        let mut jobs = 0usize;
        for document in &documents {
            let Some(list) = document.get(JOBS_KEY).and_then(Value::as_array) else {
                continue;
            };
            for job in list {
                jobs += 1;
                for (field, path) in &site.selectors {
                    let value = pluck(job, path).map(flatten).unwrap_or_default();
                    extracted
                        .get_mut(field)
                        .expect("column preallocated for every selector")
                        .push(value);
                }
            }
        }

        log::info!(
            "{} --- extracted {jobs} jobs from {} documents",
            site.url,
            documents.len()
        );
        Ok(extracted)
    }
}

/// Walks a dotted path, with integer steps indexing arrays.
fn pluck<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for step in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(step)?,
            Value::Array(list) => list.get(step.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Flattens a structured value to a cell string: lists comma-joined,
/// objects `k: v` newline-joined, null empty.
fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(list) => list.iter().map(flatten).join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {}", flatten(value)))
            .join("\n"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, ParserKind};
    use crate::data::LogicalField::*;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::time::Duration;

    fn site(selectors: Vec<(crate::data::LogicalField, &str)>) -> SiteConfig {
        SiteConfig {
            site_id: "api".into(),
            url: "https://api.x.test/search".into(),
            parser_kind: ParserKind::HireBase,
            base_url: None,
            robots_url: None,
            accept: None,
            date_format: DateFormat::Relative("{n}d".into()),
            selectors: selectors
                .into_iter()
                .map(|(f, s)| (f, s.to_string()))
                .collect::<IndexMap<_, _>>(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    #[test]
    fn plucks_dotted_paths_across_documents() {
        let docs = vec![
            json!({"jobs": [
                {"title": "Engineer", "company": {"name": "Acme"}},
                {"title": "Analyst", "company": {"name": "Globex"}},
            ]}),
            json!({"jobs": [
                {"title": "Operator", "company": {"name": "Initech"}},
            ]}),
        ];
        let site = site(vec![(CompanyName, "company.name"), (Position, "title")]);
        let extracted = JsonExtractor::new()
            .extract(Payload::Json(docs), &site)
            .unwrap();

        assert_eq!(extracted[&CompanyName], vec!["Acme", "Globex", "Initech"]);
        assert_eq!(extracted[&Position], vec!["Engineer", "Analyst", "Operator"]);
    }

    #[test]
    fn integer_steps_index_arrays() {
        let docs = vec![json!({"jobs": [
            {"locations": [{"city": "Berlin"}, {"city": "Paris"}]}
        ]})];
        let site = site(vec![(CompanySize, "locations.1.city")]);
        let extracted = JsonExtractor::new()
            .extract(Payload::Json(docs), &site)
            .unwrap();
        assert_eq!(extracted[&CompanySize], vec!["Paris"]);
    }

    #[test]
    fn structured_values_are_flattened() {
        let docs = vec![json!({"jobs": [{
            "tags": ["remote", "junior"],
            "salary": {"min": 50000, "max": 70000},
            "note": null,
        }]})];
        let site = site(vec![
            (Position, "tags"),
            (Description, "salary"),
            (CompanySize, "note"),
        ]);
        let extracted = JsonExtractor::new()
            .extract(Payload::Json(docs), &site)
            .unwrap();
        assert_eq!(extracted[&Position], vec!["remote, junior"]);
        assert_eq!(extracted[&Description], vec!["min: 50000\nmax: 70000"]);
        assert_eq!(extracted[&CompanySize], vec![""]);
    }

    #[test]
    fn missing_paths_become_empty_cells_of_equal_length() {
        let docs = vec![json!({"jobs": [
            {"title": "Engineer"},
            {"title": "Analyst", "company": {"name": "Globex"}},
        ]})];
        let site = site(vec![(CompanyName, "company.name"), (Position, "title")]);
        let extracted = JsonExtractor::new()
            .extract(Payload::Json(docs), &site)
            .unwrap();
        assert_eq!(extracted[&CompanyName], vec!["", "Globex"]);
        assert_eq!(extracted[&Position].len(), extracted[&CompanyName].len());
    }

    #[test]
    fn documents_without_jobs_are_skipped() {
        let docs = vec![json!({"error": "quota"}), json!({"jobs": []})];
        let site = site(vec![(Position, "title")]);
        let extracted = JsonExtractor::new()
            .extract(Payload::Json(docs), &site)
            .unwrap();
        assert!(extracted[&Position].is_empty());
    }
}
