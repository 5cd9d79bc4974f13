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

use crate::data::{LogicalField, Row};
use crate::processing::normalize_commas;
use serde_json::{json, Value};
use url::Url;

/// Rich text and url properties cap out at 2000 characters.
const MAX_TEXT_LEN: usize = 2000;
/// Multi-select option names cap out at 100 characters.
const MAX_OPTION_LEN: usize = 100;

/// One row shaped for the sink, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub company_name: String,
    pub position: String,
    pub application_link: Option<String>,
    pub description: Option<String>,
    pub company_size: Option<String>,
}

impl SinkRecord {
    /// Validates a row into a record. `None` when `company_name` or
    /// `position` is missing or shorter than two characters; such rows
    /// never reach the sink.
    pub fn from_row(row: &Row) -> Option<Self> {
        let company_name = row.get(LogicalField::CompanyName)?;
        let position = row.get(LogicalField::Position)?;
        if company_name.chars().count() < 2 || position.chars().count() < 2 {
            return None;
        }
        Some(Self {
            company_name: company_name.to_string(),
            position: position.to_string(),
            application_link: row.get(LogicalField::ApplicationLink).map(str::to_string),
            description: row.get(LogicalField::Description).map(str::to_string),
            company_size: row.get(LogicalField::CompanySize).map(str::to_string),
        })
    }

    /// The create-page request body.
    ///
    /// Field caps follow the sink's limits: the title and any url at
    /// 2000 characters, option names at 100. Over-length links are
    /// replaced by their origin; the description is split into 2000
    /// character paragraph blocks, dropping blank chunks.
    pub fn to_body(&self, database_id: &str) -> Value {
        let mut body = json!({
            "parent": { "database_id": database_id },
            "properties": {
                "Company Name": {
                    "title": [{ "type": "text", "text": { "content": truncate_chars(&self.company_name, MAX_TEXT_LEN) } }],
                },
                "Position": {
                    "multi_select": [{ "name": truncate_chars(&normalize_commas(&self.position), MAX_OPTION_LEN) }],
                },
                "Status": { "status": { "name": "Pending" } },
            },
        });

        if let Some(description) = &self.description {
            let children = description_blocks(description);
            if !children.is_empty() {
                body["children"] = Value::Array(children);
            }
        }

        if let Some(company_size) = &self.company_size {
            body["properties"]["Company Size"] = json!({
                "multi_select": [{ "name": truncate_chars(&normalize_commas(company_size), MAX_OPTION_LEN) }],
            });
        }

        if let Some(link) = &self.application_link {
            body["properties"]["Application Link"] = json!({ "url": capped_link(link) });
        }

        body
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Splits the description into paragraph blocks of at most
/// [`MAX_TEXT_LEN`] characters, dropping chunks that are blank after
/// stripping.
fn description_blocks(description: &str) -> Vec<Value> {
    let chars: Vec<char> = description.chars().collect();
    chars
        .chunks(MAX_TEXT_LEN)
        .map(|chunk| chunk.iter().collect::<String>())
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{ "type": "text", "text": { "content": chunk } }],
                },
            })
        })
        .collect()
}

/// A link the sink accepts: unchanged under the cap, otherwise reduced
/// to its origin, or null when no origin can be derived.
fn capped_link(link: &str) -> Value {
    if link.chars().count() <= MAX_TEXT_LEN {
        return json!(link);
    }
    match Url::parse(link) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => {
                let origin = match parsed.port() {
                    Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
                    None => format!("{}://{host}", parsed.scheme()),
                };
                json!(origin)
            }
            None => Value::Null,
        },
        Err(_) => Value::Null,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::test_support::frame;
    use crate::data::LogicalField::*;

    fn record() -> SinkRecord {
        SinkRecord {
            company_name: "Acme".into(),
            position: "Engineer".into(),
            application_link: Some("https://acme.test/apply".into()),
            description: Some("Job description".into()),
            company_size: Some("100+".into()),
        }
    }

    #[test]
    fn body_carries_all_properties() {
        let body = record().to_body("db-id");
        assert_eq!(body["parent"]["database_id"], "db-id");
        assert_eq!(
            body["properties"]["Company Name"]["title"][0]["text"]["content"],
            "Acme"
        );
        assert_eq!(
            body["properties"]["Position"]["multi_select"][0]["name"],
            "Engineer"
        );
        assert_eq!(body["properties"]["Status"]["status"]["name"], "Pending");
        assert_eq!(
            body["properties"]["Application Link"]["url"],
            "https://acme.test/apply"
        );
        assert_eq!(
            body["properties"]["Company Size"]["multi_select"][0]["name"],
            "100+"
        );
        assert_eq!(
            body["children"][0]["paragraph"]["rich_text"][0]["text"]["content"],
            "Job description"
        );
    }

    #[test]
    fn missing_description_omits_children() {
        let mut record = record();
        record.description = None;
        let body = record.to_body("db-id");
        assert!(body.get("children").is_none());
    }

    #[test]
    fn blank_description_omits_children() {
        let mut record = record();
        record.description = Some("   \n  ".into());
        let body = record.to_body("db-id");
        assert!(body.get("children").is_none());
    }

    #[test]
    fn long_description_chunks_at_2000_chars() {
        let mut record = record();
        record.description = Some("x".repeat(4100));
        let body = record.to_body("db-id");
        let children = body["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        for child in children {
            let content = child["paragraph"]["rich_text"][0]["text"]["content"]
                .as_str()
                .unwrap();
            assert!(content.chars().count() <= 2000);
            assert!(!content.trim().is_empty());
        }
    }

    #[test]
    fn over_long_link_is_reduced_to_its_origin() {
        let mut record = record();
        record.application_link =
            Some(format!("https://acme.test/apply?token={}", "t".repeat(2100)));
        let body = record.to_body("db-id");
        assert_eq!(body["properties"]["Application Link"]["url"], "https://acme.test");
    }

    #[test]
    fn over_long_unparseable_link_becomes_null() {
        let mut record = record();
        record.application_link = Some("x".repeat(2100));
        let body = record.to_body("db-id");
        assert_eq!(body["properties"]["Application Link"]["url"], Value::Null);
    }

    #[test]
    fn commas_in_options_are_normalized() {
        let mut record = record();
        record.position = "Engineer, Backend".into();
        record.company_size = Some("1，000、000".into());
        let body = record.to_body("db-id");
        assert_eq!(
            body["properties"]["Position"]["multi_select"][0]["name"],
            "Engineer - Backend"
        );
        assert_eq!(
            body["properties"]["Company Size"]["multi_select"][0]["name"],
            "1 -000 -000"
        );
    }

    #[test]
    fn titles_and_options_are_truncated() {
        let mut record = record();
        record.company_name = "c".repeat(2500);
        record.position = "p".repeat(250);
        let body = record.to_body("db-id");
        assert_eq!(
            body["properties"]["Company Name"]["title"][0]["text"]["content"]
                .as_str()
                .unwrap()
                .chars()
                .count(),
            2000
        );
        assert_eq!(
            body["properties"]["Position"]["multi_select"][0]["name"]
                .as_str()
                .unwrap()
                .chars()
                .count(),
            100
        );
    }

    #[test]
    fn rows_missing_required_fields_are_rejected() {
        let valid = frame(vec![(CompanyName, vec!["Acme"]), (Position, vec!["Eng"])]);
        assert!(SinkRecord::from_row(&valid.row(0)).is_some());

        let short_name = frame(vec![(CompanyName, vec!["A"]), (Position, vec!["Eng"])]);
        assert!(SinkRecord::from_row(&short_name.row(0)).is_none());

        let no_position = frame(vec![(CompanyName, vec!["Acme"])]);
        assert!(SinkRecord::from_row(&no_position.row(0)).is_none());
    }
}
