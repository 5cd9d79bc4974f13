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

use crate::client::HttpClient;
use crate::config::SinkConfig;
use crate::sink::SinkRecord;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const NOTION_VERSION: &str = "2025-09-03";

/// Query pages per request.
const QUERY_PAGE_SIZE: usize = 100;
/// Keeps paginated queries under the sink's 3-requests-per-second cap.
const QUERY_SPACING: Duration = Duration::from_millis(350);

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// What happened to one write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteOutcome {
    Created,
    /// The sink reported a conflict; the record should be re-published.
    Conflict,
    /// Logged and dropped; the stream must not block on one record.
    Dropped,
}

/// The wire client for the downstream document database.
#[derive(Debug)]
pub struct NotionClient {
    client: HttpClient,
    config: SinkConfig,
}

impl NotionClient {
    pub fn new(client: HttpClient, config: SinkConfig) -> Self {
        Self { client, config }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// POSTs one record. Never fails the stream: conflicts are reported
    /// for re-publishing, everything else is logged and dropped.
    pub async fn create_page(&self, record: &SinkRecord) -> WriteOutcome {
        let body = record.to_body(&self.config.database_id);
        let response = self
            .authed(self.client.post(&self.config.pages_endpoint()))
            .json(&body)
            .send()
            .await;

        match response {
            Ok(response) => match response.status() {
                StatusCode::OK | StatusCode::CREATED => WriteOutcome::Created,
                StatusCode::CONFLICT => {
                    log::info!("sink conflict for {:?}, re-publishing", record.company_name);
                    WriteOutcome::Conflict
                }
                status => {
                    let detail = response.text().await.unwrap_or_default();
                    log::error!(
                        "sink rejected {:?} with {status}: {detail}",
                        record.company_name
                    );
                    WriteOutcome::Dropped
                }
            },
            Err(error) => {
                log::error!("sink write failed for {:?}: {error}", record.company_name);
                WriteOutcome::Dropped
            }
        }
    }

    /// All records, following cursors until `has_more` is false.
    pub async fn query_all(&self) -> Result<Vec<Value>, SinkError> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }
            let page: Value = self
                .authed(self.client.post(&self.config.query_endpoint()))
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if let Some(batch) = page.get("results").and_then(Value::as_array) {
                results.extend(batch.iter().cloned());
            }
            if !page.get("has_more").and_then(Value::as_bool).unwrap_or(false) {
                break;
            }
            cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
            tokio::time::sleep(QUERY_SPACING).await;
        }
        Ok(results)
    }

    /// Archives (deletes) a record.
    pub async fn archive_page(&self, page_id: &str) -> Result<(), SinkError> {
        self.authed(self.client.patch(&self.config.page_endpoint(page_id)))
            .json(&json!({ "archived": true }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// The concatenated paragraph text of a page's children.
    #[cfg(test)]
    pub async fn read_description(&self, page_id: &str) -> Result<Option<String>, SinkError> {
        let children: Value = self
            .authed(
                self.client
                    .get(&self.config.block_children_endpoint(page_id)),
            )
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = children
            .get("results")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| {
                        block["paragraph"]["rich_text"][0]["text"]["content"].as_str()
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty());
        Ok(text)
    }
}
