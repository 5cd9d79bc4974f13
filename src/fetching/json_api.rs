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
use crate::config::{QuerySet, SiteConfig};
use crate::fetching::Payload;
use serde_json::{json, Value};
use std::time::Duration;
use time::format_description::well_known::Iso8601;
use time::OffsetDateTime;

/// Minimum spacing between API queries.
const QUERY_SPACING: Duration = Duration::from_secs(1);

/// Fetches a vendor JSON API: one POST per configured query, collecting
/// the successful response documents. Individual failures are logged and
/// skipped; the query set is capped to the vendor's daily allowance.
#[derive(Debug)]
pub struct JsonApiFetcher {
    client: HttpClient,
    api_key: Option<String>,
}

impl JsonApiFetcher {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    pub async fn fetch(&self, site: &SiteConfig) -> Option<Payload> {
        let Some(query_set) = &site.queries else {
            log::warn!("{} --- no query set configured", site.url);
            return None;
        };

        let payloads = build_payloads(query_set);
        if payloads.is_empty() {
            log::warn!("{} --- no queries to send", site.url);
            return None;
        }

        let total = payloads.len();
        log::info!("{} --- starting fetch of {total} queries", site.url);

        let mut responses = Vec::new();
        for (index, payload) in payloads.into_iter().enumerate() {
            let query_name = payload
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            log::info!(
                "{} --- query {}/{total} ['{query_name}']",
                site.url,
                index + 1
            );

            match self.fetch_single(&site.url, &payload).await {
                Ok(document) => responses.push(document),
                Err(error) => {
                    log::error!("{} --- query '{query_name}' failed: {error}", site.url)
                }
            }

            if index + 1 < total {
                tokio::time::sleep(QUERY_SPACING).await;
            }
        }

        log::info!(
            "{} --- finished, success {}/{total}",
            site.url,
            responses.len()
        );
        if responses.is_empty() {
            return None;
        }
        Some(Payload::Json(responses))
    }

    async fn fetch_single(&self, url: &str, payload: &Value) -> Result<Value, reqwest::Error> {
        let mut request = self.client.post(url).json(payload);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        request
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

/// One payload per query: the configured defaults plus the query string
/// (type + postfix) and the posted-since date. Truncated to the daily
/// cap; the vendor bans beyond its allowance.
fn build_payloads(query_set: &QuerySet) -> Vec<Value> {
    let mut queries: &[String] = &query_set.queries;
    if queries.len() > query_set.daily_cap {
        log::warn!(
            "{} job types configured but only {} queries allowed per day, truncating",
            queries.len(),
            query_set.daily_cap
        );
        queries = &queries[..query_set.daily_cap];
    }

    let date_posted = (OffsetDateTime::now_utc() - time::Duration::days(query_set.days_ago))
        .date()
        .format(&Iso8601::DATE)
        .unwrap_or_default();

    queries
        .iter()
        .map(|job_query| {
            let mut payload = Value::Object(query_set.defaults.clone());
            let query = format!("{job_query} {}", query_set.query_postfix)
                .trim()
                .to_string();
            payload["query"] = json!(query);
            payload["date_posted"] = json!(date_posted);
            payload
        })
        .collect()
}
