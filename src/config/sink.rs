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

use crate::config::ConfigError;

pub const ENV_TOKEN: &str = "NOTION_KEY";
pub const ENV_DATABASE_ID: &str = "DATABASE_ID";
pub const ENV_DATA_SOURCE_ID: &str = "DATA_SOURCE_ID";
pub const ENV_HIREBASE_API_KEY: &str = "HIREBASE_API_KEY";

const DEFAULT_API_BASE: &str = "https://api.notion.com";

/// Credentials and identifiers for the downstream document database,
/// plus the optional JSON-API key.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Base url of the sink API. Overridable for tests.
    pub api_base: String,
    pub token: String,
    pub database_id: String,
    pub data_source_id: String,
    pub hirebase_api_key: Option<String>,
}

impl SinkConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        Ok(Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: required(ENV_TOKEN)?,
            database_id: required(ENV_DATABASE_ID)?,
            data_source_id: required(ENV_DATA_SOURCE_ID)?,
            hirebase_api_key: std::env::var(ENV_HIREBASE_API_KEY)
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }

    pub fn pages_endpoint(&self) -> String {
        format!("{}/v1/pages", self.api_base)
    }

    pub fn page_endpoint(&self, page_id: &str) -> String {
        format!("{}/v1/pages/{page_id}", self.api_base)
    }

    pub fn query_endpoint(&self) -> String {
        format!(
            "{}/v1/data_sources/{}/query",
            self.api_base, self.data_source_id
        )
    }

    #[cfg(test)]
    pub fn block_children_endpoint(&self, block_id: &str) -> String {
        format!("{}/v1/blocks/{block_id}/children", self.api_base)
    }

    #[cfg(test)]
    pub fn for_tests(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token: "secret".to_string(),
            database_id: "db-id".to_string(),
            data_source_id: "ds-id".to_string(),
            hirebase_api_key: Some("api-key".to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoints_are_versioned() {
        let config = SinkConfig::for_tests("https://api.notion.test");
        assert_eq!(config.pages_endpoint(), "https://api.notion.test/v1/pages");
        assert_eq!(
            config.page_endpoint("abc"),
            "https://api.notion.test/v1/pages/abc"
        );
        assert_eq!(
            config.query_endpoint(),
            "https://api.notion.test/v1/data_sources/ds-id/query"
        );
        assert_eq!(
            config.block_children_endpoint("blk"),
            "https://api.notion.test/v1/blocks/blk/children"
        );
    }
}
