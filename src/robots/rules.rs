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

use std::time::Duration;

/// Minimum wait between fetches of one site, also the default when a
/// robots.txt sets none.
pub const DEFAULT_CRAWL_DELAY: Duration = Duration::from_secs(1);

/// The verdict of the robots advisor for one request url. Immutable once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRules {
    pub can_fetch: bool,
    pub crawl_delay: Duration,
    pub user_agent: String,
}

impl RobotsRules {
    /// The fail-closed default: deny, rather than risk fetching a site
    /// whose policy could not be read.
    pub fn conservative(user_agent: &str) -> Self {
        Self {
            can_fetch: false,
            crawl_delay: DEFAULT_CRAWL_DELAY,
            user_agent: user_agent.to_string(),
        }
    }
}
