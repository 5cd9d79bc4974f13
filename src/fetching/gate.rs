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
use crate::robots::RobotsAdvisor;

/// Asks the advisor whether `site` may be fetched and, if so, waits out
/// the crawl delay. `false` means skip this cycle.
pub(super) async fn respect_robots(
    site: &SiteConfig,
    user_agent: &str,
    advisor: &RobotsAdvisor,
) -> bool {
    let robots_txt_url = site.robots_txt_url();
    let rules = advisor
        .get_rules(&site.url, robots_txt_url.as_deref(), user_agent)
        .await;

    if !rules.can_fetch {
        log::warn!("robots.txt disallows fetching: {}", site.url);
        return false;
    }

    tokio::time::sleep(rules.crawl_delay).await;
    true
}
