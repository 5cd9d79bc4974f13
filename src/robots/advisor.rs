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
use crate::robots::rules::{RobotsRules, DEFAULT_CRAWL_DELAY};
use std::sync::Arc;
use std::time::Duration;
use texting_robots::Robot;
use thiserror::Error;

#[derive(Debug, Error)]
enum RobotsError {
    #[error("robots.txt request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("robots.txt could not be parsed: {0}")]
    InvalidRobotsTxt(#[from] anyhow::Error),
}

/// A cached verdict plus the robots.txt url it was parsed from, so the
/// refresher can revalidate without re-deriving it.
#[derive(Debug)]
pub(super) struct CachedVerdict {
    pub rules: RobotsRules,
    pub robots_txt_url: String,
}

/// Gates network-facing fetchers by robots.txt policy.
///
/// The cache is keyed by the request url; two urls under the same host
/// share an entry only when identical. Only allow verdicts are cached,
/// so a site that denies today is asked again next cycle.
#[derive(Debug)]
pub struct RobotsAdvisor {
    client: HttpClient,
    cache: moka::future::Cache<String, Arc<CachedVerdict>>,
}

impl RobotsAdvisor {
    pub fn new(client: HttpClient, cache_size: u64) -> Self {
        Self {
            client,
            cache: moka::future::Cache::new(cache_size),
        }
    }

    /// The rules for fetching `request_url`, consulting the cache first.
    ///
    /// Any failure to retrieve or parse the policy yields the
    /// conservative default (deny) and caches nothing.
    pub async fn get_rules(
        &self,
        request_url: &str,
        robots_txt_url: Option<&str>,
        user_agent: &str,
    ) -> RobotsRules {
        if let Some(cached) = self.cache.get(request_url).await {
            log::trace!("robots cache hit: {request_url}");
            return cached.rules.clone();
        }

        let Some(robots_txt_url) = robots_txt_url else {
            log::warn!("no robots.txt location for {request_url}, denying");
            return RobotsRules::conservative(user_agent);
        };

        match self
            .fetch_and_parse(robots_txt_url, request_url, user_agent)
            .await
        {
            Ok(rules) => {
                if rules.can_fetch {
                    self.cache
                        .insert(
                            request_url.to_string(),
                            Arc::new(CachedVerdict {
                                rules: rules.clone(),
                                robots_txt_url: robots_txt_url.to_string(),
                            }),
                        )
                        .await;
                }
                rules
            }
            Err(error) => {
                log::warn!("robots lookup failed for {request_url}: {error}");
                RobotsRules::conservative(user_agent)
            }
        }
    }

    /// Re-checks whether `request_url` is still fetchable, bypassing the
    /// cache. Used by the refresher; errors count as "no".
    pub(super) async fn revalidate(&self, verdict: &CachedVerdict, request_url: &str) -> bool {
        self.fetch_and_parse(
            &verdict.robots_txt_url,
            request_url,
            &verdict.rules.user_agent,
        )
        .await
        .map(|rules| rules.can_fetch)
        .unwrap_or(false)
    }

    pub(super) fn cache(&self) -> &moka::future::Cache<String, Arc<CachedVerdict>> {
        &self.cache
    }

    async fn fetch_and_parse(
        &self,
        robots_txt_url: &str,
        request_url: &str,
        user_agent: &str,
    ) -> Result<RobotsRules, RobotsError> {
        let response = self.client.get(robots_txt_url).send().await?;
        let status = response.status();

        // A site without a readable robots.txt imposes no policy.
        if status.is_client_error() || status.is_server_error() {
            return Ok(RobotsRules {
                can_fetch: true,
                crawl_delay: DEFAULT_CRAWL_DELAY,
                user_agent: user_agent.to_string(),
            });
        }

        let body = response.bytes().await?;
        let robot = Robot::new(user_agent, body.as_ref())?;
        // Honor the site's delay, but never go below the 1 s floor.
        let crawl_delay = robot
            .delay
            .map(|seconds| Duration::from_secs_f32(seconds).max(DEFAULT_CRAWL_DELAY))
            .unwrap_or(DEFAULT_CRAWL_DELAY);

        Ok(RobotsRules {
            can_fetch: robot.allowed(request_url),
            crawl_delay,
            user_agent: user_agent.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn advisor(server: &mockito::ServerGuard) -> (RobotsAdvisor, String) {
        let advisor = RobotsAdvisor::new(HttpClient::new().unwrap(), 32);
        (advisor, server.url())
    }

    #[tokio::test]
    async fn allow_verdict_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_body("User-agent: *\nAllow: /\nCrawl-delay: 2")
            .expect(1)
            .create_async()
            .await;
        let (advisor, base) = advisor(&server);
        let robots_url = format!("{base}/robots.txt");
        let page = format!("{base}/jobs");

        let first = advisor.get_rules(&page, Some(&robots_url), "opilio").await;
        let second = advisor.get_rules(&page, Some(&robots_url), "opilio").await;

        assert!(first.can_fetch);
        assert_eq!(first.crawl_delay, Duration::from_secs(2));
        assert_eq!(first, second);
        robots.assert_async().await;
    }

    #[tokio::test]
    async fn deny_verdict_is_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_body("User-agent: *\nDisallow: /")
            .expect(2)
            .create_async()
            .await;
        let (advisor, base) = advisor(&server);
        let robots_url = format!("{base}/robots.txt");
        let page = format!("{base}/jobs");

        assert!(!advisor.get_rules(&page, Some(&robots_url), "opilio").await.can_fetch);
        assert!(!advisor.get_rules(&page, Some(&robots_url), "opilio").await.can_fetch);
        robots.assert_async().await;
    }

    #[tokio::test]
    async fn network_error_denies_and_caches_nothing() {
        let advisor = RobotsAdvisor::new(HttpClient::new().unwrap(), 32);
        let rules = advisor
            .get_rules(
                "http://127.0.0.1:1/jobs",
                Some("http://127.0.0.1:1/robots.txt"),
                "opilio",
            )
            .await;
        assert!(!rules.can_fetch);
        assert_eq!(rules.crawl_delay, DEFAULT_CRAWL_DELAY);
        assert_eq!(advisor.cache().entry_count(), 0);
    }

    #[tokio::test]
    async fn missing_robots_file_imposes_no_policy() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;
        let (advisor, base) = advisor(&server);
        let rules = advisor
            .get_rules(
                &format!("{base}/jobs"),
                Some(&format!("{base}/robots.txt")),
                "opilio",
            )
            .await;
        assert!(rules.can_fetch);
    }

    #[tokio::test]
    async fn no_robots_location_denies() {
        let advisor = RobotsAdvisor::new(HttpClient::new().unwrap(), 32);
        let rules = advisor.get_rules("https://x.test/jobs", None, "opilio").await;
        assert!(!rules.can_fetch);
    }
}
