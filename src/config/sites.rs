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
use crate::data::LogicalField;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use strum::{Display, EnumString};

/// Marker introducing a relative date template.
const RELATIVE_MARKER: &str = "--relative";

/// How a site is fetched and extracted.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParserKind {
    /// Plain HTTP CSV download.
    Download,
    /// Interactive CSV export driven through a headless browser.
    SelDownload,
    /// Static HTML, CSS selectors.
    Static,
    /// JavaScript-rendered page, extracted from the live DOM.
    Js,
    /// Vendor JSON API returning one document per query.
    HireBase,
}

impl ParserKind {
    /// The tag processors and bus messages carry for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ParserKind::Download => "DOWNLOAD_PARSER",
            ParserKind::SelDownload => "SEL_DOWNLOAD_PARSER",
            ParserKind::Static => "STATIC_PARSER",
            ParserKind::Js => "JS_PARSER",
            ParserKind::HireBase => "HIRE_BASE_PARSER",
        }
    }

    /// Downloads and the capped JSON API poll daily; rendered pages poll
    /// every three hours.
    pub fn default_cadence(&self) -> Duration {
        match self {
            ParserKind::Download | ParserKind::SelDownload | ParserKind::HireBase => {
                Duration::from_secs(24 * 60 * 60)
            }
            ParserKind::Static | ParserKind::Js => Duration::from_secs(3 * 60 * 60),
        }
    }

    fn requires_base_url(&self) -> bool {
        !matches!(self, ParserKind::Download | ParserKind::SelDownload)
    }

    fn requires_accept(&self) -> bool {
        matches!(self, ParserKind::Download | ParserKind::SelDownload)
    }
}

/// A date column format: either a `time` format description, or a
/// relative template (`--relative <template with {n}>`) encoding
/// "n days ago".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    Absolute(String),
    Relative(String),
}

impl DateFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().strip_prefix(RELATIVE_MARKER) {
            Some(template) => DateFormat::Relative(template.trim().to_string()),
            None => DateFormat::Absolute(raw.trim().to_string()),
        }
    }

    fn validate(&self, site: &str) -> Result<(), ConfigError> {
        match self {
            DateFormat::Absolute(format) => {
                time::format_description::parse_owned::<2>(format).map_err(|e| {
                    ConfigError::InvalidDateFormat {
                        site: site.to_string(),
                        reason: e.to_string(),
                    }
                })?;
            }
            DateFormat::Relative(template) => {
                if template.matches("{n}").count() != 1 {
                    return Err(ConfigError::InvalidDateFormat {
                        site: site.to_string(),
                        reason: format!(
                            "relative template must contain exactly one {{n}}: {template:?}"
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Serialize for DateFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateFormat::Absolute(format) => serializer.serialize_str(format),
            DateFormat::Relative(template) => {
                serializer.serialize_str(&format!("{RELATIVE_MARKER} {template}"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for DateFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(DateFormat::parse(&String::deserialize(deserializer)?))
    }
}

/// The query set for the JSON API: one request per query, capped daily.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuerySet {
    /// Job types, one API query each.
    pub queries: Vec<String>,
    /// Payload fields sent with every query.
    #[serde(default)]
    pub defaults: serde_json::Map<String, serde_json::Value>,
    /// Appended to every query string.
    #[serde(default)]
    pub query_postfix: String,
    /// `date_posted` is now minus this many days.
    #[serde(default = "_default_days_ago")]
    pub days_ago: i64,
    /// Hard cap on queries per cycle; the vendor bans beyond its daily
    /// request allowance.
    #[serde(default = "_default_daily_cap")]
    pub daily_cap: usize,
}

const fn _default_days_ago() -> i64 {
    2
}
const fn _default_daily_cap() -> usize {
    10
}

/// One configured source. Immutable after startup.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_id: String,
    pub url: String,
    pub parser_kind: ParserKind,
    pub base_url: Option<String>,
    pub robots_url: Option<String>,
    pub accept: Option<String>,
    pub date_format: DateFormat,
    pub selectors: IndexMap<LogicalField, String>,
    pub cadence: Duration,
    pub queries: Option<QuerySet>,
}

impl SiteConfig {
    /// The robots.txt location for this site: the configured override, or
    /// the base url with any trailing slash stripped plus `/robots.txt`.
    pub fn robots_txt_url(&self) -> Option<String> {
        if let Some(robots_url) = &self.robots_url {
            return Some(robots_url.clone());
        }
        self.base_url
            .as_ref()
            .map(|base| format!("{}/robots.txt", base.trim_end_matches('/')))
    }

    pub fn parser_tag(&self) -> &'static str {
        self.parser_kind.tag()
    }
}

/// The raw per-site document; everything optional so validation can name
/// the site instead of failing inside the deserializer.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawSiteConfig {
    url: Option<String>,
    parser_type: Option<ParserKind>,
    base_url: Option<String>,
    robots_url: Option<String>,
    accept: Option<String>,
    date_format: Option<DateFormat>,
    #[serde(default)]
    selectors: IndexMap<LogicalField, String>,
    cadence_seconds: Option<u64>,
    queries: Option<QuerySet>,
}

#[derive(Debug, Deserialize)]
struct WebsitesFile {
    websites: IndexMap<String, RawSiteConfig>,
}

/// Loads and validates the site catalog.
pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: WebsitesFile = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    file.websites
        .into_iter()
        .map(|(site_id, raw)| validate_site(site_id, raw))
        .collect()
}

fn validate_site(site_id: String, raw: RawSiteConfig) -> Result<SiteConfig, ConfigError> {
    let missing = |key| ConfigError::MissingKey {
        site: site_id.clone(),
        key,
    };

    let url = raw.url.filter(|u| !u.is_empty()).ok_or_else(|| missing("url"))?;
    let parser_kind = raw.parser_type.ok_or_else(|| missing("parser_type"))?;
    let date_format = raw.date_format.ok_or_else(|| missing("date_format"))?;
    date_format.validate(&site_id)?;

    if parser_kind.requires_base_url() && raw.base_url.as_deref().unwrap_or("").is_empty() {
        return Err(missing("base_url"));
    }
    if parser_kind.requires_accept() && raw.accept.as_deref().unwrap_or("").is_empty() {
        return Err(missing("accept"));
    }
    if raw.selectors.is_empty() {
        return Err(ConfigError::NoSelectors { site: site_id });
    }
    if parser_kind == ParserKind::HireBase && raw.queries.is_none() {
        return Err(ConfigError::MissingQuerySet { site: site_id });
    }

    let cadence = raw
        .cadence_seconds
        .map(Duration::from_secs)
        .unwrap_or_else(|| parser_kind.default_cadence());

    Ok(SiteConfig {
        site_id,
        url,
        parser_kind,
        base_url: raw.base_url,
        robots_url: raw.robots_url,
        accept: raw.accept,
        date_format,
        selectors: raw.selectors,
        cadence,
        queries: raw.queries,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::LogicalField;

    fn parse_one(yaml: &str) -> Result<Vec<SiteConfig>, ConfigError> {
        let file: WebsitesFile = serde_yaml::from_str(yaml).unwrap();
        file.websites
            .into_iter()
            .map(|(site_id, raw)| validate_site(site_id, raw))
            .collect()
    }

    const VALID: &str = r#"
websites:
  acme_jobs:
    url: https://jobs.acme.test/listing
    base_url: https://jobs.acme.test/
    parser_type: STATIC
    date_format: "--relative {n} days ago"
    selectors:
      company_name: ".company"
      position: ".role"
      date: ".posted"
"#;

    #[test]
    fn accepts_a_valid_static_site() {
        let sites = parse_one(VALID).unwrap();
        assert_eq!(sites.len(), 1);
        let site = &sites[0];
        assert_eq!(site.site_id, "acme_jobs");
        assert_eq!(site.parser_kind, ParserKind::Static);
        assert_eq!(site.cadence, Duration::from_secs(3 * 60 * 60));
        assert_eq!(
            site.date_format,
            DateFormat::Relative("{n} days ago".to_string())
        );
        assert_eq!(
            site.selectors.get(&LogicalField::Position).map(String::as_str),
            Some(".role")
        );
    }

    #[test]
    fn strips_trailing_slash_for_robots() {
        let sites = parse_one(VALID).unwrap();
        assert_eq!(
            sites[0].robots_txt_url().as_deref(),
            Some("https://jobs.acme.test/robots.txt")
        );
    }

    #[test]
    fn missing_url_names_the_site() {
        let err = parse_one(
            r#"
websites:
  broken:
    parser_type: STATIC
    base_url: https://x.test
    date_format: "[year]-[month]-[day]"
    selectors: { company_name: ".c" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref site, key: "url" } if site == "broken"));
    }

    #[test]
    fn download_requires_accept_but_not_base_url() {
        let err = parse_one(
            r#"
websites:
  dl:
    url: https://x.test/export.csv
    parser_type: DOWNLOAD
    date_format: "[year]-[month]-[day]"
    selectors: { company_name: "Company" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "accept", .. }));

        let ok = parse_one(
            r#"
websites:
  dl:
    url: https://x.test/export.csv
    parser_type: DOWNLOAD
    accept: text/csv
    date_format: "[year]-[month]-[day]"
    selectors: { company_name: "Company" }
"#,
        )
        .unwrap();
        assert_eq!(ok[0].cadence, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn static_requires_base_url() {
        let err = parse_one(
            r#"
websites:
  s:
    url: https://x.test/jobs
    parser_type: STATIC
    date_format: "[year]-[month]-[day]"
    selectors: { company_name: ".c" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "base_url", .. }));
    }

    #[test]
    fn empty_selectors_rejected() {
        let err = parse_one(
            r#"
websites:
  s:
    url: https://x.test/jobs
    base_url: https://x.test
    parser_type: STATIC
    date_format: "[year]-[month]-[day]"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoSelectors { .. }));
    }

    #[test]
    fn hire_base_requires_queries() {
        let err = parse_one(
            r#"
websites:
  api:
    url: https://api.x.test/search
    base_url: https://api.x.test
    parser_type: HIRE_BASE
    date_format: "--relative {n}d"
    selectors: { company_name: "company.name" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingQuerySet { .. }));
    }

    #[test]
    fn bad_relative_template_rejected() {
        let err = parse_one(
            r#"
websites:
  s:
    url: https://x.test/jobs
    base_url: https://x.test
    parser_type: STATIC
    date_format: "--relative days ago"
    selectors: { company_name: ".c" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateFormat { .. }));
    }

    #[test]
    fn bad_absolute_format_rejected() {
        let err = parse_one(
            r#"
websites:
  s:
    url: https://x.test/jobs
    base_url: https://x.test
    parser_type: STATIC
    date_format: "[not-a-thing]"
    selectors: { company_name: ".c" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateFormat { .. }));
    }
}
