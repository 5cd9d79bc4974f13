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

use crate::config::{ConfigError, FiltersConfig, SinkConfig, SiteConfig, SystemConfig};
use std::path::Path;

/// Everything the application needs to start, validated.
#[derive(Debug)]
pub struct Configs {
    pub system: SystemConfig,
    pub sites: Vec<SiteConfig>,
    pub filters: FiltersConfig,
    pub sink: SinkConfig,
}

impl Configs {
    /// Loads the site catalog and filter lists from disk and the sink
    /// credentials from the environment. Any violation aborts startup.
    pub fn load(
        websites_path: &Path,
        filters_path: Option<&Path>,
        system: SystemConfig,
    ) -> Result<Self, ConfigError> {
        let sites = super::sites::load_sites(websites_path)?;
        let filters = match filters_path {
            Some(path) => FiltersConfig::load(path)?,
            None => FiltersConfig::default(),
        };
        let sink = SinkConfig::from_env()?;
        Ok(Self {
            system,
            sites,
            filters,
            sink,
        })
    }

    /// Like [`Self::load`] but without touching the environment; used by
    /// the `validate` mode which only checks the catalog.
    pub fn load_catalog_only(
        websites_path: &Path,
        filters_path: Option<&Path>,
    ) -> Result<(Vec<SiteConfig>, FiltersConfig), ConfigError> {
        let sites = super::sites::load_sites(websites_path)?;
        let filters = match filters_path {
            Some(path) => FiltersConfig::load(path)?,
            None => FiltersConfig::default(),
        };
        Ok((sites, filters))
    }
}

pub const EXAMPLE_WEBSITES: &str = r#"# Site catalog. One entry per source.
#
# Required everywhere: url, parser_type, date_format, selectors.
# Required unless parser_type is DOWNLOAD/SEL_DOWNLOAD: base_url.
# Required for DOWNLOAD/SEL_DOWNLOAD: accept.
# HIRE_BASE additionally needs a `queries` block.
#
# date_format is either a `time` format description
# (e.g. "[year]-[month]-[day]") or "--relative <template>" where the
# template contains exactly one {n}, e.g. "--relative {n} days ago".
websites:
  example_static:
    url: https://jobs.example.com/listing
    base_url: https://jobs.example.com
    parser_type: STATIC
    date_format: "--relative {n} days ago"
    selectors:
      company_name: ".job-card .company"
      position: ".job-card .title"
      application_link: ".job-card a.apply"
      date: ".job-card .posted"

  example_download:
    url: https://boards.example.org/export.csv
    parser_type: DOWNLOAD
    accept: text/csv
    date_format: "[month]/[day]/[year]"
    selectors:
      company_name: "Company"
      position: "Role"
      application_link: "Link"
      date: "Posted"

  example_api:
    url: https://api.hirebase.example/v1/search
    base_url: https://api.hirebase.example
    parser_type: HIRE_BASE
    date_format: "--relative {n}d"
    selectors:
      company_name: "company.name"
      position: "title"
      application_link: "apply_url"
      description: "description"
      date: "age"
    queries:
      queries: [software engineer, data engineer]
      query_postfix: "new grad"
      days_ago: 2
      daily_cap: 10
"#;

pub const EXAMPLE_FILTERS: &str = r#"# Filter lists. `general` applies to every site; `specific.<site_id>`
# is merged on top. Terms are matched case-insensitively.
general:
  ignore:
    position: [senior, staff, principal]
specific:
  example_download:
    scrub:
      company_name: ["↳"]
"#;

/// Writes commented example config files next to each other. Refuses to
/// overwrite existing files.
pub fn generate_example_configs(directory: &Path) -> Result<(), ConfigError> {
    let io_err = |path: &Path, source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    for (name, content) in [
        ("websites.yaml", EXAMPLE_WEBSITES),
        ("filters.yaml", EXAMPLE_FILTERS),
    ] {
        let path = directory.join(name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, content).map_err(|e| io_err(&path, e))?;
    }
    Ok(())
}
