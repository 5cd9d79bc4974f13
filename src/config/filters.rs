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
use std::collections::BTreeSet;
use std::path::Path;

/// Term lists per column for one filter category set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterSets {
    /// Rows whose column contains one of these terms are dropped.
    #[serde(default)]
    pub ignore: IndexMap<LogicalField, Vec<String>>,
    /// Cells equal to one of these terms become null and are forward-filled.
    #[serde(default)]
    pub scrub: IndexMap<LogicalField, Vec<String>>,
}

/// The filter document: global defaults plus per-site overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub general: FilterSets,
    #[serde(default)]
    pub specific: IndexMap<String, FilterSets>,
}

/// Filters after resolution for one site: global ∪ site-specific,
/// lower-cased and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFilters {
    pub ignore: IndexMap<LogicalField, BTreeSet<String>>,
    pub scrub: IndexMap<LogicalField, BTreeSet<String>>,
}

impl ResolvedFilters {
    pub fn is_empty(&self) -> bool {
        self.ignore.is_empty() && self.scrub.is_empty()
    }
}

impl FiltersConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the effective term lists for a site. Resolution is
    /// additive: general terms and site-specific terms are merged.
    pub fn resolve(&self, site_id: &str) -> ResolvedFilters {
        let specific = self.specific.get(site_id);
        ResolvedFilters {
            ignore: merge(
                &self.general.ignore,
                specific.map(|s| &s.ignore),
            ),
            scrub: merge(&self.general.scrub, specific.map(|s| &s.scrub)),
        }
    }
}

fn merge(
    general: &IndexMap<LogicalField, Vec<String>>,
    specific: Option<&IndexMap<LogicalField, Vec<String>>>,
) -> IndexMap<LogicalField, BTreeSet<String>> {
    let mut merged: IndexMap<LogicalField, BTreeSet<String>> = IndexMap::new();
    let normalize = |term: &String| term.trim().to_lowercase();

    for (field, terms) in general {
        merged
            .entry(*field)
            .or_default()
            .extend(terms.iter().map(normalize));
    }
    if let Some(specific) = specific {
        for (field, terms) in specific {
            merged
                .entry(*field)
                .or_default()
                .extend(terms.iter().map(normalize));
        }
    }
    merged.retain(|_, terms| !terms.is_empty());
    merged
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::LogicalField::*;

    const DOC: &str = r#"
general:
  ignore:
    position: [Senior, Staff]
scrub:
specific:
  acme_jobs:
    ignore:
      position: [senior, Principal]
    scrub:
      company_name: ["↳"]
"#;

    #[test]
    fn merges_general_and_specific_case_insensitively() {
        let config: FiltersConfig = serde_yaml::from_str(DOC).unwrap();
        let resolved = config.resolve("acme_jobs");

        let position = resolved.ignore.get(&Position).unwrap();
        assert_eq!(
            position.iter().cloned().collect::<Vec<_>>(),
            vec!["principal", "senior", "staff"]
        );
        assert!(resolved.scrub.get(&CompanyName).unwrap().contains("↳"));
    }

    #[test]
    fn unknown_site_gets_general_only() {
        let config: FiltersConfig = serde_yaml::from_str(DOC).unwrap();
        let resolved = config.resolve("other_site");
        assert_eq!(resolved.ignore.get(&Position).unwrap().len(), 2);
        assert!(resolved.scrub.is_empty());
    }

    #[test]
    fn empty_document_resolves_empty() {
        let config = FiltersConfig::default();
        assert!(config.resolve("anything").is_empty());
    }
}
