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

use std::path::PathBuf;
use thiserror::Error;

/// Anything that makes the configuration unusable. These are the only
/// errors that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no {key} found for {site}")]
    MissingKey { site: String, key: &'static str },
    #[error("no selectors found for {site}")]
    NoSelectors { site: String },
    #[error("invalid date_format for {site}: {reason}")]
    InvalidDateFormat { site: String, reason: String },
    #[error("no query set found for {site} (required for HIRE_BASE)")]
    MissingQuerySet { site: String },
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}
