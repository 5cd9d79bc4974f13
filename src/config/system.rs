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

use serde::{Deserialize, Serialize};

/// The default number of pooled headless browser instances.
pub const DEFAULT_BROWSER_INSTANCES: usize = 2;

/// Config of the system: caches, browsers, logging.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// How many headless browser instances are pooled.
    #[serde(default = "_default_browser_instances")]
    pub browser_instances: usize,

    /// Run the browsers headless?
    #[serde(default = "_default_headless")]
    pub headless: bool,

    /// The capacity of the robots cache.
    #[serde(default = "_default_robots_cache_size")]
    pub robots_cache_size: u64,

    /// Hours between robots revalidation passes.
    #[serde(default = "_default_robots_refresh_hours")]
    pub robots_refresh_hours: u64,

    /// The log level of the harvester.
    #[serde(default = "_default_log_level")]
    pub log_level: log::LevelFilter,

    /// Log to a file?
    #[serde(default)]
    pub log_to_file: bool,
}

const fn _default_browser_instances() -> usize {
    DEFAULT_BROWSER_INSTANCES
}
const fn _default_headless() -> bool {
    true
}
const fn _default_robots_cache_size() -> u64 {
    32
}
const fn _default_robots_refresh_hours() -> u64 {
    24
}
const fn _default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            browser_instances: _default_browser_instances(),
            headless: _default_headless(),
            robots_cache_size: _default_robots_cache_size(),
            robots_refresh_hours: _default_robots_refresh_hours(),
            log_level: _default_log_level(),
            log_to_file: false,
        }
    }
}
