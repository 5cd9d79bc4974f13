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

use dashmap::DashMap;

/// Tracks the most recently seen top row per source.
///
/// Keys are source identifiers (typically the site url), values the
/// fingerprint of the top row of the last successful extraction. Entries
/// live for the whole process; each worker writes only its own key.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: DashMap<String, String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn track(&self, key: &str, fingerprint: String) {
        self.entries.insert(key.to_string(), fingerprint);
    }
}
