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

use crate::browser::BrowserLease;
use chromiumoxide::Page;

/// What a fetcher hands to its extractor.
///
/// The `Dom` variant keeps its browser lease alive across fetch and
/// extract of one parse call; dropping the payload returns the instance
/// to the pool on every exit path.
pub enum Payload {
    /// HTML text.
    Text(String),
    /// CSV text.
    Csv(String),
    /// A live page on a leased browser instance.
    Dom { lease: BrowserLease, page: Page },
    /// One JSON document per successful API query.
    Json(Vec<serde_json::Value>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Payload::Csv(text) => f.debug_tuple("Csv").field(&text.len()).finish(),
            Payload::Dom { lease, .. } => f.debug_tuple("Dom").field(lease).finish(),
            Payload::Json(docs) => f.debug_tuple("Json").field(&docs.len()).finish(),
        }
    }
}
