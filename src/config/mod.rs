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

pub mod configs;
pub mod error;
pub mod filters;
pub mod sink;
pub mod sites;
pub mod system;

pub use configs::Configs;
pub use error::ConfigError;
pub use filters::{FiltersConfig, ResolvedFilters};
pub use sink::SinkConfig;
pub use sites::{DateFormat, ParserKind, QuerySet, SiteConfig};
pub use system::SystemConfig;
