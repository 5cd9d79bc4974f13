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

mod change_detection;
mod date_filter;
mod filters;
mod pipeline;
mod position;

pub use change_detection::ChangeDetection;
pub use date_filter::DateFilter;
pub use filters::FilterProcessor;
pub use pipeline::ProcessingPipeline;
pub use position::{normalize_commas, PositionNormalization};

use crate::config::{ResolvedFilters, SiteConfig};
use crate::data::{Frame, LogicalField};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("missing column {column} for {site}")]
    MissingColumn { site: String, column: LogicalField },
    #[error("unparseable date {value:?} for {site}")]
    DateParse { site: String, value: String },
    #[error("unusable date_format for {site}: {reason}")]
    DateFormat { site: String, reason: String },
}

/// Everything a processor may consult about the cycle it runs in.
pub struct ProcessingContext<'a> {
    pub site: &'a SiteConfig,
    pub filters: &'a ResolvedFilters,
    pub parser_tag: &'a str,
}

/// Which parser tags a processor runs for. The whitelist wins: when it
/// is non-empty the blacklist is ignored; when empty, everything not
/// blacklisted applies.
#[derive(Debug, Clone, Default)]
pub struct Applicability {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Applicability {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn applies_to(&self, parser_tag: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|tag| tag == parser_tag);
        }
        !self.exclude.iter().any(|tag| tag == parser_tag)
    }
}

/// One row-level transform in the pipeline.
pub trait Processor: Send + Sync {
    fn applicability(&self) -> &Applicability;

    fn process(&self, frame: Frame, ctx: &ProcessingContext<'_>)
        -> Result<Frame, ProcessingError>;
}
