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

use crate::processing::{
    ChangeDetection, DateFilter, FilterProcessor, PositionNormalization, ProcessingContext,
    ProcessingError, Processor,
};
use crate::data::Frame;
use crate::tracker::ChangeTracker;
use std::sync::Arc;

/// Executes processors in order, skipping those not applicable to the
/// cycle's parser tag and short-circuiting once the frame is empty.
pub struct ProcessingPipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessingPipeline {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// The standard chain. Change detection runs first so the tracker
    /// advances on the frame as extracted; a downstream filter emptying
    /// the frame must not stall the fingerprint.
    pub fn standard(tracker: Arc<ChangeTracker>) -> Self {
        Self::new(vec![
            Box::new(ChangeDetection::new(tracker)),
            Box::new(DateFilter::new()),
            Box::new(FilterProcessor::new()),
            Box::new(PositionNormalization::new()),
        ])
    }

    pub fn execute(
        &self,
        mut frame: Frame,
        ctx: &ProcessingContext<'_>,
    ) -> Result<Frame, ProcessingError> {
        for processor in &self.processors {
            if !processor.applicability().applies_to(ctx.parser_tag) {
                continue;
            }
            frame = processor.process(frame, ctx)?;
            if frame.is_empty() {
                break;
            }
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{DateFormat, ParserKind, ResolvedFilters, SiteConfig};
    use crate::data::test_support::frame;
    use crate::data::LogicalField::*;
    use crate::processing::Applicability;
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn site() -> SiteConfig {
        SiteConfig {
            site_id: "pipe".into(),
            url: "https://x.test/jobs".into(),
            parser_kind: ParserKind::Static,
            base_url: Some("https://x.test".into()),
            robots_url: None,
            accept: None,
            date_format: DateFormat::Relative("{n} days ago".into()),
            selectors: IndexMap::new(),
            cadence: Duration::from_secs(60),
            queries: None,
        }
    }

    struct Counting {
        applicability: Applicability,
        calls: Arc<AtomicUsize>,
        empty_out: bool,
    }

    impl Processor for Counting {
        fn applicability(&self) -> &Applicability {
            &self.applicability
        }

        fn process(
            &self,
            frame: Frame,
            _ctx: &ProcessingContext<'_>,
        ) -> Result<Frame, ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if self.empty_out { frame.cleared() } else { frame })
        }
    }

    #[test]
    fn short_circuits_on_empty_frame() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = ProcessingPipeline::new(vec![
            Box::new(Counting {
                applicability: Applicability::all(),
                calls: first.clone(),
                empty_out: true,
            }),
            Box::new(Counting {
                applicability: Applicability::all(),
                calls: second.clone(),
                empty_out: false,
            }),
        ]);

        let site = site();
        let filters = ResolvedFilters::default();
        let ctx = ProcessingContext {
            site: &site,
            filters: &filters,
            parser_tag: "STATIC_PARSER",
        };
        let out = pipeline
            .execute(frame(vec![(CompanyName, vec!["a"])]), &ctx)
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inapplicable_processors_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ProcessingPipeline::new(vec![Box::new(Counting {
            applicability: Applicability {
                include: vec!["JS_PARSER".into()],
                exclude: vec![],
            },
            calls: calls.clone(),
            empty_out: false,
        })]);

        let site = site();
        let filters = ResolvedFilters::default();
        let ctx = ProcessingContext {
            site: &site,
            filters: &filters,
            parser_tag: "STATIC_PARSER",
        };
        pipeline
            .execute(frame(vec![(CompanyName, vec!["a"])]), &ctx)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
