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

use crate::data::Frame;
use crate::processing::{Applicability, ProcessingContext, ProcessingError, Processor};
use crate::tracker::ChangeTracker;
use std::sync::Arc;

/// Keeps only the rows that are new since the last poll.
///
/// Sources present newest entries at the top, so the top row is the most
/// compact fingerprint of "where we left off": everything strictly above
/// the previous top row is new. When the previous top row is no longer
/// visible, turnover exceeded the window and the whole frame counts as
/// new.
pub struct ChangeDetection {
    tracker: Arc<ChangeTracker>,
    applicability: Applicability,
}

impl ChangeDetection {
    pub fn new(tracker: Arc<ChangeTracker>) -> Self {
        Self {
            tracker,
            applicability: Applicability::all(),
        }
    }

    #[allow(dead_code)]
    pub fn with_applicability(tracker: Arc<ChangeTracker>, applicability: Applicability) -> Self {
        Self {
            tracker,
            applicability,
        }
    }
}

impl Processor for ChangeDetection {
    fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    fn process(
        &self,
        frame: Frame,
        ctx: &ProcessingContext<'_>,
    ) -> Result<Frame, ProcessingError> {
        if frame.is_empty() {
            return Ok(frame);
        }

        let key = ctx.site.url.as_str();
        let previous = self.tracker.get(key);
        let current = frame.fingerprint(0);

        let Some(previous) = previous else {
            // First sighting.
            self.tracker.track(key, current);
            return Ok(frame);
        };

        if previous == current {
            // Nothing changed since the last poll.
            self.tracker.track(key, current);
            return Ok(frame.cleared());
        }

        self.tracker.track(key, current);
        for index in 0..frame.row_count() {
            if frame.fingerprint(index) == previous {
                return Ok(frame.head(index));
            }
        }
        Ok(frame)
    }
}
