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

mod worker;

pub use worker::SiteWorker;

use std::sync::atomic::{AtomicBool, AtomicUsize};

/// Bookkeeping shared by every site worker.
///
/// `active` counts workers inside a parse; `quiet` is the quiet window
/// during which housekeeping runs and workers back off. Reads are
/// advisory, plain atomics suffice.
#[derive(Debug, Default)]
pub struct SchedulerState {
    pub active: AtomicUsize,
    pub quiet: AtomicBool,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }
}
