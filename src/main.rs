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

use crate::application::Opilio;
use crate::args::{consume_args, ConsumedArgs, OpilioArgs};
use crate::logging::configure_logging;
use clap::Parser;
use std::process::ExitCode;

mod application;
mod args;
mod browser;
mod bus;
mod client;
mod config;
mod data;
mod extraction;
mod fetching;
mod logging;
mod parser;
mod processing;
mod robots;
mod runtime;
mod scheduler;
mod sink;
mod tracker;

fn main() -> ExitCode {
    match consume_args(OpilioArgs::parse()) {
        ConsumedArgs::Nothing => ExitCode::SUCCESS,
        ConsumedArgs::Failed => ExitCode::FAILURE,
        ConsumedArgs::RunConfig(configs) => {
            configure_logging(&configs.system);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("Fatal: Was not able to initialize runtime!");
            match runtime.block_on(Opilio::new(*configs).run()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    log::error!("{error:?}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
