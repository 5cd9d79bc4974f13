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

use crate::config::{configs::generate_example_configs, Configs, SystemConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
/// Welcome to Opilio
pub struct OpilioArgs {
    /// A command to initialize exemplary configs
    #[arg(long)]
    pub generate_example_config: bool,

    /// The mode of Opilio
    #[command(subcommand)]
    pub mode: Option<RunMode>,
}

#[derive(Subcommand, Debug)]
pub enum RunMode {
    /// Harvest the configured sites until interrupted.
    RUN {
        /// The site catalog.
        #[arg(short, long, default_value = "websites.yaml")]
        websites: PathBuf,

        /// The filter lists.
        #[arg(short, long)]
        filters: Option<PathBuf>,

        /// Overrides the log level from the config.
        #[arg(long)]
        override_log_level: Option<log::LevelFilter>,

        /// Log to file
        #[arg(long)]
        log_to_file: bool,

        /// Run the pooled browsers with a visible window.
        #[arg(long)]
        headful: bool,

        /// The number of pooled browser instances.
        #[arg(short, long)]
        browsers: Option<usize>,
    },
    /// Check a site catalog and filter lists without starting anything.
    VALIDATE {
        /// The site catalog.
        #[arg(short, long, default_value = "websites.yaml")]
        websites: PathBuf,

        /// The filter lists.
        #[arg(short, long)]
        filters: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub enum ConsumedArgs {
    RunConfig(Box<Configs>),
    Nothing,
    Failed,
}

/// Consumes the args and returns everything necessary to execute Opilio
pub fn consume_args(args: OpilioArgs) -> ConsumedArgs {
    if args.generate_example_config {
        return match generate_example_configs(std::path::Path::new(".")) {
            Ok(()) => {
                println!("Example configs written to websites.yaml and filters.yaml");
                ConsumedArgs::Nothing
            }
            Err(error) => {
                eprintln!("{error}");
                ConsumedArgs::Failed
            }
        };
    }

    match args.mode {
        None => {
            println!("Nothing to do. Try --help.");
            ConsumedArgs::Nothing
        }
        Some(RunMode::VALIDATE { websites, filters }) => {
            match Configs::load_catalog_only(&websites, filters.as_deref()) {
                Ok((sites, _)) => {
                    println!("{} site(s) validated", sites.len());
                    ConsumedArgs::Nothing
                }
                Err(error) => {
                    eprintln!("{error}");
                    ConsumedArgs::Failed
                }
            }
        }
        Some(RunMode::RUN {
            websites,
            filters,
            override_log_level,
            log_to_file,
            headful,
            browsers,
        }) => {
            let mut system = SystemConfig::default();
            if let Some(level) = override_log_level {
                system.log_level = level;
            }
            system.log_to_file = log_to_file;
            system.headless = !headful;
            if let Some(browsers) = browsers {
                system.browser_instances = browsers;
            }

            match Configs::load(&websites, filters.as_deref(), system) {
                Ok(configs) => ConsumedArgs::RunConfig(Box::new(configs)),
                Err(error) => {
                    eprintln!("{error}");
                    ConsumedArgs::Failed
                }
            }
        }
    }
}
