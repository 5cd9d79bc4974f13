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

use crate::config::SiteConfig;
use crate::data::RawExtraction;
use crate::extraction::ExtractionError;
use crate::fetching::Payload;
use std::collections::HashMap;

/// Projects logical fields out of CSV text by header name. Selectors
/// naming headers the file does not have are skipped.
#[derive(Debug, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        payload: Payload,
        site: &SiteConfig,
    ) -> Result<RawExtraction, ExtractionError> {
        let (Payload::Csv(content) | Payload::Text(content)) = payload else {
            return Err(ExtractionError::WrongPayload);
        };
        log::info!("{} --- extracting {} columns from csv", site.url, site.selectors.len());

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();
        let header_index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();

        let mut columns: Vec<(crate::data::LogicalField, usize, Vec<String>)> = site
            .selectors
            .iter()
            .filter_map(|(field, header)| {
                header_index
                    .get(header.as_str())
                    .map(|index| (*field, *index, Vec::new()))
            })
            .collect();

        for record in reader.records() {
            let record = record?;
            for (_, index, values) in &mut columns {
                values.push(record.get(*index).unwrap_or("").to_string());
            }
        }

        Ok(columns
            .into_iter()
            .map(|(field, _, values)| (field, values))
            .collect())
    }
}
