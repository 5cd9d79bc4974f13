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

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The logical fields a site can map its source keys onto.
///
/// Every extractor produces columns keyed by these fields; the sink only
/// ever sees rows expressed in them.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogicalField {
    CompanyName,
    Position,
    ApplicationLink,
    Description,
    CompanySize,
    Date,
}

#[cfg(test)]
mod test {
    use super::LogicalField;
    use std::str::FromStr;

    #[test]
    fn serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&LogicalField::CompanyName).unwrap(),
            "\"company_name\""
        );
        assert_eq!(LogicalField::ApplicationLink.to_string(), "application_link");
    }

    #[test]
    fn parses_from_snake_case() {
        assert_eq!(
            LogicalField::from_str("company_size").unwrap(),
            LogicalField::CompanySize
        );
        assert!(LogicalField::from_str("salary").is_err());
    }
}
