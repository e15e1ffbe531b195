//! Matching profiles
//!
//! A profile links incoming columns to master columns and says how each pair
//! is compared. Profiles are themselves tabular sources with the columns
//! `Key`, `Master Key`, and optionally `Comparison` and `Points`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::{Error, Result, Source};

pub const KEY_COLUMN: &str = "Key";
pub const MASTER_KEY_COLUMN: &str = "Master Key";
pub const COMPARISON_COLUMN: &str = "Comparison";
pub const POINTS_COLUMN: &str = "Points";

/// How a mapped pair of values is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Equality after trimming and case folding
    Insensitive,
    /// Jaro-Winkler similarity of trimmed, lower-cased values
    Fuzzy,
}

impl Comparison {
    /// Similarity of two values in 0.0..=1.0
    pub fn similarity(&self, incoming: &str, master: &str) -> f64 {
        match self {
            Comparison::Exact => {
                if !incoming.is_empty() && incoming == master {
                    1.0
                } else {
                    0.0
                }
            }
            Comparison::Insensitive => {
                let a = incoming.trim().to_lowercase();
                let b = master.trim().to_lowercase();
                if !a.is_empty() && a == b {
                    1.0
                } else {
                    0.0
                }
            }
            Comparison::Fuzzy => {
                let a = incoming.trim().to_lowercase();
                let b = master.trim().to_lowercase();
                if a.is_empty() || b.is_empty() {
                    0.0
                } else {
                    strsim::jaro_winkler(&a, &b)
                }
            }
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "exact" => Ok(Comparison::Exact),
            "insensitive" | "case-insensitive" => Ok(Comparison::Insensitive),
            "fuzzy" => Ok(Comparison::Fuzzy),
            other => Err(Error::InvalidProfile(format!("Unknown comparison: {}", other))),
        }
    }
}

/// One incoming-column to master-column link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Incoming column
    pub key: String,
    /// Master column
    pub master_key: String,
    pub comparison: Comparison,
    /// Weight of this mapping in a pair's score
    pub points: f64,
}

/// Ordered set of mappings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub mappings: Vec<Mapping>,
}

impl Profile {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self { mappings }
    }

    /// Build a profile from its tabular form
    ///
    /// Rows with a blank `Key` are skipped. Blank `Points` default to 1.
    pub fn from_source(source: &Source) -> Result<Self> {
        for required in [KEY_COLUMN, MASTER_KEY_COLUMN] {
            if !source.has_column(required) {
                return Err(Error::InvalidProfile(format!(
                    "Profile is missing the '{}' column",
                    required
                )));
            }
        }

        let mut mappings = Vec::new();
        for record in source.records() {
            let key = record.value(KEY_COLUMN).trim();
            if key.is_empty() {
                continue;
            }

            let master_key = record.value(MASTER_KEY_COLUMN).trim();
            if master_key.is_empty() {
                return Err(Error::InvalidProfile(format!(
                    "Row {}: '{}' has no master column",
                    record.input_line, key
                )));
            }

            let comparison: Comparison = record.value(COMPARISON_COLUMN).parse()?;

            let points_text = record.value(POINTS_COLUMN).trim();
            let points = if points_text.is_empty() {
                1.0
            } else {
                points_text.parse::<f64>().map_err(|_| {
                    Error::InvalidProfile(format!(
                        "Row {}: points '{}' is not a number",
                        record.input_line, points_text
                    ))
                })?
            };

            mappings.push(Mapping {
                key: key.to_string(),
                master_key: master_key.to_string(),
                comparison,
                points,
            });
        }

        Ok(Self { mappings })
    }

    /// Incoming column → master column, first mapping wins per incoming column
    pub fn header_mapping(&self) -> HashMap<String, String> {
        let mut header_map = HashMap::new();
        for mapping in &self.mappings {
            header_map
                .entry(mapping.key.clone())
                .or_insert_with(|| mapping.master_key.clone());
        }
        header_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::format::InputFormat;
    use crate::tabular::load_source;

    fn profile_from(csv: &str) -> Result<Profile> {
        let source = load_source(csv.as_bytes(), InputFormat::Csv, TextEncoding::utf8())?;
        Profile::from_source(&source)
    }

    #[test]
    fn test_from_source_defaults() {
        let profile = profile_from("Key,Master Key\nPhone,Telephone\n").unwrap();
        assert_eq!(
            profile.mappings,
            vec![Mapping {
                key: "Phone".to_string(),
                master_key: "Telephone".to_string(),
                comparison: Comparison::Exact,
                points: 1.0,
            }]
        );
    }

    #[test]
    fn test_from_source_reads_comparison_and_points() {
        let profile =
            profile_from("Key,Master Key,Comparison,Points\nName,Full Name,fuzzy,2.5\n,,,\n").unwrap();
        assert_eq!(profile.mappings.len(), 1);
        assert_eq!(profile.mappings[0].comparison, Comparison::Fuzzy);
        assert_eq!(profile.mappings[0].points, 2.5);
    }

    #[test]
    fn test_from_source_rejects_bad_rows() {
        assert!(matches!(profile_from("Key\nPhone\n"), Err(Error::InvalidProfile(_))));
        assert!(profile_from("Key,Master Key,Comparison\nA,B,soundex\n").is_err());
        assert!(profile_from("Key,Master Key,Points\nA,B,lots\n").is_err());
        assert!(profile_from("Key,Master Key\nA,\n").is_err());
    }

    #[test]
    fn test_header_mapping_first_seen_wins() {
        let profile = profile_from("Key,Master Key\nPhone,Home Phone\nPhone,Work Phone\nName,Name\n")
            .unwrap();
        let map = profile.header_mapping();

        assert_eq!(map.len(), 2);
        assert_eq!(map["Phone"], "Home Phone");
        assert_eq!(map, profile.header_mapping());
    }

    #[test]
    fn test_similarity() {
        assert_eq!(Comparison::Exact.similarity("Ada", "Ada"), 1.0);
        assert_eq!(Comparison::Exact.similarity("Ada", "ada"), 0.0);
        assert_eq!(Comparison::Exact.similarity("", ""), 0.0);
        assert_eq!(Comparison::Insensitive.similarity(" Ada ", "ADA"), 1.0);
        assert_eq!(Comparison::Fuzzy.similarity("", "Ada"), 0.0);

        let close = Comparison::Fuzzy.similarity("Jonathan", "Jonathon");
        assert!(close > 0.9 && close < 1.0);
    }
}
