//! Record matching
//!
//! [`Matcher`] is the seam the wizard compares sources through.
//! [`ProfileMatcher`] scores every (incoming, master) pair by summing the
//! weighted similarity of each profile mapping.

use serde::{Deserialize, Serialize};

use crate::{Error, Profile, Record, Result, Source};

/// One incoming record paired with one candidate master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub incoming: Record,
    pub master: Record,
    /// Record id of `master` within the master source
    pub master_id: String,
    pub score: f64,
}

/// Compares an incoming source against a master source
pub trait Matcher: Send + Sync {
    /// Produce every pairing scoring at least `cutoff`, in no particular order
    fn compare_sources(
        &self,
        profile: &Profile,
        master: &Source,
        incoming: &Source,
        cutoff: u32,
    ) -> Result<Vec<MatchResult>>;
}

/// Weighted-sum matcher driven by the profile mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileMatcher;

impl ProfileMatcher {
    pub fn new() -> Self {
        Self
    }

    fn score(profile: &Profile, incoming: &Record, master: &Record) -> f64 {
        profile
            .mappings
            .iter()
            .map(|m| {
                m.points
                    * m.comparison
                        .similarity(incoming.value(&m.key), master.value(&m.master_key))
            })
            .sum()
    }
}

impl Matcher for ProfileMatcher {
    fn compare_sources(
        &self,
        profile: &Profile,
        master: &Source,
        incoming: &Source,
        cutoff: u32,
    ) -> Result<Vec<MatchResult>> {
        if profile.mappings.is_empty() {
            return Err(Error::Match("Profile has no mappings".to_string()));
        }
        for mapping in &profile.mappings {
            if !incoming.has_column(&mapping.key) {
                return Err(Error::Match(format!(
                    "Incoming file has no column '{}'",
                    mapping.key
                )));
            }
            if !master.has_column(&mapping.master_key) {
                return Err(Error::Match(format!(
                    "Master file has no column '{}'",
                    mapping.master_key
                )));
            }
        }

        let cutoff = f64::from(cutoff);
        let mut results = Vec::new();
        for incoming_record in incoming.records() {
            for master_record in master.records() {
                let score = Self::score(profile, incoming_record, master_record);
                if score > 0.0 && score >= cutoff {
                    results.push(MatchResult {
                        incoming: incoming_record.clone(),
                        master: master_record.clone(),
                        master_id: master.record_id(master_record),
                        score,
                    });
                }
            }
        }

        tracing::debug!(
            master_records = master.len(),
            incoming_records = incoming.len(),
            cutoff,
            results = results.len(),
            "Pairs scored"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::format::InputFormat;
    use crate::tabular::load_source;

    fn csv(text: &str) -> Source {
        load_source(text.as_bytes(), InputFormat::Csv, TextEncoding::utf8()).unwrap()
    }

    fn fixtures() -> (Profile, Source, Source) {
        let profile = Profile::from_source(&csv(
            "Key,Master Key,Comparison,Points\nName,Full Name,fuzzy,1\nZip,Postcode,exact,1\n",
        ))
        .unwrap();
        let mut master = csv("ID,Full Name,Postcode\nM1,Ada Lovelace,12345\nM2,Alan Turing,99999\n");
        master.set_primary_key("ID").unwrap();
        let incoming = csv("Name,Zip\nAda Lovelace,12345\nNobody,00000\n");
        (profile, master, incoming)
    }

    #[test]
    fn test_compare_scores_and_ids() {
        let (profile, master, incoming) = fixtures();
        let results = ProfileMatcher::new()
            .compare_sources(&profile, &master, &incoming, 0)
            .unwrap();

        let best = results
            .iter()
            .find(|r| r.incoming.input_line == 1 && r.master_id == "M1")
            .unwrap();
        assert!((best.score - 2.0).abs() < 1e-9);
        assert!(results.iter().all(|r| r.score > 0.0));
    }

    #[test]
    fn test_cutoff_filters_weak_pairs() {
        let (profile, master, incoming) = fixtures();
        let results = ProfileMatcher::new()
            .compare_sources(&profile, &master, &incoming, 2)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].master_id, "M1");
    }

    #[test]
    fn test_missing_mapped_column_fails() {
        let (profile, master, _) = fixtures();
        let incoming = csv("Name\nAda\n");
        assert!(matches!(
            ProfileMatcher::new().compare_sources(&profile, &master, &incoming, 0),
            Err(Error::Match(_))
        ));
    }
}
