//! Persisted state of one workflow run

use chrono::{DateTime, Utc};
use recmerge_common::{group_results, LineEnding, MatchGroup, Matcher, OutputFormat, Profile, Source};
use serde::{Deserialize, Serialize};

use crate::error::{WizardError, WizardResult};
use crate::intake::PreparedRun;

/// Column appended when the new-address flag is requested
pub const NEW_ADDRESS_COLUMN: &str = "RE New Address";

pub const DEFAULT_MAX_CANDIDATES: usize = 5;

/// Options chosen on the upload form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Minimum score for a pairing to become a candidate
    pub cutoff: u32,
    /// Candidates kept per incoming line; 0 keeps all
    pub max_candidates: usize,
    pub output_format: OutputFormat,
    /// Key from the supported encoding set
    pub output_encoding: String,
    pub line_ending: LineEnding,
    pub display_diff: bool,
    pub include_unmatched_records: bool,
    pub output_only_modified_entries: bool,
    pub include_re_new_address_flag: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cutoff: 0,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            output_format: OutputFormat::default(),
            output_encoding: recmerge_common::encoding::DEFAULT_ENCODING.to_string(),
            line_ending: LineEnding::default(),
            display_diff: false,
            include_unmatched_records: false,
            output_only_modified_entries: false,
            include_re_new_address_flag: false,
        }
    }
}

/// Snapshot of a run between the compare and resolve steps
///
/// Sources are stored whole so the resolution step needs nothing but this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub master: Source,
    pub incoming: Source,
    pub profile: Profile,
    pub primary_key: String,
    /// Unique lines, ascending; candidates by non-increasing score
    pub results: Vec<MatchGroup>,
    pub options: RunOptions,
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// Run the matcher over a prepared run and rank the candidates
    pub fn compare(run: PreparedRun, matcher: &dyn Matcher) -> WizardResult<Self> {
        let results = matcher
            .compare_sources(&run.profile, &run.master, &run.incoming, run.options.cutoff)
            .map_err(|e| WizardError::Matcher(e.to_string()))?;
        let pairings = results.len();
        let results = group_results(results, run.options.max_candidates);

        tracing::info!(
            pairings,
            groups = results.len(),
            cutoff = run.options.cutoff,
            "Comparison complete"
        );

        Ok(Self {
            master: run.master,
            incoming: run.incoming,
            profile: run.profile,
            primary_key: run.primary_key,
            results,
            options: run.options,
            created_at: Utc::now(),
        })
    }

    /// Headers of the merged output, in order
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.incoming.headers().to_vec();
        if !headers.iter().any(|h| h == &self.primary_key) {
            headers.push(self.primary_key.clone());
        }
        if self.options.include_re_new_address_flag && !headers.iter().any(|h| h == NEW_ADDRESS_COLUMN)
        {
            headers.push(NEW_ADDRESS_COLUMN.to_string());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recmerge_common::{Comparison, Mapping, MatchResult, Record};

    struct FailingMatcher;

    impl Matcher for FailingMatcher {
        fn compare_sources(
            &self,
            _profile: &Profile,
            _master: &Source,
            _incoming: &Source,
            _cutoff: u32,
        ) -> recmerge_common::Result<Vec<MatchResult>> {
            Err(recmerge_common::Error::Match("index unavailable".to_string()))
        }
    }

    fn run(options: RunOptions) -> PreparedRun {
        let mut master = Source::new(vec!["CustomerID".to_string(), "Name".to_string()]);
        for (line, (id, name)) in [("M1", "Ada"), ("M2", "Adam"), ("M3", "Alan")].iter().enumerate() {
            master.add_record(Record::new(
                line + 1,
                [("CustomerID", *id), ("Name", *name)]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
        }
        master.set_primary_key("CustomerID").unwrap();

        let mut incoming = Source::new(vec!["Name".to_string()]);
        incoming.add_record(Record::new(1, [("Name".to_string(), "Ada".to_string())].into()));

        PreparedRun {
            master,
            incoming,
            profile: Profile::new(vec![Mapping {
                key: "Name".to_string(),
                master_key: "Name".to_string(),
                comparison: Comparison::Fuzzy,
                points: 1.0,
            }]),
            primary_key: "CustomerID".to_string(),
            options,
        }
    }

    #[test]
    fn test_compare_ranks_and_truncates() {
        let op = Operation::compare(
            run(RunOptions {
                max_candidates: 2,
                ..RunOptions::default()
            }),
            &recmerge_common::ProfileMatcher::new(),
        )
        .unwrap();

        assert_eq!(op.results.len(), 1);
        let group = &op.results[0];
        assert_eq!(group.input_line, 1);
        assert_eq!(group.candidates.len(), 2);
        assert_eq!(group.candidates[0].master_id, "M1");
        assert!(group.candidates[0].score >= group.candidates[1].score);
    }

    #[test]
    fn test_compare_surfaces_matcher_failure() {
        let result = Operation::compare(run(RunOptions::default()), &FailingMatcher);
        assert!(matches!(result, Err(WizardError::Matcher(msg)) if msg.contains("index unavailable")));
    }

    #[test]
    fn test_output_headers() {
        let mut op = Operation::compare(run(RunOptions::default()), &recmerge_common::ProfileMatcher::new())
            .unwrap();
        assert_eq!(op.output_headers(), vec!["Name", "CustomerID"]);

        op.options.include_re_new_address_flag = true;
        op.primary_key = "Name".to_string();
        assert_eq!(op.output_headers(), vec!["Name", NEW_ADDRESS_COLUMN]);
    }
}
