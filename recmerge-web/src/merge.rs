//! Resolution of review choices into the merged output source

use recmerge_common::{Record, Source};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::error::{WizardError, WizardResult};
use crate::field_key::{FieldKey, ResolutionForm};
use crate::operation::{Operation, NEW_ADDRESS_COLUMN};

const FLAG_TRUE: &str = "TRUE";
const FLAG_FALSE: &str = "FALSE";

/// Per-field choice submitted from the review page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChoice {
    Master,
    User,
    Incoming,
}

impl FieldChoice {
    /// Absent and blank submissions keep the incoming value
    pub fn from_submission(value: Option<&str>) -> WizardResult<Self> {
        match value {
            None | Some("") => Ok(FieldChoice::Incoming),
            Some(other) => other.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldChoice::Master => "MASTER",
            FieldChoice::User => "USER",
            FieldChoice::Incoming => "INCOMING",
        }
    }
}

impl FromStr for FieldChoice {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(FieldChoice::Master),
            "USER" => Ok(FieldChoice::User),
            "INCOMING" => Ok(FieldChoice::Incoming),
            other => Err(WizardError::InvalidSubmission(format!(
                "unexpected field choice '{}'",
                other
            ))),
        }
    }
}

/// Apply `form` to the persisted run and build the output source
///
/// Deterministic for a given (operation, form). Any invalid choice aborts the
/// whole resolution.
pub fn resolve(op: &Operation, form: &ResolutionForm) -> WizardResult<Source> {
    let mut output = Source::new(op.output_headers());
    let header_mapping = op.profile.header_mapping();
    let options = &op.options;
    let mut grouped_lines = BTreeSet::new();

    for group in &op.results {
        grouped_lines.insert(group.input_line);

        let chosen = form
            .get(&FieldKey::master_choice(group.input_line))
            .filter(|id| !id.is_empty());
        if chosen.is_none() && !options.include_unmatched_records {
            continue;
        }
        let Some(top) = group.top() else {
            continue;
        };

        let chosen_master = match chosen {
            Some(id) => Some(find_master(op, group.candidate(id).map(|c| &c.master), id)?),
            None => None,
        };
        let record_id = chosen.unwrap_or("");

        let mut values = top.incoming.values.clone();
        values.insert(op.primary_key.clone(), record_id.to_string());
        let mut modified = false;

        for column in op.incoming.headers() {
            if column == &op.primary_key {
                continue;
            }
            let submitted = form.get(&FieldKey::field_choice(group.input_line, record_id, column));
            match FieldChoice::from_submission(submitted)? {
                FieldChoice::Master => {
                    if options.output_only_modified_entries {
                        values.insert(column.clone(), String::new());
                    } else if let Some(master) = chosen_master {
                        let master_column = header_mapping.get(column).ok_or_else(|| {
                            WizardError::InvalidSubmission(format!(
                                "column '{}' has no master mapping",
                                column
                            ))
                        })?;
                        values.insert(column.clone(), master.value(master_column).to_string());
                    }
                }
                FieldChoice::User => {
                    let entry = form
                        .get(&FieldKey::user_entry(group.input_line, record_id, column))
                        .unwrap_or("");
                    if !entry.is_empty() {
                        values.insert(column.clone(), entry.to_string());
                    }
                    modified = true;
                }
                FieldChoice::Incoming => {
                    modified = true;
                }
            }
        }

        if options.include_re_new_address_flag {
            let flagged = modified && form.is_checked(&FieldKey::new_address(group.input_line));
            values.insert(
                NEW_ADDRESS_COLUMN.to_string(),
                if flagged { FLAG_TRUE } else { FLAG_FALSE }.to_string(),
            );
        }

        output.add_record(Record::new(group.input_line, values));
    }

    if options.include_unmatched_records {
        for record in op.incoming.records() {
            if grouped_lines.contains(&record.input_line) {
                continue;
            }
            let mut values: BTreeMap<String, String> = record.values.clone();
            values.insert(op.primary_key.clone(), String::new());
            if options.include_re_new_address_flag {
                values.insert(NEW_ADDRESS_COLUMN.to_string(), FLAG_FALSE.to_string());
            }
            output.add_record(Record::new(record.input_line, values));
        }
    }

    tracing::debug!(
        groups = op.results.len(),
        records = output.len(),
        "Resolution applied"
    );

    Ok(output)
}

/// Chosen master record: the ranked candidate, else any master record with that id
fn find_master<'a>(
    op: &'a Operation,
    candidate: Option<&'a Record>,
    id: &str,
) -> WizardResult<&'a Record> {
    if let Some(record) = candidate {
        return Ok(record);
    }
    op.master
        .records()
        .iter()
        .find(|r| op.master.record_id(r) == id)
        .ok_or_else(|| WizardError::InvalidSubmission(format!("unknown master record '{}'", id)))
}
