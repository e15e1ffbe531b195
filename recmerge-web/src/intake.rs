//! Upload and parameter intake for `POST /run`

use axum::extract::Multipart;
use recmerge_common::bundle::MasterBundle;
use recmerge_common::encoding::TextEncoding;
use recmerge_common::format::{is_bundle_filename, BUNDLE_EXTENSION};
use recmerge_common::tabular::load_source;
use recmerge_common::{InputFormat, LineEnding, OutputFormat, Profile, Source};
use std::collections::HashMap;

use crate::error::{WizardError, WizardResult};
use crate::operation::{RunOptions, DEFAULT_MAX_CANDIDATES};

/// One uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Raw multipart submission: files by field name plus plain fields
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    files: HashMap<String, Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, filename: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(
            name.to_string(),
            Upload {
                filename: Some(filename.to_string()),
                bytes: bytes.into(),
            },
        );
        self
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Drain a multipart body
    ///
    /// Parts with a filename are files; an empty file input (no name, no bytes)
    /// counts as not submitted.
    pub async fn from_multipart(mut multipart: Multipart) -> WizardResult<Self> {
        let mut form = Self::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WizardError::input("upload", e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| WizardError::input(&name, e.body_text()))?;

            match filename {
                Some(filename) => {
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        Upload {
                            filename: Some(filename),
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = String::from_utf8(bytes.to_vec()).map_err(|_| {
                        WizardError::InvalidField(format!("Field '{}' is not valid UTF-8", name))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn file(&self, name: &str) -> Option<&Upload> {
        self.files.get(name)
    }

    /// Trimmed field value; blank counts as absent
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Presence flag (checkbox)
    pub fn flag(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Validated inputs for one comparison
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub master: Source,
    pub incoming: Source,
    pub profile: Profile,
    pub primary_key: String,
    pub options: RunOptions,
}

/// Parse uploads and validate parameters
pub fn prepare(form: &UploadForm) -> WizardResult<PreparedRun> {
    let format_choice = form.field("input_format");
    let encoding = input_encoding(form.field("input_encoding"));

    let master_upload = form
        .file("master")
        .ok_or_else(|| WizardError::InvalidField("A master file is required".to_string()))?;
    let incoming_upload = form
        .file("incoming")
        .ok_or_else(|| WizardError::InvalidField("An incoming file is required".to_string()))?;

    let is_bundle = format_choice
        .map(|c| c.eq_ignore_ascii_case(BUNDLE_EXTENSION))
        .unwrap_or(false)
        || master_upload
            .filename
            .as_deref()
            .map(is_bundle_filename)
            .unwrap_or(false);

    let (mut master, profile) = if is_bundle {
        let bundle = MasterBundle::from_bytes(&master_upload.bytes)
            .map_err(|e| WizardError::input("master", e))?;
        (bundle.source, bundle.profile)
    } else {
        let master = load_upload(master_upload, "master", format_choice, encoding)?;
        let profile_upload = form
            .file("profile")
            .ok_or_else(|| WizardError::InvalidField("A profile file is required".to_string()))?;
        let profile_source = load_upload(profile_upload, "profile", format_choice, encoding)?;
        let profile =
            Profile::from_source(&profile_source).map_err(|e| WizardError::input("profile", e))?;
        (master, profile)
    };

    // A bundle is always JSON; the incoming file follows the form's choices
    let incoming_choice = format_choice.filter(|c| !c.eq_ignore_ascii_case(BUNDLE_EXTENSION));
    let incoming = load_upload(incoming_upload, "incoming", incoming_choice, encoding)?;

    let primary_key = form
        .field("primary_key")
        .map(str::to_string)
        .or_else(|| master.primary_key().map(str::to_string))
        .ok_or_else(|| WizardError::InvalidField("A primary key column is required".to_string()))?;
    master.set_primary_key(&primary_key).map_err(|_| {
        WizardError::InvalidField(format!(
            "The primary key column '{}' does not exist in the master file",
            primary_key
        ))
    })?;

    let options = RunOptions {
        cutoff: parse_count(form.field("cutoff"), 0, "Cutoff")?,
        max_candidates: parse_count(
            form.field("nresults"),
            DEFAULT_MAX_CANDIDATES as u32,
            "Number of results",
        )? as usize,
        output_format: match form.field("output_format") {
            Some(choice) => choice.parse::<OutputFormat>().map_err(|_| {
                WizardError::InvalidField(format!("Unsupported output format: {}", choice))
            })?,
            None => OutputFormat::default(),
        },
        output_encoding: TextEncoding::select(form.field("output_encoding"))
            .map_err(|e| WizardError::InvalidField(e.to_string()))?
            .key()
            .to_string(),
        line_ending: match form.field("line_endings") {
            Some(choice) => choice.parse::<LineEnding>().map_err(|_| {
                WizardError::InvalidField(format!("Unsupported line ending: {}", choice))
            })?,
            None => LineEnding::default(),
        },
        display_diff: form.flag("display_diff"),
        include_unmatched_records: form.flag("include_unmatched_records"),
        output_only_modified_entries: form.flag("output_only_modified_entries"),
        include_re_new_address_flag: form.flag("include_re_new_address_flag"),
    };

    tracing::debug!(
        master_records = master.len(),
        incoming_records = incoming.len(),
        mappings = profile.mappings.len(),
        primary_key = %primary_key,
        bundle = is_bundle,
        "Uploads accepted"
    );

    Ok(PreparedRun {
        master,
        incoming,
        profile,
        primary_key,
        options,
    })
}

/// Explicit supported choice, else UTF-8
fn input_encoding(choice: Option<&str>) -> TextEncoding {
    match choice.map(TextEncoding::from_key) {
        Some(Ok(encoding)) => encoding,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Falling back to UTF-8 input");
            TextEncoding::utf8()
        }
        None => TextEncoding::utf8(),
    }
}

fn load_upload(
    upload: &Upload,
    label: &str,
    format_choice: Option<&str>,
    encoding: TextEncoding,
) -> WizardResult<Source> {
    let format = InputFormat::select(format_choice, upload.filename.as_deref());
    load_source(&upload.bytes, format, encoding).map_err(|e| WizardError::input(label, e))
}

fn parse_count(value: Option<&str>, default: u32, label: &str) -> WizardResult<u32> {
    match value {
        None => Ok(default),
        Some(text) => text.parse::<u32>().map_err(|_| {
            WizardError::InvalidField(format!("{} must be a non-negative whole number", label))
        }),
    }
}
