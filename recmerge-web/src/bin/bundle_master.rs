//! recmerge-bundle - pre-process a master file and its profile into a bundle
//!
//! The resulting `.recmaster` file can be uploaded as the master on its own;
//! it already carries the matching profile and primary key.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use recmerge_common::bundle::MasterBundle;
use recmerge_common::encoding::TextEncoding;
use recmerge_common::format::BUNDLE_EXTENSION;
use recmerge_common::tabular::load_source;
use recmerge_common::{InputFormat, Profile, Source};

#[derive(Parser, Debug)]
#[command(name = "recmerge-bundle")]
#[command(about = "Build a pre-processed master bundle for the recmerge wizard")]
#[command(version)]
struct Args {
    /// Master data file
    #[arg(long)]
    master: PathBuf,

    /// Matching profile
    #[arg(long)]
    profile: PathBuf,

    /// Master column holding the record id
    #[arg(long)]
    primary_key: String,

    /// csv, tsv or json (default: from each file's extension)
    #[arg(long)]
    input_format: Option<String>,

    /// Encoding of both input files
    #[arg(long, default_value = "utf-8")]
    input_encoding: String,

    /// Bundle to write
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let encoding = TextEncoding::from_key(&args.input_encoding)
        .with_context(|| format!("Unsupported input encoding '{}'", args.input_encoding))?;
    let format_choice = args.input_format.as_deref();
    if let Some(choice) = format_choice {
        choice
            .parse::<InputFormat>()
            .with_context(|| format!("Unsupported input format '{}'", choice))?;
    }

    let mut master = read_source(&args.master, format_choice, encoding)?;
    master
        .set_primary_key(&args.primary_key)
        .with_context(|| format!("Primary key '{}' is not a master column", args.primary_key))?;

    let profile_source = read_source(&args.profile, format_choice, encoding)?;
    let profile = Profile::from_source(&profile_source)
        .with_context(|| format!("Invalid profile {}", args.profile.display()))?;
    if profile.mappings.is_empty() {
        bail!("Profile {} has no mappings", args.profile.display());
    }

    let records = master.len();
    let mappings = profile.mappings.len();
    let bytes = MasterBundle::new(master, profile).to_bytes()?;

    let output = with_bundle_extension(&args.output);
    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        records,
        mappings,
        "Wrote {} ({} bytes)",
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn read_source(path: &Path, format_choice: Option<&str>, encoding: TextEncoding) -> Result<Source> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    let format = InputFormat::select(format_choice, filename);
    load_source(&bytes, format, encoding).with_context(|| format!("Failed to parse {}", path.display()))
}

fn with_bundle_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(BUNDLE_EXTENSION) {
        path.to_path_buf()
    } else {
        path.with_extension(BUNDLE_EXTENSION)
    }
}
