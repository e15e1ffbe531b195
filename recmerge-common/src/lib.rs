//! # recmerge Common Library
//!
//! Tabular collaborators for the reconciliation wizard:
//! - Source and record model
//! - Input/output formats, text encodings and line endings
//! - Matching profiles and the matcher seam
//! - Grouping of match results for review
//! - Pre-processed master bundles

pub mod bundle;
pub mod encoding;
pub mod error;
pub mod format;
pub mod grouping;
pub mod matcher;
pub mod profile;
pub mod source;
pub mod tabular;

pub use error::{Error, Result};
pub use format::{InputFormat, LineEnding, OutputFormat};
pub use grouping::{group_results, MatchGroup};
pub use matcher::{MatchResult, Matcher, ProfileMatcher};
pub use profile::{Comparison, Mapping, Profile};
pub use source::{Record, Source};
