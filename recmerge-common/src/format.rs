//! Supported input/output formats and line-ending conventions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Extension of a pre-processed master bundle
pub const BUNDLE_EXTENSION: &str = "recmaster";

/// Formats a source can be loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Tsv,
    Json,
}

impl InputFormat {
    pub const ALL: [InputFormat; 3] = [InputFormat::Csv, InputFormat::Tsv, InputFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Tsv => "tsv",
            InputFormat::Json => "json",
        }
    }

    /// Guess the format from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(InputFormat::Csv),
            "tsv" | "tab" => Some(InputFormat::Tsv),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }

    /// Pick the input format for an upload
    ///
    /// An explicit choice wins when it names a supported format; otherwise the
    /// filename extension decides, defaulting to CSV.
    pub fn select(choice: Option<&str>, filename: Option<&str>) -> Self {
        choice
            .and_then(|c| c.parse().ok())
            .or_else(|| filename.and_then(Self::from_filename))
            .unwrap_or(InputFormat::Csv)
    }
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "tsv" => Ok(InputFormat::Tsv),
            "json" => Ok(InputFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a source can be written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Csv, OutputFormat::Tsv, OutputFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    /// Filename extension used for downloads
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line terminator used when writing output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// CRLF
    #[default]
    Windows,
    /// LF
    Unix,
    /// CR
    Mac,
}

impl LineEnding {
    pub const ALL: [LineEnding; 3] = [LineEnding::Windows, LineEnding::Unix, LineEnding::Mac];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Windows => "windows",
            LineEnding::Unix => "unix",
            LineEnding::Mac => "mac",
        }
    }

    pub fn terminator(&self) -> &'static str {
        match self {
            LineEnding::Windows => "\r\n",
            LineEnding::Unix => "\n",
            LineEnding::Mac => "\r",
        }
    }

    pub fn csv_terminator(&self) -> csv::Terminator {
        match self {
            LineEnding::Windows => csv::Terminator::CRLF,
            LineEnding::Unix => csv::Terminator::Any(b'\n'),
            LineEnding::Mac => csv::Terminator::Any(b'\r'),
        }
    }
}

impl FromStr for LineEnding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "crlf" => Ok(LineEnding::Windows),
            "unix" | "lf" => Ok(LineEnding::Unix),
            "mac" | "cr" => Ok(LineEnding::Mac),
            other => Err(Error::Parse(format!("Unknown line ending: {}", other))),
        }
    }
}

/// True when `filename` names a pre-processed master bundle
pub fn is_bundle_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_supported_explicit_choice() {
        assert_eq!(InputFormat::select(Some("tsv"), Some("data.csv")), InputFormat::Tsv);
        assert_eq!(InputFormat::select(Some("JSON"), None), InputFormat::Json);
    }

    #[test]
    fn test_select_falls_back_to_extension_then_csv() {
        assert_eq!(InputFormat::select(Some("xlsx"), Some("data.json")), InputFormat::Json);
        assert_eq!(InputFormat::select(None, Some("DATA.TAB")), InputFormat::Tsv);
        assert_eq!(InputFormat::select(None, Some("data.dat")), InputFormat::Csv);
        assert_eq!(InputFormat::select(Some(""), None), InputFormat::Csv);
    }

    #[test]
    fn test_line_ending_parse() {
        assert_eq!("unix".parse::<LineEnding>().unwrap(), LineEnding::Unix);
        assert_eq!("CRLF".parse::<LineEnding>().unwrap(), LineEnding::Windows);
        assert!("dos".parse::<LineEnding>().is_err());
        assert_eq!(LineEnding::default().terminator(), "\r\n");
    }

    #[test]
    fn test_bundle_filename() {
        assert!(is_bundle_filename("donors.recmaster"));
        assert!(is_bundle_filename("DONORS.RECMASTER"));
        assert!(!is_bundle_filename("donors.csv"));
        assert!(!is_bundle_filename("recmaster"));
    }
}
