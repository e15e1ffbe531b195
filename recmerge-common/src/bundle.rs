//! Pre-processed master bundles
//!
//! A bundle carries a master source together with the profile used to match
//! against it, so regular imports only upload the incoming file. Stored as
//! JSON with the `.recmaster` extension.

use serde::{Deserialize, Serialize};

use crate::{Error, Profile, Result, Source};

/// Current bundle layout version
pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterBundle {
    pub version: u32,
    /// Master records; may carry a primary key
    pub source: Source,
    pub profile: Profile,
}

impl MasterBundle {
    pub fn new(source: Source, profile: Profile) -> Self {
        Self {
            version: BUNDLE_VERSION,
            source,
            profile,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bundle: MasterBundle = serde_json::from_slice(bytes)?;
        if bundle.version != BUNDLE_VERSION {
            return Err(Error::Parse(format!(
                "Unsupported master bundle version {} (expected {})",
                bundle.version, BUNDLE_VERSION
            )));
        }
        Ok(bundle)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::format::InputFormat;
    use crate::tabular::load_source;

    #[test]
    fn test_bundle_keeps_primary_key_and_profile() {
        let mut source = load_source(b"ID,Name\nM1,Ada\n", InputFormat::Csv, TextEncoding::utf8())
            .unwrap();
        source.set_primary_key("ID").unwrap();
        let profile_source =
            load_source(b"Key,Master Key\nName,Name\n", InputFormat::Csv, TextEncoding::utf8())
                .unwrap();
        let profile = Profile::from_source(&profile_source).unwrap();

        let bytes = MasterBundle::new(source, profile).to_bytes().unwrap();
        let loaded = MasterBundle::from_bytes(&bytes).unwrap();

        assert_eq!(loaded.source.primary_key(), Some("ID"));
        assert_eq!(loaded.profile.mappings.len(), 1);
    }

    #[test]
    fn test_rejects_unknown_version_and_garbage() {
        let bundle = MasterBundle {
            version: 99,
            source: Source::default(),
            profile: Profile::default(),
        };
        let bytes = serde_json::to_vec(&bundle).unwrap();
        assert!(matches!(MasterBundle::from_bytes(&bytes), Err(Error::Parse(_))));
        assert!(matches!(MasterBundle::from_bytes(b"ID,Name"), Err(Error::Json(_))));
    }
}
