//! Profile export/import encoding
//!
//! An exported profile is a versioned JSON envelope, base64 encoded so it
//! survives being pasted or uploaded as a plain text file.

use crate::profile::Profile;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Version of the export format
const EXPORT_FORMAT_VERSION: u32 = 1;

/// Exported profile envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileExport {
    /// Format version for future compatibility
    pub version: u32,
    /// The exported profile
    pub profile: Profile,
}

/// Error type for export/import operations
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Payload is not valid base64
    #[error("Invalid export encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid format version
    #[error("Unsupported export format version: {0}")]
    UnsupportedVersion(u32),
    /// Exported profile carries no token
    #[error("Exported profile has an empty token")]
    MissingToken,
}

/// Encode a profile into its export representation
///
/// # Errors
/// Returns an error if the profile cannot be serialized
pub fn encode_profile(profile: &Profile) -> Result<String, ExportError> {
    let export = ProfileExport {
        version: EXPORT_FORMAT_VERSION,
        profile: profile.clone(),
    };
    let json = serde_json::to_vec(&export)?;
    Ok(STANDARD.encode(json))
}

/// Decode a profile from its export representation
///
/// Surrounding whitespace (a trailing newline from an editor, say) is ignored.
///
/// # Errors
/// Returns an error if the data is not a valid export
pub fn decode_profile(data: &str) -> Result<Profile, ExportError> {
    let bytes = STANDARD.decode(data.trim())?;
    let export: ProfileExport = serde_json::from_slice(&bytes)?;

    if export.version > EXPORT_FORMAT_VERSION {
        return Err(ExportError::UnsupportedVersion(export.version));
    }
    if export.profile.token.is_empty() {
        return Err(ExportError::MissingToken);
    }

    Ok(export.profile)
}
