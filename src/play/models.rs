//! Wire models for the androidpublisher v3 REST surface.
//!
//! Field names follow the service's camelCase JSON. Per the Google JSON
//! conventions, `int64` fields travel as decimal strings; the [`i64_string`]
//! codecs below handle that.

use serde::{Deserialize, Serialize};

/// A server-side transactional edit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEdit {
    /// Opaque edit identifier; every mutating call references it
    pub id: String,
    /// Epoch seconds at which the server abandons the edit
    #[serde(default)]
    pub expiry_time_seconds: Option<String>,
}

/// An APK known to the server within an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apk {
    /// Version code assigned by the manifest
    pub version_code: i64,
    /// Content digests of the binary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<ApkBinary>,
}

/// Content digests of an uploaded binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApkBinary {
    /// Lower-case hex SHA-1 digest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    /// Lower-case hex SHA-256 digest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Response of the APK list call. The server may omit the list entirely
/// when the application has no binaries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApksListResponse {
    /// Existing APKs; absent means none
    #[serde(default)]
    pub apks: Option<Vec<Apk>>,
}

/// An expansion file slot of one version code. Exactly one of the two
/// fields is populated: either literal content with a size, or a reference
/// to another version code's file of the same type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionFile {
    /// Byte size of literal content
    #[serde(
        default,
        with = "i64_string::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_size: Option<i64>,
    /// Version code whose same-type file this slot references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references_version: Option<i64>,
}

impl ExpansionFile {
    /// A slot pointing at another version code's file.
    pub fn reference_to(version_code: i64) -> Self {
        Self {
            file_size: None,
            references_version: Some(version_code),
        }
    }
}

/// Response of the expansion file upload call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionFilesUploadResponse {
    /// State of the slot after the upload
    #[serde(default)]
    pub expansion_file: Option<ExpansionFile>,
}

/// A localized release-note entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    /// BCP-47 language tag as used by the Play Console
    pub language: String,
    /// Localized text
    pub text: String,
}

/// Rollout status of a track release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    /// Fully rolled out
    Completed,
    /// Staged rollout at `user_fraction`
    InProgress,
}

/// One release assigned to a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    /// Version codes in this release
    #[serde(with = "i64_string::vec")]
    pub version_codes: Vec<i64>,
    /// Fraction of users receiving the release; only set while in progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_fraction: Option<f64>,
    /// Rollout status
    pub status: ReleaseStatus,
    /// Localized release notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<Vec<LocalizedText>>,
}

/// Track assignment payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Track name, e.g. `production` or `beta`
    pub track: String,
    /// Releases on the track
    pub releases: Vec<TrackRelease>,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// The error envelope
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// Error envelope with a status code and message list.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Numeric status code
    #[serde(default)]
    pub code: Option<u16>,
    /// Top-level message
    #[serde(default)]
    pub message: Option<String>,
    /// Individual error entries
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// One entry of the error list.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Collects every distinct human-readable message in the body.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if let Some(body) = &self.error {
            for detail in &body.errors {
                if let Some(message) = &detail.message {
                    messages.push(message.clone());
                }
            }
            if let Some(message) = &body.message
                && !messages.contains(message)
            {
                messages.push(message.clone());
            }
        }
        messages
    }
}

/// Serde codecs for Google's int64-as-decimal-string JSON convention.
pub mod i64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    /// `Option<i64>` as an optional decimal string.
    pub mod option {
        use super::*;

        /// Serializes `Some(n)` as `"n"`.
        pub fn serialize<S: Serializer>(
            value: &Option<i64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(n) => serializer.serialize_str(&n.to_string()),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes `"n"` (or a bare number) as `Some(n)`.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<i64>, D::Error> {
            let value = Option::<super::StringOrNumber>::deserialize(deserializer)?;
            value.map(super::StringOrNumber::into_i64).transpose()
        }
    }

    /// `Vec<i64>` as a list of decimal strings.
    pub mod vec {
        use super::*;

        /// Serializes each element as a decimal string.
        pub fn serialize<S: Serializer>(value: &[i64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(value.iter().map(|n| n.to_string()))
        }

        /// Deserializes a list of decimal strings (or bare numbers).
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<i64>, D::Error> {
            let values = Vec::<StringOrNumber>::deserialize(deserializer)?;
            values.into_iter().map(StringOrNumber::into_i64).collect()
        }
    }

    /// Accepts both encodings; some API surfaces send bare numbers.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    impl StringOrNumber {
        fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
            match self {
                StringOrNumber::String(s) => s
                    .parse()
                    .map_err(|_| E::custom(format!("invalid int64 string '{}'", s))),
                StringOrNumber::Number(n) => Ok(n),
            }
        }
    }
}
