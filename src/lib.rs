//! # playship
//!
//! Publish Android APKs to Google Play from a CI build.
//!
//! One run opens a transactional edit against the Google Play Developer
//! Publishing API, uploads binaries with their ProGuard mapping and
//! expansion files, assigns the uploaded version codes to a release track,
//! and commits the edit. The known commit-timeout flakiness of the API is
//! reconciled by re-reading server state through a fresh edit.
//!
//! ## Usage
//!
//! ```bash
//! playship app-release.apk                         # full rollout to production
//! playship --track beta --rollout 25 app.apk       # staged rollout to beta
//! playship --reuse-expansion-files app.apk         # keep the previous OBBs
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod apk;
pub mod cli;
pub mod digest;
pub mod error;
pub mod play;
pub mod publish;

// Re-export main types for public API
pub use apk::ApkMeta;
pub use cli::OutputManager;
pub use error::{ApiError, ApkError, CliError, PublishError, Result};
pub use play::{ExpansionFileType, PlayClient, PublishApi};
pub use publish::{ApkUploader, EditSession, ExpansionFileSet, PublishOutcome, ReleaseNote};

use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration of one upload run
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Application ID; taken from the first APK when `None`
    pub application_id: Option<String>,
    /// APK files to upload, in upload order
    pub apk_paths: Vec<PathBuf>,
    /// ProGuard mapping files keyed by the APK they belong to
    pub mapping_files: HashMap<PathBuf, PathBuf>,
    /// Expansion files keyed by version code
    pub expansion_files: HashMap<i64, ExpansionFileSet>,
    /// Reference the previous expansion files for versions that bring none
    pub reuse_expansion_files: bool,
    /// Release track to assign the upload to
    pub track: String,
    /// Fraction of users to roll out to; outside (0, 1) the release completes
    pub rollout_fraction: f64,
    /// Localized release notes
    pub release_notes: Option<Vec<ReleaseNote>>,
    /// Paths are displayed relative to this root
    pub workspace_root: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            apk_paths: Vec::new(),
            mapping_files: HashMap::new(),
            expansion_files: HashMap::new(),
            reuse_expansion_files: false,
            track: "production".to_string(),
            rollout_fraction: 1.0,
            release_notes: None,
            workspace_root: None,
        }
    }
}
