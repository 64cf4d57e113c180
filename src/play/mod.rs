//! Google Play publishing API surface.
//!
//! The orchestration in [`crate::publish`] is written against the
//! [`PublishApi`] trait; [`PlayClient`] is the HTTP implementation. Tests
//! substitute an in-memory fake at the same seam.

mod client;
pub mod models;

pub use client::PlayClient;

use std::future::Future;
use std::path::Path;

use crate::error::ApiError;
use models::{Apk, AppEdit, ExpansionFile, Track};

/// Result type for individual API calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The two expansion file slots a version code can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionFileType {
    /// Primary expansion file
    Main,
    /// Patch expansion file
    Patch,
}

impl ExpansionFileType {
    /// Both slots, in the order they are applied.
    pub const ALL: [ExpansionFileType; 2] = [ExpansionFileType::Main, ExpansionFileType::Patch];

    /// The type tag used in API paths.
    pub fn as_str(self) -> &'static str {
        match self {
            ExpansionFileType::Main => "main",
            ExpansionFileType::Patch => "patch",
        }
    }
}

impl std::fmt::Display for ExpansionFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deobfuscation file type tag for ProGuard/R8 mapping files.
pub const DEOBFUSCATION_FILE_TYPE_PROGUARD: &str = "proguard";

/// Operations of the publishing API consumed by the upload flow.
///
/// Every mutating call references the edit opened by [`PublishApi::open_edit`];
/// nothing becomes visible until [`PublishApi::commit_edit`] succeeds.
pub trait PublishApi {
    /// Opens a new transactional edit for the application.
    fn open_edit(&self, application_id: &str) -> impl Future<Output = ApiResult<AppEdit>>;

    /// Lists the APKs the application currently has, normalized so that an
    /// absent list reads as empty.
    fn list_apks(
        &self,
        application_id: &str,
        edit_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<Apk>>>;

    /// Uploads an APK and returns it as acknowledged by the server.
    fn upload_apk(
        &self,
        application_id: &str,
        edit_id: &str,
        path: &Path,
    ) -> impl Future<Output = ApiResult<Apk>>;

    /// Uploads a deobfuscation file for one version code.
    fn upload_deobfuscation_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: &str,
        path: &Path,
    ) -> impl Future<Output = ApiResult<()>>;

    /// Reads one expansion file slot. A missing slot is reported by the
    /// server as HTTP 404, surfaced here as [`ApiError::Api`] with that
    /// status; callers treat it as "no file".
    fn get_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
    ) -> impl Future<Output = ApiResult<ExpansionFile>>;

    /// Uploads literal expansion file content into a slot.
    fn upload_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
        path: &Path,
    ) -> impl Future<Output = ApiResult<()>>;

    /// Overwrites a slot, e.g. with a reference to another version's file.
    fn update_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
        file: &ExpansionFile,
    ) -> impl Future<Output = ApiResult<()>>;

    /// Assigns releases to a named track within the edit.
    fn assign_track(
        &self,
        application_id: &str,
        edit_id: &str,
        track: &Track,
    ) -> impl Future<Output = ApiResult<()>>;

    /// Commits the edit, making all staged changes live.
    fn commit_edit(
        &self,
        application_id: &str,
        edit_id: &str,
    ) -> impl Future<Output = ApiResult<()>>;
}
