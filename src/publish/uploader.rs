//! End-to-end APK upload orchestration.
//!
//! One run performs a strictly ordered sequence against a single edit:
//! open, enumerate existing binaries, upload new binaries (aborting on a
//! content-hash duplicate), upload mapping files, resolve expansion files,
//! assign the track release, commit, and reconcile an ambiguous commit.
//! Nothing is retried except that final reconciliation read.

use std::path::Path;

use crate::apk;
use crate::cli::OutputManager;
use crate::digest;
use crate::UploadConfig;
use crate::error::{ApiError, ApkError, CliError, PublishError, Result};
use crate::play::models::Track;
use crate::play::{DEOBFUSCATION_FILE_TYPE_PROGUARD, ExpansionFileType, PublishApi};

use super::edit::{self, EditSession};
use super::expansion::ExpansionFileResolver;
use super::release;

/// Outcome of one publish run.
///
/// Expected no-ops are distinct from failures: a duplicate binary or a
/// commit that could not be confirmed are unsuccessful but not erroneous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// All changes were committed and are live
    Applied {
        /// Version codes released in this run
        version_codes: Vec<i64>,
    },
    /// A binary with the same content hash already exists; nothing was staged
    DuplicateApk {
        /// The duplicated digest
        sha1: String,
    },
    /// The commit timed out and none of the uploads are visible on the server
    CommitUnconfirmed,
}

impl PublishOutcome {
    /// Whether the run left the requested changes live on Google Play.
    pub fn is_applied(&self) -> bool {
        matches!(self, PublishOutcome::Applied { .. })
    }
}

/// Drives one upload run against the publishing API.
pub struct ApkUploader<'a, A> {
    api: &'a A,
    config: &'a UploadConfig,
    output: &'a OutputManager,
}

impl<'a, A: PublishApi> ApkUploader<'a, A> {
    /// Creates an uploader over one configuration.
    pub fn new(api: &'a A, config: &'a UploadConfig, output: &'a OutputManager) -> Self {
        Self {
            api,
            config,
            output,
        }
    }

    /// Runs the full publish sequence once.
    pub async fn run(&self) -> Result<PublishOutcome> {
        let application_id = self.resolve_application_id()?;

        // Opening the edit doubles as a credential check; any failure here
        // aborts before anything is staged
        self.output.println(&format!(
            "Authenticating to Google Play API...\n- Application ID: {}\n",
            application_id
        ));
        let mut session = EditSession::new(self.api, &application_id);
        session.open().await?;
        let edit_id = session.edit_id().to_string();

        let existing_apks = session.list_existing_apks().await?;

        // Candidates for expansion-file reuse: everything the server knows,
        // plus the version codes named by the expansion configuration
        let mut existing_version_codes: Vec<i64> =
            existing_apks.iter().map(|apk| apk.version_code).collect();
        existing_version_codes.extend(self.config.expansion_files.keys().copied());

        self.output.println(&format!(
            "Uploading {} APK(s) with application ID: {}\n",
            self.config.apk_paths.len(),
            application_id
        ));

        let mut uploaded_version_codes = Vec::new();
        for apk_path in &self.config.apk_paths {
            let meta = apk::read_metadata(apk_path)?;
            if meta.package_name != application_id {
                return Err(ApkError::ApplicationIdMismatch {
                    path: apk_path.clone(),
                    expected: application_id.clone(),
                    found: meta.package_name,
                }
                .into());
            }

            let sha1 = digest::sha1_hex(apk_path)
                .await
                .map_err(|source| ApkError::Io {
                    path: apk_path.clone(),
                    source,
                })?;

            self.output
                .println(&format!("      APK file: {}", self.display_name(apk_path)));
            self.output.println(&format!("    SHA-1 hash: {}", sha1));
            self.output
                .println(&format!("   versionCode: {}", meta.version_code));
            self.output
                .println(&format!(" minSdkVersion: {}", meta.min_sdk_display()));

            // Uploading a binary the server already has would fail, so a
            // hash match ends the whole run as an expected no-op
            let duplicate = existing_apks.iter().any(|existing| {
                existing
                    .binary
                    .as_ref()
                    .and_then(|binary| binary.sha1.as_deref())
                    .is_some_and(|existing_sha1| existing_sha1.to_lowercase() == sha1)
            });
            if duplicate {
                self.output.println("");
                self.output.println(
                    "This APK already exists in the Google Play account; it cannot be uploaded again",
                );
                return Ok(PublishOutcome::DuplicateApk { sha1 });
            }

            let uploaded = self
                .api
                .upload_apk(&application_id, &edit_id, apk_path)
                .await?;
            uploaded_version_codes.push(uploaded.version_code);

            if let Some(mapping_path) = self.config.mapping_files.get(apk_path) {
                self.upload_mapping_file(&application_id, &edit_id, uploaded.version_code, mapping_path)
                    .await?;
            }
            self.output.println("");
        }

        if !self.config.expansion_files.is_empty() || self.config.reuse_expansion_files {
            let mut resolver = ExpansionFileResolver::new(
                self.api,
                &application_id,
                &edit_id,
                existing_version_codes,
            );
            for &version_code in &uploaded_version_codes {
                let file_set = self.config.expansion_files.get(&version_code);

                self.output.println(&format!(
                    "Handling expansion files for versionCode {}",
                    version_code
                ));
                for file_type in ExpansionFileType::ALL {
                    resolver
                        .apply(
                            version_code,
                            file_type,
                            file_set.and_then(|set| set.file_for(file_type)),
                            self.config.reuse_expansion_files,
                            self.output,
                        )
                        .await?;
                }
                self.output.println("");
            }
        }

        // Assign everything uploaded in this run to the configured track
        let notes = release::to_localized_text(self.config.release_notes.as_deref());
        let track_release =
            release::build_release(uploaded_version_codes.clone(), self.config.rollout_fraction, notes);
        let track = Track {
            track: self.config.track.clone(),
            releases: vec![track_release],
        };
        self.output.println(&format!(
            "Assigning {} version(s) to {} track with {}% rollout",
            uploaded_version_codes.len(),
            track.track,
            self.config.rollout_fraction * 100.0
        ));
        self.api
            .assign_track(&application_id, &edit_id, &track)
            .await?;

        self.output.println("Applying changes to Google Play...");
        match session.commit().await {
            Ok(()) => {}
            Err(PublishError::Api(ApiError::Timeout { .. })) => {
                // The API is prone to timing out on commit despite having
                // applied the changes server-side; re-read state through a
                // fresh edit before declaring the run unsuccessful
                self.output
                    .println("- An error occurred while applying changes: commit timed out");
                self.output
                    .println("- Checking whether the changes have been applied anyway...\n");

                let present =
                    edit::versions_now_present(self.api, &application_id, &uploaded_version_codes)
                        .await?;
                if present.is_empty() {
                    self.output
                        .println("The APKs that were uploaded were not found on Google Play");
                    self.output
                        .println("- No changes have been applied to the Google Play account");
                    return Ok(PublishOutcome::CommitUnconfirmed);
                }
            }
            Err(e) => return Err(e),
        }

        self.output
            .println("Changes were successfully applied to Google Play");
        Ok(PublishOutcome::Applied {
            version_codes: uploaded_version_codes,
        })
    }

    /// The application id: configured explicitly, or taken from the first APK.
    fn resolve_application_id(&self) -> Result<String> {
        if let Some(application_id) = &self.config.application_id {
            return Ok(application_id.clone());
        }
        let first = self
            .config
            .apk_paths
            .first()
            .ok_or_else(|| CliError::MissingArgument {
                argument: "APK".to_string(),
            })?;
        Ok(apk::read_metadata(first)?.package_name)
    }

    /// Uploads one mapping file, skipping empty ones the API would reject.
    async fn upload_mapping_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        mapping_path: &Path,
    ) -> Result<()> {
        let size = std::fs::metadata(mapping_path)
            .map_err(|source| ApkError::Io {
                path: mapping_path.to_path_buf(),
                source,
            })?
            .len();

        self.output
            .println(&format!(" Mapping file size: {}", size));
        if size == 0 {
            log::warn!(
                "skipping empty mapping file {}",
                mapping_path.display()
            );
            self.output.println(&format!(
                " Ignoring empty ProGuard mapping file: {}",
                self.display_name(mapping_path)
            ));
            return Ok(());
        }

        self.output.println(&format!(
            " Uploading associated ProGuard mapping file: {}",
            self.display_name(mapping_path)
        ));
        self.api
            .upload_deobfuscation_file(
                application_id,
                edit_id,
                version_code,
                DEOBFUSCATION_FILE_TYPE_PROGUARD,
                mapping_path,
            )
            .await?;
        Ok(())
    }

    /// Path for progress output, relative to the workspace root when set.
    fn display_name(&self, path: &Path) -> String {
        self.config
            .workspace_root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
