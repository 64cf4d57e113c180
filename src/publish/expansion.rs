//! Expansion file resolution.
//!
//! For each newly uploaded version code and each of the two file types, the
//! resolver either uploads an explicitly supplied file, references the latest
//! previously uploaded file of that type (when reuse is enabled), or does
//! nothing. The "latest version with an expansion file" lookup walks the
//! pre-existing version codes newest-first and is computed at most once per
//! run, per type.

use std::path::{Path, PathBuf};

use crate::cli::OutputManager;
use crate::error::{ApiError, Result};
use crate::play::models::ExpansionFile;
use crate::play::{ExpansionFileType, PublishApi};

/// Local expansion files configured for one version code.
#[derive(Debug, Clone, Default)]
pub struct ExpansionFileSet {
    /// Main expansion file, if supplied
    pub main: Option<PathBuf>,
    /// Patch expansion file, if supplied
    pub patch: Option<PathBuf>,
}

impl ExpansionFileSet {
    /// The configured file for one slot.
    pub fn file_for(&self, file_type: ExpansionFileType) -> Option<&Path> {
        match file_type {
            ExpansionFileType::Main => self.main.as_deref(),
            ExpansionFileType::Patch => self.patch.as_deref(),
        }
    }
}

/// Latest pre-existing version codes carrying each expansion file type.
/// Computed lazily, once per orchestration run.
#[derive(Debug, Clone, Copy)]
struct LatestExpansionVersions {
    main: Option<i64>,
    patch: Option<i64>,
}

/// Decides and applies the expansion file action for uploaded version codes.
pub struct ExpansionFileResolver<'a, A> {
    api: &'a A,
    application_id: &'a str,
    edit_id: &'a str,
    /// Version codes known before this run, for reuse lookups
    existing_version_codes: Vec<i64>,
    latest: Option<LatestExpansionVersions>,
}

impl<'a, A: PublishApi> ExpansionFileResolver<'a, A> {
    /// Creates a resolver scoped to one open edit.
    ///
    /// `existing_version_codes` are the version codes known before this run
    /// started; only those are candidates for reuse.
    pub fn new(
        api: &'a A,
        application_id: &'a str,
        edit_id: &'a str,
        existing_version_codes: Vec<i64>,
    ) -> Self {
        Self {
            api,
            application_id,
            edit_id,
            existing_version_codes,
            latest: None,
        }
    }

    /// Applies the expansion file action for one (version code, type) slot:
    /// upload the supplied file, reference the latest previous one when reuse
    /// is enabled, or do nothing.
    pub async fn apply(
        &mut self,
        version_code: i64,
        file_type: ExpansionFileType,
        file: Option<&Path>,
        use_previous_if_missing: bool,
        output: &OutputManager,
    ) -> Result<()> {
        // An explicitly supplied file always wins
        if let Some(file) = file {
            output.println(&format!(
                "- Uploading new {} expansion file: {}",
                file_type,
                file.display()
            ));
            self.api
                .upload_expansion_file(
                    self.application_id,
                    self.edit_id,
                    version_code,
                    file_type,
                    file,
                )
                .await?;
            return Ok(());
        }

        if use_previous_if_missing {
            let latest = self.latest_version_with(file_type).await?;

            let Some(latest) = latest else {
                output.println(&format!(
                    "- No {0} expansion file to apply, and no existing APK with a {0} expansion file was found",
                    file_type
                ));
                return Ok(());
            };

            output.println(&format!(
                "- Applying {} expansion file from previous APK: {}",
                file_type, latest
            ));
            self.api
                .update_expansion_file(
                    self.application_id,
                    self.edit_id,
                    version_code,
                    file_type,
                    &ExpansionFile::reference_to(latest),
                )
                .await?;
            return Ok(());
        }

        output.println(&format!("- No {} expansion file to apply", file_type));
        Ok(())
    }

    /// The newest pre-existing version code with an expansion file of this
    /// type. Both types are resolved on first use and cached for the rest of
    /// the run.
    async fn latest_version_with(&mut self, file_type: ExpansionFileType) -> Result<Option<i64>> {
        let latest = match self.latest {
            Some(latest) => latest,
            None => {
                // Newest first, so the first hit is the latest
                self.existing_version_codes.sort_unstable();
                self.existing_version_codes.reverse();

                let resolved = LatestExpansionVersions {
                    main: self.find_latest(ExpansionFileType::Main).await?,
                    patch: self.find_latest(ExpansionFileType::Patch).await?,
                };
                self.latest = Some(resolved);
                resolved
            }
        };

        Ok(match file_type {
            ExpansionFileType::Main => latest.main,
            ExpansionFileType::Patch => latest.patch,
        })
    }

    /// Walks the existing version codes newest-first for one file type.
    /// A slot holding literal content wins as-is; a slot holding a reference
    /// resolves to the referenced version code, not the intermediate one.
    async fn find_latest(&self, file_type: ExpansionFileType) -> Result<Option<i64>> {
        for &version_code in &self.existing_version_codes {
            let Some(file) = self.expansion_file(version_code, file_type).await? else {
                continue;
            };
            if file.file_size.is_some_and(|size| size > 0) {
                return Ok(Some(version_code));
            }
            if let Some(referenced) = file.references_version.filter(|vc| *vc > 0) {
                return Ok(Some(referenced));
            }
        }
        Ok(None)
    }

    /// Reads one expansion file slot, mapping the server's 404 to `None`.
    async fn expansion_file(
        &self,
        version_code: i64,
        file_type: ExpansionFileType,
    ) -> Result<Option<ExpansionFile>> {
        match self
            .api
            .get_expansion_file(self.application_id, self.edit_id, version_code, file_type)
            .await
        {
            Ok(file) => Ok(Some(file)),
            Err(ApiError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
