//! Local APK inspection.
//!
//! An APK is a ZIP archive with a compiled `AndroidManifest.xml` at its root.
//! This module extracts the manifest and surfaces the metadata the publishing
//! flow needs, without any network access.

mod axml;

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use zip::ZipArchive;

use crate::error::ApkError;

/// Archive entry holding the compiled manifest.
const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Metadata of a local APK file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkMeta {
    /// Application id (`package` in the manifest)
    pub package_name: String,
    /// `android:versionCode`, unique per application
    pub version_code: i64,
    /// Human-readable `android:versionName`, if declared
    pub version_name: Option<String>,
    /// Declared `android:minSdkVersion`, if any
    pub min_sdk_version: Option<String>,
}

impl ApkMeta {
    /// minSdkVersion for display; Android treats an undeclared value as 1.
    pub fn min_sdk_display(&self) -> &str {
        self.min_sdk_version.as_deref().unwrap_or("1")
    }
}

/// Reads the metadata of the APK at `path`.
pub fn read_metadata(path: &Path) -> Result<ApkMeta, ApkError> {
    let file = File::open(path).map_err(|source| ApkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut archive = ZipArchive::new(file).map_err(|source| ApkError::NotAnArchive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut manifest = Vec::new();
    {
        let mut entry = match archive.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ApkError::MissingManifest {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ApkError::NotAnArchive {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        entry
            .read_to_end(&mut manifest)
            .map_err(|source| ApkError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }

    let info = axml::parse_manifest(&manifest).map_err(|e| ApkError::Manifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(ApkMeta {
        package_name: info.package_name,
        version_code: info.version_code,
        version_name: info.version_name,
        min_sdk_version: info.min_sdk_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_read_metadata_rejects_non_archive() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"this is not a zip file").expect("Failed to write");

        let err = read_metadata(file.path()).unwrap_err();
        assert!(matches!(err, ApkError::NotAnArchive { .. }));
    }

    #[test]
    fn test_read_metadata_rejects_missing_file() {
        let err = read_metadata(Path::new("/does/not/exist.apk")).unwrap_err();
        assert!(matches!(err, ApkError::Io { .. }));
    }

    #[test]
    fn test_read_metadata_requires_manifest_entry() {
        let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let mut writer = zip::ZipWriter::new(file.reopen().expect("Failed to reopen"));
        writer
            .start_file("classes.dex", zip::write::SimpleFileOptions::default())
            .expect("Failed to start entry");
        writer.write_all(b"dex").expect("Failed to write entry");
        writer.finish().expect("Failed to finish zip");

        let err = read_metadata(file.path()).unwrap_err();
        assert!(matches!(err, ApkError::MissingManifest { .. }));
    }

    #[test]
    fn test_min_sdk_display_defaults_to_one() {
        let meta = ApkMeta {
            package_name: "com.example".to_string(),
            version_code: 1,
            version_name: None,
            min_sdk_version: None,
        };
        assert_eq!(meta.min_sdk_display(), "1");
    }
}
