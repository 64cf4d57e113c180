//! Command line argument parsing and validation.
//!
//! Associations use `key=value` syntax: mapping files are keyed by the APK
//! path they belong to, expansion files by version code, release notes by
//! language tag.

use std::path::PathBuf;

use clap::Parser;

use crate::publish::is_valid_language_tag;

/// Publish Android APKs to Google Play
#[derive(Parser, Debug)]
#[command(
    name = "playship",
    version,
    about = "Publish Android APKs to Google Play",
    long_about = "Upload APKs with their ProGuard mapping and expansion files, \
assign them to a release track with a rollout percentage and release notes, \
and commit the change.

Usage:
  playship app-release.apk
  playship --track beta --rollout 25 app-release.apk
  playship --mapping app-release.apk=mapping.txt --release-notes en-US=notes.txt app-release.apk"
)]
pub struct Args {
    /// APK files to upload, in upload order
    #[arg(value_name = "APK", required = true)]
    pub apks: Vec<PathBuf>,

    /// Application ID; taken from the first APK when omitted
    #[arg(long, value_name = "ID")]
    pub application_id: Option<String>,

    /// Release track to assign the upload to
    #[arg(long, default_value = "production", value_name = "TRACK")]
    pub track: String,

    /// Percentage of users to roll out to (100 completes the rollout)
    #[arg(long, default_value_t = 100.0, value_name = "PERCENT")]
    pub rollout: f64,

    /// ProGuard mapping file, as APK=FILE (bare FILE with a single APK)
    #[arg(long = "mapping", value_name = "APK=FILE")]
    pub mappings: Vec<String>,

    /// Main expansion file, as VERSIONCODE=FILE
    #[arg(long = "obb-main", value_name = "VC=FILE")]
    pub obb_main: Vec<String>,

    /// Patch expansion file, as VERSIONCODE=FILE
    #[arg(long = "obb-patch", value_name = "VC=FILE")]
    pub obb_patch: Vec<String>,

    /// Reference the previous expansion files for versions that bring none
    #[arg(long)]
    pub reuse_expansion_files: bool,

    /// Release notes, as LANG=FILE; the file holds the localized text
    #[arg(long = "release-notes", value_name = "LANG=FILE")]
    pub release_notes: Vec<String>,

    /// OAuth2 access token with the androidpublisher scope
    #[arg(long, env = "PLAY_API_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: String,

    /// Workspace root; file paths are shown relative to it
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.rollout) {
            return Err(format!(
                "rollout must be between 0 and 100, got {}",
                self.rollout
            ));
        }

        for raw in &self.mappings {
            match split_pair(raw) {
                Some((apk, _)) => {
                    if !self.apks.iter().any(|p| p == &PathBuf::from(apk)) {
                        return Err(format!(
                            "--mapping refers to '{}', which is not among the APKs to upload",
                            apk
                        ));
                    }
                }
                None if self.apks.len() == 1 => {}
                None => {
                    return Err(format!(
                        "--mapping '{}' needs the APK=FILE form when uploading more than one APK",
                        raw
                    ));
                }
            }
        }

        for raw in self.obb_main.iter().chain(&self.obb_patch) {
            let Some((version_code, _)) = split_pair(raw) else {
                return Err(format!("expansion file '{}' is not in VC=FILE form", raw));
            };
            if version_code.parse::<i64>().is_err() {
                return Err(format!(
                    "expansion file version code '{}' is not an integer",
                    version_code
                ));
            }
        }

        for raw in &self.release_notes {
            let Some((language, _)) = split_pair(raw) else {
                return Err(format!("release notes '{}' are not in LANG=FILE form", raw));
            };
            if !is_valid_language_tag(language) {
                return Err(format!(
                    "'{}' is not a language tag Google Play accepts",
                    language
                ));
            }
        }

        Ok(())
    }
}

/// Splits `key=value` at the first `=`.
pub fn split_pair(raw: &str) -> Option<(&str, &str)> {
    raw.split_once('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["playship", "--token", "t"];
        argv.extend_from_slice(extra);
        argv.push("app.apk");
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = base_args(&[]).expect("Failed to parse");
        assert_eq!(args.track, "production");
        assert_eq!(args.rollout, 100.0);
        assert!(!args.reuse_expansion_files);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_rollout_bounds() {
        let args = base_args(&["--rollout", "250"]).expect("Failed to parse");
        assert!(args.validate().is_err());

        let args = base_args(&["--rollout", "25"]).expect("Failed to parse");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_bare_mapping_needs_single_apk() {
        let args = Args::try_parse_from([
            "playship", "--token", "t", "--mapping", "mapping.txt", "a.apk", "b.apk",
        ])
        .expect("Failed to parse");
        assert!(args.validate().is_err());

        let args = base_args(&["--mapping", "mapping.txt"]).expect("Failed to parse");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_mapping_must_reference_listed_apk() {
        let args = base_args(&["--mapping", "other.apk=mapping.txt"]).expect("Failed to parse");
        assert!(args.validate().is_err());

        let args = base_args(&["--mapping", "app.apk=mapping.txt"]).expect("Failed to parse");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_expansion_version_code_must_be_integer() {
        let args = base_args(&["--obb-main", "abc=main.obb"]).expect("Failed to parse");
        assert!(args.validate().is_err());

        let args = base_args(&["--obb-main", "42=main.obb"]).expect("Failed to parse");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_release_notes_language_validation() {
        let args = base_args(&["--release-notes", "english=notes.txt"]).expect("Failed to parse");
        assert!(args.validate().is_err());

        let args = base_args(&["--release-notes", "en-US=notes.txt"]).expect("Failed to parse");
        assert!(args.validate().is_ok());
    }
}
