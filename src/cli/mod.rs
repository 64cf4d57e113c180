//! Command line interface for playship.
//!
//! Parses arguments, assembles the upload configuration, and maps the
//! publish outcome to an exit code: 0 applied, 1 expected no-op, 2 failure
//! (the failure path is handled in `main`).

mod args;
mod output;

pub use args::{Args, split_pair};
pub use output::OutputManager;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::UploadConfig;
use crate::error::{CliError, Result};
use crate::play::PlayClient;
use crate::publish::{ApkUploader, ExpansionFileSet, PublishOutcome, ReleaseNote};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let output = OutputManager::new(args.quiet);
    let config = build_config(&args).await?;
    let client = PlayClient::new(args.token.clone())?;

    let outcome = ApkUploader::new(&client, &config, &output).run().await?;
    match outcome {
        PublishOutcome::Applied { version_codes } => {
            output.success(&format!(
                "Released version code(s) {} to the {} track",
                version_codes
                    .iter()
                    .map(|vc| vc.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                config.track
            ));
            Ok(0)
        }
        PublishOutcome::DuplicateApk { .. } | PublishOutcome::CommitUnconfirmed => Ok(1),
    }
}

/// Builds the upload configuration from parsed arguments, reading release
/// note files from disk.
async fn build_config(args: &Args) -> Result<UploadConfig> {
    let mut mapping_files = HashMap::new();
    for raw in &args.mappings {
        let (apk, mapping) = match split_pair(raw) {
            Some((apk, mapping)) => (PathBuf::from(apk), PathBuf::from(mapping)),
            // validate() guarantees a single APK for the bare form
            None => (args.apks[0].clone(), PathBuf::from(raw)),
        };
        mapping_files.insert(apk, mapping);
    }

    let mut expansion_files: HashMap<i64, ExpansionFileSet> = HashMap::new();
    for (raw, main) in args
        .obb_main
        .iter()
        .map(|raw| (raw, true))
        .chain(args.obb_patch.iter().map(|raw| (raw, false)))
    {
        let (version_code, file) = split_pair(raw).ok_or_else(|| CliError::InvalidArguments {
            reason: format!("expansion file '{}' is not in VC=FILE form", raw),
        })?;
        let version_code: i64 =
            version_code
                .parse()
                .map_err(|_| CliError::InvalidArguments {
                    reason: format!("expansion file version code '{}' is not an integer", version_code),
                })?;

        let set = expansion_files.entry(version_code).or_default();
        if main {
            set.main = Some(PathBuf::from(file));
        } else {
            set.patch = Some(PathBuf::from(file));
        }
    }

    let mut release_notes = Vec::new();
    for raw in &args.release_notes {
        let (language, file) = split_pair(raw).ok_or_else(|| CliError::InvalidArguments {
            reason: format!("release notes '{}' are not in LANG=FILE form", raw),
        })?;
        let text = tokio::fs::read_to_string(file).await?;
        release_notes.push(ReleaseNote {
            language: language.to_string(),
            text,
        });
    }

    Ok(UploadConfig {
        application_id: args.application_id.clone(),
        apk_paths: args.apks.clone(),
        mapping_files,
        expansion_files,
        reuse_expansion_files: args.reuse_expansion_files,
        track: args.track.clone(),
        rollout_fraction: args.rollout / 100.0,
        release_notes: (!release_notes.is_empty()).then_some(release_notes),
        workspace_root: args.workspace.clone(),
    })
}
