//! Upload and edit orchestration against the Google Play publishing API.
//!
//! The pieces compose top-down: [`ApkUploader`] drives one publish run,
//! [`EditSession`] owns the remote edit transaction, and
//! [`ExpansionFileResolver`] decides the per-version expansion file action.
//! [`build_release`] is the pure payload transform.

mod edit;
mod expansion;
mod release;
mod uploader;

pub use edit::{EditSession, versions_now_present};
pub use expansion::{ExpansionFileResolver, ExpansionFileSet};
pub use release::{ReleaseNote, build_release, is_valid_language_tag, to_localized_text};
pub use uploader::{ApkUploader, PublishOutcome};
