//! Track release assembly.
//!
//! Turns the version codes uploaded in one run, the configured rollout
//! fraction and the release notes into the track release payload. The API
//! distinguishes a staged rollout from a full release by the presence of the
//! fraction field, so the fraction must be absent (not zero) outside (0, 1).

use std::sync::OnceLock;

use regex::Regex;

use crate::play::models::{LocalizedText, ReleaseStatus, TrackRelease};

/// Language tags accepted by the Play Console for localized text.
const LANGUAGE_TAG_PATTERN: &str = "^[a-z]{2,3}([-_][0-9A-Z]{2,})?$";

/// One localized release-note entry as configured by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNote {
    /// BCP-47 language tag, e.g. `en-US`
    pub language: String,
    /// Localized text shown in the store listing
    pub text: String,
}

/// Whether `tag` is a language tag the Play Console accepts.
pub fn is_valid_language_tag(tag: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(LANGUAGE_TAG_PATTERN).expect("language tag pattern is valid"))
        .is_match(tag)
}

/// Converts configured release notes into the wire representation.
/// `None` in yields `None` out; the notes are carried through unchanged.
pub fn to_localized_text(notes: Option<&[ReleaseNote]>) -> Option<Vec<LocalizedText>> {
    notes.map(|notes| {
        notes
            .iter()
            .map(|note| LocalizedText {
                language: note.language.clone(),
                text: note.text.clone(),
            })
            .collect()
    })
}

/// Builds the release payload for one track assignment.
///
/// A fraction strictly between 0 and 1 yields an in-progress staged rollout
/// carrying that fraction; any other value (including exactly 0 and exactly 1)
/// yields a completed release with the fraction omitted entirely.
pub fn build_release(
    version_codes: Vec<i64>,
    rollout_fraction: f64,
    release_notes: Option<Vec<LocalizedText>>,
) -> TrackRelease {
    let staged = rollout_fraction > 0.0 && rollout_fraction < 1.0;

    TrackRelease {
        version_codes,
        user_fraction: staged.then_some(rollout_fraction),
        status: if staged {
            ReleaseStatus::InProgress
        } else {
            ReleaseStatus::Completed
        },
        release_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_fraction_is_staged_rollout() {
        for fraction in [0.001, 0.05, 0.25, 0.5, 0.999] {
            let release = build_release(vec![42], fraction, None);
            assert_eq!(release.status, ReleaseStatus::InProgress);
            assert_eq!(release.user_fraction, Some(fraction));
        }
    }

    #[test]
    fn test_boundary_fractions_complete_without_fraction() {
        for fraction in [0.0, 1.0] {
            let release = build_release(vec![42], fraction, None);
            assert_eq!(release.status, ReleaseStatus::Completed);
            assert_eq!(release.user_fraction, None);
        }
    }

    #[test]
    fn test_out_of_range_fractions_complete_without_fraction() {
        for fraction in [-0.5, 1.5, 100.0] {
            let release = build_release(vec![42], fraction, None);
            assert_eq!(release.status, ReleaseStatus::Completed);
            assert_eq!(release.user_fraction, None);
        }
    }

    #[test]
    fn test_release_notes_carried_through() {
        let notes = vec![ReleaseNote {
            language: "en-US".to_string(),
            text: "Bug fixes".to_string(),
        }];
        let release = build_release(vec![1, 2], 0.1, to_localized_text(Some(&notes)));

        let localized = release.release_notes.expect("notes should be present");
        assert_eq!(localized.len(), 1);
        assert_eq!(localized[0].language, "en-US");
        assert_eq!(localized[0].text, "Bug fixes");
    }

    #[test]
    fn test_absent_release_notes_stay_absent() {
        assert_eq!(to_localized_text(None), None);
        let release = build_release(vec![1], 1.0, None);
        assert!(release.release_notes.is_none());
    }

    #[test]
    fn test_language_tags() {
        for tag in ["en", "en-US", "es-419", "fil", "zh-CN", "pt_BR"] {
            assert!(is_valid_language_tag(tag), "expected '{}' to be valid", tag);
        }
        for tag in ["", "EN", "e", "en-us", "english", "en US"] {
            assert!(!is_valid_language_tag(tag), "expected '{}' to be invalid", tag);
        }
    }
}
