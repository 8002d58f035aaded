//! Canonical status vocabulary.
//!
//! Every status shown to a user goes through [`label_for`] and
//! [`color_class_for`]. Blocking holds are rendered as an advisory phrase,
//! never as the raw internal code.

use crate::models::{StatusCode, StatusLabel};

pub const ADVISORY_LABEL: &str = "Needs review";

pub const CLASS_SUCCESS: &str = "status-success";
pub const CLASS_WARNING: &str = "status-warning";
pub const CLASS_INFO: &str = "status-info";
pub const CLASS_NEUTRAL: &str = "status-neutral";

fn canonical_label(code: StatusCode) -> &'static str {
    match code {
        StatusCode::Approved => "Approved",
        StatusCode::Paid => "Paid",
        StatusCode::Verified => "Verified",
        StatusCode::Flagged | StatusCode::Blocked => ADVISORY_LABEL,
        StatusCode::Review => "In review",
        StatusCode::Pending => "Pending",
        StatusCode::Draft => "Draft",
        StatusCode::Unknown => "Unknown",
    }
}

fn canonical_class(code: StatusCode) -> &'static str {
    match code {
        StatusCode::Approved | StatusCode::Paid | StatusCode::Verified => CLASS_SUCCESS,
        StatusCode::Flagged | StatusCode::Blocked | StatusCode::Review => CLASS_WARNING,
        StatusCode::Pending => CLASS_INFO,
        StatusCode::Draft | StatusCode::Unknown => CLASS_NEUTRAL,
    }
}

/// Display text for a backend status. Unrecognized codes come back unchanged.
pub fn label_for(code: &str) -> String {
    match StatusCode::parse(code) {
        Some(known) => canonical_label(known).to_string(),
        None => code.to_string(),
    }
}

pub fn color_class_for(code: &str) -> &'static str {
    StatusCode::parse(code)
        .map(canonical_class)
        .unwrap_or(CLASS_NEUTRAL)
}

pub fn status_label(code: &str) -> StatusLabel {
    StatusLabel {
        text: label_for(code),
        color_class: color_class_for(code).to_string(),
    }
}

pub fn is_advisory(code: &str) -> bool {
    matches!(
        StatusCode::parse(code),
        Some(StatusCode::Flagged) | Some(StatusCode::Blocked)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_code_has_a_readable_label() {
        for code in StatusCode::ALL {
            let label = label_for(code.as_str());
            assert!(!label.is_empty());
            assert_ne!(label, code.as_str(), "{} leaked verbatim", code.as_str());
        }
    }

    #[test]
    fn flagged_and_blocked_share_the_advisory_phrase() {
        assert_eq!(label_for("FLAGGED"), ADVISORY_LABEL);
        assert_eq!(label_for("BLOCKED"), ADVISORY_LABEL);
        assert_eq!(color_class_for("BLOCKED"), CLASS_WARNING);
        assert!(is_advisory("blocked"));
        assert!(!is_advisory("PAID"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(label_for("approved"), "Approved");
        assert_eq!(label_for(" Paid "), "Paid");
        assert_eq!(color_class_for("verified"), CLASS_SUCCESS);
        assert_eq!(color_class_for("pending"), CLASS_INFO);
    }

    #[test]
    fn unknown_codes_fall_back_to_raw_text_and_neutral_class() {
        assert_eq!(label_for("XYZ123"), "XYZ123");
        assert_eq!(label_for(&label_for("XYZ123")), "XYZ123");
        assert_eq!(color_class_for("XYZ123"), CLASS_NEUTRAL);
        assert_eq!(label_for(""), "");
        assert_eq!(color_class_for(""), CLASS_NEUTRAL);
    }

    #[test]
    fn status_label_pairs_text_and_class() {
        let label = status_label("review");
        assert_eq!(label.text, "In review");
        assert_eq!(label.color_class, CLASS_WARNING);
    }
}
