use std::collections::HashMap;

use serde::Serialize;

use crate::models::Candidate;

/// Component names the review pipeline uses for the 1080p encode.
const HIGH_RES_ENCODE_NAMES: &[&str] = &["review-mp4-1080", "review-webm-1080"];

/// Component names the review pipeline uses for the standard 720p encode.
const STANDARD_ENCODE_NAMES: &[&str] = &["review-mp4", "review-webm"];

/// Closed classification of a candidate. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationType {
    EncodedLow,
    EncodedHigh,
    Original,
    Other,
}

impl RepresentationType {
    /// Label used in generated filenames.
    pub fn label(self) -> &'static str {
        match self {
            RepresentationType::EncodedHigh => "encoded_1080p",
            RepresentationType::EncodedLow => "encoded_720p",
            RepresentationType::Original => "original",
            RepresentationType::Other => "other",
        }
    }
}

/// Classify a candidate by its declared name. First match wins: known
/// high-res encode name, known standard encode name, the canonical mark,
/// then everything else (still images included).
pub fn classify(candidate: &Candidate) -> RepresentationType {
    if HIGH_RES_ENCODE_NAMES.contains(&candidate.name.as_str()) {
        RepresentationType::EncodedHigh
    } else if STANDARD_ENCODE_NAMES.contains(&candidate.name.as_str()) {
        RepresentationType::EncodedLow
    } else if candidate.canonical {
        RepresentationType::Original
    } else {
        RepresentationType::Other
    }
}

/// Bucket candidates by representation type, keeping first-seen order
/// within each bucket.
pub fn group_by_type(candidates: &[Candidate]) -> HashMap<RepresentationType, Vec<&Candidate>> {
    let mut groups: HashMap<RepresentationType, Vec<&Candidate>> = HashMap::new();
    for candidate in candidates {
        groups.entry(classify(candidate)).or_default().push(candidate);
    }
    groups
}
