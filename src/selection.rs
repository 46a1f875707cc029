use clap::ValueEnum;

use crate::catalog::{classify, group_by_type, RepresentationType};
use crate::models::{Candidate, LogicalAsset};

/// Extensions treated as still images when breaking ties inside the
/// `Other` bucket during fallback.
const STILL_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "exr", "dpx"];

/// Which representation the operator wants for the primary pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preference {
    Original,
    Encoded,
}

/// Largest declared size wins; ties go to the first-seen candidate.
fn largest<'a>(bucket: &[&'a Candidate]) -> Option<&'a Candidate> {
    bucket
        .iter()
        .copied()
        .reduce(|best, c| if c.size > best.size { c } else { best })
}

/// Pick the best candidate for the primary download pass.
///
/// Returns `None` when nothing matches; that is a normal negative outcome
/// ("no suitable component") and routes the asset to fallback handling.
pub fn select_primary<'a>(
    candidates: &'a [Candidate],
    preference: Preference,
) -> Option<&'a Candidate> {
    let groups = group_by_type(candidates);

    match preference {
        Preference::Original => {
            if let Some(originals) = groups.get(&RepresentationType::Original) {
                return largest(originals);
            }
            let all: Vec<&Candidate> = candidates.iter().collect();
            largest(&all)
        }
        Preference::Encoded => [
            RepresentationType::EncodedLow,
            RepresentationType::EncodedHigh,
            RepresentationType::Original,
        ]
        .iter()
        .find_map(|rep| groups.get(rep).and_then(|bucket| largest(bucket))),
    }
}

/// Pick a substitute candidate after a failed primary attempt.
///
/// Walks a fixed priority order, skipping excluded types. Inside `Other`,
/// still-image candidates beat everything else in the bucket.
pub fn select_fallback<'a>(
    candidates: &'a [Candidate],
    exclude: &[RepresentationType],
) -> Option<&'a Candidate> {
    let groups = group_by_type(candidates);

    for rep in [
        RepresentationType::EncodedLow,
        RepresentationType::EncodedHigh,
        RepresentationType::Other,
        RepresentationType::Original,
    ] {
        if exclude.contains(&rep) {
            continue;
        }
        let Some(bucket) = groups.get(&rep) else {
            continue;
        };
        if rep == RepresentationType::Other {
            let images: Vec<&Candidate> = bucket
                .iter()
                .copied()
                .filter(|c| is_still_image(c))
                .collect();
            if let Some(found) = largest(&images) {
                return Some(found);
            }
        }
        if let Some(found) = largest(bucket) {
            return Some(found);
        }
    }
    None
}

fn is_still_image(candidate: &Candidate) -> bool {
    candidate
        .file_type
        .as_deref()
        .map(|ext| STILL_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Build the output filename for a selected representation:
/// `{parent}_{name}_v{version:03}_{label}[.{ext}]`, with characters that
/// are unsafe in filenames replaced by underscores. Deterministic and
/// idempotent for identical inputs.
pub fn generate_filename(
    asset: &LogicalAsset,
    rep: RepresentationType,
    ext: Option<&str>,
) -> String {
    let mut name = format!(
        "{}_{}_v{:03}_{}",
        asset.parent_name,
        asset.name,
        asset.version,
        rep.label()
    );
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }
    name.chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, ext: Option<&str>, size: u64, canonical: bool) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            file_type: ext.map(str::to_string),
            size,
            asset_id: "a1".to_string(),
            canonical,
        }
    }

    fn asset() -> LogicalAsset {
        LogicalAsset {
            id: "a1".to_string(),
            parent_name: "SHOT010".to_string(),
            name: "comp".to_string(),
            version: 3,
        }
    }

    #[test]
    fn prefer_original_returns_original_when_present() {
        let candidates = vec![
            candidate("c1", "review-mp4", Some("mp4"), 50, false),
            candidate("c2", "main", Some("mov"), 500, true),
        ];
        let picked = select_primary(&candidates, Preference::Original).unwrap();
        assert_eq!(picked.id, "c2");
    }

    #[test]
    fn prefer_original_falls_back_to_largest() {
        let candidates = vec![
            candidate("c1", "review-mp4", Some("mp4"), 50, false),
            candidate("c2", "review-mp4-1080", Some("mp4"), 200, false),
        ];
        let picked = select_primary(&candidates, Preference::Original).unwrap();
        assert_eq!(picked.id, "c2");
    }

    #[test]
    fn prefer_encoded_picks_low_over_larger_original() {
        let candidates = vec![
            candidate("c1", "main", Some("mov"), 500, true),
            candidate("c2", "review-mp4", Some("mp4"), 50, false),
        ];
        let picked = select_primary(&candidates, Preference::Encoded).unwrap();
        assert_eq!(picked.id, "c2");
    }

    #[test]
    fn prefer_encoded_walks_high_then_original() {
        let candidates = vec![
            candidate("c1", "main", Some("mov"), 500, true),
            candidate("c2", "review-mp4-1080", Some("mp4"), 200, false),
        ];
        let picked = select_primary(&candidates, Preference::Encoded).unwrap();
        assert_eq!(picked.id, "c2");

        let only_original = vec![candidate("c1", "main", Some("mov"), 500, true)];
        let picked = select_primary(&only_original, Preference::Encoded).unwrap();
        assert_eq!(picked.id, "c1");
    }

    #[test]
    fn prefer_encoded_with_only_other_is_none() {
        let candidates = vec![candidate("c1", "thumbnail", Some("jpg"), 10, false)];
        assert!(select_primary(&candidates, Preference::Encoded).is_none());
    }

    #[test]
    fn empty_candidate_list_selects_nothing() {
        assert!(select_primary(&[], Preference::Original).is_none());
        assert!(select_fallback(&[], &[]).is_none());
    }

    #[test]
    fn fallback_prefers_low_encode_first() {
        let candidates = vec![
            candidate("c1", "main", Some("mov"), 500, true),
            candidate("c2", "review-mp4-1080", Some("mp4"), 200, false),
            candidate("c3", "review-mp4", Some("mp4"), 50, false),
        ];
        let picked = select_fallback(&candidates, &[]).unwrap();
        assert_eq!(picked.id, "c3");
    }

    #[test]
    fn fallback_honors_exclusions() {
        let candidates = vec![
            candidate("c1", "main", Some("mov"), 500, true),
            candidate("c2", "review-mp4", Some("mp4"), 50, false),
        ];
        let picked = select_fallback(&candidates, &[RepresentationType::EncodedLow]).unwrap();
        assert_eq!(picked.id, "c1");
    }

    #[test]
    fn fallback_other_bucket_prefers_still_images() {
        let candidates = vec![
            candidate("c1", "notes", Some("txt"), 900, false),
            candidate("c2", "matte", Some("exr"), 10, false),
        ];
        let picked = select_fallback(&candidates, &[]).unwrap();
        assert_eq!(picked.id, "c2");
    }

    #[test]
    fn fallback_size_tie_goes_to_first_seen() {
        let candidates = vec![
            candidate("c1", "render-a", Some("exr"), 100, false),
            candidate("c2", "render-b", Some("exr"), 100, false),
        ];
        let picked = select_fallback(&candidates, &[]).unwrap();
        assert_eq!(picked.id, "c1");
    }

    #[test]
    fn filename_matches_expected_shape() {
        let name = generate_filename(&asset(), RepresentationType::Original, Some("mov"));
        assert_eq!(name, "SHOT010_comp_v003_original.mov");
    }

    #[test]
    fn filename_is_deterministic_and_sanitized() {
        let mut dirty = asset();
        dirty.parent_name = "SHOT/010".to_string();
        dirty.name = "comp?*".to_string();
        let a = generate_filename(&dirty, RepresentationType::EncodedLow, Some("mp4"));
        let b = generate_filename(&dirty, RepresentationType::EncodedLow, Some("mp4"));
        assert_eq!(a, b);
        assert_eq!(a, "SHOT_010_comp___v003_encoded_720p.mp4");
        for forbidden in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            assert!(!a.contains(forbidden));
        }
    }

    #[test]
    fn filename_without_extension_has_no_trailing_dot() {
        let name = generate_filename(&asset(), RepresentationType::EncodedHigh, None);
        assert_eq!(name, "SHOT010_comp_v003_encoded_1080p");
    }
}
