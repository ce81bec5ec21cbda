use crate::models::{Config, REQUIRED_MODULES};
use crate::spec::ProductSpec;
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const SIMILARITY_LIMIT: f64 = 0.8;

/// One already-generated spec, as seen by duplicate detection.
#[derive(Debug, Clone)]
pub struct SignatureEntry {
    pub slug: String,
    pub niche: String,
    pub modules: Vec<String>,
    pub signature: String,
    pub hash: String,
}

/// Canonical signature over the parts of a spec that make two products "the
/// same": niche, module list, and layout shape.
pub fn spec_signature(niche: &str, modules: &[String], page_count: usize, grid_variant: u32) -> String {
    format!(
        "{}|{}|pages:{}|grid:{}",
        niche,
        modules.join("|"),
        page_count,
        grid_variant
    )
}

pub fn signature_hash(signature: &str) -> String {
    format!("{:x}", md5::compute(signature.as_bytes()))
}

pub fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[derive(Debug, Deserialize)]
struct StoredSpec {
    niche: String,
    slug: String,
    #[serde(default)]
    modules: Vec<String>,
    #[serde(default)]
    layout: StoredLayout,
}

#[derive(Debug, Default, Deserialize)]
struct StoredLayout {
    #[serde(default)]
    page_count: usize,
    #[serde(default)]
    grid_variant: u32,
}

/// Scan sibling product directories for spec.json files and index them.
/// Unreadable entries are skipped; a half-written spec must not sink the batch.
pub fn build_signature_index(out_dir: &Path) -> Result<Vec<SignatureEntry>> {
    let mut index = Vec::new();
    if !out_dir.exists() {
        return Ok(index);
    }
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        let spec_path = entry.path().join("spec.json");
        if !spec_path.is_file() {
            continue;
        }
        let Ok(text) = fs::read_to_string(&spec_path) else {
            continue;
        };
        let Ok(stored) = serde_json::from_str::<StoredSpec>(&text) else {
            continue;
        };
        let signature = spec_signature(
            &stored.niche,
            &stored.modules,
            stored.layout.page_count,
            stored.layout.grid_variant,
        );
        let hash = signature_hash(&signature);
        index.push(SignatureEntry {
            slug: stored.slug,
            niche: stored.niche,
            modules: stored.modules,
            signature,
            hash,
        });
    }
    Ok(index)
}

/// Exact signature hash match or module-set Jaccard above the limit counts as
/// a duplicate. A product never collides with its own slug.
pub fn check_duplicate_signature(spec: &ProductSpec, index: &[SignatureEntry]) -> Option<String> {
    let signature = spec_signature(
        &spec.niche,
        &spec.modules,
        spec.layout.page_count,
        spec.layout.grid_variant,
    );
    let hash = signature_hash(&signature);
    for entry in index {
        if entry.slug == spec.slug {
            continue;
        }
        if entry.hash == hash {
            return Some(format!("Spec duplicate of {}", entry.slug));
        }
        if jaccard_similarity(&spec.modules, &entry.modules) > SIMILARITY_LIMIT {
            return Some(format!("Spec too similar to {}", entry.slug));
        }
    }
    None
}

fn contained_banned_words<'a>(text: &str, banned: &'a [String]) -> Vec<&'a str> {
    let lowered = text.to_lowercase();
    banned
        .iter()
        .filter(|word| lowered.contains(word.as_str()))
        .map(String::as_str)
        .collect()
}

/// Validate one candidate spec plus its listing description. Returns every
/// failure found; an empty list means the spec may be rendered.
pub fn validate_spec(
    spec: &ProductSpec,
    description: &str,
    config: &Config,
    index: &[SignatureEntry],
) -> Vec<String> {
    let mut errors = Vec::new();

    let mut text_fields: Vec<&str> = vec![&spec.title];
    text_fields.extend(spec.modules.iter().map(String::as_str));
    for text in text_fields {
        let banned = contained_banned_words(text, &config.banned_words);
        if !banned.is_empty() {
            errors.push(format!("Banned words found: {}", banned.join(", ")));
            break;
        }
    }

    let missing: Vec<&str> = REQUIRED_MODULES
        .iter()
        .filter(|module| !spec.modules.iter().any(|m| m == **module))
        .copied()
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing required modules: {}", missing.join(", ")));
    }

    let len = description.chars().count();
    if !(200..=400).contains(&len) {
        errors.push("Description length must be between 200 and 400 characters".to_string());
    }

    if let Some(duplicate) = check_duplicate_signature(spec, index) {
        errors.push(duplicate);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::build_spec;

    fn entry_for(spec: &ProductSpec) -> SignatureEntry {
        let signature = spec_signature(
            &spec.niche,
            &spec.modules,
            spec.layout.page_count,
            spec.layout.grid_variant,
        );
        SignatureEntry {
            slug: spec.slug.clone(),
            niche: spec.niche.clone(),
            modules: spec.modules.clone(),
            hash: signature_hash(&signature),
            signature,
        }
    }

    #[test]
    fn signature_duplicate_detection() {
        let mut existing = build_spec("BUDGET", "Alpha", "alpha", 0);
        existing.modules = vec!["cover", "how_to", "tracker", "notes"]
            .into_iter()
            .map(String::from)
            .collect();
        let index = vec![entry_for(&existing)];

        let mut candidate = build_spec("BUDGET", "Beta", "beta", 0);
        candidate.modules = existing.modules.clone();
        candidate.layout.page_count = existing.layout.page_count;
        candidate.layout.grid_variant = existing.layout.grid_variant;

        assert_eq!(
            check_duplicate_signature(&candidate, &index).as_deref(),
            Some("Spec duplicate of alpha")
        );
    }

    #[test]
    fn own_slug_never_collides() {
        let spec = build_spec("BUDGET", "Alpha", "alpha", 0);
        let index = vec![entry_for(&spec)];
        assert_eq!(check_duplicate_signature(&spec, &index), None);
    }

    #[test]
    fn near_duplicate_trips_jaccard() {
        let existing = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        let index = vec![entry_for(&existing)];

        let mut candidate = build_spec("ADHD", "Focus Kit", "focus-kit", 0);
        candidate.modules = existing.modules.clone();
        // Different grid variant so the hashes differ but the modules match.
        candidate.layout.grid_variant = (existing.layout.grid_variant + 1) % 6;

        let verdict = check_duplicate_signature(&candidate, &index).unwrap();
        assert!(verdict.contains("too similar"), "{verdict}");
    }

    #[test]
    fn jaccard_bounds() {
        let a: Vec<String> = vec!["a".into(), "b".into()];
        let b: Vec<String> = vec!["a".into(), "b".into()];
        let c: Vec<String> = vec!["c".into()];
        let empty: Vec<String> = Vec::new();
        assert_eq!(jaccard_similarity(&a, &b), 1.0);
        assert_eq!(jaccard_similarity(&a, &c), 0.0);
        assert_eq!(jaccard_similarity(&empty, &empty), 1.0);
    }

    #[test]
    fn banned_words_fail_validation() {
        let mut spec = build_spec("ADHD", "Miracle Plan", "miracle-plan", 0);
        spec.title = "Miracle Plan".to_string();
        let description = "x".repeat(250);
        let errors = validate_spec(&spec, &description, &Config::default(), &[]);
        assert!(errors.iter().any(|e| e.contains("Banned")), "{errors:?}");
    }

    #[test]
    fn description_length_is_enforced() {
        let spec = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        let config = Config::default();
        let errors = validate_spec(&spec, "too short", &config, &[]);
        assert!(errors.iter().any(|e| e.contains("Description length")));
        let errors = validate_spec(&spec, &"x".repeat(250), &config, &[]);
        assert!(errors.is_empty(), "{errors:?}");
    }
}
