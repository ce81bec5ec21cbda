use crate::store::Store;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub niche: String,
}

fn base_tags(niche: &str) -> Vec<String> {
    let niche_token = niche.to_lowercase().replace(' ', "-");
    let tags = [
        niche_token.clone(),
        format!("{}-planner", niche_token),
        "printable".to_string(),
        "pdf".to_string(),
        "planner".to_string(),
        "tracker".to_string(),
        "worksheet".to_string(),
        "a4".to_string(),
        "us-letter".to_string(),
        "instant-download".to_string(),
        "digital".to_string(),
        "minimalist".to_string(),
        "productivity".to_string(),
        "organization".to_string(),
        "daily".to_string(),
        "weekly".to_string(),
    ];
    let mut unique = Vec::new();
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique.truncate(13);
    unique
}

/// Marketplaces reject descriptions outside 200-400 chars, so pad short copy
/// with a neutral filler line and truncate long copy with an ellipsis.
fn normalize_description(text: &str) -> String {
    let mut text = text.to_string();
    if text.chars().count() < 200 {
        let filler = " Designed for easy printing and daily use, this template keeps your routine consistent and clear.";
        let mut iterations = 0;
        while text.chars().count() + filler.chars().count() <= 400
            && text.chars().count() < 200
            && iterations < 10
        {
            text.push_str(filler);
            iterations += 1;
        }
    }
    if text.chars().count() > 400 {
        text = text.chars().take(397).collect::<String>().trim_end().to_string() + "...";
    }
    if text.chars().count() < 200 {
        let pad = 200 - text.chars().count();
        text.push_str(&" ".repeat(pad));
    }
    text
}

pub fn build_metadata(niche: &str, title: &str, slug: &str, price: f64) -> Metadata {
    let description = format!(
        "Stay organized with the {} printable designed for {} routines. \
         Includes structured pages, clear trackers, and space to reflect so you can plan consistently. \
         Print at home in A4 or US Letter and reuse as needed.",
        title, niche
    );
    Metadata {
        slug: slug.to_string(),
        title: format!("{} {} Printable PDF", niche, title),
        description: normalize_description(&description),
        tags: base_tags(niche),
        price,
        niche: niche.to_string(),
    }
}

pub fn write_metadata(metadata: &Metadata, store: &Store) -> Result<PathBuf> {
    let path = store.artifact_path(&metadata.slug, "metadata")?;
    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write metadata {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_lands_in_marketplace_window() {
        let metadata = build_metadata("ADHD", "Focus Planner", "focus-planner", 4.99);
        let len = metadata.description.chars().count();
        assert!((200..=400).contains(&len), "{len}");
    }

    #[test]
    fn long_descriptions_are_truncated_with_ellipsis() {
        let text = "word ".repeat(200);
        let normalized = normalize_description(&text);
        assert!(normalized.chars().count() <= 400);
        assert!(normalized.ends_with("..."));
    }

    #[test]
    fn tags_are_unique_and_capped() {
        let metadata = build_metadata("BUDGET", "Budget Tracker", "budget-tracker", 4.99);
        assert!(metadata.tags.len() <= 13);
        let mut deduped = metadata.tags.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), metadata.tags.len());
        assert_eq!(metadata.tags[0], "budget");
        assert_eq!(metadata.tags[1], "budget-planner");
    }

    #[test]
    fn seo_title_is_composed() {
        let metadata = build_metadata("ADHD", "Focus Planner", "focus-planner", 4.99);
        assert_eq!(metadata.title, "ADHD Focus Planner Printable PDF");
    }
}
