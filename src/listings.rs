//! Marketplace exports: a listings CSV built from finished product
//! directories, and an upload-pack CSV flattened for picky import tools.

use crate::render_preview::pdf_page_count;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LISTING_FIELDS: [&str; 13] = [
    "slug",
    "niche",
    "title_raw",
    "title",
    "page_count",
    "formats",
    "bundle_zip",
    "preview_1",
    "preview_2",
    "preview_3",
    "tags",
    "description",
    "price_usd",
];

#[derive(Debug, Deserialize)]
struct ListingMetadata {
    #[serde(default)]
    slug: String,
    #[serde(default)]
    niche: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ListingSpec {
    #[serde(default)]
    modules: Vec<String>,
    #[serde(default)]
    layout: ListingLayout,
}

#[derive(Debug, Default, Deserialize)]
struct ListingLayout {
    #[serde(default)]
    page_count: usize,
}

/// Strip a leading niche prefix and make sure the sale title carries the
/// "Printable" and "PDF" keywords buyers search for.
pub fn clean_title(niche: &str, title: &str) -> String {
    let niche = niche.trim().to_uppercase();
    let mut t = title.trim().to_string();

    // Compare and strip by characters; uppercasing can change byte length, so
    // byte slicing on an uppercased prefix is not safe here.
    if !niche.is_empty() {
        let niche_chars = niche.chars().count();
        let head: String = t.chars().take(niche_chars).collect();
        let separator = t.chars().nth(niche_chars);
        if head.to_uppercase() == niche && separator == Some(' ') {
            t = t
                .chars()
                .skip(niche_chars + 1)
                .collect::<String>()
                .trim()
                .to_string();
        }
    }
    if t.is_empty() {
        t = "Printable Planner".to_string();
    }
    if !t.contains("Printable") {
        t = format!("{} Printable", t);
    }
    if !t.contains("PDF") {
        t = format!("{} PDF", t);
    }
    t
}

/// Page-count-tiered USD price.
pub fn price_for_pages(page_count: usize) -> &'static str {
    match page_count {
        0..=3 => "2.99",
        4..=6 => "3.99",
        7..=10 => "4.99",
        _ => "5.99",
    }
}

/// Pipe-joined tag list, capped at 20. Pipes avoid comma trouble inside CSV
/// cells; the upload pack converts them later.
pub fn build_listing_tags(niche: &str, title: &str) -> String {
    let mut tags: Vec<String> = ["printable", "planner", "pdf", "a4", "us-letter"]
        .iter()
        .map(|t| t.to_string())
        .collect();

    match niche.trim().to_uppercase().as_str() {
        "BUDGET" => tags.extend(
            ["budget", "money", "finance", "expense-tracker", "savings"].map(String::from),
        ),
        // The niche name itself stays out of the tags to avoid listing policy
        // flags on some marketplaces.
        "ADHD" => tags.extend(
            ["focus", "routine", "productivity", "daily-planner", "habit-tracker"]
                .map(String::from),
        ),
        _ => tags.extend(["tracker", "organizer"].map(String::from)),
    }

    let skip = ["planner", "printable", "template", "pdf"];
    let title_words: Vec<String> = title
        .replace('-', " ")
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 4 && !skip.contains(&w.as_str()))
        .take(3)
        .collect();
    tags.extend(title_words);

    let mut unique = Vec::new();
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique.truncate(20);
    unique.join("|")
}

/// Multi-line sales description. No promises, and the digital-only notice is
/// always present.
pub fn build_listing_description(title: &str, page_count: usize, modules: &[String]) -> String {
    let mut features: Vec<String> = modules
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| format!("- {}", title_case(&m.replace('_', " "))))
        .collect();
    if features.is_empty() {
        features.push("- Printable pages".to_string());
    }

    format!(
        "{title}\n\n\
         Includes {page_count} pages.\n\n\
         Formats:\n- PDF (A4)\n- PDF (US Letter)\n\n\
         What's inside:\n{features}\n\n\
         How it works:\n\
         1) Download the ZIP file\n\
         2) Open and print the PDF pages you need\n\
         3) Fill in by hand and reuse as desired\n\n\
         Notes:\n\
         - Digital download only (no physical item shipped)\n\
         - Colors may vary by printer\n",
        title = title,
        page_count = page_count,
        features = features.join("\n"),
    )
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct ProductArtifacts {
    bundle: PathBuf,
    pdf_a4: PathBuf,
    previews: [PathBuf; 3],
}

fn validate_artifacts(sku_dir: &Path, slug: &str) -> Result<ProductArtifacts> {
    let artifacts = ProductArtifacts {
        bundle: sku_dir.join("bundle.zip"),
        pdf_a4: sku_dir.join("a4.pdf"),
        previews: [
            sku_dir.join("preview_1.png"),
            sku_dir.join("preview_2.png"),
            sku_dir.join("preview_3.png"),
        ],
    };
    let mut required = vec![
        artifacts.bundle.clone(),
        artifacts.pdf_a4.clone(),
        sku_dir.join("letter.pdf"),
        sku_dir.join("spec.json"),
        sku_dir.join("metadata.json"),
    ];
    required.extend(artifacts.previews.iter().cloned());

    let missing: Vec<String> = required
        .iter()
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        bail!("[{}] Missing required artifacts: {}", slug, missing.join(", "));
    }
    Ok(artifacts)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Missing JSON file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Real page count from the PDF when Pdfium is available; the spec's recorded
/// count otherwise.
fn resolve_page_count(pdf_a4: &Path, spec_count: usize) -> usize {
    match fs::read(pdf_a4).ok().and_then(|bytes| pdf_page_count(&bytes).ok()) {
        Some(count) if count > 0 => count,
        _ => {
            debug!(pdf = %pdf_a4.display(), "falling back to recorded page count");
            spec_count
        }
    }
}

/// Scan finished product directories under `out_dir` and write the listings
/// CSV. Returns the number of rows written.
pub fn write_listings_csv(out_dir: &Path, csv_path: &Path) -> Result<usize> {
    if !out_dir.exists() {
        bail!("Output directory not found: {}", out_dir.display());
    }

    let mut sku_dirs: Vec<PathBuf> = fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    sku_dirs.sort();

    if let Some(parent) = csv_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    writer.write_record(LISTING_FIELDS)?;

    let mut rows = 0;
    for sku_dir in sku_dirs {
        let meta_path = sku_dir.join("metadata.json");
        if !meta_path.is_file() {
            // Not a product directory.
            continue;
        }
        let meta: ListingMetadata = read_json(&meta_path)?;
        let spec: ListingSpec = read_json(&sku_dir.join("spec.json"))?;

        let slug = if meta.slug.is_empty() {
            sku_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            meta.slug.clone()
        };
        let artifacts = validate_artifacts(&sku_dir, &slug)?;

        let title = clean_title(&meta.niche, &meta.title);
        let page_count = resolve_page_count(&artifacts.pdf_a4, spec.layout.page_count);
        let tags = build_listing_tags(&meta.niche, &title);
        let description = build_listing_description(&title, page_count, &spec.modules);

        let page_count_field = page_count.to_string();
        let bundle_field = artifacts.bundle.display().to_string();
        let preview_fields: Vec<String> = artifacts
            .previews
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        writer.write_record([
            slug.as_str(),
            meta.niche.as_str(),
            meta.title.as_str(),
            title.as_str(),
            page_count_field.as_str(),
            "PDF(A4)|PDF(US Letter)",
            bundle_field.as_str(),
            preview_fields[0].as_str(),
            preview_fields[1].as_str(),
            preview_fields[2].as_str(),
            tags.as_str(),
            description.as_str(),
            price_for_pages(page_count),
        ])?;
        rows += 1;
    }

    writer.flush()?;
    if rows == 0 {
        warn!(dir = %out_dir.display(), "no finished products found");
    }
    Ok(rows)
}

/// Flatten real newlines into a visible " \n " marker so spreadsheet imports
/// keep one row per listing.
pub fn normalize_newlines(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let marked = unified.replace('\n', " \\n ");
    marked.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pipe-separated tags to the comma-separated form upload tools expect,
/// deduplicated and capped.
pub fn tags_pipe_to_commas(tags_pipe: &str, max_tags: usize) -> String {
    let mut unique: Vec<&str> = Vec::new();
    for tag in tags_pipe.split('|') {
        let tag = tag.trim();
        if !tag.is_empty() && !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique.truncate(max_tags);
    unique.join(", ")
}

/// Rewrite a listings CSV into an upload pack: same columns, flattened
/// descriptions, comma tags. Returns the number of rows written.
pub fn write_upload_pack(listings_csv: &Path, upload_csv: &Path) -> Result<usize> {
    if !listings_csv.exists() {
        bail!("Input CSV not found: {}", listings_csv.display());
    }

    let mut reader = csv::Reader::from_path(listings_csv)
        .with_context(|| format!("Failed to read {}", listings_csv.display()))?;
    let headers = reader.headers()?.clone();
    let description_idx = headers.iter().position(|h| h == "description");
    let tags_idx = headers.iter().position(|h| h == "tags");

    if let Some(parent) = upload_csv.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(upload_csv)
        .with_context(|| format!("Failed to create {}", upload_csv.display()))?;
    writer.write_record(&headers)?;

    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        let transformed: Vec<String> = record
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if Some(i) == description_idx {
                    normalize_newlines(field)
                } else if Some(i) == tags_idx {
                    tags_pipe_to_commas(field, 13)
                } else {
                    field.to_string()
                }
            })
            .collect();
        writer.write_record(&transformed)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_niche_prefix_and_adds_keywords() {
        assert_eq!(
            clean_title("BUDGET", "BUDGET Monthly Money Tracker"),
            "Monthly Money Tracker Printable PDF"
        );
        assert_eq!(clean_title("ADHD", ""), "Printable Planner PDF");
        assert_eq!(
            clean_title("ADHD", "Focus Printable PDF"),
            "Focus Printable PDF"
        );
    }

    #[test]
    fn clean_title_handles_multibyte_prefixes() {
        // Multi-byte niche strips cleanly.
        assert_eq!(
            clean_title("CAFÉ", "CAFÉ Budget Planner"),
            "Budget Planner Printable PDF"
        );
        // Ligatures grow when uppercased (ﬁ → FI); the prefix check must not
        // slice on the case-folded length.
        let cleaned = clean_title("FIFIÉ", "ﬁﬁé Planner");
        assert!(cleaned.ends_with("PDF"));
    }

    #[test]
    fn price_tiers_follow_page_count() {
        assert_eq!(price_for_pages(3), "2.99");
        assert_eq!(price_for_pages(6), "3.99");
        assert_eq!(price_for_pages(10), "4.99");
        assert_eq!(price_for_pages(11), "5.99");
    }

    #[test]
    fn tags_are_pipe_joined_unique_and_capped() {
        let tags = build_listing_tags("BUDGET", "Monthly Budget Tracker Printable");
        let parts: Vec<&str> = tags.split('|').collect();
        assert!(parts.len() <= 20);
        assert!(parts.contains(&"budget"));
        assert!(!parts.contains(&"printable-printable"));
        let mut deduped = parts.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), parts.len());
    }

    #[test]
    fn adhd_tags_avoid_the_niche_name() {
        let tags = build_listing_tags("ADHD", "Focus Planner");
        assert!(!tags.split('|').any(|t| t == "adhd"));
        assert!(tags.split('|').any(|t| t == "focus"));
    }

    #[test]
    fn description_lists_modules_and_digital_notice() {
        let modules = vec!["cover".to_string(), "habit_grid".to_string()];
        let text = build_listing_description("Focus Planner Printable PDF", 8, &modules);
        assert!(text.contains("Includes 8 pages."));
        assert!(text.contains("- Habit Grid"));
        assert!(text.contains("Digital download only"));
    }

    #[test]
    fn newline_normalization_is_spreadsheet_safe() {
        let text = "line one\r\nline two\nline three";
        let flat = normalize_newlines(text);
        assert_eq!(flat, "line one \\n line two \\n line three");
        assert!(!flat.contains('\n'));
    }

    #[test]
    fn pipe_tags_become_capped_comma_tags() {
        let pipe = (1..=20).map(|i| format!("tag{i}")).collect::<Vec<_>>().join("|");
        let commas = tags_pipe_to_commas(&pipe, 13);
        assert_eq!(commas.matches(", ").count(), 12);
        assert!(commas.starts_with("tag1, tag2"));
        assert_eq!(tags_pipe_to_commas("a||a| b ", 13), "a, b");
    }
}
