use crate::models::{Config, Product, ProductStatus};
use crate::store::Store;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

const REQUIRED_COLUMNS: [&str; 2] = ["niche", "title"];

#[derive(Debug, Clone)]
pub struct CsvRow {
    pub niche: String,
    pub title: String,
}

/// Load and validate the product CSV. Rows that are entirely blank are skipped.
pub fn load_rows(csv_path: &Path) -> Result<Vec<CsvRow>> {
    if !csv_path.exists() {
        bail!("CSV not found: {}", csv_path.display());
    }
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV {}", csv_path.display()))?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .copied()
        .collect();
    if !missing.is_empty() {
        bail!("CSV missing columns: {}", missing.join(", "));
    }
    let niche_idx = headers.iter().position(|h| h == "niche").unwrap_or(0);
    let title_idx = headers.iter().position(|h| h == "title").unwrap_or(1);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(CsvRow {
            niche: record.get(niche_idx).unwrap_or("").trim().to_string(),
            title: record.get(title_idx).unwrap_or("").trim().to_string(),
        });
    }
    if rows.is_empty() {
        bail!("CSV has no data rows");
    }
    Ok(rows)
}

/// Lowercase ASCII slug: non-alphanumeric runs collapse to a single dash.
pub fn slug_from_title(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    re.replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Validate CSV rows and insert them as DRAFT products.
pub fn ingest_products(csv_path: &Path, store: &Store, config: &Config) -> Result<Vec<Product>> {
    let rows = load_rows(csv_path)?;
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        if row.niche.is_empty() || row.title.is_empty() {
            bail!("CSV rows must include niche and title");
        }
        let key = (row.niche.to_lowercase(), row.title.to_lowercase());
        if !seen.insert(key) {
            bail!("Duplicate title in niche: {} - {}", row.niche, row.title);
        }
        let slug = slug_from_title(&row.title);
        let product = store.insert_product(&row.niche, &row.title, &slug, config.default_price)?;
        products.push(product);
    }
    Ok(products)
}

pub fn list_products(
    store: &Store,
    statuses: &[ProductStatus],
    niche: Option<&str>,
) -> Result<Vec<Product>> {
    store.list_products(statuses, niche)
}
