//! Customer-facing bundle: README plus a deterministic zip of both PDFs.

use crate::store::Store;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn create_readme(slug: &str, disclaimer: &str, store: &Store) -> Result<PathBuf> {
    let path = store.artifact_path(slug, "readme")?;
    let lines = [
        "Thank you for downloading your printable template.",
        "1. Print the PDF pages you need.",
        "2. Use pens or markers to fill in the sections.",
        "3. Store pages in a binder for reuse.",
        "4. Review weekly for progress.",
    ];
    let mut text = lines.join("\n");
    text.push_str(&format!("\nDisclaimer: {}", disclaimer));
    fs::write(&path, text)
        .with_context(|| format!("Failed to write README {}", path.display()))?;
    Ok(path)
}

/// Zip the two PDFs and the README. Entry timestamps are pinned to the zip
/// epoch so the same inputs always produce byte-identical bundles.
pub fn create_bundle(
    slug: &str,
    pdf_a4: &Path,
    pdf_us: &Path,
    readme: &Path,
    store: &Store,
) -> Result<PathBuf> {
    let bundle_path = store.artifact_path(slug, "bundle")?;
    let file = fs::File::create(&bundle_path)
        .with_context(|| format!("Failed to create bundle {}", bundle_path.display()))?;
    let mut bundle = ZipWriter::new(file);

    let fixed_time = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|_| anyhow!("Invalid fixed zip timestamp"))?;
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_time);

    for path in [pdf_a4, pdf_us, readme] {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Bundle entry has no file name: {}", path.display()))?;
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read bundle entry {}", path.display()))?;
        bundle.start_file(name, options)?;
        bundle.write_all(&bytes)?;
    }

    bundle.finish()?;
    Ok(bundle_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> Store {
        Store::open(dir.path()).unwrap()
    }

    #[test]
    fn readme_ends_with_disclaimer() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let path = create_readme("focus-planner", "For information only.", &store).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Thank you for downloading"));
        assert!(text.ends_with("Disclaimer: For information only."));
    }

    #[test]
    fn bundle_is_deterministic_for_same_inputs() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let product_dir = store.product_dir("focus-planner").unwrap();
        let a4 = product_dir.join("a4.pdf");
        let us = product_dir.join("letter.pdf");
        std::fs::write(&a4, b"%PDF-1.4 fake a4").unwrap();
        std::fs::write(&us, b"%PDF-1.4 fake letter").unwrap();
        let readme = create_readme("focus-planner", "x", &store).unwrap();

        let first = create_bundle("focus-planner", &a4, &us, &readme, &store).unwrap();
        let first_bytes = std::fs::read(&first).unwrap();
        let second = create_bundle("focus-planner", &a4, &us, &readme, &store).unwrap();
        let second_bytes = std::fs::read(&second).unwrap();
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn bundle_contains_expected_entries() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let product_dir = store.product_dir("focus-planner").unwrap();
        let a4 = product_dir.join("a4.pdf");
        let us = product_dir.join("letter.pdf");
        std::fs::write(&a4, b"a4").unwrap();
        std::fs::write(&us, b"us").unwrap();
        let readme = create_readme("focus-planner", "x", &store).unwrap();
        let bundle = create_bundle("focus-planner", &a4, &us, &readme, &store).unwrap();

        let file = std::fs::File::open(bundle).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["a4.pdf", "letter.pdf", "README.txt"]);
    }
}
