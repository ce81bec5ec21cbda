//! Sequential batch pipeline: spec selection with a bounded retry loop, then
//! rendering, previews, metadata, and packaging per product.

use crate::metadata::{build_metadata, write_metadata, Metadata};
use crate::models::{Config, Product, ProductStatus};
use crate::package::{create_bundle, create_readme};
use crate::qa::{build_signature_index, validate_spec, SignatureEntry};
use crate::render_pdf::render_pdfs;
use crate::render_preview::render_previews;
use crate::spec::{build_spec, write_spec, ProductSpec};
use crate::store::Store;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// How many procedural variants to try before giving up on a product.
pub const MAX_SPEC_VARIANTS: u32 = 10;

#[derive(Debug, Default)]
pub struct PipelineResults {
    pub ready: Vec<String>,
    pub failed: Vec<String>,
}

/// Try spec variants until one passes QA. Returns the accepted spec and its
/// metadata, or the errors from the last rejected variant.
fn select_spec(
    product: &Product,
    config: &Config,
    index: &[SignatureEntry],
) -> Result<(ProductSpec, Metadata), Vec<String>> {
    let mut last_errors = Vec::new();
    for variant in 0..MAX_SPEC_VARIANTS {
        let spec = build_spec(&product.niche, &product.title, &product.sku_slug, variant);
        let metadata = build_metadata(
            &product.niche,
            &product.title,
            &product.sku_slug,
            product.price,
        );
        let errors = validate_spec(&spec, &metadata.description, config, index);
        if errors.is_empty() {
            if variant > 0 {
                info!(slug = %product.sku_slug, variant, "accepted spec after retries");
            }
            return Ok((spec, metadata));
        }
        last_errors = errors;
    }
    Err(last_errors)
}

type Artifacts = Vec<(String, PathBuf)>;

fn process_product(
    product: &Product,
    config: &Config,
    store: &Store,
    index: &[SignatureEntry],
) -> Result<(ProductStatus, Artifacts, Vec<String>)> {
    let mut artifacts: Artifacts = Vec::new();

    let (spec, metadata) = match select_spec(product, config, index) {
        Ok(accepted) => accepted,
        Err(errors) => return Ok((ProductStatus::Failed, artifacts, errors)),
    };

    let spec_path = write_spec(&spec, store)?;
    artifacts.push(("spec".to_string(), spec_path));

    let (pdf_a4, pdf_us) = render_pdfs(&spec, store, &config.disclaimer_text)?;
    artifacts.push(("pdf_a4".to_string(), pdf_a4.clone()));
    artifacts.push(("pdf_usletter".to_string(), pdf_us.clone()));

    let previews = render_previews(&spec, &pdf_a4, store)?;
    for (i, path) in previews.into_iter().enumerate() {
        artifacts.push((format!("preview_{}", i + 1), path));
    }

    let metadata_path = write_metadata(&metadata, store)?;
    artifacts.push(("metadata".to_string(), metadata_path));

    let readme_path = create_readme(&product.sku_slug, &config.disclaimer_text, store)?;
    let bundle_path = create_bundle(&product.sku_slug, &pdf_a4, &pdf_us, &readme_path, store)?;
    artifacts.push(("readme".to_string(), readme_path));
    artifacts.push(("bundle".to_string(), bundle_path));

    Ok((ProductStatus::Ready, artifacts, Vec::new()))
}

fn write_error_log(store: &Store, slug: &str, message: &str) -> Result<PathBuf> {
    let path = store.artifact_path(slug, "error")?;
    fs::write(&path, message)?;
    Ok(path)
}

/// Run every product through the pipeline, updating status rows as we go.
/// One broken product never aborts the batch.
pub fn run_pipeline(
    products: &[Product],
    config: &Config,
    store: &Store,
) -> Result<PipelineResults> {
    let mut results = PipelineResults::default();

    for product in products {
        // Rebuilt per product so each one sees the specs written before it.
        let index = build_signature_index(store.out_dir())?;

        let (status, artifacts, errors) = match process_product(product, config, store, &index) {
            Ok(outcome) => outcome,
            Err(err) => (ProductStatus::Failed, Vec::new(), vec![format!("{err:#}")]),
        };

        match status {
            ProductStatus::Ready => {
                store.set_status(product.id, ProductStatus::Ready, None, None)?;
                store.record_artifacts(product.id, &artifacts)?;
                info!(slug = %product.sku_slug, "product ready");
                results.ready.push(product.sku_slug.clone());
            }
            _ => {
                let message = if errors.is_empty() {
                    "Unknown error".to_string()
                } else {
                    errors.join("\n")
                };
                let fail_code = if message.contains("Banned")
                    || message.contains("Missing required")
                    || message.contains("Description length")
                    || message.contains("duplicate")
                    || message.contains("similar")
                {
                    "QA"
                } else {
                    "PIPELINE"
                };
                store.set_status(
                    product.id,
                    ProductStatus::Failed,
                    Some(fail_code),
                    Some(&message),
                )?;
                write_error_log(store, &product.sku_slug, &message)?;
                warn!(slug = %product.sku_slug, %fail_code, "product failed");
                results.failed.push(product.sku_slug.clone());
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(store: &Store, niche: &str, title: &str, slug: &str) -> Product {
        store.insert_product(niche, title, slug, 4.99).unwrap()
    }

    #[test]
    fn qa_failure_marks_product_failed_and_writes_error_log() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let config = Config::default();
        // Banned word in the title fails every variant the same way.
        let product = draft(&store, "ADHD", "Miracle Focus Cure", "miracle-focus-cure");

        let results = run_pipeline(&[product], &config, &store).unwrap();
        assert_eq!(results.ready.len(), 0);
        assert_eq!(results.failed, vec!["miracle-focus-cure".to_string()]);

        let failed = store.list_products(&[ProductStatus::Failed], None).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].fail_code.as_deref(), Some("QA"));

        let log = dir.path().join("miracle-focus-cure/error.log");
        let text = std::fs::read_to_string(log).unwrap();
        assert!(text.contains("Banned words"), "{text}");
    }

    #[test]
    fn select_spec_skips_duplicate_variants() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let config = Config::default();

        // Pre-write a spec that collides with variant 0 of the candidate.
        let mut existing = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        existing.slug = "existing-planner".to_string();
        write_spec(&existing, &store).unwrap();

        let index = build_signature_index(store.out_dir()).unwrap();
        let product = draft(&store, "ADHD", "Focus Planner", "focus-planner");
        let selected = select_spec(&product, &config, &index);

        // Either a later variant diverges enough to pass, or all ten fail with
        // a similarity error; both paths must name the existing slug.
        match selected {
            Ok((spec, _)) => assert!(spec.variant > 0, "variant 0 should have collided"),
            Err(errors) => assert!(
                errors.iter().any(|e| e.contains("existing-planner")),
                "{errors:?}"
            ),
        }
    }

    #[test]
    fn max_variants_is_ten() {
        assert_eq!(MAX_SPEC_VARIANTS, 10);
    }
}
