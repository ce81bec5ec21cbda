use planner_forge::ingest::ingest_products;
use planner_forge::listings::{write_listings_csv, write_upload_pack};
use planner_forge::models::{Config, ProductStatus};
use planner_forge::pipeline::run_pipeline;
use planner_forge::store::Store;
use std::fs;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.out_dir = dir.path().join("out").to_string_lossy().into_owned();
    config.csv_path = None;
    config
}

#[test]
#[ignore = "requires a Pdfium library (set PDFIUM_LIBRARY_PATH)"]
fn full_pipeline_produces_all_artifacts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Store::open(&config.out_dir()).unwrap();

    let csv = dir.path().join("products.csv");
    fs::write(
        &csv,
        "niche,title\nADHD,Focus Planner\nBUDGET,Monthly Bills Organizer\n",
    )
    .unwrap();
    let products = ingest_products(&csv, &store, &config).unwrap();
    assert_eq!(products.len(), 2);

    let results = run_pipeline(&products, &config, &store).unwrap();
    if !results.failed.is_empty() {
        for slug in &results.failed {
            let log = config.out_dir().join(slug).join("error.log");
            let text = fs::read_to_string(&log).unwrap_or_default();
            if text.contains("Pdfium") {
                panic!(
                    "Pdfium library not found. Set PDFIUM_LIBRARY_PATH to a pdfium build before running this test."
                );
            }
            panic!("pipeline failed for {slug}: {text}");
        }
    }
    assert_eq!(results.ready.len(), 2);

    for product in &products {
        let product_dir = config.out_dir().join(&product.sku_slug);
        for file in [
            "a4.pdf",
            "letter.pdf",
            "preview_1.png",
            "preview_2.png",
            "preview_3.png",
            "spec.json",
            "metadata.json",
            "README.txt",
            "bundle.zip",
        ] {
            assert!(product_dir.join(file).is_file(), "missing {file}");
        }
        let artifacts = store.list_artifacts(product.id).unwrap();
        assert!(artifacts.iter().any(|a| a.kind == "bundle"));
        assert!(artifacts.iter().any(|a| a.kind == "pdf_a4"));
    }

    let ready = store.list_products(&[ProductStatus::Ready], None).unwrap();
    assert_eq!(ready.len(), 2);

    // Listings and upload pack over the finished output tree.
    let listings_csv = config.out_dir().join("listings.csv");
    let rows = write_listings_csv(&config.out_dir(), &listings_csv).unwrap();
    assert_eq!(rows, 2);

    let upload_csv = config.out_dir().join("upload_pack.csv");
    let upload_rows = write_upload_pack(&listings_csv, &upload_csv).unwrap();
    assert_eq!(upload_rows, 2);

    let upload_text = fs::read_to_string(&upload_csv).unwrap();
    assert!(upload_text.contains(" \\n "), "descriptions not flattened");
}

#[test]
fn pipeline_marks_banned_products_failed_without_rendering() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Store::open(&config.out_dir()).unwrap();

    let csv = dir.path().join("products.csv");
    fs::write(&csv, "niche,title\nADHD,Guarantee Focus Cure Planner\n").unwrap();
    let products = ingest_products(&csv, &store, &config).unwrap();

    let results = run_pipeline(&products, &config, &store).unwrap();
    assert!(results.ready.is_empty());
    assert_eq!(results.failed, vec!["guarantee-focus-cure-planner".to_string()]);

    let product_dir = config.out_dir().join("guarantee-focus-cure-planner");
    assert!(product_dir.join("error.log").is_file());
    // QA rejected the spec before any rendering happened.
    assert!(!product_dir.join("a4.pdf").exists());

    let failed = store.list_products(&[ProductStatus::Failed], None).unwrap();
    assert_eq!(failed[0].fail_code.as_deref(), Some("QA"));
    assert!(failed[0]
        .fail_detail
        .as_deref()
        .unwrap_or("")
        .contains("Banned words"));
}
