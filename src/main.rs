use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use planner_forge::ingest::{ingest_products, list_products};
use planner_forge::listings::{write_listings_csv, write_upload_pack};
use planner_forge::models::{Config, ProductStatus};
use planner_forge::pipeline::run_pipeline;
use planner_forge::store::Store;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let matches = Command::new("planner-forge")
        .version("1.0")
        .about("Generates printable planner products from a niche/title CSV")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("build")
                .about("Ingest the product CSV and render all DRAFT products")
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_name("FILE")
                        .help("CSV path with niche/title columns"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .help("Output directory"),
                )
                .arg(
                    Arg::new("niche")
                        .long("niche")
                        .value_name("NICHE")
                        .help("Only process products in this niche"),
                )
                .arg(
                    Arg::new("dry-run-ingest")
                        .long("dry-run-ingest")
                        .action(ArgAction::SetTrue)
                        .help("Only ingest the CSV, do not render"),
                ),
        )
        .subcommand(
            Command::new("retry")
                .about("Re-run the pipeline for FAILED products")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .help("Output directory"),
                )
                .arg(
                    Arg::new("drafts")
                        .long("drafts")
                        .action(ArgAction::SetTrue)
                        .help("Retry DRAFT products instead of FAILED"),
                ),
        )
        .subcommand(
            Command::new("listings")
                .about("Write a marketplace listings CSV from finished products")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .help("Output directory"),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_name("FILE")
                        .help("Listings CSV path (default: <out>/listings.csv)"),
                ),
        )
        .subcommand(
            Command::new("upload-pack")
                .about("Flatten a listings CSV for marketplace upload tools")
                .arg(
                    Arg::new("in")
                        .long("in")
                        .value_name("FILE")
                        .help("Input listings CSV (default: <out>/listings.csv)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("FILE")
                        .help("Upload pack CSV path (default: <out>/upload_pack.csv)"),
                ),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration
    let mut config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    match matches.subcommand() {
        Some(("build", sub)) => {
            if let Some(out) = sub.get_one::<String>("out") {
                config.out_dir = out.clone();
            }
            let store = Store::open(&config.out_dir())?;

            let csv_path = sub
                .get_one::<String>("csv")
                .cloned()
                .or_else(|| config.csv_path.clone().filter(|p| Path::new(p).exists()));
            if let Some(csv) = csv_path {
                println!("📄 Ingesting CSV: {}", csv);
                let products = ingest_products(Path::new(&csv), &store, &config)?;
                println!("✅ Ingested {} products", products.len());
                if sub.get_flag("dry-run-ingest") {
                    return Ok(());
                }
            }

            let niche = sub.get_one::<String>("niche").map(String::as_str);
            let products = list_products(&store, &[ProductStatus::Draft], niche)?;
            if products.is_empty() {
                println!("❓ No products to process");
                return Ok(());
            }

            println!("🛠️  Processing {} products...", products.len());
            let results = run_pipeline(&products, &config, &store)?;
            print_results(&results);
        }
        Some(("retry", sub)) => {
            if let Some(out) = sub.get_one::<String>("out") {
                config.out_dir = out.clone();
            }
            let store = Store::open(&config.out_dir())?;

            let statuses = if sub.get_flag("drafts") {
                [ProductStatus::Draft]
            } else {
                [ProductStatus::Failed]
            };
            let products = list_products(&store, &statuses, None)?;
            if products.is_empty() {
                println!("❓ No products to retry");
                return Ok(());
            }

            println!("🔁 Retrying {} products...", products.len());
            let results = run_pipeline(&products, &config, &store)?;
            print_results(&results);
        }
        Some(("listings", sub)) => {
            if let Some(out) = sub.get_one::<String>("out") {
                config.out_dir = out.clone();
            }
            let out_dir = config.out_dir();
            let csv_path = sub
                .get_one::<String>("csv")
                .map(|p| Path::new(p).to_path_buf())
                .unwrap_or_else(|| out_dir.join("listings.csv"));

            let rows = write_listings_csv(&out_dir, &csv_path)?;
            println!("✅ Wrote {} listings to {}", rows, csv_path.display());
        }
        Some(("upload-pack", sub)) => {
            let out_dir = config.out_dir();
            let in_path = sub
                .get_one::<String>("in")
                .map(|p| Path::new(p).to_path_buf())
                .unwrap_or_else(|| out_dir.join("listings.csv"));
            let csv_path = sub
                .get_one::<String>("out")
                .map(|p| Path::new(p).to_path_buf())
                .unwrap_or_else(|| out_dir.join("upload_pack.csv"));

            let rows = write_upload_pack(&in_path, &csv_path)?;
            println!("✅ Wrote {} upload rows to {}", rows, csv_path.display());
        }
        _ => unreachable!("subcommand_required guarantees a subcommand"),
    }

    Ok(())
}

fn print_results(results: &planner_forge::pipeline::PipelineResults) {
    println!("\n📊 SUMMARY");
    println!("✅ READY: {}", results.ready.len());
    println!("❌ FAILED: {}", results.failed.len());
    for slug in &results.failed {
        println!("   ❌ {}", slug);
    }
}
