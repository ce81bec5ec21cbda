use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub out_dir: String,
    pub csv_path: Option<String>,
    pub banned_words: Vec<String>,
    pub disclaimer_text: String,
    pub default_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: "out".to_string(),
            csv_path: Some("products.csv".to_string()),
            banned_words: vec![
                "cure".to_string(),
                "guarantee".to_string(),
                "diagnose".to_string(),
                "treatment".to_string(),
                "medical".to_string(),
                "miracle".to_string(),
            ],
            disclaimer_text: "This printable is for informational purposes only.".to_string(),
            default_price: 4.99,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    pub fn out_dir(&self) -> PathBuf {
        PathBuf::from(&self.out_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.out_dir().join("ace.db")
    }
}

pub const REQUIRED_MODULES: [&str; 4] = ["cover", "how_to", "tracker", "notes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Draft,
    Ready,
    Failed,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Ready => "READY",
            ProductStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ProductStatus::Draft),
            "READY" => Ok(ProductStatus::Ready),
            "FAILED" => Ok(ProductStatus::Failed),
            other => Err(anyhow::anyhow!("Unknown product status: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub niche: String,
    pub title: String,
    pub sku_slug: String,
    pub format: String,
    pub price: f64,
    pub status: ProductStatus,
    pub fail_code: Option<String>,
    pub fail_detail: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: i64,
    pub product_id: i64,
    pub kind: String,
    pub path: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [ProductStatus::Draft, ProductStatus::Ready, ProductStatus::Failed] {
            assert_eq!(status.as_str().parse::<ProductStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.out_dir, "out");
        assert_eq!(parsed.banned_words.len(), 6);
        assert_eq!(parsed.default_price, 4.99);
    }
}
