use crate::models::{Artifact, Product, ProductStatus};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed file name for each artifact kind inside a product directory.
pub fn artifact_file_name(kind: &str) -> Option<&'static str> {
    match kind {
        "pdf_a4" => Some("a4.pdf"),
        "pdf_usletter" => Some("letter.pdf"),
        "preview_1" => Some("preview_1.png"),
        "preview_2" => Some("preview_2.png"),
        "preview_3" => Some("preview_3.png"),
        "bundle" => Some("bundle.zip"),
        "metadata" => Some("metadata.json"),
        "spec" => Some("spec.json"),
        "error" => Some("error.log"),
        "readme" => Some("README.txt"),
        _ => None,
    }
}

/// SQLite-backed bookkeeping for products and their artifacts.
pub struct Store {
    conn: Connection,
    out_dir: PathBuf,
}

impl Store {
    pub fn open(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
        let conn = Connection::open(out_dir.join("ace.db"))?;
        let store = Self {
            conn,
            out_dir: out_dir.to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS product (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                niche TEXT NOT NULL,
                title TEXT NOT NULL,
                sku_slug TEXT NOT NULL,
                format TEXT NOT NULL DEFAULT 'printable',
                price REAL NOT NULL DEFAULT 4.99,
                status TEXT NOT NULL DEFAULT 'DRAFT',
                fail_code TEXT,
                fail_detail TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_product_sku_slug ON product (sku_slug);
            CREATE TABLE IF NOT EXISTS artifact (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES product (id),
                type TEXT NOT NULL,
                path TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        self.migrate()?;
        Ok(())
    }

    /// Older databases predate the fail_code/fail_detail columns.
    fn migrate(&self) -> Result<()> {
        let mut columns = Vec::new();
        let mut stmt = self.conn.prepare("PRAGMA table_info(product)")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            columns.push(name);
        }
        if !columns.iter().any(|c| c == "fail_code") {
            self.conn
                .execute("ALTER TABLE product ADD COLUMN fail_code TEXT", [])?;
        }
        if !columns.iter().any(|c| c == "fail_detail") {
            self.conn
                .execute("ALTER TABLE product ADD COLUMN fail_detail TEXT", [])?;
        }
        Ok(())
    }

    pub fn insert_product(
        &self,
        niche: &str,
        title: &str,
        sku_slug: &str,
        price: f64,
    ) -> Result<Product> {
        let created_at = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO product (niche, title, sku_slug, format, price, status, created_at)
             VALUES (?1, ?2, ?3, 'printable', ?4, 'DRAFT', ?5)",
            params![niche, title, sku_slug, price, created_at],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Product {
            id,
            niche: niche.to_string(),
            title: title.to_string(),
            sku_slug: sku_slug.to_string(),
            format: "printable".to_string(),
            price,
            status: ProductStatus::Draft,
            fail_code: None,
            fail_detail: None,
            created_at,
        })
    }

    pub fn list_products(
        &self,
        statuses: &[ProductStatus],
        niche: Option<&str>,
    ) -> Result<Vec<Product>> {
        let mut sql = String::from(
            "SELECT id, niche, title, sku_slug, format, price, status, fail_code, fail_detail, created_at
             FROM product WHERE 1 = 1",
        );
        if !statuses.is_empty() {
            let placeholders: Vec<String> = statuses
                .iter()
                .map(|s| format!("'{}'", s.as_str()))
                .collect();
            sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
        }
        if niche.is_some() {
            sql.push_str(" AND niche = ?1");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Product, String)> {
            let status: String = row.get(6)?;
            Ok((
                Product {
                    id: row.get(0)?,
                    niche: row.get(1)?,
                    title: row.get(2)?,
                    sku_slug: row.get(3)?,
                    format: row.get(4)?,
                    price: row.get(5)?,
                    status: ProductStatus::Draft,
                    fail_code: row.get(7)?,
                    fail_detail: row.get(8)?,
                    created_at: row.get(9)?,
                },
                status,
            ))
        };
        let rows: Vec<(Product, String)> = if let Some(niche) = niche {
            stmt.query_map(params![niche], map_row)?
                .collect::<rusqlite::Result<_>>()?
        } else {
            stmt.query_map([], map_row)?
                .collect::<rusqlite::Result<_>>()?
        };

        let mut products = Vec::with_capacity(rows.len());
        for (mut product, status) in rows {
            product.status = status.parse()?;
            products.push(product);
        }
        Ok(products)
    }

    pub fn set_status(
        &self,
        product_id: i64,
        status: ProductStatus,
        fail_code: Option<&str>,
        fail_detail: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE product SET status = ?1, fail_code = ?2, fail_detail = ?3 WHERE id = ?4",
            params![status.as_str(), fail_code, fail_detail, product_id],
        )?;
        Ok(())
    }

    pub fn record_artifacts(&self, product_id: i64, artifacts: &[(String, PathBuf)]) -> Result<()> {
        let created_at = Utc::now().to_rfc3339();
        for (kind, path) in artifacts {
            let relative = path.strip_prefix(&self.out_dir).unwrap_or(path);
            self.conn.execute(
                "INSERT INTO artifact (product_id, type, path, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![product_id, kind, relative.to_string_lossy(), created_at],
            )?;
        }
        Ok(())
    }

    pub fn list_artifacts(&self, product_id: i64) -> Result<Vec<Artifact>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, type, path, created_at FROM artifact WHERE product_id = ?1 ORDER BY id",
        )?;
        let artifacts = stmt
            .query_map(params![product_id], |row| {
                Ok(Artifact {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    kind: row.get(2)?,
                    path: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artifacts)
    }

    /// Directory holding all artifacts for one product, created on demand.
    pub fn product_dir(&self, slug: &str) -> Result<PathBuf> {
        let dir = self.out_dir.join(slug);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create product directory {}", dir.display()))?;
        Ok(dir)
    }

    pub fn artifact_path(&self, slug: &str, kind: &str) -> Result<PathBuf> {
        let file_name = artifact_file_name(kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown artifact kind: {}", kind))?;
        Ok(self.product_dir(slug)?.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_and_list_products() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store
            .insert_product("ADHD", "Focus Planner", "focus-planner", 4.99)
            .unwrap();
        store
            .insert_product("BUDGET", "Budget Tracker", "budget-tracker", 4.99)
            .unwrap();

        let drafts = store.list_products(&[ProductStatus::Draft], None).unwrap();
        assert_eq!(drafts.len(), 2);

        let budget = store
            .list_products(&[ProductStatus::Draft], Some("BUDGET"))
            .unwrap();
        assert_eq!(budget.len(), 1);
        assert_eq!(budget[0].sku_slug, "budget-tracker");
    }

    #[test]
    fn status_update_records_failure_detail() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let product = store
            .insert_product("ADHD", "Focus Planner", "focus-planner", 4.99)
            .unwrap();
        store
            .set_status(
                product.id,
                ProductStatus::Failed,
                Some("QA"),
                Some("Banned words found: miracle"),
            )
            .unwrap();

        let failed = store.list_products(&[ProductStatus::Failed], None).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].fail_code.as_deref(), Some("QA"));
        assert!(store
            .list_products(&[ProductStatus::Draft], None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn artifacts_store_paths_relative_to_out_dir() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let product = store
            .insert_product("ADHD", "Focus Planner", "focus-planner", 4.99)
            .unwrap();
        let pdf = store.artifact_path("focus-planner", "pdf_a4").unwrap();
        store
            .record_artifacts(product.id, &[("pdf_a4".to_string(), pdf)])
            .unwrap();

        let artifacts = store.list_artifacts(product.id).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, "focus-planner/a4.pdf");
    }

    #[test]
    fn reopening_keeps_rows_and_migration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store
                .insert_product("BUDGET", "Bills Planner", "bills-planner", 4.99)
                .unwrap();
        }
        let store = Store::open(dir.path()).unwrap();
        let products = store.list_products(&[], None).unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn unknown_artifact_kind_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.artifact_path("slug", "thumbnail").is_err());
    }
}
