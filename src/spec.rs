use crate::archetypes::{hash_int, pick_archetype, pick_theme};
use crate::store::Store;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Optional modules only feed metadata/QA variety; the renderer follows the
/// archetype recipe.
fn optional_module_pool(niche: &str) -> &'static [&'static str] {
    match niche {
        "BUDGET" => &[
            "monthly_overview",
            "goal_setting",
            "priority_matrix",
            "weekly_review",
            "gratitude_log",
            "reflection",
            "project_steps",
        ],
        "ADHD" => &[
            "daily_focus",
            "weekly_planner",
            "habit_grid",
            "mood_checkin",
            "reflection",
            "affirmations",
            "project_steps",
        ],
        _ => &[],
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecCopy {
    pub cover_subtitle: String,
    pub included_lines: Vec<String>,
    pub howto_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecLayout {
    pub page_count: usize,
    pub grid_variant: u32,
    pub preview_pages: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpec {
    pub niche: String,
    pub title: String,
    pub slug: String,
    pub variant: u32,
    pub theme: String,
    pub archetype: String,
    pub modules: Vec<String>,
    pub recipe: Vec<String>,
    pub copy: SpecCopy,
    pub layout: SpecLayout,
}

fn hash_seed(slug: &str, variant: u32) -> u128 {
    hash_int(&format!("{}-{}", slug, variant))
}

fn dedupe_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Pick 2-4 optional modules, ordered by a per-name hash so each slug/variant
/// draws a different-looking subset from the same pool.
fn select_optional_modules(slug: &str, niche: &str, variant: u32) -> Vec<String> {
    let pool = optional_module_pool(niche);
    if pool.is_empty() {
        return Vec::new();
    }
    let seed = hash_seed(slug, variant);
    let count = usize::min(2 + (seed % 3) as usize, pool.len());

    let mut ordered: Vec<&str> = pool.to_vec();
    ordered.sort_by_key(|name| md5::compute(format!("{}-{}-{}", slug, variant, name)).0);
    ordered.iter().take(count).map(|m| m.to_string()).collect()
}

/// Deterministic product spec: archetype (page recipe + copy), theme, modules
/// for QA/metadata, and layout facts the renderer and previews rely on.
pub fn build_spec(niche: &str, title: &str, slug: &str, variant: u32) -> ProductSpec {
    let niche = niche.trim().to_uppercase();
    let title = title.trim().to_string();
    let slug = slug.trim().to_string();

    let seed = hash_seed(&slug, variant);
    let archetype = pick_archetype(&slug, &niche, &title);
    let theme = pick_theme(&format!("{}-{}", slug, variant));

    let recipe: Vec<String> = archetype.recipe.iter().map(|p| p.to_string()).collect();
    let page_count = recipe.len();

    let preview_pages: Vec<usize> = archetype
        .preview_pages
        .iter()
        .filter(|_| page_count > 0)
        .map(|&p| p.min(page_count - 1))
        .collect();

    let optional = select_optional_modules(&slug, &niche, variant);
    let mut modules: Vec<String> = crate::models::REQUIRED_MODULES
        .iter()
        .map(|m| m.to_string())
        .collect();
    modules.extend(recipe.iter().cloned());
    modules.extend(optional);
    let modules = dedupe_preserve_order(modules);

    ProductSpec {
        niche,
        title,
        slug,
        variant,
        theme: theme.to_string(),
        archetype: archetype.key.to_string(),
        modules,
        recipe,
        copy: SpecCopy {
            cover_subtitle: archetype.cover_subtitle.to_string(),
            included_lines: archetype.included_lines.iter().map(|s| s.to_string()).collect(),
            howto_lines: archetype.howto_lines.iter().map(|s| s.to_string()).collect(),
        },
        layout: SpecLayout {
            page_count,
            grid_variant: (seed.wrapping_add(variant as u128) % 6) as u32,
            preview_pages,
        },
    }
}

pub fn write_spec(spec: &ProductSpec, store: &Store) -> Result<PathBuf> {
    let path = store.artifact_path(&spec.slug, "spec")?;
    let json = serde_json::to_string_pretty(spec)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write spec {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_is_deterministic() {
        let a = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        let b = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn spec_contains_required_modules_and_recipe() {
        let spec = build_spec("BUDGET", "Budget Tracker", "budget-tracker", 0);
        for module in crate::models::REQUIRED_MODULES {
            assert!(spec.modules.iter().any(|m| m == module), "missing {module}");
        }
        for page in &spec.recipe {
            assert!(spec.modules.iter().any(|m| m == page), "missing {page}");
        }
        assert_eq!(spec.layout.page_count, spec.recipe.len());
    }

    #[test]
    fn preview_pages_stay_in_range() {
        let spec = build_spec("ADHD", "Weekly Review Kit", "weekly-review-kit", 0);
        assert_eq!(spec.layout.preview_pages.len(), 3);
        for page in &spec.layout.preview_pages {
            assert!(*page < spec.layout.page_count);
        }
    }

    #[test]
    fn variants_change_the_module_mix() {
        let variants: Vec<Vec<String>> = (0..10)
            .map(|v| build_spec("BUDGET", "Budget Tracker", "budget-tracker", v).modules)
            .collect();
        // At least one variant must differ, otherwise the retry loop is useless.
        assert!(variants.iter().any(|m| *m != variants[0]));
    }

    #[test]
    fn optional_module_count_is_bounded() {
        for variant in 0..10 {
            let picked = select_optional_modules("budget-tracker", "BUDGET", variant);
            assert!((2..=4).contains(&picked.len()), "{picked:?}");
        }
        assert!(select_optional_modules("slug", "OTHER", 0).is_empty());
    }
}
