//! Marketplace preview images: rasterize three spec-chosen pages of the A4 PDF
//! into PNGs via Pdfium.

use crate::spec::ProductSpec;
use crate::store::Store;
use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rendered at twice the A4 point width so thumbnails stay crisp.
pub const PREVIEW_TARGET_WIDTH: u32 = 1190;

/// Errors emitted while rendering preview images.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to load Pdfium runtime: {0}")]
    Library(#[from] PdfiumError),

    #[error("failed to load PDF document: {0}")]
    Document(#[source] PdfiumError),

    #[error("document has {pages} pages but previews need page {wanted}")]
    TooFewPages { pages: usize, wanted: usize },

    #[error("failed to render page {page_index}: {source}")]
    PageRender {
        page_index: usize,
        #[source]
        source: PdfiumError,
    },

    #[error("failed to encode page {page_index} as PNG: {source}")]
    Encode {
        page_index: usize,
        #[source]
        source: image::ImageError,
    },
}

/// Rasterize the requested zero-based pages of a PDF into PNG bytes.
pub fn render_preview_pngs(
    bytes: &[u8],
    pages: &[usize],
    target_width: u32,
) -> Result<Vec<Vec<u8>>, PreviewError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(PreviewError::Document)?;

    let page_count = document.pages().len() as usize;
    let mut images = Vec::with_capacity(pages.len());

    for &page_index in pages {
        if page_index >= page_count {
            return Err(PreviewError::TooFewPages {
                pages: page_count,
                wanted: page_index + 1,
            });
        }
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|source| PreviewError::PageRender { page_index, source })?;

        let render_config = PdfRenderConfig::new().set_target_width(target_width as i32);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|source| PreviewError::PageRender { page_index, source })?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();

        let mut encoded = Vec::new();
        let encoder = PngEncoder::new(&mut encoded);
        encoder
            .write_image(&rgba, width, height, ColorType::Rgba8.into())
            .map_err(|source| PreviewError::Encode { page_index, source })?;
        images.push(encoded);
    }

    Ok(images)
}

/// Render preview_1.png .. preview_3.png for a product from its A4 PDF.
pub fn render_previews(
    spec: &ProductSpec,
    pdf_path: &Path,
    store: &Store,
) -> Result<Vec<PathBuf>> {
    let bytes = fs::read(pdf_path)
        .with_context(|| format!("Failed to read {}", pdf_path.display()))?;
    let pngs = render_preview_pngs(&bytes, &spec.layout.preview_pages, PREVIEW_TARGET_WIDTH)?;

    let mut paths = Vec::with_capacity(pngs.len());
    for (i, png) in pngs.iter().enumerate() {
        let kind = format!("preview_{}", i + 1);
        let path = store.artifact_path(&spec.slug, &kind)?;
        fs::write(&path, png)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Count pages without rendering anything.
pub fn pdf_page_count(bytes: &[u8]) -> Result<usize, PreviewError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(PreviewError::Document)?;
    Ok(document.pages().len() as usize)
}

fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(result) = try_bind_from_env("PDFIUM_LIBRARY_PATH") {
        return result;
    }

    for var in ["PDFIUM_LIB_DIR", "PDFIUM_DYNAMIC_LIB_PATH"] {
        if let Some(result) = try_bind_from_env(var) {
            if result.is_ok() {
                return result;
            }
        }
    }

    for candidate in candidate_paths() {
        if let Some(result) = try_bind_from_path(&candidate) {
            if result.is_ok() {
                return result;
            }
        }
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(primary_err) => Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|_| primary_err),
    }
}

fn try_bind_from_env(var: &str) -> Option<Result<Pdfium, PdfiumError>> {
    let value = env::var_os(var)?;
    try_bind_from_path(Path::new(&value))
}

fn try_bind_from_path(path: &Path) -> Option<Result<Pdfium, PdfiumError>> {
    if path.is_dir() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        Some(Pdfium::bind_to_library(lib_path).map(Pdfium::new))
    } else if path.exists() {
        Some(Pdfium::bind_to_library(path).map(Pdfium::new))
    } else {
        None
    }
}

const DEFAULT_PDFIUM_LOCATIONS: &[&str] = &[
    "third_party/pdfium/lib/libpdfium.so",
    "pdfium/lib/libpdfium.so",
    "libpdfium.so",
];

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for candidate in DEFAULT_PDFIUM_LOCATIONS {
        paths.push(PathBuf::from(candidate));
        paths.push(manifest_dir.join(candidate));
    }
    paths
}
