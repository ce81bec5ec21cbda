pub mod archetypes;
pub mod ingest;
pub mod listings;
pub mod metadata;
pub mod models;
pub mod package;
pub mod pipeline;
pub mod qa;
pub mod render_pdf;
pub mod render_preview;
pub mod spec;
pub mod store;
