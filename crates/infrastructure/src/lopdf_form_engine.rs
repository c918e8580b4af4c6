//! PDF form engine built on `lopdf`.

mod fields;
mod fill;
mod flatten;
mod objects;
mod overlay;
mod security;
mod text;


use lopdf::Document;
use prcard_application::PdfFormEngine;
use prcard_core::{AppError, AppResult};
use prcard_domain::{FieldValues, PdfFieldSet, StampOverlay};

/// `lopdf` implementation of the PDF form engine port.
///
/// Every call parses its own copy of the document, so the engine is
/// stateless and safe to share between requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfFormEngine;

impl LopdfFormEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn fill(&self, document: &[u8], values: &FieldValues, flatten: bool) -> AppResult<Document> {
        let mut document = open(document)?;
        fill::apply_values(&mut document, values)?;
        if flatten {
            flatten::flatten_fields(&mut document)?;
        }
        fill::request_viewer_appearances(&mut document);
        Ok(document)
    }
}

impl PdfFormEngine for LopdfFormEngine {
    fn read_fields(&self, document: &[u8]) -> AppResult<PdfFieldSet> {
        let document = open(document)?;
        Ok(fields::read_field_values(&document))
    }

    fn fill_fields(
        &self,
        document: &[u8],
        values: &FieldValues,
        flatten: bool,
    ) -> AppResult<Vec<u8>> {
        let mut document = self.fill(document, values, flatten)?;
        save(&mut document)
    }

    fn stamp_overlay(
        &self,
        document: &[u8],
        values: &FieldValues,
        overlay: &StampOverlay,
        flatten: bool,
    ) -> AppResult<Vec<u8>> {
        let mut document = self.fill(document, values, flatten)?;
        overlay::draw_stamps(&mut document, overlay)?;
        save(&mut document)
    }
}

fn open(bytes: &[u8]) -> AppResult<Document> {
    let mut document = Document::load_mem(bytes).map_err(|error| {
        AppError::Validation(format!("document is not a readable PDF: {error}"))
    })?;

    if document.is_encrypted() {
        security::decrypt_document(&mut document)?;
    }
    Ok(document)
}

fn save(document: &mut Document) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|error| AppError::Internal(format!("failed to write PDF: {error}")))?;
    Ok(buffer)
}
