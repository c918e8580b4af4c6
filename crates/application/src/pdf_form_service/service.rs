use std::sync::Arc;

use tracing::info;

use prcard_core::AppResult;
use prcard_domain::{FieldValues, PdfFieldSet, StampOverlay};

use super::ports::{PdfFormEngine, SourceDocumentStore};

/// Application service for the PR card PDF form.
///
/// The source document is loaded again on every call, so concurrent requests
/// never share parsed document state.
#[derive(Clone)]
pub struct PdfFormService {
    source: Arc<dyn SourceDocumentStore>,
    engine: Arc<dyn PdfFormEngine>,
}

impl PdfFormService {
    /// Creates a service from a document store and a form engine.
    #[must_use]
    pub fn new(source: Arc<dyn SourceDocumentStore>, engine: Arc<dyn PdfFormEngine>) -> Self {
        Self { source, engine }
    }

    /// Lists the source form's fields with their current values.
    pub async fn list_fields(&self) -> AppResult<PdfFieldSet> {
        let document = self.source.load().await?;
        let fields = self.engine.read_fields(&document)?;
        info!(field_count = fields.len(), "listed source form fields");
        Ok(fields)
    }

    /// Fills the source form and returns the new document.
    pub async fn fill_fields(&self, values: &FieldValues, flatten: bool) -> AppResult<Vec<u8>> {
        let document = self.source.load().await?;
        let filled = self.engine.fill_fields(&document, values, flatten)?;
        info!(
            value_count = values.len(),
            flatten,
            output_bytes = filled.len(),
            "filled source form"
        );
        Ok(filled)
    }

    /// Fills the source form and stamps free text over it.
    pub async fn stamp_overlay(
        &self,
        values: &FieldValues,
        overlay: &StampOverlay,
        flatten: bool,
    ) -> AppResult<Vec<u8>> {
        let document = self.source.load().await?;
        let stamped = self
            .engine
            .stamp_overlay(&document, values, overlay, flatten)?;
        info!(
            value_count = values.len(),
            stamp_count = overlay.stamps().len(),
            flatten,
            output_bytes = stamped.len(),
            "stamped source form"
        );
        Ok(stamped)
    }
}
