use async_trait::async_trait;

use prcard_core::AppResult;
use prcard_domain::{FieldValues, PdfFieldSet, StampOverlay};

/// Port for the official, server-controlled source document.
#[async_trait]
pub trait SourceDocumentStore: Send + Sync {
    /// Reads the document bytes. Fails with `AppError::NotFound` when missing.
    async fn load(&self) -> AppResult<Vec<u8>>;
}

/// Port for reading and writing interactive PDF forms.
///
/// Every call works on its own parsed copy of `document`.
pub trait PdfFormEngine: Send + Sync {
    /// Lists fully qualified field names with their current values.
    ///
    /// Encrypted documents are opened with a blank password; documents that
    /// cannot be parsed or decrypted fail with `AppError::Validation`.
    fn read_fields(&self, document: &[u8]) -> AppResult<PdfFieldSet>;

    /// Applies values to the form and serializes the result.
    fn fill_fields(&self, document: &[u8], values: &FieldValues, flatten: bool)
    -> AppResult<Vec<u8>>;

    /// Applies values, then draws the overlay stamps on top of each page.
    fn stamp_overlay(
        &self,
        document: &[u8],
        values: &FieldValues,
        overlay: &StampOverlay,
        flatten: bool,
    ) -> AppResult<Vec<u8>>;
}
