use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use prcard_core::{AppError, AppResult};
use prcard_domain::{
    FieldValue, FieldValues, PageMeta, PdfFieldSet, StampItem, StampOverlay, parse_field_values,
};

use super::{PdfFormEngine, PdfFormService, SourceDocumentStore};

struct FakeSourceDocumentStore {
    document: Option<Vec<u8>>,
    loads: Mutex<usize>,
}

impl FakeSourceDocumentStore {
    fn with(document: Option<&[u8]>) -> Self {
        Self {
            document: document.map(<[u8]>::to_vec),
            loads: Mutex::new(0),
        }
    }
}

#[async_trait]
impl SourceDocumentStore for FakeSourceDocumentStore {
    async fn load(&self) -> AppResult<Vec<u8>> {
        *self.loads.lock().await += 1;
        self.document
            .clone()
            .ok_or_else(|| AppError::NotFound("source form is missing".to_owned()))
    }
}

/// Echoes what it was asked to do so the service wiring can be asserted.
struct EchoEngine;

impl PdfFormEngine for EchoEngine {
    fn read_fields(&self, document: &[u8]) -> AppResult<PdfFieldSet> {
        let mut fields = PdfFieldSet::new();
        fields.insert(
            "Page1[0].Name[0]",
            Some(String::from_utf8_lossy(document).into_owned()),
        );
        Ok(fields)
    }

    fn fill_fields(
        &self,
        document: &[u8],
        values: &FieldValues,
        flatten: bool,
    ) -> AppResult<Vec<u8>> {
        let mut output = document.to_vec();
        output.extend(format!("|{}|{flatten}", values.len()).bytes());
        Ok(output)
    }

    fn stamp_overlay(
        &self,
        document: &[u8],
        values: &FieldValues,
        overlay: &StampOverlay,
        flatten: bool,
    ) -> AppResult<Vec<u8>> {
        let mut output = self.fill_fields(document, values, flatten)?;
        output.extend(format!("|{}", overlay.stamps_on_page(0).count()).bytes());
        Ok(output)
    }
}

#[tokio::test]
async fn list_fields_reads_the_source_document() {
    let source = Arc::new(FakeSourceDocumentStore::with(Some(b"Jane")));
    let service = PdfFormService::new(source.clone(), Arc::new(EchoEngine));

    let fields = service.list_fields().await.unwrap_or_default();

    assert_eq!(fields.get("Page1[0].Name[0]"), Some(&Some("Jane".to_owned())));
    assert_eq!(*source.loads.lock().await, 1);
}

#[tokio::test]
async fn missing_source_document_is_not_found() {
    let service = PdfFormService::new(
        Arc::new(FakeSourceDocumentStore::with(None)),
        Arc::new(EchoEngine),
    );

    assert!(matches!(
        service.list_fields().await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        service.fill_fields(&FieldValues::new(), false).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn every_call_reloads_the_source_document() {
    let source = Arc::new(FakeSourceDocumentStore::with(Some(b"pdf")));
    let service = PdfFormService::new(source.clone(), Arc::new(EchoEngine));
    let values = parse_field_values([("Page1[0].Yes[0]".to_owned(), "/On".to_owned())]);

    let first = service.fill_fields(&values, true).await;
    let second = service.fill_fields(&values, false).await;

    assert_eq!(first.unwrap_or_default(), b"pdf|1|true".to_vec());
    assert_eq!(second.unwrap_or_default(), b"pdf|1|false".to_vec());
    assert_eq!(*source.loads.lock().await, 2);
    assert_eq!(
        values.get("Page1[0].Yes[0]"),
        Some(&FieldValue::Name("On".to_owned()))
    );
}

#[tokio::test]
async fn stamp_overlay_passes_stamps_to_the_engine() {
    let service = PdfFormService::new(
        Arc::new(FakeSourceDocumentStore::with(Some(b"pdf"))),
        Arc::new(EchoEngine),
    );
    let declared = PageMeta::new(800.0, 1000.0).unwrap_or_else(|_| unreachable!());
    let overlay = StampOverlay::new(
        vec![declared],
        vec![
            StampItem::new(0, 10.0, 10.0, 20.0, "Jane").unwrap_or_else(|_| unreachable!()),
            StampItem::new(0, 10.0, 40.0, 20.0, "  ").unwrap_or_else(|_| unreachable!()),
        ],
    );

    let stamped = service
        .stamp_overlay(&FieldValues::new(), &overlay, false)
        .await;

    assert_eq!(stamped.unwrap_or_default(), b"pdf|0|false|1".to_vec());
}
