//! PDF form ports and application service.

mod ports;
mod service;

#[cfg(test)]
mod tests;

pub use ports::{PdfFormEngine, SourceDocumentStore};
pub use service::PdfFormService;
