//! Draws free-text stamps over page content.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, StringFormat};
use prcard_core::{AppError, AppResult};
use prcard_domain::{PageSize, StampOverlay};
use tracing::debug;

use super::objects::{add_helvetica, add_page_resource, append_page_content, page_box, real};
use super::text::win_ansi_bytes;

const STAMP_FONT: &str = "PrcStampF";

/// Draws the overlay's visible stamps. Returns the number drawn.
///
/// Stamps on pages the document does not have are skipped.
pub(super) fn draw_stamps(document: &mut Document, overlay: &StampOverlay) -> AppResult<usize> {
    let pages = document.get_pages();
    let mut font_id = None;
    let mut drawn = 0;

    for (index, page_id) in pages.values().copied().enumerate() {
        let stamps: Vec<_> = overlay.stamps_on_page(index).collect();
        if stamps.is_empty() {
            continue;
        }

        let media_box = page_box(document, page_id);
        let page_size = PageSize {
            width: media_box.width(),
            height: media_box.height(),
        };
        let declared = overlay.declared_page(index);

        let mut operations = vec![Operation::new("g", vec![real(0.0)])];
        for stamp in &stamps {
            let placement = stamp.placement(declared, page_size);
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(STAMP_FONT.as_bytes().to_vec()),
                        real(placement.font_size_pt),
                    ],
                ),
                Operation::new(
                    "Td",
                    vec![
                        real(media_box.llx + placement.x_pt),
                        real(media_box.lly + placement.y_pt),
                    ],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        win_ansi_bytes(stamp.text()),
                        StringFormat::Hexadecimal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }
            .encode()
            .map_err(|error| AppError::Internal(format!("failed to encode stamps: {error}")))?;
        let font = *font_id.get_or_insert_with(|| add_helvetica(document));
        add_page_resource(document, page_id, "Font", STAMP_FONT, font)?;
        append_page_content(document, page_id, content)?;
        drawn += stamps.len();
    }

    let skipped = overlay
        .stamps()
        .iter()
        .filter(|stamp| !stamp.is_blank() && stamp.page() >= pages.len())
        .count();
    debug!(drawn, skipped, "drew stamp overlay");
    Ok(drawn)
}
