//! Paints widget appearances into page content and removes the fields.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use prcard_core::{AppError, AppResult};
use tracing::debug;

use super::fields::collect_fields;
use super::objects::{
    Rect, acro_form_mut, add_page_resource, append_page_content, entry, internal, number, real,
};

/// Annotation flag bit for hidden annotations.
const HIDDEN_FLAG: i64 = 1 << 1;

/// Flattens every form field. Returns the number of widgets painted.
pub(super) fn flatten_fields(document: &mut Document) -> AppResult<usize> {
    let fields = collect_fields(document);
    let widgets: HashSet<ObjectId> = fields
        .iter()
        .flat_map(|field| field.widgets.iter().copied())
        .collect();
    let mut painted = 0;
    let mut resource_index = 0;

    for page_id in document.get_pages().into_values() {
        let annotations = page_annotations(document, page_id);
        if !annotations
            .iter()
            .any(|annotation| is_widget(annotation, &widgets))
        {
            continue;
        }

        let mut operations = Vec::new();
        let mut kept = Vec::new();
        for annotation in annotations {
            let Object::Reference(widget_id) = annotation else {
                kept.push(annotation);
                continue;
            };
            if !widgets.contains(&widget_id) {
                kept.push(annotation);
                continue;
            }
            let Some(placement) = widget_placement(document, widget_id) else {
                continue;
            };

            resource_index += 1;
            let name = format!("PrcFlat{resource_index}");
            add_page_resource(document, page_id, "XObject", &name, placement.appearance)?;
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("cm", placement.matrix.iter().copied().map(real).collect()),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ]);
            painted += 1;
        }

        if !operations.is_empty() {
            let content = Content { operations }.encode().map_err(|error| {
                AppError::Internal(format!("failed to encode flattened fields: {error}"))
            })?;
            append_page_content(document, page_id, content)?;
        }

        let page = document.get_dictionary_mut(page_id).map_err(internal)?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", Object::Array(kept));
        }
    }

    if let Some(form) = acro_form_mut(document) {
        form.set("Fields", Object::Array(Vec::new()));
        form.remove(b"XFA");
    }

    debug!(
        field_count = fields.len(),
        painted, "flattened form fields"
    );
    Ok(painted)
}

fn is_widget(annotation: &Object, widgets: &HashSet<ObjectId>) -> bool {
    matches!(annotation, Object::Reference(id) if widgets.contains(id))
}

fn page_annotations(document: &Document, page_id: ObjectId) -> Vec<Object> {
    document
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| entry(document, page, b"Annots"))
        .and_then(|annotations| annotations.as_array().ok())
        .cloned()
        .unwrap_or_default()
}

struct WidgetPlacement {
    appearance: ObjectId,
    matrix: [f64; 6],
}

/// The normal appearance of a visible widget and the matrix that maps its
/// bounding box onto the widget rectangle.
fn widget_placement(document: &Document, widget_id: ObjectId) -> Option<WidgetPlacement> {
    let widget = document.get_dictionary(widget_id).ok()?;
    let flags = entry(document, widget, b"F").and_then(number).unwrap_or(0.0) as i64;
    if flags & HIDDEN_FLAG != 0 {
        return None;
    }

    let rect = Rect::from_object(document, widget.get(b"Rect").ok()?)?;
    let normal = entry(document, widget, b"AP")?
        .as_dict()
        .ok()?
        .get(b"N")
        .ok()?;

    let appearance = match normal {
        Object::Reference(id) => match document.get_object(*id).ok()? {
            Object::Stream(_) => *id,
            Object::Dictionary(states) => selected_state(widget, states)?,
            _ => return None,
        },
        Object::Dictionary(states) => selected_state(widget, states)?,
        _ => return None,
    };

    let bounding_box = document
        .get_object(appearance)
        .ok()?
        .as_stream()
        .ok()
        .and_then(|stream| stream.dict.get(b"BBox").ok())
        .and_then(|object| Rect::from_object(document, object))
        .unwrap_or(Rect {
            llx: 0.0,
            lly: 0.0,
            urx: rect.width(),
            ury: rect.height(),
        });

    let scale_x = if bounding_box.width() > 0.0 {
        rect.width() / bounding_box.width()
    } else {
        1.0
    };
    let scale_y = if bounding_box.height() > 0.0 {
        rect.height() / bounding_box.height()
    } else {
        1.0
    };

    Some(WidgetPlacement {
        appearance,
        matrix: [
            scale_x,
            0.0,
            0.0,
            scale_y,
            rect.llx - bounding_box.llx * scale_x,
            rect.lly - bounding_box.lly * scale_y,
        ],
    })
}

fn selected_state(widget: &Dictionary, states: &Dictionary) -> Option<ObjectId> {
    let state = widget.get(b"AS").ok()?.as_name().ok()?;
    states.get(state).ok()?.as_reference().ok()
}
