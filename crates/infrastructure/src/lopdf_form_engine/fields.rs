//! Walks the AcroForm field tree into terminal fields.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use prcard_domain::PdfFieldSet;

use super::objects::{acro_form, entry, inherited};
use super::text::{decode_text, value_to_string};

/// A terminal field and the widget annotations that display it.
#[derive(Debug, Clone)]
pub(super) struct FormField {
    pub(super) id: ObjectId,
    pub(super) name: String,
    pub(super) widgets: Vec<ObjectId>,
}

impl FormField {
    /// Field type (`Tx`, `Btn`, `Ch`, `Sig`), inherited through parents.
    pub(super) fn field_type<'a>(&self, document: &'a Document) -> Option<&'a [u8]> {
        inherited(document, self.id, b"FT")?.as_name().ok()
    }
}

/// Every terminal field reachable from `/AcroForm/Fields`, in tree order.
pub(super) fn collect_fields(document: &Document) -> Vec<FormField> {
    let Some(form) = acro_form(document) else {
        return Vec::new();
    };
    let Some(Object::Array(roots)) = entry(document, form, b"Fields") else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    for root in roots {
        if let Ok(id) = root.as_reference() {
            visit(document, id, None, &mut visited, &mut fields);
        }
    }
    fields
}

fn visit(
    document: &Document,
    id: ObjectId,
    parent_name: Option<&str>,
    visited: &mut HashSet<ObjectId>,
    fields: &mut Vec<FormField>,
) {
    if !visited.insert(id) {
        return;
    }
    let Ok(dictionary) = document.get_dictionary(id) else {
        return;
    };

    let partial_name = match entry(document, dictionary, b"T") {
        Some(Object::String(bytes, _)) => Some(decode_text(bytes)),
        _ => None,
    };
    let name = match (parent_name, partial_name) {
        (Some(parent), Some(partial)) => Some(format!("{parent}.{partial}")),
        (None, Some(partial)) => Some(partial),
        (Some(parent), None) => Some(parent.to_owned()),
        (None, None) => None,
    };

    let mut child_fields = Vec::new();
    let mut widgets = Vec::new();
    for kid in kids(document, dictionary) {
        match document.get_dictionary(kid) {
            Ok(kid_dictionary) if kid_dictionary.has(b"T") => child_fields.push(kid),
            Ok(_) => widgets.push(kid),
            Err(_) => {}
        }
    }

    for child in child_fields {
        visit(document, child, name.as_deref(), visited, fields);
    }

    let is_terminal = !widgets.is_empty() || !dictionary.has(b"Kids");
    if let (true, Some(name)) = (is_terminal, name) {
        if widgets.is_empty() {
            widgets.push(id);
        }
        fields.push(FormField { id, name, widgets });
    }
}

fn kids(document: &Document, dictionary: &Dictionary) -> Vec<ObjectId> {
    match entry(document, dictionary, b"Kids") {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Field names mapped to their current values.
pub(super) fn read_field_values(document: &Document) -> PdfFieldSet {
    let mut field_set = PdfFieldSet::new();
    for field in collect_fields(document) {
        let value = document
            .get_dictionary(field.id)
            .ok()
            .and_then(|dictionary| entry(document, dictionary, b"V"))
            .and_then(value_to_string);
        field_set.insert(field.name, value);
    }
    field_set
}
