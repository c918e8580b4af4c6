//! Object graph helpers shared by the form, flatten and overlay passes.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use prcard_core::{AppError, AppResult};
use prcard_domain::PageSize;

/// US Letter, used when a page declares no media box.
const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

const MAX_INHERITANCE_DEPTH: usize = 64;

/// Follows a reference to its target, or returns the object itself.
pub(super) fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Reads a dictionary entry, following one level of indirection.
pub(super) fn entry<'a>(
    document: &'a Document,
    dictionary: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dictionary
        .get(key)
        .ok()
        .map(|object| resolve(document, object))
}

pub(super) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

pub(super) fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Looks up an inheritable attribute on an object or its `/Parent` chain.
pub(super) fn inherited<'a>(
    document: &'a Document,
    start: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = start;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dictionary = document.get_dictionary(current).ok()?;
        if let Some(value) = entry(document, dictionary, key) {
            return Some(value);
        }
        current = dictionary.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// A `[llx lly urx ury]` rectangle normalized so width and height are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Rect {
    pub(super) llx: f64,
    pub(super) lly: f64,
    pub(super) urx: f64,
    pub(super) ury: f64,
}

impl Rect {
    pub(super) fn from_object(document: &Document, object: &Object) -> Option<Self> {
        let Object::Array(items) = resolve(document, object) else {
            return None;
        };
        let values = items
            .iter()
            .map(|item| number(resolve(document, item)))
            .collect::<Option<Vec<_>>>()?;
        let [x1, y1, x2, y2] = values.as_slice() else {
            return None;
        };

        Some(Self {
            llx: x1.min(*x2),
            lly: y1.min(*y2),
            urx: x1.max(*x2),
            ury: y1.max(*y2),
        })
    }

    pub(super) fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub(super) fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

fn catalog_id(document: &Document) -> Option<ObjectId> {
    document.trailer.get(b"Root").ok()?.as_reference().ok()
}

/// The interactive form dictionary, if the document has one.
pub(super) fn acro_form(document: &Document) -> Option<&Dictionary> {
    let catalog = document.get_dictionary(catalog_id(document)?).ok()?;
    entry(document, catalog, b"AcroForm")?.as_dict().ok()
}

pub(super) fn acro_form_mut(document: &mut Document) -> Option<&mut Dictionary> {
    let catalog_id = catalog_id(document)?;
    let form_id = document
        .get_dictionary(catalog_id)
        .ok()?
        .get(b"AcroForm")
        .ok()?
        .as_reference()
        .ok();

    match form_id {
        Some(id) => document.get_dictionary_mut(id).ok(),
        None => document
            .get_dictionary_mut(catalog_id)
            .ok()?
            .get_mut(b"AcroForm")
            .ok()?
            .as_dict_mut()
            .ok(),
    }
}

/// Page size in points from the (possibly inherited) media box.
pub(super) fn page_box(document: &Document, page_id: ObjectId) -> Rect {
    inherited(document, page_id, b"MediaBox")
        .and_then(|object| Rect::from_object(document, object))
        .filter(|rect| rect.width() > 0.0 && rect.height() > 0.0)
        .unwrap_or(Rect {
            llx: 0.0,
            lly: 0.0,
            urx: DEFAULT_PAGE_SIZE.width,
            ury: DEFAULT_PAGE_SIZE.height,
        })
}

/// Adds a standard Helvetica font object and returns its id.
pub(super) fn add_helvetica(document: &mut Document) -> ObjectId {
    document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Registers `target` under `/Resources/<category>/<name>` of a page.
///
/// Inherited resources are copied onto the page first so the new entry does
/// not leak into sibling pages through the page tree.
pub(super) fn add_page_resource(
    document: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> AppResult<()> {
    let page = document.get_dictionary(page_id).map_err(internal)?;
    let resources_id = page
        .get(b"Resources")
        .ok()
        .and_then(|object| object.as_reference().ok());

    if resources_id.is_none() && !page.has(b"Resources") {
        let inherited_resources = inherited(document, page_id, b"Resources")
            .and_then(|object| object.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        document
            .get_dictionary_mut(page_id)
            .map_err(internal)?
            .set("Resources", inherited_resources);
    }

    let category_id = {
        let resources = match resources_id {
            Some(id) => document.get_dictionary(id).map_err(internal)?,
            None => document
                .get_dictionary(page_id)
                .and_then(|page| page.get(b"Resources"))
                .and_then(Object::as_dict)
                .map_err(internal)?,
        };
        resources
            .get(category.as_bytes())
            .ok()
            .and_then(|object| object.as_reference().ok())
    };

    let category_dictionary = match category_id {
        Some(id) => document.get_dictionary_mut(id).map_err(internal)?,
        None => {
            let resources = match resources_id {
                Some(id) => document.get_dictionary_mut(id).map_err(internal)?,
                None => document
                    .get_dictionary_mut(page_id)
                    .and_then(|page| page.get_mut(b"Resources"))
                    .and_then(Object::as_dict_mut)
                    .map_err(internal)?,
            };
            if !resources.has(category.as_bytes()) {
                resources.set(category, Dictionary::new());
            }
            resources
                .get_mut(category.as_bytes())
                .and_then(Object::as_dict_mut)
                .map_err(internal)?
        }
    };

    category_dictionary.set(name, Object::Reference(target));
    Ok(())
}

/// Paints `content` on top of a page.
///
/// The existing content is wrapped in `q`/`Q` so its graphics state cannot
/// leak into the appended operators.
pub(super) fn append_page_content(
    document: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> AppResult<()> {
    let existing = {
        let page = document.get_dictionary(page_id).map_err(internal)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let save_state = document.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut overlay = b"Q\n".to_vec();
    overlay.extend(content);
    let overlay_id = document.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_state));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    document
        .get_dictionary_mut(page_id)
        .map_err(internal)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

pub(super) fn internal(error: lopdf::Error) -> AppError {
    AppError::Internal(format!("failed to edit PDF object graph: {error}"))
}
