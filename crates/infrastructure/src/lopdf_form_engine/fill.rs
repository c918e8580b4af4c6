//! Writes values into fields and regenerates their widget appearances.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use prcard_core::{AppError, AppResult};
use prcard_domain::{FieldValue, FieldValues};
use tracing::debug;

use super::fields::{FormField, collect_fields};
use super::objects::{
    Rect, acro_form, acro_form_mut, add_helvetica, entry, inherited, internal, real,
};
use super::text::{decode_text, encode_text, win_ansi_bytes};

const FALLBACK_DEFAULT_APPEARANCE: &str = "/Helv 0 Tf 0 g";
const AUTO_FONT_SIZE_RATIO: f64 = 0.7;
const MIN_AUTO_FONT_SIZE: f64 = 4.0;
const MAX_AUTO_FONT_SIZE: f64 = 12.0;
const TEXT_PADDING: f64 = 2.0;

/// Font and colour parsed from a `/DA` string.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct DefaultAppearance {
    pub(super) font: String,
    pub(super) size: f64,
    pub(super) color: Vec<f64>,
}

impl DefaultAppearance {
    pub(super) fn parse(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let mut appearance = Self {
            font: "Helv".to_owned(),
            size: 0.0,
            color: vec![0.0],
        };

        for (index, token) in tokens.iter().enumerate() {
            let operands = |count: usize| -> Option<Vec<f64>> {
                let start = index.checked_sub(count)?;
                tokens[start..index]
                    .iter()
                    .map(|operand| operand.parse::<f64>().ok())
                    .collect()
            };
            match *token {
                "Tf" if index >= 2 => {
                    if let Some(font) = tokens[index - 2].strip_prefix('/') {
                        appearance.font = font.to_owned();
                    }
                    appearance.size = tokens[index - 1].parse().unwrap_or(0.0);
                }
                "g" => {
                    if let Some(gray) = operands(1) {
                        appearance.color = gray;
                    }
                }
                "rg" => {
                    if let Some(rgb) = operands(3) {
                        appearance.color = rgb;
                    }
                }
                _ => {}
            }
        }
        appearance
    }

    fn font_size_for(&self, height: f64) -> f64 {
        if self.size > 0.0 {
            self.size
        } else {
            (height * AUTO_FONT_SIZE_RATIO).clamp(MIN_AUTO_FONT_SIZE, MAX_AUTO_FONT_SIZE)
        }
    }

    fn color_operation(&self) -> Operation {
        let operator = if self.color.len() == 3 { "rg" } else { "g" };
        Operation::new(operator, self.color.iter().copied().map(real).collect())
    }
}

/// Applies `values` to matching fields. Unknown names are ignored.
///
/// Returns how many fields were written.
pub(super) fn apply_values(document: &mut Document, values: &FieldValues) -> AppResult<usize> {
    if values.is_empty() {
        return Ok(0);
    }

    let fields = collect_fields(document);
    let mut fonts = FontResolver::default();
    let mut written = 0;

    for field in &fields {
        let Some(value) = values.get(&field.name) else {
            continue;
        };
        match value {
            FieldValue::Text(text) => write_text(document, field, text, &mut fonts)?,
            FieldValue::Name(state) => write_name(document, field, state)?,
        }
        written += 1;
    }

    let known = fields.len();
    debug!(
        requested = values.len(),
        written, known, "applied form field values"
    );

    if written > 0 {
        if let Some(form) = acro_form_mut(document) {
            // XFA-aware viewers would show the stale XFA data instead.
            form.remove(b"XFA");
        }
    }
    Ok(written)
}

/// Sets `/NeedAppearances true` on the form, if there is one.
pub(super) fn request_viewer_appearances(document: &mut Document) {
    if let Some(form) = acro_form_mut(document) {
        form.set("NeedAppearances", Object::Boolean(true));
    }
}

fn write_text(
    document: &mut Document,
    field: &FormField,
    text: &str,
    fonts: &mut FontResolver,
) -> AppResult<()> {
    let draws_text = matches!(field.field_type(document), Some(b"Tx" | b"Ch"));

    document
        .get_dictionary_mut(field.id)
        .map_err(internal)?
        .set("V", encode_text(text));

    if !draws_text {
        return Ok(());
    }

    for widget in &field.widgets {
        let Some(rect) = document
            .get_dictionary(*widget)
            .ok()
            .and_then(|dictionary| dictionary.get(b"Rect").ok())
            .and_then(|object| Rect::from_object(document, object))
        else {
            continue;
        };

        let appearance = DefaultAppearance::parse(&default_appearance(document, field, *widget));
        let font_id = fonts.resolve(document, &appearance.font);
        let stream = text_appearance(text, &appearance, rect, font_id)?;
        let stream_id = document.add_object(stream);

        document
            .get_dictionary_mut(*widget)
            .map_err(internal)?
            .set("AP", dictionary! { "N" => stream_id });
    }
    Ok(())
}

fn write_name(document: &mut Document, field: &FormField, state: &str) -> AppResult<()> {
    document
        .get_dictionary_mut(field.id)
        .map_err(internal)?
        .set("V", Object::Name(state.as_bytes().to_vec()));

    for widget in &field.widgets {
        let has_state = {
            let dictionary = document.get_dictionary(*widget).map_err(internal)?;
            let normal = entry(document, dictionary, b"AP")
                .and_then(|appearances| appearances.as_dict().ok())
                .and_then(|appearances| entry(document, appearances, b"N"))
                .and_then(|normal| normal.as_dict().ok());
            normal.map(|states| states.has(state.as_bytes()))
        };

        let appearance_state = match has_state {
            Some(false) => b"Off".to_vec(),
            Some(true) | None => state.as_bytes().to_vec(),
        };
        document
            .get_dictionary_mut(*widget)
            .map_err(internal)?
            .set("AS", Object::Name(appearance_state));
    }
    Ok(())
}

fn default_appearance(document: &Document, field: &FormField, widget: ObjectId) -> String {
    let own = document
        .get_dictionary(widget)
        .ok()
        .and_then(|dictionary| entry(document, dictionary, b"DA"));
    let found = own
        .or_else(|| inherited(document, field.id, b"DA"))
        .or_else(|| acro_form(document).and_then(|form| entry(document, form, b"DA")));

    match found {
        Some(Object::String(bytes, _)) => decode_text(bytes),
        _ => FALLBACK_DEFAULT_APPEARANCE.to_owned(),
    }
}

fn text_appearance(
    text: &str,
    appearance: &DefaultAppearance,
    rect: Rect,
    font_id: ObjectId,
) -> AppResult<Stream> {
    let width = rect.width();
    let height = rect.height();
    let font_size = appearance.font_size_for(height);
    let baseline = ((height - font_size) / 2.0 + font_size * 0.22).max(1.0);

    let content = Content {
        operations: vec![
            Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
            Operation::new("q", vec![]),
            Operation::new(
                "re",
                vec![
                    real(1.0),
                    real(1.0),
                    real((width - 2.0).max(0.0)),
                    real((height - 2.0).max(0.0)),
                ],
            ),
            Operation::new("W", vec![]),
            Operation::new("n", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(appearance.font.as_bytes().to_vec()),
                    real(font_size),
                ],
            ),
            appearance.color_operation(),
            Operation::new("Td", vec![real(TEXT_PADDING), real(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi_bytes(text), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("EMC", vec![]),
        ],
    };
    let bytes = content.encode().map_err(|error| {
        AppError::Internal(format!("failed to encode field appearance: {error}"))
    })?;

    let mut fonts = Dictionary::new();
    fonts.set(appearance.font.as_str(), Object::Reference(font_id));

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![real(0.0), real(0.0), real(width), real(height)],
            "Resources" => dictionary! { "Font" => fonts },
        },
        bytes,
    ))
}

/// Finds fonts in `/AcroForm/DR`, adding Helvetica when a name is unknown.
#[derive(Default)]
struct FontResolver {
    fallback: Option<ObjectId>,
}

impl FontResolver {
    fn resolve(&mut self, document: &mut Document, font: &str) -> ObjectId {
        let declared = acro_form(document)
            .and_then(|form| entry(document, form, b"DR"))
            .and_then(|resources| resources.as_dict().ok())
            .and_then(|resources| entry(document, resources, b"Font"))
            .and_then(|fonts| fonts.as_dict().ok())
            .and_then(|fonts| fonts.get(font.as_bytes()).ok())
            .and_then(|object| object.as_reference().ok());

        if let Some(id) = declared {
            return id;
        }
        *self
            .fallback
            .get_or_insert_with(|| add_helvetica(document))
    }
}

#[cfg(test)]
mod tests {
    use super::DefaultAppearance;

    #[test]
    fn parses_font_size_and_gray() {
        let appearance = DefaultAppearance::parse("/Helv 9 Tf 0.5 g");

        assert_eq!(appearance.font, "Helv");
        assert!((appearance.size - 9.0).abs() < f64::EPSILON);
        assert_eq!(appearance.color, vec![0.5]);
    }

    #[test]
    fn parses_rgb_colour_and_auto_size() {
        let appearance = DefaultAppearance::parse("0 0 1 rg /TiRo 0 Tf");

        assert_eq!(appearance.font, "TiRo");
        assert!((appearance.font_size_for(10.0) - 7.0).abs() < 1e-9);
        assert_eq!(appearance.color, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_appearance_falls_back_to_black_helvetica() {
        let appearance = DefaultAppearance::parse("");

        assert_eq!(appearance.font, "Helv");
        assert!((appearance.font_size_for(100.0) - 12.0).abs() < 1e-9);
        assert_eq!(appearance.color, vec![0.0]);
    }
}
