use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value requested for one interactive form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Literal text written into a text field.
    Text(String),
    /// PDF name constant, used for checkbox and radio states (`/Yes`, `/Off`).
    Name(String),
}

impl FieldValue {
    /// Interprets a raw request value. A leading forward slash marks a PDF name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('/') {
            Some(name) => Self::Name(name.to_owned()),
            None => Self::Text(raw.to_owned()),
        }
    }
}

/// Requested values keyed by fully qualified field name.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// Parses raw request values, see [`FieldValue::parse`].
pub fn parse_field_values<I>(raw: I) -> FieldValues
where
    I: IntoIterator<Item = (String, String)>,
{
    raw.into_iter()
        .map(|(name, value)| {
            let value = FieldValue::parse(&value);
            (name, value)
        })
        .collect()
}

/// Fully qualified field names mapped to their current values.
///
/// Keys are the dotted names PDF viewers present (`Page1[0].Name[0]`).
/// A field without a `/V` entry maps to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PdfFieldSet(BTreeMap<String, Option<String>>);

impl PdfFieldSet {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a field and its current value. Later inserts for the same name win.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.insert(name.into(), value);
    }

    /// Returns the current value of a field, `None` when the field is unknown.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Option<String>> {
        self.0.get(name)
    }

    /// Returns whether the field exists in the form.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the form has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, PdfFieldSet};

    #[test]
    fn leading_slash_marks_a_name_value() {
        assert_eq!(FieldValue::parse("/Yes"), FieldValue::Name("Yes".to_owned()));
        assert_eq!(
            FieldValue::parse("Jane / Doe"),
            FieldValue::Text("Jane / Doe".to_owned())
        );
    }

    #[test]
    fn field_set_keeps_absent_values_distinct_from_unknown_fields() {
        let mut fields = PdfFieldSet::new();
        fields.insert("Page1[0].Name[0]", Some("Jane".to_owned()));
        fields.insert("Page1[0].Signed[0]", None);

        assert_eq!(
            fields.get("Page1[0].Name[0]"),
            Some(&Some("Jane".to_owned()))
        );
        assert_eq!(fields.get("Page1[0].Signed[0]"), Some(&None));
        assert_eq!(fields.get("Page2[0].Missing[0]"), None);
        assert_eq!(fields.len(), 2);
    }
}
