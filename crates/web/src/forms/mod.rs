//! Declarative HTML form validation.
//!
//! A form is a static list of [`FieldSpec`]s. Each field names its input
//! kind (which decides how the raw text is coerced) and an ordered list of
//! [`Validator`]s. [`validate`] turns submitted text into either typed
//! [`CleanedData`] or a field → messages [`FormErrors`] map. Validation never
//! touches the store.
//!
//! Rules applied per field:
//!
//! 1. The raw value is coerced according to [`FieldKind`]. A coercion
//!    failure is the field's only error.
//! 2. Validators run in declaration order. A failing [`Validator::Required`]
//!    discards earlier messages for the field and stops the chain.
//! 3. Range and length validators ignore absent values; pair them with
//!    `Required` to reject those.

pub mod login;
pub mod product;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

pub use login::{LoginData, LoginForm};
pub use product::ProductForm;

/// Raw `application/x-www-form-urlencoded` input, field name → text.
pub type RawForm = HashMap<String, String>;

/// How a field's raw text is interpreted and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    TextArea,
    /// Masked text; never echoed back when the form is re-rendered.
    Password,
    /// Floating point number.
    Float,
}

impl FieldKind {
    /// HTML `<input type>` for this kind (text areas render their own element).
    #[must_use]
    pub const fn input_type(self) -> &'static str {
        match self {
            Self::Text | Self::TextArea => "text",
            Self::Password => "password",
            Self::Float => "number",
        }
    }
}

/// A rule checked against a coerced field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validator {
    /// The field must be present and not blank.
    Required,
    /// Text length in characters.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Inclusive numeric bounds.
    NumberRange { min: Option<f64>, max: Option<f64> },
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Input name, also the key in [`RawForm`] and [`FormErrors`].
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    pub kind: FieldKind,
    pub validators: &'static [Validator],
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// `None` when the input was absent or blank.
    Float(Option<f64>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Float(v) => v.is_none(),
        }
    }
}

/// Successfully validated values, by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedData(BTreeMap<&'static str, FieldValue>);

impl CleanedData {
    /// Text value of `field`, empty when absent.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        match self.0.get(field) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Numeric value of `field`, if present.
    #[must_use]
    pub fn float(&self, field: &str) -> Option<f64> {
        match self.0.get(field) {
            Some(FieldValue::Float(v)) => *v,
            _ => None,
        }
    }
}

/// Validation messages, by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// No errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Messages for `field` (empty if none).
    #[must_use]
    pub fn for_field(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields with at least one error.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NOT_FLOAT: &str = "Not a valid float value.";

/// Validate `raw` against `fields`.
///
/// # Errors
///
/// Returns every field's messages when any field fails.
pub fn validate(fields: &[FieldSpec], raw: &RawForm) -> Result<CleanedData, FormErrors> {
    let mut cleaned = BTreeMap::new();
    let mut errors = FormErrors::new();

    for field in fields {
        let input = raw.get(field.name).map(String::as_str);
        match validate_field(field, input) {
            Ok(value) => {
                cleaned.insert(field.name, value);
            }
            Err(messages) => {
                for message in messages {
                    errors.add(field.name, message);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(CleanedData(cleaned))
    } else {
        Err(errors)
    }
}

fn validate_field(field: &FieldSpec, input: Option<&str>) -> Result<FieldValue, Vec<String>> {
    let value = coerce(field.kind, input).map_err(|message| vec![message])?;

    let mut messages = Vec::new();
    for validator in field.validators {
        match check(validator, &value) {
            Ok(()) => {}
            Err(message) if *validator == Validator::Required => {
                messages.clear();
                messages.push(message);
                break;
            }
            Err(message) => messages.push(message),
        }
    }

    if messages.is_empty() {
        Ok(value)
    } else {
        Err(messages)
    }
}

fn coerce(kind: FieldKind, input: Option<&str>) -> Result<FieldValue, String> {
    match kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::Password => {
            Ok(FieldValue::Text(input.unwrap_or_default().to_owned()))
        }
        FieldKind::Float => {
            let Some(text) = input.map(str::trim).filter(|s| !s.is_empty()) else {
                return Ok(FieldValue::Float(None));
            };
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(FieldValue::Float(Some(n))),
                _ => Err(MSG_NOT_FLOAT.to_owned()),
            }
        }
    }
}

fn check(validator: &Validator, value: &FieldValue) -> Result<(), String> {
    match *validator {
        Validator::Required => {
            if value.is_blank() {
                Err(MSG_REQUIRED.to_owned())
            } else {
                Ok(())
            }
        }
        Validator::Length { min, max } => {
            let FieldValue::Text(text) = value else {
                return Ok(());
            };
            let len = text.chars().count();
            match (min, max) {
                (Some(min), Some(max)) if len < min || len > max => Err(format!(
                    "Field must be between {min} and {max} characters long."
                )),
                (Some(min), None) if len < min => {
                    Err(format!("Field must be at least {min} characters long."))
                }
                (None, Some(max)) if len > max => {
                    Err(format!("Field cannot be longer than {max} characters."))
                }
                _ => Ok(()),
            }
        }
        Validator::NumberRange { min, max } => {
            let FieldValue::Float(Some(n)) = value else {
                return Ok(());
            };
            match (min, max) {
                (Some(min), Some(max)) if *n < min || *n > max => {
                    Err(format!("Number must be between {min} and {max}."))
                }
                (Some(min), None) if *n < min => Err(format!("Number must be at least {min}.")),
                (None, Some(max)) if *n > max => Err(format!("Number must be at most {max}.")),
                _ => Ok(()),
            }
        }
    }
}

/// One field prepared for rendering.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub multiline: bool,
    pub required: bool,
    pub value: String,
    pub errors: Vec<String>,
}

/// A form bound to values and errors, ready for a template.
#[derive(Debug, Clone)]
pub struct BoundForm {
    pub fields: Vec<FieldView>,
}

impl BoundForm {
    /// Bind `values` and `errors` to `fields`.
    ///
    /// Password values are never echoed.
    #[must_use]
    pub fn new(fields: &[FieldSpec], values: &RawForm, errors: &FormErrors) -> Self {
        let fields = fields
            .iter()
            .map(|spec| FieldView {
                name: spec.name,
                label: spec.label,
                input_type: spec.kind.input_type(),
                multiline: spec.kind == FieldKind::TextArea,
                required: spec.validators.contains(&Validator::Required),
                value: if spec.kind == FieldKind::Password {
                    String::new()
                } else {
                    values.get(spec.name).cloned().unwrap_or_default()
                },
                errors: errors.for_field(spec.name).to_vec(),
            })
            .collect();

        Self { fields }
    }

    /// Whether any field carries an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| !f.errors.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "title",
            label: "Title",
            kind: FieldKind::Text,
            validators: &[
                Validator::Required,
                Validator::Length {
                    min: Some(2),
                    max: Some(5),
                },
            ],
        },
        FieldSpec {
            name: "score",
            label: "Score",
            kind: FieldKind::Float,
            validators: &[Validator::NumberRange {
                min: Some(1.0),
                max: Some(10.0),
            }],
        },
        FieldSpec {
            name: "secret",
            label: "Secret",
            kind: FieldKind::Password,
            validators: &[],
        },
    ];

    fn raw(pairs: &[(&str, &str)]) -> RawForm {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_valid_input() {
        let data = validate(FIELDS, &raw(&[("title", "abc"), ("score", " 7.5 ")])).unwrap();
        assert_eq!(data.text("title"), "abc");
        assert_eq!(data.float("score"), Some(7.5));
        assert_eq!(data.text("secret"), "");
    }

    #[test]
    fn test_optional_number_may_be_blank() {
        let data = validate(FIELDS, &raw(&[("title", "abc"), ("score", "")])).unwrap();
        assert_eq!(data.float("score"), None);
    }

    #[test]
    fn test_required_replaces_other_errors() {
        let errors = validate(FIELDS, &raw(&[("title", "   ")])).unwrap_err();
        assert_eq!(errors.for_field("title"), [MSG_REQUIRED]);
    }

    #[test]
    fn test_length_bounds() {
        let errors = validate(FIELDS, &raw(&[("title", "toolong")])).unwrap_err();
        assert_eq!(
            errors.for_field("title"),
            ["Field must be between 2 and 5 characters long."]
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(validate(FIELDS, &raw(&[("title", "ééééé")])).is_ok());
    }

    #[test]
    fn test_coercion_failure_is_only_error() {
        let errors = validate(FIELDS, &raw(&[("title", "abc"), ("score", "ten")])).unwrap_err();
        assert_eq!(errors.for_field("score"), [MSG_NOT_FLOAT]);
        assert!(errors.for_field("title").is_empty());
    }

    #[test]
    fn test_non_finite_is_not_a_float() {
        for input in ["NaN", "inf", "-infinity"] {
            let errors =
                validate(FIELDS, &raw(&[("title", "abc"), ("score", input)])).unwrap_err();
            assert_eq!(errors.for_field("score"), [MSG_NOT_FLOAT], "{input}");
        }
    }

    #[test]
    fn test_number_range() {
        let errors = validate(FIELDS, &raw(&[("title", "abc"), ("score", "11")])).unwrap_err();
        assert_eq!(errors.for_field("score"), ["Number must be between 1 and 10."]);
    }

    #[test]
    fn test_all_fields_reported() {
        let errors = validate(FIELDS, &raw(&[("score", "0")])).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, ["score", "title"]);
    }

    #[test]
    fn test_bound_form_hides_password() {
        let values = raw(&[("title", "abc"), ("secret", "hunter2")]);
        let mut errors = FormErrors::new();
        errors.add("title", "bad");

        let form = BoundForm::new(FIELDS, &values, &errors);
        assert!(form.has_errors());
        assert_eq!(form.fields[0].value, "abc");
        assert_eq!(form.fields[0].errors, ["bad"]);
        assert!(form.fields[0].required);
        assert_eq!(form.fields[1].input_type, "number");
        assert_eq!(form.fields[2].value, "");
        assert_eq!(form.fields[2].input_type, "password");
    }
}
