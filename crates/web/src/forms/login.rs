//! Login form.

use super::{BoundForm, FieldKind, FieldSpec, FormErrors, RawForm, Validator, validate};

/// Submitted login credentials, not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    pub username: String,
    pub password: String,
}

/// Form for logging in.
pub struct LoginForm;

impl LoginForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "username",
            label: "Username",
            kind: FieldKind::Text,
            validators: &[Validator::Required],
        },
        FieldSpec {
            name: "password",
            label: "Password",
            kind: FieldKind::Password,
            validators: &[Validator::Required],
        },
    ];

    /// Validate a login submission.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is blank.
    pub fn validate(raw: &RawForm) -> Result<LoginData, FormErrors> {
        let cleaned = validate(Self::FIELDS, raw)?;
        Ok(LoginData {
            username: cleaned.text("username"),
            password: cleaned.text("password"),
        })
    }

    /// Bind values and errors for rendering.
    #[must_use]
    pub fn bind(values: &RawForm, errors: &FormErrors) -> BoundForm {
        BoundForm::new(Self::FIELDS, values, errors)
    }
}
