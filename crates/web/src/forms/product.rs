//! Product create/edit form.

use fooapp_core::Price;

use super::{
    BoundForm, FieldKind, FieldSpec, FormErrors, MSG_REQUIRED, RawForm, Validator, validate,
};
use crate::models::{Product, ProductData};

/// Longest accepted product name, in characters.
pub const NAME_MAX_LENGTH: usize = 255;

/// Form for creating and editing products.
pub struct ProductForm;

impl ProductForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "name",
            label: "Name",
            kind: FieldKind::Text,
            validators: &[
                Validator::Required,
                Validator::Length {
                    min: None,
                    max: Some(NAME_MAX_LENGTH),
                },
            ],
        },
        FieldSpec {
            name: "description",
            label: "Description",
            kind: FieldKind::TextArea,
            validators: &[],
        },
        FieldSpec {
            name: "price",
            label: "Price",
            kind: FieldKind::Float,
            validators: &[
                Validator::Required,
                Validator::NumberRange {
                    min: Some(Price::MIN),
                    max: None,
                },
            ],
        },
    ];

    /// Validate a submission into storable product fields.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field is invalid.
    pub fn validate(raw: &RawForm) -> Result<ProductData, FormErrors> {
        let cleaned = validate(Self::FIELDS, raw)?;

        let Some(amount) = cleaned.float("price") else {
            let mut errors = FormErrors::new();
            errors.add("price", MSG_REQUIRED);
            return Err(errors);
        };
        let price = Price::new(amount).map_err(|e| {
            let mut errors = FormErrors::new();
            errors.add("price", e.to_string());
            errors
        })?;

        Ok(ProductData {
            name: cleaned.text("name"),
            description: cleaned.text("description"),
            price,
        })
    }

    /// Form values for editing an existing product.
    #[must_use]
    pub fn initial(product: &Product) -> RawForm {
        RawForm::from([
            ("name".to_owned(), product.name.clone()),
            ("description".to_owned(), product.description.clone()),
            ("price".to_owned(), product.price.to_string()),
        ])
    }

    /// Bind values and errors for rendering.
    #[must_use]
    pub fn bind(values: &RawForm, errors: &FormErrors) -> BoundForm {
        BoundForm::new(Self::FIELDS, values, errors)
    }
}
