//! Request-body schemas.
//!
//! Each schema is parsed from a raw JSON value and rejected on the first
//! violation, before any store is touched.

use bson::{Bson, Document};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Customer;

/// Fields a product update may touch, in the order they are listed to clients.
pub const PRODUCT_UPDATE_FIELDS: [&str; 7] = [
    "subject",
    "description",
    "price",
    "location",
    "image",
    "availableInventory",
    "rating",
];

const IMAGE_PREFIX: &str = "Images/";
const MIN_PHONE_DIGITS: usize = 10;
const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Request body must not be empty")]
    EmptyBody,
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: &'static str },
    #[error("Field '{field}' is not allowed; allowed fields are: {allowed}")]
    DisallowedField { field: String, allowed: String },
    #[error("'productsIDs' and 'numberOfSpaces' must have the same length (got {ids} and {spaces})")]
    LengthMismatch { ids: usize, spaces: usize },
    #[error("Invalid max '{0}': max must be a positive integer literal made of digits only (no sign, no decimal point)")]
    InvalidMax(String),
    #[error("max ({max}) exceeds the number of documents in the collection ({total})")]
    MaxExceedsTotal { max: String, total: u64 },
    #[error("Invalid sort aspect '{given}'; valid sort aspects are: {valid}")]
    InvalidSortAspect { given: String, valid: String },
    #[error("Invalid sort order '{0}'; expected 'asc' or 'desc'")]
    InvalidSortOrder(String),
    #[error("Invalid document id '{0}'")]
    InvalidObjectId(String),
    #[error("Invalid product id '{0}'; expected a positive integer")]
    InvalidProductId(String),
    #[error("Insufficient inventory for product {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: i64,
        available: i64,
        requested: i64,
    },
}

impl ValidationError {
    fn invalid(field: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason,
        }
    }
}

/// A validated order placement: the customer plus `(product id, spaces)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub user: Customer,
    pub lines: Vec<(i64, i64)>,
}

impl OrderRequest {
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let user = body
            .get("user")
            .ok_or(ValidationError::MissingField("user"))?
            .as_object()
            .ok_or_else(|| ValidationError::invalid("user", "must be an object"))?;

        let user = Customer {
            first_name: required_string(user, "firstName")?,
            last_name: required_string(user, "lastName")?,
            phone_number: phone_number(user)?,
        };

        Ok(Self {
            user,
            lines: paired_lines(body)?,
        })
    }
}

/// A validated bulk inventory adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryAdjustment {
    pub lines: Vec<(i64, i64)>,
    pub restore: bool,
}

impl InventoryAdjustment {
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let restore = match body.get("restore") {
            None => false,
            Some(Value::Bool(restore)) => *restore,
            Some(_) => return Err(ValidationError::invalid("restore", "must be a boolean")),
        };

        Ok(Self {
            lines: paired_lines(body)?,
            restore,
        })
    }

    /// Signed increment for a quantity: positive when restoring, negative when deducting.
    pub fn delta(&self, quantity: i64) -> i64 {
        if self.restore {
            quantity
        } else {
            -quantity
        }
    }
}

/// A validated product update: absolute overwrites plus an optional relative
/// inventory increment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductUpdate {
    pub set: Document,
    pub inventory_increment: Option<i64>,
}

impl ProductUpdate {
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let fields = body.as_object().ok_or(ValidationError::NotAnObject)?;
        if fields.is_empty() {
            return Err(ValidationError::EmptyBody);
        }

        let mut update = Self::default();
        for (name, value) in fields {
            if !PRODUCT_UPDATE_FIELDS.contains(&name.as_str()) {
                return Err(ValidationError::DisallowedField {
                    field: name.clone(),
                    allowed: PRODUCT_UPDATE_FIELDS.join(", "),
                });
            }
            if name == "availableInventory" {
                let increment = integer(value)
                    .filter(|n| *n != 0)
                    .ok_or_else(|| ValidationError::invalid(name, "must be a non-zero integer"))?;
                update.inventory_increment = Some(increment);
            } else {
                let value = product_field(name, value)
                    .map_err(|reason| ValidationError::invalid(name, reason))?;
                update.set.insert(name.clone(), value);
            }
        }
        Ok(update)
    }

    /// The MongoDB update operators for this change.
    pub fn to_update_document(&self) -> Document {
        let mut update = Document::new();
        if !self.set.is_empty() {
            update.insert("$set", self.set.clone());
        }
        if let Some(increment) = self.inventory_increment {
            update.insert("$inc", bson::doc! { "availableInventory": increment });
        }
        update
    }
}

/// Parses a numeric product id taken from a URL segment.
pub fn product_id_literal(raw: &str) -> Result<i64, ValidationError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidProductId(raw.to_string()));
    }
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ValidationError::InvalidProductId(raw.to_string()))
}

fn product_field(name: &str, value: &Value) -> Result<Bson, &'static str> {
    match name {
        "subject" | "description" | "location" => non_empty_string(value)
            .map(Bson::String)
            .ok_or("must be a non-empty string"),
        "price" => match (value.as_i64(), value.as_f64()) {
            (Some(n), _) if n > 0 => Ok(Bson::Int64(n)),
            (None, Some(n)) if n > 0.0 && n.is_finite() => Ok(Bson::Double(n)),
            _ => Err("must be a positive number"),
        },
        "image" => value
            .as_str()
            .filter(|path| is_image_path(path))
            .map(|path| Bson::String(path.to_string()))
            .ok_or("must be a path of the form 'Images/<name>'"),
        "rating" => integer(value)
            .filter(|n| (0..=MAX_RATING).contains(n))
            .and_then(|n| i32::try_from(n).ok())
            .map(Bson::Int32)
            .ok_or("must be an integer between 0 and 5"),
        _ => Err("is not an updatable field"),
    }
}

fn is_image_path(path: &str) -> bool {
    path.strip_prefix(IMAGE_PREFIX)
        .is_some_and(|name| !name.trim().is_empty() && !name.contains('/'))
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn required_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = object.get(field).ok_or(ValidationError::MissingField(field))?;
    non_empty_string(value)
        .ok_or_else(|| ValidationError::invalid(field, "must be a non-empty string"))
}

fn phone_number(user: &Map<String, Value>) -> Result<String, ValidationError> {
    let phone = required_string(user, "phoneNumber")?;
    if phone.len() < MIN_PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "phoneNumber",
            "must contain only digits and be at least 10 digits long",
        ));
    }
    Ok(phone)
}

fn paired_lines(body: &Map<String, Value>) -> Result<Vec<(i64, i64)>, ValidationError> {
    let ids = positive_integers(body, "productsIDs")?;
    let spaces = positive_integers(body, "numberOfSpaces")?;
    if ids.len() != spaces.len() {
        return Err(ValidationError::LengthMismatch {
            ids: ids.len(),
            spaces: spaces.len(),
        });
    }
    Ok(ids.into_iter().zip(spaces).collect())
}

fn positive_integers(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<i64>, ValidationError> {
    let values = body
        .get(field)
        .ok_or(ValidationError::MissingField(field))?
        .as_array()
        .filter(|values| !values.is_empty())
        .ok_or_else(|| ValidationError::invalid(field, "must be a non-empty array"))?;

    values
        .iter()
        .map(|value| {
            integer(value).filter(|n| *n > 0).ok_or_else(|| {
                ValidationError::invalid(field, "must contain only positive whole numbers")
            })
        })
        .collect()
}

/// A JSON number with no fractional part, e.g. `3` or `3.0`.
fn integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}
