//! Sorted, truncated listings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bson::{Bson, Document};

use crate::numeric;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAspect {
    Id,
    Subject,
    Description,
    Price,
    Location,
    Image,
    AvailableInventory,
    Rating,
}

impl SortAspect {
    pub const ALL: [SortAspect; 8] = [
        SortAspect::Id,
        SortAspect::Subject,
        SortAspect::Description,
        SortAspect::Price,
        SortAspect::Location,
        SortAspect::Image,
        SortAspect::AvailableInventory,
        SortAspect::Rating,
    ];

    pub fn field(self) -> &'static str {
        match self {
            SortAspect::Id => "id",
            SortAspect::Subject => "subject",
            SortAspect::Description => "description",
            SortAspect::Price => "price",
            SortAspect::Location => "location",
            SortAspect::Image => "image",
            SortAspect::AvailableInventory => "availableInventory",
            SortAspect::Rating => "rating",
        }
    }

    fn valid_list() -> String {
        Self::ALL.map(SortAspect::field).join(", ")
    }
}

impl fmt::Display for SortAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for SortAspect {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|aspect| aspect.field() == s)
            .ok_or_else(|| ValidationError::InvalidSortAspect {
                given: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Applies the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// The path parameters of a sorted listing, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SortRequest {
    pub max: u64,
    pub aspect: SortAspect,
    pub order: SortOrder,
    max_literal: String,
}

impl SortRequest {
    pub fn parse(max: &str, aspect: &str, order: &str) -> Result<Self, ValidationError> {
        if max.is_empty() || !max.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidMax(max.to_string()));
        }
        // Digit strings too long for u64 are kept as "more than any collection holds".
        let parsed = max.parse::<u64>().unwrap_or(u64::MAX);
        if parsed == 0 {
            return Err(ValidationError::InvalidMax(max.to_string()));
        }

        Ok(Self {
            max: parsed,
            aspect: aspect.parse()?,
            order: order.parse()?,
            max_literal: max.to_string(),
        })
    }

    /// Rejects a `max` larger than the collection.
    pub fn check_total(&self, total: u64) -> Result<(), ValidationError> {
        if self.max > total {
            return Err(ValidationError::MaxExceedsTotal {
                max: self.max_literal.clone(),
                total,
            });
        }
        Ok(())
    }

    /// Sorts by the requested field and keeps the first `max` documents.
    ///
    /// The sort is stable, so documents comparing equal keep their stored order.
    pub fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        let field = self.aspect.field();
        documents.sort_by(|a, b| self.order.apply(compare_values(a.get(field), b.get(field))));
        documents.truncate(usize::try_from(self.max).unwrap_or(usize::MAX));
        documents
    }
}

/// Ascending comparison of two field values.
///
/// Strings compare case-insensitively and numbers numerically. Missing values
/// sort first, then numbers, then strings, then everything else by its
/// extended-JSON rendering.
pub fn compare_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Bson::String(a), Bson::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => match (numeric(a), numeric(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => type_rank(a)
                    .cmp(&type_rank(b))
                    .then_with(|| a.to_string().cmp(&b.to_string())),
            },
        },
    }
}

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::String(_) => 2,
        _ => 3,
    }
}
