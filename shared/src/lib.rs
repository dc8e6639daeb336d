use bson::{oid::ObjectId, Bson, DateTime, Document};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub mod json;
pub mod search;
pub mod sorting;
pub mod validation;

pub use search::SearchQuery;
pub use sorting::{SortAspect, SortOrder, SortRequest};
pub use validation::{
    InventoryAdjustment, OrderRequest, ProductUpdate, ValidationError, PRODUCT_UPDATE_FIELDS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

/// An order as stored in the orders collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: Customer,
    #[serde(rename = "productsIDs")]
    pub product_ids: Vec<i64>,
    #[serde(rename = "numberOfSpaces")]
    pub number_of_spaces: Vec<i64>,
    #[serde(rename = "orderDate")]
    pub order_date: DateTime,
}

/// The slice of a product document the inventory workflows care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductStock {
    pub product_id: i64,
    pub available_inventory: i64,
}

impl Order {
    pub fn new(request: OrderRequest) -> Self {
        let (product_ids, number_of_spaces) = request.lines.into_iter().unzip();
        Self {
            id: None,
            user: request.user,
            product_ids,
            number_of_spaces,
            order_date: DateTime::from_millis(Utc::now().timestamp_millis()),
        }
    }

    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(self)
    }
}

impl ProductStock {
    /// Reads the numeric `id` and `availableInventory` of a product document.
    ///
    /// Returns `None` when either field is missing or not an integral number.
    pub fn from_document(document: &Document) -> Option<Self> {
        Some(Self {
            product_id: integral(document.get("id")?)?,
            available_inventory: integral(document.get("availableInventory")?)?,
        })
    }

    pub fn can_fulfil(&self, spaces: i64) -> bool {
        self.available_inventory >= spaces
    }
}

/// Any BSON number as an `f64`.
pub fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Any BSON number with no fractional part as an `i64`.
pub fn integral(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
        _ => None,
    }
}

/// Sums the spaces reserved for `product_id` across the given order documents.
///
/// Ids and spaces are paired by position; a pair whose spaces value is not an
/// integral number contributes nothing.
pub fn reserved_spaces(orders: &[Document], product_id: i64) -> i64 {
    orders
        .iter()
        .filter_map(|order| {
            let ids = order.get_array("productsIDs").ok()?;
            let spaces = order.get_array("numberOfSpaces").ok()?;
            Some(
                ids.iter()
                    .zip(spaces)
                    .filter(|(id, _)| integral(id) == Some(product_id))
                    .filter_map(|(_, spaces)| integral(spaces))
                    .sum::<i64>(),
            )
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn stock_reads_mixed_numeric_types() {
        let product = doc! { "id": 3.0, "subject": "Art", "availableInventory": 5_i32 };
        let stock = ProductStock::from_document(&product).unwrap();
        assert_eq!(stock.product_id, 3);
        assert_eq!(stock.available_inventory, 5);
        assert!(stock.can_fulfil(5));
        assert!(!stock.can_fulfil(6));
    }

    #[test]
    fn stock_rejects_non_numeric_inventory() {
        let product = doc! { "id": 1, "availableInventory": "lots" };
        assert_eq!(ProductStock::from_document(&product), None);
    }

    #[test]
    fn reserved_spaces_sums_matching_positions_only() {
        let orders = vec![
            doc! { "productsIDs": [1, 2], "numberOfSpaces": [3, 4] },
            doc! { "productsIDs": [2, 2.0], "numberOfSpaces": [1_i64, 2] },
            doc! { "productsIDs": [5], "numberOfSpaces": [9] },
            doc! { "user": "no line items" },
        ];
        assert_eq!(reserved_spaces(&orders, 2), 7);
        assert_eq!(reserved_spaces(&orders, 1), 3);
        assert_eq!(reserved_spaces(&orders, 42), 0);
    }

    #[test]
    fn new_order_pairs_lines_in_request_order() {
        let request = OrderRequest {
            user: Customer {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_number: "07123456789".to_string(),
            },
            lines: vec![(4, 1), (2, 3)],
        };
        let order = Order::new(request);
        assert_eq!(order.product_ids, vec![4, 2]);
        assert_eq!(order.number_of_spaces, vec![1, 3]);

        let document = order.to_document().unwrap();
        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_document("user").unwrap().get_str("firstName").unwrap(), "Ada");
        assert!(document.get_datetime("orderDate").is_ok());
    }
}
