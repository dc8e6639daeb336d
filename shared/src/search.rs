//! Free-text search across product fields.

use bson::{doc, Bson, Document};

/// Fields matched as case-insensitive substrings.
pub const TEXT_FIELDS: [&str; 4] = ["subject", "description", "location", "image"];

/// Numeric fields matched by their string rendering and, for numeric terms, exactly.
pub const NUMERIC_FIELDS: [&str; 3] = ["price", "availableInventory", "rating"];

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    term: String,
    pattern: String,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        let term = term.into();
        let pattern = escape_regex(&term);
        Self { term, pattern }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// The term as a number, when it is one.
    pub fn as_number(&self) -> Option<f64> {
        self.term
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }

    /// An `$or` over every searchable field.
    pub fn filter(&self) -> Document {
        let mut clauses: Vec<Bson> = TEXT_FIELDS
            .iter()
            .map(|field| {
                Bson::Document(doc! {
                    *field: { "$regex": self.pattern.as_str(), "$options": "i" }
                })
            })
            .collect();

        clauses.extend(NUMERIC_FIELDS.iter().map(|field| {
            Bson::Document(doc! {
                "$expr": {
                    "$regexMatch": {
                        "input": { "$toString": format!("${field}") },
                        "regex": self.pattern.as_str(),
                    }
                }
            })
        }));

        if let Some(number) = self.as_number() {
            clauses.extend(
                NUMERIC_FIELDS
                    .iter()
                    .map(|field| Bson::Document(doc! { *field: number })),
            );
        }

        doc! { "$or": clauses }
    }

    /// A single-stage aggregation pipeline applying [`SearchQuery::filter`].
    pub fn pipeline(&self) -> Vec<Document> {
        vec![doc! { "$match": self.filter() }]
    }
}

/// Escapes regular-expression metacharacters so the term matches literally.
pub fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
