//! Schema validation for inbound product and order documents.
//!
//! Documents are checked field by field so that every problem is reported in
//! one pass, as a map from field name to a list of messages. Nested list
//! items report under their index.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

use super::order::NewOrderDetail;
use super::product::Product;

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_AN_INTEGER: &str = "Not a valid integer.";
pub const NOT_A_NUMBER: &str = "Not a valid number.";
pub const INVALID_TYPE: &str = "Invalid type.";
pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";
pub const TOO_MANY_PLACES: &str = "Must have at most 2 decimal places.";
pub const NUMBER_OUT_OF_RANGE: &str = "Number out of range.";

/// Prices are stored as NUMERIC(18, 2).
const PRICE_SCALE: i64 = 2;
const PRICE_INTEGER_DIGITS: u32 = 16;

const SCHEMA_KEY: &str = "_schema";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Map<String, Value>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        let entry = self
            .0
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.to_string()));
        }
    }

    /// Attach the errors of list item `index` under `field`.
    pub fn nest(&mut self, field: &str, index: usize, inner: ValidationErrors) {
        let entry = self
            .0
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(items) = entry {
            items.insert(index.to_string(), inner.to_json());
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Validate a product document.
pub fn load_product(value: &Value) -> Result<Product, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(doc) = value.as_object() else {
        errors.add(SCHEMA_KEY, INVALID_INPUT_TYPE);
        return Err(errors);
    };

    let id = read_string(doc, "id", &mut errors);
    let title = read_string(doc, "title", &mut errors);
    let passenger_capacity = read_integer(doc, "passenger_capacity", &mut errors);
    let maximum_speed = read_integer(doc, "maximum_speed", &mut errors);
    let in_stock = read_integer(doc, "in_stock", &mut errors);

    let product = match (id, title, passenger_capacity, maximum_speed, in_stock) {
        (Some(id), Some(title), Some(passenger_capacity), Some(maximum_speed), Some(in_stock)) => {
            Some(Product {
                id,
                title,
                passenger_capacity,
                maximum_speed,
                in_stock,
            })
        }
        _ => None,
    };
    errors.finish(product)
}

/// Validate a create-order document (`{"order_details": [...]}`) and return
/// its line items.
pub fn load_order_details(value: &Value) -> Result<Vec<NewOrderDetail>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(doc) = value.as_object() else {
        errors.add(SCHEMA_KEY, INVALID_INPUT_TYPE);
        return Err(errors);
    };

    let Some(raw) = require(doc, "order_details", &mut errors) else {
        return Err(errors);
    };
    let Some(items) = raw.as_array() else {
        errors.add("order_details", INVALID_TYPE);
        return Err(errors);
    };

    let mut details = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match load_order_detail(item) {
            Ok(detail) => details.push(detail),
            Err(inner) => errors.nest("order_details", index, inner),
        }
    }
    errors.finish(Some(details))
}

fn load_order_detail(value: &Value) -> Result<NewOrderDetail, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(doc) = value.as_object() else {
        errors.add(SCHEMA_KEY, INVALID_INPUT_TYPE);
        return Err(errors);
    };

    let product_id = read_string(doc, "product_id", &mut errors);
    let price = read_decimal(doc, "price", &mut errors).and_then(|p| {
        let problem = price_problem(&p);
        if let Some(message) = problem {
            errors.add("price", message);
        }
        problem.is_none().then_some(p)
    });
    let quantity = read_integer(doc, "quantity", &mut errors).and_then(|q| {
        let narrowed = i32::try_from(q).ok();
        if narrowed.is_none() {
            errors.add("quantity", NOT_AN_INTEGER);
        }
        narrowed
    });

    let detail = match (product_id, price, quantity) {
        (Some(product_id), Some(price), Some(quantity)) => Some(NewOrderDetail {
            product_id,
            price,
            quantity,
        }),
        _ => None,
    };
    errors.finish(detail)
}

fn require<'a>(
    doc: &'a Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Value> {
    match doc.get(field) {
        None => {
            errors.add(field, MISSING);
            None
        }
        Some(Value::Null) => {
            errors.add(field, NULL);
            None
        }
        Some(v) => Some(v),
    }
}

fn read_string(
    doc: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match require(doc, field, errors)? {
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

fn read_integer(
    doc: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let parsed = match require(doc, field, errors)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, NOT_AN_INTEGER);
    }
    parsed
}

fn read_decimal(
    doc: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<BigDecimal> {
    let parsed = match require(doc, field, errors)? {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, NOT_A_NUMBER);
    }
    parsed
}

fn price_problem(price: &BigDecimal) -> Option<&'static str> {
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Some(TOO_MANY_PLACES);
    }
    if price.abs() >= BigDecimal::from(10_i64.pow(PRICE_INTEGER_DIGITS)) {
        return Some(NUMBER_OUT_OF_RANGE);
    }
    None
}
