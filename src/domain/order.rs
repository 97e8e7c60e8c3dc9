use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde_json::{json, Value};

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderDetail {
    pub product_id: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub id: i32,
    pub product_id: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i32,
    pub order_details: Vec<OrderDetail>,
}

/// Replacement price and quantity for one existing line item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetailUpdate {
    pub id: i32,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub id: i32,
    pub order_details: Vec<OrderDetailUpdate>,
}

impl Order {
    /// Serialized form shared by RPC replies and the `order_created` event.
    /// Prices travel as strings to keep their scale.
    pub fn to_json(&self) -> Value {
        let details: Vec<Value> = self
            .order_details
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "product_id": d.product_id,
                    "price": d.price.to_string(),
                    "quantity": d.quantity
                })
            })
            .collect();

        json!({
            "id": self.id,
            "order_details": details
        })
    }
}

/// Pair every stored line item of `order_id` with its replacement, in the
/// order of `stored_ids`. Each stored item must have exactly one replacement
/// and no replacement may name an item outside the order.
pub fn match_detail_updates<'a>(
    order_id: i32,
    stored_ids: &[i32],
    updates: &'a [OrderDetailUpdate],
) -> Result<Vec<&'a OrderDetailUpdate>, DomainError> {
    let by_id: HashMap<i32, &OrderDetailUpdate> = updates.iter().map(|u| (u.id, u)).collect();

    if let Some(stray) = updates.iter().find(|u| !stored_ids.contains(&u.id)) {
        return Err(DomainError::OrderDetailMismatch {
            order_id,
            detail_id: stray.id,
        });
    }

    stored_ids
        .iter()
        .map(|id| {
            by_id
                .get(id)
                .copied()
                .ok_or(DomainError::OrderDetailMismatch {
                    order_id,
                    detail_id: *id,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn update(id: i32, quantity: i32) -> OrderDetailUpdate {
        OrderDetailUpdate {
            id,
            price: BigDecimal::from(1),
            quantity,
        }
    }

    #[test]
    fn updates_are_matched_in_stored_order() {
        let updates = vec![update(2, 20), update(1, 10)];
        let matched = match_detail_updates(5, &[1, 2], &updates).expect("should match");
        assert_eq!(matched.iter().map(|u| u.quantity).collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    fn stored_item_without_replacement_is_rejected() {
        let updates = vec![update(1, 10)];
        let err = match_detail_updates(5, &[1, 2], &updates).unwrap_err();
        assert!(matches!(
            err,
            DomainError::OrderDetailMismatch {
                order_id: 5,
                detail_id: 2
            }
        ));
    }

    #[test]
    fn replacement_for_foreign_item_is_rejected() {
        let updates = vec![update(1, 10), update(2, 20), update(99, 1)];
        let err = match_detail_updates(5, &[1, 2], &updates).unwrap_err();
        assert!(matches!(
            err,
            DomainError::OrderDetailMismatch { detail_id: 99, .. }
        ));
    }

    #[test]
    fn to_json_keeps_price_scale() {
        let order = Order {
            id: 7,
            order_details: vec![OrderDetail {
                id: 1,
                product_id: "the_odyssey".to_string(),
                price: BigDecimal::from_str("200.00").expect("valid decimal"),
                quantity: 2,
            }],
        };

        assert_eq!(
            order.to_json(),
            json!({
                "id": 7,
                "order_details": [
                    {"id": 1, "product_id": "the_odyssey", "price": "200.00", "quantity": 2}
                ]
            })
        );
    }
}
