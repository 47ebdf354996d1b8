//! Shape checks for request bodies that need field-level error reporting.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{FieldIssue, OrderEntry, MAX_ORDER};

/// Validate a reorder body of the form `{ "items": [{ "id", "order" }] }`.
///
/// Collects every problem rather than stopping at the first one. `id` must
/// be a non-empty string that appears once in the batch; `order` must be a
/// non-negative integer no larger than [`MAX_ORDER`] (floats such as `1.0`
/// are rejected).
pub fn parse_reorder_body(body: &Value) -> Result<Vec<OrderEntry>, Vec<FieldIssue>> {
    let Some(object) = body.as_object() else {
        return Err(vec![FieldIssue::new("", "Expected an object")]);
    };

    let items = match object.get("items") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(vec![FieldIssue::new("items", "Expected an array")]),
        None => return Err(vec![FieldIssue::new("items", "Required")]),
    };

    let mut issues = Vec::new();
    let mut entries = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();

    for (i, item) in items.iter().enumerate() {
        let Some(item) = item.as_object() else {
            issues.push(FieldIssue::new(format!("items[{}]", i), "Expected an object"));
            continue;
        };

        let id = match item.get("id") {
            Some(Value::String(id)) if !id.is_empty() => {
                if seen.insert(id.as_str()) {
                    Some(id.clone())
                } else {
                    issues.push(FieldIssue::new(
                        format!("items[{}].id", i),
                        "Duplicate id in batch",
                    ));
                    None
                }
            }
            Some(Value::String(_)) => {
                issues.push(FieldIssue::new(format!("items[{}].id", i), "Must not be empty"));
                None
            }
            Some(_) => {
                issues.push(FieldIssue::new(format!("items[{}].id", i), "Expected a string"));
                None
            }
            None => {
                issues.push(FieldIssue::new(format!("items[{}].id", i), "Required"));
                None
            }
        };

        let order = match item.get("order") {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(order) if order <= MAX_ORDER as u64 => Some(order as i64),
                Some(_) => {
                    issues.push(FieldIssue::new(format!("items[{}].order", i), "Out of range"));
                    None
                }
                None => {
                    issues.push(FieldIssue::new(
                        format!("items[{}].order", i),
                        "Expected a non-negative integer",
                    ));
                    None
                }
            },
            Some(_) => {
                issues.push(FieldIssue::new(
                    format!("items[{}].order", i),
                    "Expected a non-negative integer",
                ));
                None
            }
            None => {
                issues.push(FieldIssue::new(format!("items[{}].order", i), "Required"));
                None
            }
        };

        if let (Some(id), Some(order)) = (id, order) {
            entries.push(OrderEntry { id, order });
        }
    }

    if issues.is_empty() {
        Ok(entries)
    } else {
        Err(issues)
    }
}

/// Check an optional caller-supplied `order` on create inputs.
pub fn check_order(order: Option<i64>) -> Result<(), Vec<FieldIssue>> {
    match order {
        Some(order) if order < 0 => Err(vec![FieldIssue::new(
            "order",
            "Expected a non-negative integer",
        )]),
        Some(order) if order > MAX_ORDER => Err(vec![FieldIssue::new("order", "Out of range")]),
        _ => Ok(()),
    }
}
