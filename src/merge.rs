//! Deep merge of generic structured documents
//!
//! `merge(base, overlay)` produces a new document where:
//! - maps present on both sides merge key by key, recursively
//! - sequences present on both sides merge position by position; maps at the
//!   same index merge recursively, any other pair takes the overlay element
//! - the overlay's sequence length wins: trailing overlay elements are kept,
//!   trailing base elements are dropped
//! - everything else (scalars, nulls, type mismatches) takes the overlay value
//!
//! Keys only in `base` survive, keys only in `overlay` are added. The
//! operation is not commutative.

use serde_json::{Map, Value};

/// Deep-merge `overlay` onto `base`.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_maps(base, overlay)),
        (Value::Array(base), Value::Array(overlay)) => Value::Array(merge_sequences(base, overlay)),
        (_, overlay) => overlay.clone(),
    }
}

/// Merge two maps, recursing where both sides hold a map or a sequence.
pub fn merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in overlay {
        let merged = match out.get(key) {
            Some(existing) => merge(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Merge two sequences positionally; the result has the overlay's length.
pub fn merge_sequences(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    overlay
        .iter()
        .enumerate()
        .map(|(i, value)| match (base.get(i), value) {
            (Some(Value::Object(b)), Value::Object(o)) => Value::Object(merge_maps(b, o)),
            _ => value.clone(),
        })
        .collect()
}
