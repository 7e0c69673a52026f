use serde_json::Value;

use crate::models::EventKind;

/// Infer the event kind from the payload shape alone.
///
/// The platform sends structurally different payloads to the same endpoint
/// with no type field, so this is an ordered chain of structural guards.
/// First match wins; the order is load-bearing because a payload can satisfy
/// more than one guard (payment-change payloads also carry the id/timestamp
/// fields the deleted guard looks for). Do not reorder.
pub fn classify(payload: &Value) -> EventKind {
    let Some(fields) = payload.as_object() else {
        return EventKind::Unknown;
    };

    if non_empty(fields.get("id"))
        && defined(fields.get("paid_time"))
        && defined(fields.get("payment_status"))
    {
        return EventKind::OrderPaymentStatusChanged;
    }

    // Deleted notifications are sparse: just the order id and the two
    // timestamps, at most one extra key. Richer payloads carrying the same
    // three fields fall through to the later guards.
    if fields.contains_key("order_id")
        && fields.contains_key("created_at")
        && fields.contains_key("last_updated_at")
        && fields.len() <= 4
    {
        return EventKind::OrderDeleted;
    }

    if defined(fields.get("gross_revenue")) {
        return EventKind::OrderPayload;
    }

    if defined(fields.get("status")) && defined(fields.get("draft_time")) {
        return EventKind::OrderStatusChanged;
    }

    EventKind::Unknown
}

/// Present and not null.
fn defined(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

/// Present, not null, and not the empty string.
fn non_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(v) => !v.is_null(),
        None => false,
    }
}
