use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event kind inferred from the shape of a webhook payload.
///
/// The upstream platform sends no discriminator field, so the kind is
/// recomputed per request by structural heuristics and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    OrderPaymentStatusChanged,
    OrderDeleted,
    /// Created / updated / epayment-created notifications, which share a schema.
    OrderPayload,
    OrderStatusChanged,
    Unknown,
}

/// Row appended to ORDERS_MASTER for every kind except payment-status-changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderMasterRecord {
    pub order_id: String,
    pub created_at: String,
    pub created_date: String,
    pub product: String,
    pub gross_revenue: String,
    pub status: String,
    pub is_spam: bool,
    pub is_canceled: bool,
    pub is_deleted: bool,
    pub last_updated_at: String,
}

impl OrderMasterRecord {
    /// Column order matches the ORDERS_MASTER sheet layout.
    pub fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("order_id", self.order_id.clone()),
            ("created_at", self.created_at.clone()),
            ("created_date", self.created_date.clone()),
            ("product", self.product.clone()),
            ("gross_revenue", self.gross_revenue.clone()),
            ("status", self.status.clone()),
            ("is_spam", self.is_spam.to_string()),
            ("is_canceled", self.is_canceled.to_string()),
            ("is_deleted", self.is_deleted.to_string()),
            ("last_updated_at", self.last_updated_at.clone()),
        ]
    }
}

/// Row appended to PAYMENTS_STATUS for payment-status-changed notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentStatusRecord {
    pub order_id: String,
    pub paid_time: String,
    pub paid_date: String,
    pub payment_status: String,
    pub last_updated_at: String,
}

impl PaymentStatusRecord {
    pub fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("order_id", self.order_id.clone()),
            ("paid_time", self.paid_time.clone()),
            ("paid_date", self.paid_date.clone()),
            ("payment_status", self.payment_status.clone()),
            ("last_updated_at", self.last_updated_at.clone()),
        ]
    }
}

/// Date-only prefix (`YYYY-MM-DD`) of an ISO-8601 timestamp string.
/// Idempotent: applying it to its own output is a no-op.
pub fn date_only(timestamp: &str) -> String {
    timestamp.chars().take(10).collect()
}

/// Coerce a payload scalar to the string form written into a sheet cell.
/// Strings pass through verbatim; numbers and booleans are formatted;
/// null, absent, and composite values become the empty string.
pub fn scalar_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Loose truthiness over JSON values, matching the upstream platform's
/// flag semantics: false, 0, "", null, and absent are all falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_only_takes_ten_char_prefix() {
        assert_eq!(date_only("2024-01-05T10:00:00Z"), "2024-01-05");
    }

    #[test]
    fn date_only_is_idempotent() {
        let once = date_only("2024-02-01T00:00:00Z");
        assert_eq!(date_only(&once), once);
    }

    #[test]
    fn date_only_of_empty_is_empty() {
        assert_eq!(date_only(""), "");
    }

    #[test]
    fn date_only_of_short_string_is_the_string() {
        assert_eq!(date_only("2024-01"), "2024-01");
    }

    #[test]
    fn scalar_str_coerces_numbers_and_bools() {
        assert_eq!(scalar_str(Some(&json!("x"))), "x");
        assert_eq!(scalar_str(Some(&json!(50000))), "50000");
        assert_eq!(scalar_str(Some(&json!(true))), "true");
        assert_eq!(scalar_str(Some(&Value::Null)), "");
        assert_eq!(scalar_str(None), "");
        assert_eq!(scalar_str(Some(&json!({"a": 1}))), "");
    }

    #[test]
    fn truthiness_matches_upstream_flag_semantics() {
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!("somebody@example.com"))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(None));
    }
}
