use serde_json::Value;
use tracing::{debug, error};

use crate::models::{date_only, is_truthy, scalar_str, EventKind, OrderMasterRecord, PaymentStatusRecord};
use crate::services::classifier::classify;
use crate::services::sheets::RecordSink;

/// Sheet receiving one row per order lifecycle notification.
pub const ORDERS_MASTER: &str = "ORDERS_MASTER";
/// Sheet receiving one row per payment-status change.
pub const PAYMENTS_STATUS: &str = "PAYMENTS_STATUS";

/// Classify the payload, extract the per-kind field set, and append exactly
/// one row to exactly one of the two sheets.
///
/// Best-effort by contract: the HTTP response has already been sent by the
/// time this runs, so every failure here is terminal for the request and is
/// only logged.
pub async fn dispatch(sink: &dyn RecordSink, payload: &Value) {
    let kind = classify(payload);
    debug!(?kind, "classified webhook payload");

    let (table, row) = match kind {
        EventKind::OrderPaymentStatusChanged => {
            (PAYMENTS_STATUS, build_payment_record(payload).columns())
        }
        _ => (ORDERS_MASTER, build_master_record(payload, kind).columns()),
    };

    if let Err(e) = sink.append(table, &row).await {
        error!(table, error = %e, "failed to append webhook record");
    }
}

/// Field extraction for every kind except payment-status-changed. Absent or
/// non-scalar fields become empty cells; deleted notifications carry only
/// their identifying fields, so most cells stay empty for them.
pub fn build_master_record(payload: &Value, kind: EventKind) -> OrderMasterRecord {
    let created_at = scalar_str(payload.get("created_at"));
    let status = scalar_str(payload.get("status")).to_lowercase();

    OrderMasterRecord {
        order_id: first_scalar(payload, &["order_id", "id"]),
        created_date: date_only(&created_at),
        created_at,
        product: extract_product(payload),
        gross_revenue: scalar_str(payload.get("gross_revenue")),
        is_spam: is_truthy(payload.get("probable_spam"))
            || is_truthy(payload.get("marked_as_spam_by")),
        is_canceled: status == "canceled",
        is_deleted: kind == EventKind::OrderDeleted,
        status,
        last_updated_at: scalar_str(payload.get("last_updated_at")),
    }
}

pub fn build_payment_record(payload: &Value) -> PaymentStatusRecord {
    let paid_time = scalar_str(payload.get("paid_time"));

    PaymentStatusRecord {
        order_id: first_scalar(payload, &["id", "order_id"]),
        paid_date: date_only(&paid_time),
        paid_time,
        payment_status: scalar_str(payload.get("payment_status")).to_lowercase(),
        last_updated_at: scalar_str(payload.get("last_updated_at")),
    }
}

/// First key in `keys` that holds a non-empty scalar.
fn first_scalar(payload: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| scalar_str(payload.get(key)))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Two-tier product lookup: the first order line names the product in the
/// order payload variants; the draft variants only expose it as the key of
/// the `final_variants` mapping.
fn extract_product(payload: &Value) -> String {
    if let Some(name) = payload
        .get("orderlines")
        .and_then(|lines| lines.get(0))
        .and_then(|line| line.get("product_name"))
        .and_then(Value::as_str)
    {
        return name.to_string();
    }

    payload
        .get("final_variants")
        .and_then(Value::as_object)
        .and_then(|variants| variants.keys().next())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every append it receives; optionally fails each call.
    #[derive(Default)]
    struct RecordingSink {
        appends: Mutex<Vec<(String, Vec<(&'static str, String)>)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn appends(&self) -> Vec<(String, Vec<(&'static str, String)>)> {
            self.appends.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn append(&self, table: &str, row: &[(&'static str, String)]) -> Result<()> {
            self.appends
                .lock()
                .unwrap()
                .push((table.to_string(), row.to_vec()));
            if self.fail {
                return Err(GatewayError::SinkWrite("injected failure".into()));
            }
            Ok(())
        }
    }

    fn cell<'a>(row: &'a [(&'static str, String)], name: &str) -> &'a str {
        &row.iter().find(|(col, _)| *col == name).unwrap().1
    }

    #[tokio::test]
    async fn deleted_payload_writes_master_row_with_deleted_flag() {
        let sink = RecordingSink::default();
        let payload = json!({
            "order_id": "1",
            "created_at": "2024-01-05T10:00:00Z",
            "last_updated_at": "2024-01-05T10:00:00Z",
        });

        dispatch(&sink, &payload).await;

        let appends = sink.appends();
        assert_eq!(appends.len(), 1);
        let (table, row) = &appends[0];
        assert_eq!(table, ORDERS_MASTER);
        assert_eq!(cell(row, "order_id"), "1");
        assert_eq!(cell(row, "created_date"), "2024-01-05");
        assert_eq!(cell(row, "is_deleted"), "true");
        assert_eq!(cell(row, "product"), "");
        assert_eq!(cell(row, "gross_revenue"), "");
    }

    #[tokio::test]
    async fn payment_change_writes_payment_row_only() {
        let sink = RecordingSink::default();
        let payload = json!({
            "id": 7,
            "paid_time": "2024-02-01T00:00:00Z",
            "payment_status": "PAID",
        });

        dispatch(&sink, &payload).await;

        let appends = sink.appends();
        assert_eq!(appends.len(), 1);
        let (table, row) = &appends[0];
        assert_eq!(table, PAYMENTS_STATUS);
        assert_eq!(cell(row, "order_id"), "7");
        assert_eq!(cell(row, "payment_status"), "paid");
        assert_eq!(cell(row, "paid_date"), "2024-02-01");
    }

    #[tokio::test]
    async fn order_payload_extracts_product_from_orderlines() {
        let sink = RecordingSink::default();
        let payload = json!({
            "order_id": "2",
            "gross_revenue": 50000,
            "status": "Processing",
            "orderlines": [{"product_name": "Widget"}],
        });

        dispatch(&sink, &payload).await;

        let (table, row) = &sink.appends()[0];
        assert_eq!(table, ORDERS_MASTER);
        assert_eq!(cell(row, "product"), "Widget");
        assert_eq!(cell(row, "gross_revenue"), "50000");
        assert_eq!(cell(row, "status"), "processing");
        assert_eq!(cell(row, "is_canceled"), "false");
        assert_eq!(cell(row, "is_deleted"), "false");
    }

    #[tokio::test]
    async fn canceled_status_change_sets_canceled_flag() {
        let sink = RecordingSink::default();
        let payload = json!({
            "order_id": "3",
            "status": "canceled",
            "draft_time": "2024-01-01T00:00:00Z",
        });

        dispatch(&sink, &payload).await;

        let (table, row) = &sink.appends()[0];
        assert_eq!(table, ORDERS_MASTER);
        assert_eq!(cell(row, "is_canceled"), "true");
        assert_eq!(cell(row, "is_deleted"), "false");
    }

    #[tokio::test]
    async fn empty_payload_still_writes_exactly_one_master_row() {
        let sink = RecordingSink::default();

        dispatch(&sink, &json!({})).await;

        let appends = sink.appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0, ORDERS_MASTER);
        assert_eq!(cell(&appends[0].1, "is_deleted"), "false");
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let sink = RecordingSink::failing();

        // Must not panic or propagate; the failure is only logged.
        dispatch(&sink, &json!({"order_id": "4", "gross_revenue": 10})).await;

        assert_eq!(sink.appends().len(), 1);
    }

    #[test]
    fn product_falls_back_to_final_variants_key() {
        let payload = json!({
            "gross_revenue": 10,
            "final_variants": {"Deluxe Widget": {"qty": 1}},
        });
        let record = build_master_record(&payload, EventKind::OrderPayload);
        assert_eq!(record.product, "Deluxe Widget");
    }

    #[test]
    fn spam_flags_are_or_ed() {
        let flagged = json!({"probable_spam": true});
        assert!(build_master_record(&flagged, EventKind::Unknown).is_spam);

        let marked = json!({"marked_as_spam_by": "ops@example.com"});
        assert!(build_master_record(&marked, EventKind::Unknown).is_spam);

        let clean = json!({"probable_spam": false, "marked_as_spam_by": ""});
        assert!(!build_master_record(&clean, EventKind::Unknown).is_spam);
    }

    #[test]
    fn payment_record_order_id_falls_back_to_order_id_key() {
        let payload = json!({
            "order_id": "12",
            "paid_time": "2024-03-01T00:00:00Z",
            "payment_status": "paid",
        });
        assert_eq!(build_payment_record(&payload).order_id, "12");
    }
}
