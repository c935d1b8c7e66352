use chrono::Utc;
use pipecost_core::{UsageEvent, parse_timestamp};
use serde_json::Value;
use tracing::debug;

use crate::parser::{clamp_credits, find_string, value_to_f64};
use crate::types::{IngestError, Result};

const DEFAULT_WAREHOUSE: &str = "default";

fn usage_event_from_row(index: usize, row: &Value) -> Result<UsageEvent> {
    let unit = find_string(row, &[&["model_name"]]).ok_or_else(|| {
        IngestError::Validation(format!("usage record {index} has no model_name"))
    })?;
    let raw_start = find_string(row, &[&["start_time"]]).ok_or_else(|| {
        IngestError::Validation(format!("usage record {index} has no start_time"))
    })?;
    let start_time = parse_timestamp(raw_start).ok_or_else(|| {
        IngestError::Validation(format!(
            "usage record {index} has an invalid start_time: {raw_start}"
        ))
    })?;
    let credits = clamp_credits(
        row.get("credits_used")
            .and_then(value_to_f64)
            .unwrap_or(0.0),
    );
    let warehouse = find_string(row, &[&["warehouse"], &["warehouse_name"]])
        .unwrap_or(DEFAULT_WAREHOUSE);
    Ok(UsageEvent {
        unit: unit.to_string(),
        credits,
        start_time: Some(start_time.with_timezone(&Utc)),
        warehouse: warehouse.to_string(),
    })
}

/// Reads already-attributed usage records (one per model run).
pub fn usage_events_from_value(raw: &Value) -> Result<Vec<UsageEvent>> {
    let rows = raw.as_array().ok_or_else(|| {
        IngestError::Validation("expected a JSON array of usage records".to_string())
    })?;
    let events = rows
        .iter()
        .enumerate()
        .map(|(index, row)| usage_event_from_row(index, row))
        .collect::<Result<Vec<_>>>()?;
    debug!(events = events.len(), "loaded usage records");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_usage_records() {
        let raw = json!([
            {"model_name": "fct_orders", "credits_used": 2.0, "start_time": "2024-01-15T08:00:00"},
            {"model_name": "stg_orders", "credits_used": 0.5, "start_time": "2024-01-15T09:00:00Z", "warehouse": "ETL_WH"}
        ]);
        let events = usage_events_from_value(&raw).expect("events");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].unit, "fct_orders");
        assert_eq!(events[0].warehouse, "default");
        assert_eq!(events[1].warehouse, "ETL_WH");
        let first = events[0].start_time.expect("start");
        let second = events[1].start_time.expect("start");
        assert_eq!((second - first).num_minutes(), 60);
    }

    #[test]
    fn rejects_record_without_model_name() {
        let raw = json!([{"credits_used": 1.0, "start_time": "2024-01-15T08:00:00"}]);
        let err = usage_events_from_value(&raw).unwrap_err();
        assert!(err.to_string().contains("model_name"));
    }

    #[test]
    fn rejects_unparseable_start_time() {
        let raw = json!([{"model_name": "a", "credits_used": 1.0, "start_time": "soon"}]);
        let err = usage_events_from_value(&raw).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn invalid_credits_are_clamped_to_zero() {
        let raw = json!([
            {"model_name": "a", "credits_used": -3.5, "start_time": "2024-01-15"},
            {"model_name": "b", "credits_used": "n/a", "start_time": "2024-01-15"},
            {"model_name": "c", "credits_used": "1.25", "start_time": "2024-01-15"}
        ]);
        let events = usage_events_from_value(&raw).expect("events");
        let credits: Vec<f64> = events.iter().map(|event| event.credits).collect();
        assert_eq!(credits, vec![0.0, 0.0, 1.25]);
    }

    #[test]
    fn rejects_non_array() {
        assert!(usage_events_from_value(&json!({"model_name": "a"})).is_err());
    }
}
