use pipecost_core::QueryRecord;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{IngestError, Result};

pub(crate) fn find_string<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    for path in paths {
        let mut current = value;
        let mut ok = true;
        for key in *path {
            if let Some(next) = current.get(*key) {
                current = next;
            } else {
                ok = false;
                break;
            }
        }
        if ok && let Some(found) = current.as_str() {
            return Some(found);
        }
    }
    None
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    if let Some(value) = value.as_f64() {
        return Some(value);
    }
    if let Some(value) = value.as_i64() {
        return Some(value as f64);
    }
    if let Some(value) = value.as_u64() {
        return Some(value as f64);
    }
    if let Some(value) = value.as_str() {
        return value.trim().parse::<f64>().ok();
    }
    None
}

fn value_to_u64(value: &Value) -> Option<u64> {
    if let Some(value) = value.as_u64() {
        return Some(value);
    }
    if let Some(value) = value.as_i64() {
        return Some(value.max(0) as u64);
    }
    if let Some(value) = value.as_str() {
        let trimmed = value.trim();
        if let Ok(parsed) = trimmed.parse::<u64>() {
            return Some(parsed);
        }
        return trimmed.parse::<f64>().ok().and_then(truncate_to_u64);
    }
    value.as_f64().and_then(truncate_to_u64)
}

fn truncate_to_u64(value: f64) -> Option<u64> {
    if value.is_finite() {
        Some(value.max(0.0).trunc() as u64)
    } else {
        None
    }
}

/// Looks up a column by its upper-case warehouse name first, then the
/// lower-case variant used by third-party exporters. Nulls count as absent.
fn column<'a>(row: &'a Value, upper: &str, lower: &str) -> Option<&'a Value> {
    row.get(upper)
        .filter(|value| !value.is_null())
        .or_else(|| row.get(lower).filter(|value| !value.is_null()))
}

fn string_column(row: &Value, upper: &str, lower: &str) -> String {
    column(row, upper, lower)
        .and_then(value_to_string)
        .unwrap_or_default()
}

/// Negative or non-finite credits become 0.
pub(crate) fn clamp_credits(credits: f64) -> f64 {
    if credits.is_finite() && credits >= 0.0 {
        credits
    } else {
        warn!(credits, "credits must be a non-negative number, using 0");
        0.0
    }
}

fn credits_column(row: &Value) -> f64 {
    clamp_credits(
        column(row, "CREDITS_USED", "credits_used")
            .and_then(value_to_f64)
            .unwrap_or(0.0),
    )
}

/// Reads one raw query-log row into canonical form. Missing or malformed
/// fields become empty strings or zero.
pub fn normalize_query_record(row: &Value) -> QueryRecord {
    QueryRecord {
        query_id: string_column(row, "QUERY_ID", "query_id"),
        query_text: string_column(row, "QUERY_TEXT", "query_text"),
        warehouse_name: string_column(row, "WAREHOUSE_NAME", "warehouse_name"),
        bytes_scanned: column(row, "BYTES_SCANNED", "bytes_scanned")
            .and_then(value_to_u64)
            .unwrap_or(0),
        credits_used: credits_column(row),
        execution_time: column(row, "EXECUTION_TIME", "execution_time")
            .and_then(value_to_u64)
            .unwrap_or(0),
        start_time: string_column(row, "START_TIME", "start_time"),
    }
}

/// Normalizes an exported query history document, which must be a JSON array.
pub fn normalize_query_history(raw: &Value) -> Result<Vec<QueryRecord>> {
    let rows = raw.as_array().ok_or_else(|| {
        IngestError::Validation("expected a JSON array of query records".to_string())
    })?;
    let records: Vec<QueryRecord> = rows.iter().map(normalize_query_record).collect();
    debug!(records = records.len(), "normalized query history");
    Ok(records)
}
