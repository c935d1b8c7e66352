use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pipecost_core::{QueryRecord, Unit, UsageEvent};
use serde_json::Value;
use tracing::info;

use crate::manifest::build_unit_graph;
use crate::parser::normalize_query_history;
use crate::types::Result;
use crate::usage::usage_events_from_value;

/// Reads a JSON document, keeping object keys in file order.
pub fn read_json_file(path: &Path) -> Result<Value> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

pub fn parse_manifest(path: &Path) -> Result<Vec<Unit>> {
    let manifest = read_json_file(path)?;
    let units = build_unit_graph(&manifest);
    info!(path = %path.display(), units = units.len(), "loaded manifest");
    Ok(units)
}

pub fn parse_query_history(path: &Path) -> Result<Vec<QueryRecord>> {
    let raw = read_json_file(path)?;
    let records = normalize_query_history(&raw)?;
    info!(path = %path.display(), records = records.len(), "loaded query history");
    Ok(records)
}

pub fn parse_usage_records(path: &Path) -> Result<Vec<UsageEvent>> {
    let raw = read_json_file(path)?;
    let events = usage_events_from_value(&raw)?;
    info!(path = %path.display(), events = events.len(), "loaded usage records");
    Ok(events)
}
