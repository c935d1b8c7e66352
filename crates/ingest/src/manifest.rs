use std::collections::HashMap;
use std::fmt::Write;

use pipecost_core::Unit;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::parser::find_string;

const DEFAULT_MATERIALIZATION: &str = "view";

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

/// Content fingerprint of a model's defining SQL. Empty SQL has no
/// fingerprint, so such models never look identical to each other.
pub fn fingerprint_sql(sql: &str) -> String {
    if sql.is_empty() {
        return String::new();
    }
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    hex_digest(&hasher.finalize())
}

fn strip_namespace(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

fn upstream_names(node: &Value) -> Vec<String> {
    node.get("depends_on")
        .and_then(|deps| deps.get("nodes"))
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(Value::as_str)
                .map(|qualified| strip_namespace(qualified).to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn optional_string(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn unit_from_node(key: &str, node: &Value) -> Option<Unit> {
    if node.get("resource_type").and_then(Value::as_str) != Some("model") {
        return None;
    }
    let Some(name) = node.get("name").and_then(Value::as_str) else {
        warn!(node = key, "model node has no name, skipping");
        return None;
    };
    let sql = find_string(node, &[&["raw_sql"], &["raw_code"]]).unwrap_or("");
    let materialization = find_string(node, &[&["config", "materialized"]])
        .unwrap_or(DEFAULT_MATERIALIZATION);
    Some(Unit {
        name: name.to_string(),
        materialization: materialization.to_string(),
        fingerprint: fingerprint_sql(sql),
        alias: optional_string(node, "alias"),
        schema: optional_string(node, "schema"),
        upstream: upstream_names(node),
        downstream: Vec::new(),
    })
}

/// Inverts upstream declarations into downstream edges. Upstream lists are
/// left untouched; references to unknown units are dropped here.
fn link_downstream(units: &mut [Unit]) {
    let index: HashMap<String, usize> = units
        .iter()
        .enumerate()
        .map(|(position, unit)| (unit.name.clone(), position))
        .collect();
    let mut edges = Vec::new();
    for unit in units.iter() {
        for upstream in &unit.upstream {
            match index.get(upstream) {
                Some(&position) => edges.push((position, unit.name.clone())),
                None => debug!(
                    unit = %unit.name,
                    upstream = %upstream,
                    "upstream is not a model in this manifest"
                ),
            }
        }
    }
    for (position, downstream) in edges {
        units[position].downstream.push(downstream);
    }
}

/// Builds the model graph from a parsed manifest document, in manifest order.
pub fn build_unit_graph(manifest: &Value) -> Vec<Unit> {
    let Some(nodes) = manifest.get("nodes").and_then(Value::as_object) else {
        warn!("manifest has no nodes object");
        return Vec::new();
    };
    let mut units: Vec<Unit> = nodes
        .iter()
        .filter_map(|(key, node)| unit_from_node(key, node))
        .collect();
    link_downstream(&mut units);
    debug!(units = units.len(), nodes = nodes.len(), "built model graph");
    units
}
