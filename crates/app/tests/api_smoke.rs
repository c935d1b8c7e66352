use std::fs;
use std::path::Path;

use pipecost_app::{AppConfig, AppError, AppState, QuerySource, ScanRequest, Tier, UPGRADE_NOTICE};
use pipecost_core::{AttributionKey, FindingCategory, Severity};
use tempfile::tempdir;

const MANIFEST: &str = r#"{"nodes": {
  "model.shop.stg_orders": {
    "resource_type": "model", "name": "stg_orders", "schema": "analytics",
    "config": {"materialized": "view"}, "raw_sql": "select * from raw.orders",
    "depends_on": {"nodes": []}
  },
  "model.shop.fct_orders": {
    "resource_type": "model", "name": "fct_orders", "schema": "analytics",
    "config": {"materialized": "table"}, "raw_sql": "select * from {{ ref('stg_orders') }}",
    "depends_on": {"nodes": ["model.shop.stg_orders"]}
  },
  "model.shop.rpt_daily": {
    "resource_type": "model", "name": "rpt_daily", "schema": "analytics",
    "config": {"materialized": "table"}, "raw_sql": "select * from {{ ref('fct_orders') }}",
    "depends_on": {"nodes": ["model.shop.fct_orders"]}
  },
  "model.shop.zombie_report": {
    "resource_type": "model", "name": "zombie_report", "schema": "analytics",
    "config": {"materialized": "table"}, "raw_sql": "select count(*) from raw.events",
    "depends_on": {"nodes": []}
  }
}}"#;

fn write_manifest(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("manifest.json");
    fs::write(&path, MANIFEST).expect("write manifest");
    path
}

fn usage_records() -> String {
    let mut records = vec![
        r#"{"model_name": "stg_orders", "credits_used": 0.5, "start_time": "2024-01-15T00:00:00"}"#
            .to_string(),
        r#"{"model_name": "rpt_daily", "credits_used": 1.0, "start_time": "2024-01-15T00:00:00"}"#
            .to_string(),
    ];
    for hour in [0, 8, 16] {
        records.push(format!(
            r#"{{"model_name": "fct_orders", "credits_used": 2.0, "start_time": "2024-01-15T{hour:02}:00:00"}}"#
        ));
    }
    for hour in 0..24 {
        records.push(format!(
            r#"{{"model_name": "zombie_report", "credits_used": 5.0, "start_time": "2024-01-15T{hour:02}:00:00Z"}}"#
        ));
    }
    format!("[{}]", records.join(","))
}

fn history() -> String {
    let mut rows = Vec::new();
    for hour in 0..6 {
        rows.push(format!(
            r#"{{"QUERY_ID": "z{hour}", "QUERY_TEXT": "insert into analytics.zombie_report select count(*) from raw.events",
                "WAREHOUSE_NAME": "TRANSFORM_WH", "BYTES_SCANNED": 100, "CREDITS_USED": 4.0,
                "EXECUTION_TIME": 1000, "START_TIME": "2024-01-15T{hour:02}:00:00Z"}}"#
        ));
    }
    rows.push(
        r#"{"query_id": "j1", "query_text": "select * from analytics.fct_orders join analytics.stg_orders using (id)",
            "warehouse_name": "BI_WH", "bytes_scanned": 101, "credits_used": 2.0,
            "execution_time": 300, "start_time": "2024-02-01T00:00:00"}"#
            .to_string(),
    );
    rows.push(
        r#"{"query_id": "u1", "query_text": "select 1", "credits_used": 1.0, "start_time": ""}"#
            .to_string(),
    );
    format!("[{}]", rows.join(","))
}

#[test]
fn scan_usage_records_end_to_end() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let queries_path = dir.path().join("queries.json");
    fs::write(&queries_path, usage_records()).expect("write queries");

    let state = AppState::default();
    let outcome = state
        .services
        .waste
        .scan(&ScanRequest {
            manifest_path,
            queries_path,
            source: QuerySource::UsageRecords,
            access_key: Some("key".to_string()),
        })
        .expect("scan");

    let report = &outcome.report;
    assert_eq!(outcome.tier, Tier::Pro);
    assert!((report.total_credits - 127.5).abs() < 1e-9);
    assert_eq!(report.summary.zombies, 1);
    assert_eq!(report.summary.over_scheduled, 1);
    assert!(report.savings_pct > 0.0 && report.savings_pct <= 75.0);
    let zombie = &report.findings[0];
    assert_eq!(zombie.category, FindingCategory::Zombie);
    assert_eq!(zombie.units, ["zombie_report"]);
    assert_eq!(zombie.severity, Severity::Critical);
    let over = &report.findings[1];
    assert_eq!(over.category, FindingCategory::OverSchedule);
    assert!(over.detail.contains("1.0h"));
    assert_eq!(over.severity, Severity::Critical);
    assert!(over.recommendation.contains("incremental"));
}

#[test]
fn scan_without_key_redacts_and_limits() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let queries_path = dir.path().join("queries.json");
    fs::write(&queries_path, usage_records()).expect("write queries");

    let config = AppConfig {
        free_unit_limit: 2,
        ..AppConfig::default()
    };
    let state = AppState::new(config);
    let outcome = state
        .services
        .waste
        .scan(&ScanRequest {
            manifest_path,
            queries_path,
            source: QuerySource::UsageRecords,
            access_key: None,
        })
        .expect("scan");

    assert_eq!(outcome.tier, Tier::Free);
    let truncation = outcome.truncation.expect("truncation");
    assert_eq!((truncation.analyzed, truncation.total), (2, 4));
    // zombie_report is past the limit, so only the schedule check sees it.
    assert_eq!(outcome.report.summary.zombies, 0);
    assert!(
        outcome
            .report
            .findings
            .iter()
            .all(|finding| finding.recommendation == UPGRADE_NOTICE
                && finding.detail == UPGRADE_NOTICE)
    );
}

#[test]
fn scan_raw_history_attributes_first() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let queries_path = dir.path().join("history.json");
    fs::write(&queries_path, history()).expect("write history");

    let state = AppState::default();
    let outcome = state
        .services
        .waste
        .scan(&ScanRequest {
            manifest_path,
            queries_path,
            source: QuerySource::QueryHistory,
            access_key: Some("key".to_string()),
        })
        .expect("scan");

    // The unattributed query has no unit but still counts toward the total.
    assert!((outcome.report.total_credits - 27.0).abs() < 1e-9);
    assert!(
        outcome
            .report
            .findings
            .iter()
            .any(|finding| finding.category == FindingCategory::OverSchedule
                && finding.units == ["zombie_report"])
    );
}

#[test]
fn free_history_scan_attributes_against_whole_manifest() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let queries_path = dir.path().join("history.json");
    fs::write(&queries_path, history()).expect("write history");

    let state = AppState::new(AppConfig {
        free_unit_limit: 2,
        ..AppConfig::default()
    });
    let outcome = state
        .services
        .waste
        .scan(&ScanRequest {
            manifest_path,
            queries_path,
            source: QuerySource::QueryHistory,
            access_key: None,
        })
        .expect("scan");

    let truncation = outcome.truncation.expect("truncation");
    assert_eq!((truncation.analyzed, truncation.total), (2, 4));
    // zombie_report is past the limit but its queries are still attributed
    // to it rather than to the unattributed bucket.
    assert!((outcome.report.total_credits - 27.0).abs() < 1e-9);
    assert_eq!(outcome.report.summary.zombies, 0);
    assert!(
        outcome
            .report
            .findings
            .iter()
            .any(|finding| finding.category == FindingCategory::OverSchedule
                && finding.units == ["zombie_report"])
    );
}

#[test]
fn unmatched_history_dilutes_zombie_share() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = dir.path().join("manifest.json");
    fs::write(
        &manifest_path,
        r#"{"nodes": {"model.shop.leaf": {
            "resource_type": "model", "name": "leaf",
            "config": {"materialized": "table"}, "raw_sql": "select 1",
            "depends_on": {"nodes": []}
        }}}"#,
    )
    .expect("write manifest");
    let queries_path = dir.path().join("history.json");
    fs::write(
        &queries_path,
        r#"[
            {"QUERY_ID": "a", "QUERY_TEXT": "select * from leaf", "CREDITS_USED": 1.0,
             "START_TIME": "2024-01-15T00:00:00Z"},
            {"QUERY_ID": "b", "QUERY_TEXT": "select * from unrelated", "CREDITS_USED": 99.0,
             "START_TIME": "2024-01-15T00:00:00Z"}
        ]"#,
    )
    .expect("write history");

    let outcome = AppState::default()
        .services
        .waste
        .scan(&ScanRequest {
            manifest_path,
            queries_path,
            source: QuerySource::QueryHistory,
            access_key: Some("key".to_string()),
        })
        .expect("scan");

    let report = &outcome.report;
    assert!((report.total_credits - 100.0).abs() < 1e-9);
    assert_eq!(report.summary.zombies, 1);
    let zombie = &report.findings[0];
    assert_eq!(zombie.units, ["leaf"]);
    assert_eq!(zombie.severity, Severity::Warning);
    assert!((zombie.estimated_savings_pct - 1.0).abs() < 1e-9);
}

#[test]
fn attribute_history_with_monthly_breakdown() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let history_path = dir.path().join("history.json");
    fs::write(&history_path, history()).expect("write history");

    let state = AppState::default();
    let run = state
        .services
        .attribution
        .attribute(&manifest_path, &history_path, None)
        .expect("attribute");

    assert_eq!(run.attributions[0].model_name, AttributionKey::unit("zombie_report"));
    let fct = run
        .attributions
        .iter()
        .find(|summary| summary.model_name == AttributionKey::unit("fct_orders"))
        .expect("fct_orders");
    assert!((fct.total_credits - 1.0).abs() < 1e-9);
    assert_eq!(fct.total_bytes_scanned, 50);
    assert_eq!(fct.warehouses, vec!["BI_WH"]);
    assert!(
        run.attributions
            .iter()
            .any(|summary| summary.model_name == AttributionKey::Unattributed)
    );

    assert!((run.monthly.total_credits - 27.0).abs() < 1e-9);
    let months: Vec<&str> = run.monthly.months.keys().map(String::as_str).collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "unknown"]);
    let month_sum: f64 = run
        .monthly
        .months
        .values()
        .map(|month| month.total_credits)
        .sum();
    assert!((month_sum - run.monthly.total_credits).abs() < 1e-9);
}

#[test]
fn attribute_rejects_non_array_history() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let history_path = dir.path().join("history.json");
    fs::write(&history_path, r#"{"rows": []}"#).expect("write history");

    let err = AppState::default()
        .services
        .attribution
        .attribute(&manifest_path, &history_path, None)
        .unwrap_err();
    assert!(matches!(err, AppError::Ingest(ingest::IngestError::Validation(_))));
}

#[test]
fn attribute_rejects_zero_top_n() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = write_manifest(dir.path());
    let err = AppState::default()
        .services
        .attribution
        .attribute(&manifest_path, &manifest_path, Some(0))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}
