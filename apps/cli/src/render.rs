use std::fmt::Write;

use pipecost_app::{AttributionRun, ScanOutcome, Tier, UPGRADE_NOTICE};

pub fn scan_table(outcome: &ScanOutcome) -> String {
    let report = &outcome.report;
    let mut out = String::new();
    let _ = writeln!(out, "Total credits:      {:.1}", report.total_credits);
    let _ = writeln!(out, "Estimated savings:  {:.1}%", report.savings_pct);
    let _ = writeln!(
        out,
        "Findings:           {} zombie, {} over-scheduled, {} redundant",
        report.summary.zombies, report.summary.over_scheduled, report.summary.redundant
    );
    if let Some(truncation) = outcome.truncation {
        let _ = writeln!(
            out,
            "Analyzed {} of {} models (free tier)",
            truncation.analyzed, truncation.total
        );
    }
    if report.findings.is_empty() {
        let _ = writeln!(out, "\nNo waste found.");
        return out;
    }
    let _ = writeln!(out);
    for finding in &report.findings {
        let _ = writeln!(
            out,
            "{:<9} {:<14} {:>6.1}%  {}  {}",
            finding.severity.as_str(),
            finding.category.as_str(),
            finding.estimated_savings_pct,
            finding.subject(),
            finding.detail
        );
        if outcome.tier == Tier::Pro {
            let _ = writeln!(out, "          -> {}", finding.recommendation);
        }
    }
    if outcome.tier == Tier::Free {
        let _ = writeln!(out, "\n{UPGRADE_NOTICE} for recommendations.");
    }
    out
}

pub fn attribution_table(run: &AttributionRun) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:>12} {:>8} {:>14} {:>10}  WAREHOUSES",
        "MODEL", "CREDITS", "QUERIES", "BYTES", "AVG_MS"
    );
    for summary in &run.attributions {
        let _ = writeln!(
            out,
            "{:<32} {:>12.4} {:>8} {:>14} {:>10.2}  {}",
            summary.model_name.to_string(),
            summary.total_credits,
            summary.query_count,
            summary.total_bytes_scanned,
            summary.avg_execution_time,
            summary.warehouses.join(",")
        );
    }
    let _ = writeln!(out, "\nTotal credits: {:.4}", run.monthly.total_credits);
    for (month, summary) in &run.monthly.months {
        let _ = writeln!(out, "\n{month}  {:.4} credits", summary.total_credits);
        for contributor in &summary.top_models {
            let _ = writeln!(
                out,
                "  {:<30} {:>12.4} {:>6.2}%",
                contributor.model.to_string(),
                contributor.credits,
                contributor.pct
            );
        }
    }
    out
}
