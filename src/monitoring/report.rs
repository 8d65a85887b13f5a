//! Drift report artifacts (JSON summary + rendered HTML), one pair per run

use super::drift::DriftReport;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths of the artifacts written for one run
#[derive(Debug, Clone, PartialEq)]
pub struct DriftArtifacts {
    pub summary_path: PathBuf,
    pub html_path: PathBuf,
}

/// Write the JSON summary and HTML rendering of `report` into `dir`
pub fn write_report(
    report: &DriftReport,
    dir: impl AsRef<Path>,
    run_at: DateTime<Utc>,
) -> Result<DriftArtifacts> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let stamp = run_at.format("%Y%m%d_%H%M%S_%3f");
    let summary_path = dir.join(format!("drift_summary_{}.json", stamp));
    let html_path = dir.join(format!("drift_report_{}.html", stamp));

    let file = File::create(&summary_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    fs::write(&html_path, render_html(report, run_at))?;

    Ok(DriftArtifacts {
        summary_path,
        html_path,
    })
}

/// Human-readable HTML rendering of a drift report
pub fn render_html(report: &DriftReport, generated_at: DateTime<Utc>) -> String {
    let summary = match report.dataset_drift() {
        Some(d) => format!(
            "<p><strong>{}</strong> of <strong>{}</strong> columns drifted ({:.2}%). Dataset drift: <strong>{}</strong> (drift share {:.2}).</p>",
            d.number_of_drifted_columns,
            d.number_of_columns,
            d.share_of_drifted_columns * 100.0,
            if d.dataset_drift { "detected" } else { "not detected" },
            d.drift_share,
        ),
        None => "<p>No dataset drift metric available.</p>".to_string(),
    };

    let rows: String = report
        .column_drifts()
        .iter()
        .map(|c| {
            format!(
                "        <tr class=\"{}\"><td>{}</td><td>{:?}</td><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{}</td></tr>\n",
                if c.drift_detected { "drifted" } else { "stable" },
                escape_html(&c.column_name),
                c.column_type,
                escape_html(&c.stattest_name),
                c.drift_score,
                c.stattest_threshold,
                if c.drift_detected { "yes" } else { "no" },
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Data Drift Report</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }}
        .header {{
            background-color: #2c3e50;
            color: white;
            padding: 20px;
            border-radius: 5px;
            margin-bottom: 20px;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            background-color: white;
        }}
        th, td {{
            padding: 8px;
            border-bottom: 1px solid #ddd;
            text-align: left;
        }}
        tr.drifted {{
            background-color: #fdecea;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Data Drift Report</h1>
        <p>Generated at {}</p>
    </div>
    {}
    <table>
        <tr><th>Column</th><th>Type</th><th>Test</th><th>p-value</th><th>Threshold</th><th>Drift</th></tr>
{}    </table>
</body>
</html>
"#,
        generated_at.to_rfc3339(),
        summary,
        rows
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
