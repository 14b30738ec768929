//! Report rendering.
//!
//! Every format shows, per round and thread count, each candidate's insert and find
//! throughput in millions of operations per second together with the phase wall
//! clock. JSON carries the flat per-phase entries and is what `rank_runs` reads back.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keys::UniquePercent;
use crate::stats::{StatisticsCollector, TimingSample};
use crate::tracing_helpers::info_log;
use crate::workload::Phase;

/// Output formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned plain-text tables.
    Text,
    /// GitHub-flavored markdown tables.
    Markdown,
    /// Machine-readable entries.
    Json,
    /// Standalone HTML page.
    Html,
}

impl ReportFormat {
    /// File extension for the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

// ============================================================================
//  JSON schema
// ============================================================================

/// Serialized form of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Report file stem.
    pub name: String,
    /// Report title.
    pub title: String,
    /// `key: value` run information.
    pub run_info: Vec<(String, String)>,
    /// Rounds in execution order.
    pub rounds: Vec<JsonRound>,
}

/// One round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRound {
    /// Round index.
    pub index: usize,
    /// Round label, e.g. `10%`.
    pub label: String,
    /// Uniqueness percentage.
    pub percent: UniquePercent,
    /// Entries grouped by thread count, then candidate.
    pub entries: Vec<JsonEntry>,
}

/// One timed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEntry {
    /// Worker count.
    pub threads: usize,
    /// Candidate name.
    pub candidate: String,
    /// Phase.
    pub phase: Phase,
    /// Wall clock in nanoseconds.
    pub duration_ns: u64,
    /// Operations across all workers.
    pub operations: u64,
    /// Throughput, absent for a zero-length phase.
    pub ops_per_sec: Option<f64>,
    /// Slowest worker in nanoseconds.
    pub slowest_thread_ns: Option<u64>,
    /// Fastest worker in nanoseconds.
    pub fastest_thread_ns: Option<u64>,
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl JsonReport {
    /// Snapshot a collector.
    #[must_use]
    pub fn from_collector(stats: &StatisticsCollector) -> Self {
        let rows = stats.rows();
        let rounds = stats
            .rounds()
            .into_iter()
            .filter_map(|index| {
                let entries: Vec<_> = rows.iter().filter(|s| s.round == index).collect();
                let percent = entries.first()?.percent;
                Some(JsonRound {
                    index,
                    label: stats.round_title(index),
                    percent,
                    entries: entries
                        .into_iter()
                        .map(|s| JsonEntry {
                            threads: s.threads,
                            candidate: s.candidate.clone(),
                            phase: s.phase,
                            duration_ns: nanos(s.duration),
                            operations: s.operations,
                            ops_per_sec: s.ops_per_sec(),
                            slowest_thread_ns: s.slowest_thread().map(nanos),
                            fastest_thread_ns: s.fastest_thread().map(nanos),
                        })
                        .collect(),
                })
            })
            .collect();

        Self {
            name: stats.name().to_string(),
            title: stats.title().to_string(),
            run_info: stats.run_info().to_vec(),
            rounds,
        }
    }
}

// ============================================================================
//  Pivoted view for the tabular formats
// ============================================================================

struct PivotRow<'a> {
    threads: usize,
    candidate: &'a str,
    cells: [Option<&'a TimingSample>; Phase::ALL.len()],
}

struct RoundView<'a> {
    label: String,
    rows: Vec<PivotRow<'a>>,
}

fn rounds_view(stats: &StatisticsCollector) -> Vec<RoundView<'_>> {
    let rows = stats.rows();
    stats
        .rounds()
        .into_iter()
        .map(|round| {
            let mut pivot: Vec<PivotRow<'_>> = Vec::new();
            for sample in rows.iter().copied().filter(|s| s.round == round) {
                let row = match pivot
                    .iter_mut()
                    .position(|r| r.threads == sample.threads && r.candidate == sample.candidate)
                {
                    Some(i) => &mut pivot[i],
                    None => {
                        pivot.push(PivotRow {
                            threads: sample.threads,
                            candidate: &sample.candidate,
                            cells: [None; Phase::ALL.len()],
                        });
                        let last = pivot.len() - 1;
                        &mut pivot[last]
                    }
                };
                row.cells[sample.phase.index()] = Some(sample);
            }
            RoundView {
                label: stats.round_title(round),
                rows: pivot,
            }
        })
        .collect()
}

fn mops(sample: Option<&TimingSample>) -> String {
    sample
        .and_then(TimingSample::mops)
        .map_or_else(|| "-".to_string(), |m| format!("{m:.3}"))
}

fn millis(sample: Option<&TimingSample>) -> String {
    sample.map_or_else(
        || "-".to_string(),
        |s| format!("{:.1}", s.duration.as_secs_f64() * 1e3),
    )
}

fn header_cells() -> Vec<String> {
    let mut cells = vec!["Threads".to_string(), "Candidate".to_string()];
    cells.extend(Phase::ALL.iter().map(|p| format!("{p} Mops/s")));
    cells.extend(Phase::ALL.iter().map(|p| format!("{p} ms")));
    cells
}

fn row_cells(row: &PivotRow<'_>) -> Vec<String> {
    let mut cells = vec![row.threads.to_string(), row.candidate.to_string()];
    cells.extend(row.cells.iter().map(|c| mops(*c)));
    cells.extend(row.cells.iter().map(|c| millis(*c)));
    cells
}

// ============================================================================
//  Renderers
// ============================================================================

fn text(stats: &StatisticsCollector, out: &mut String) -> fmt::Result {
    writeln!(out, "{}", stats.title())?;
    writeln!(out, "{}", "=".repeat(stats.title().len()))?;
    for (key, value) in stats.run_info() {
        writeln!(out, "{key}: {value}")?;
    }

    for round in rounds_view(stats) {
        writeln!(out, "\n--- {} ---", round.label)?;

        let header = header_cells();
        let body: Vec<_> = round.rows.iter().map(row_cells).collect();
        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                body.iter()
                    .map(|cells| cells[i].len())
                    .chain([header[i].len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for cells in std::iter::once(&header).chain(&body) {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i == 1 {
                        format!("{cell:<w$}")
                    } else {
                        format!("{cell:>w$}")
                    }
                })
                .collect();
            writeln!(out, "{}", line.join("  ").trim_end())?;
        }
    }
    Ok(())
}

fn markdown(stats: &StatisticsCollector, out: &mut String) -> fmt::Result {
    writeln!(out, "# {}\n", stats.title())?;
    for (key, value) in stats.run_info() {
        writeln!(out, "- **{key}:** {value}")?;
    }

    let header = header_cells();
    for round in rounds_view(stats) {
        writeln!(out, "\n## {}\n", round.label)?;
        writeln!(out, "| {} |", header.join(" | "))?;
        writeln!(out, "|{}", "---|".repeat(header.len()))?;
        for row in &round.rows {
            writeln!(out, "| {} |", row_cells(row).join(" | "))?;
        }
    }
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html(stats: &StatisticsCollector, out: &mut String) -> fmt::Result {
    let title = escape_html(stats.title());
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html><head><meta charset=\"utf-8\"><title>{title}</title>")?;
    writeln!(
        out,
        "<style>table{{border-collapse:collapse}}td,th{{border:1px solid #999;padding:2px 8px}}td{{text-align:right}}</style>"
    )?;
    writeln!(out, "</head><body>\n<h1>{title}</h1>")?;

    writeln!(out, "<ul>")?;
    for (key, value) in stats.run_info() {
        writeln!(
            out,
            "<li><b>{}:</b> {}</li>",
            escape_html(key),
            escape_html(value)
        )?;
    }
    writeln!(out, "</ul>")?;

    let header = header_cells();
    for round in rounds_view(stats) {
        writeln!(out, "<h2>{}</h2>\n<table>", escape_html(&round.label))?;
        write!(out, "<tr>")?;
        for cell in &header {
            write!(out, "<th>{}</th>", escape_html(cell))?;
        }
        writeln!(out, "</tr>")?;
        for row in &round.rows {
            write!(out, "<tr>")?;
            for cell in row_cells(row) {
                write!(out, "<td>{}</td>", escape_html(&cell))?;
            }
            writeln!(out, "</tr>")?;
        }
        writeln!(out, "</table>")?;
    }
    writeln!(out, "</body></html>")
}

/// Render `stats` in `format`. Read-only: rendering twice yields the same output.
///
/// # Errors
///
/// [`crate::BenchError::Serialize`] or [`crate::BenchError::Format`].
pub fn render(stats: &StatisticsCollector, format: ReportFormat) -> Result<String> {
    let mut out = String::with_capacity(4 * 1024);
    match format {
        ReportFormat::Text => text(stats, &mut out)?,
        ReportFormat::Markdown => markdown(stats, &mut out)?,
        ReportFormat::Html => html(stats, &mut out)?,
        ReportFormat::Json => {
            out = serde_json::to_string_pretty(&JsonReport::from_collector(stats))?;
            out.push('\n');
        }
    }
    Ok(out)
}

/// Write `<dir>/<name>.<ext>` for every format.
///
/// # Errors
///
/// [`crate::BenchError::Report`] if the directory or a file cannot be written.
pub fn write_all(
    stats: &StatisticsCollector,
    formats: &[ReportFormat],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(format!("{}.{}", stats.name(), format.extension()));
        fs::write(&path, render(stats, format)?)?;
        info_log!(path = %path.display(), ?format, "report written");
        written.push(path);
    }
    Ok(written)
}
