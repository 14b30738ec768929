//! Compare candidate rankings across several `mapfill` JSON reports.
//!
//! Throughput numbers move between runs and machines. The relative order of the
//! candidates should not. For every (percent, threads, phase) group this ranks the
//! candidates of each run by throughput and checks whether all runs agree.
//!
//! Usage: `cargo run --release --bin rank_runs [results]`

#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mapfill::report::JsonReport;
use mapfill::{BenchError, Phase, Result};
use rayon::prelude::*;

/// (percent, threads, phase)
type GroupKey = (u32, usize, Phase);

#[derive(Debug)]
struct Run {
    name: String,
    report: JsonReport,
}

#[derive(Debug, Default)]
struct Group {
    /// Per run: candidates, fastest first.
    rankings: Vec<(String, Vec<String>)>,
    /// Per candidate: Mops/s of every run that measured it.
    mops: BTreeMap<String, Vec<f64>>,
}

impl Group {
    fn agrees(&self) -> bool {
        self.rankings.windows(2).all(|w| w[0].1 == w[1].1)
    }

    /// Most frequent ranking. Ties go to the earliest run.
    fn consensus(&self) -> Option<&[String]> {
        let mut best: Option<(&[String], usize)> = None;
        for (_, ranking) in &self.rankings {
            let votes = self.rankings.iter().filter(|(_, r)| r == ranking).count();
            if best.is_none_or(|(_, v)| votes > v) {
                best = Some((ranking.as_slice(), votes));
            }
        }
        best.map(|(r, _)| r)
    }

    fn mean_mops(&self, candidate: &str) -> Option<f64> {
        let values = self.mops.get(candidate)?;
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn main() -> ExitCode {
    let dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    match run(&dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Usage: cargo run --release --bin rank_runs [results]");
            ExitCode::FAILURE
        }
    }
}

fn run(dir: &Path) -> Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(BenchError::Report(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no .json reports in {}", dir.display()),
        )));
    }

    println!("Ranking {} reports from {}\n", paths.len(), dir.display());

    // Parallel load of every report
    let loaded: Vec<(PathBuf, Result<Run>)> = paths
        .into_par_iter()
        .map(|path| {
            let run = load(&path);
            (path, run)
        })
        .collect();

    let mut runs = Vec::with_capacity(loaded.len());
    for (path, run) in loaded {
        match run {
            Ok(run) => runs.push(run),
            Err(e) => eprintln!("skipping {}: {e}", path.display()),
        }
    }

    let groups = group_runs(&runs);
    let markdown = markdown(&runs, &groups)?;

    let output = dir.join("RankSummary.md");
    fs::write(&output, markdown)?;
    println!("Report written to: {}\n", output.display());

    print_summary(&groups);
    Ok(())
}

fn load(path: &Path) -> Result<Run> {
    let text = fs::read_to_string(path)?;
    let report: JsonReport = serde_json::from_str(&text)?;
    let name = path
        .file_stem()
        .map_or_else(|| report.name.clone(), |s| s.to_string_lossy().into_owned());
    Ok(Run { name, report })
}

fn group_runs(runs: &[Run]) -> BTreeMap<GroupKey, Group> {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for run in runs {
        // Per run first, so each run contributes one ranking per group.
        let mut per_run: BTreeMap<GroupKey, Vec<(String, f64)>> = BTreeMap::new();
        for round in &run.report.rounds {
            for entry in &round.entries {
                let Some(ops) = entry.ops_per_sec else {
                    continue;
                };
                per_run
                    .entry((round.percent.get(), entry.threads, entry.phase))
                    .or_default()
                    .push((entry.candidate.clone(), ops));
            }
        }

        for (key, mut measured) in per_run {
            measured.sort_by(|a, b| b.1.total_cmp(&a.1));

            let group = groups.entry(key).or_default();
            for (candidate, ops) in &measured {
                group
                    .mops
                    .entry(candidate.clone())
                    .or_default()
                    .push(ops / 1e6);
            }
            group
                .rankings
                .push((run.name.clone(), measured.into_iter().map(|(c, _)| c).collect()));
        }
    }
    groups
}

fn markdown(runs: &[Run], groups: &BTreeMap<GroupKey, Group>) -> Result<String> {
    let mut md = String::with_capacity(16 * 1024);

    writeln!(md, "# Candidate Ranking Summary\n")?;
    writeln!(md, "| Metric | Value |")?;
    writeln!(md, "|--------|-------|")?;
    writeln!(md, "| Runs | {} |", runs.len())?;
    writeln!(md, "| Groups | {} |", groups.len())?;
    let agreeing = groups.values().filter(|g| g.agrees()).count();
    writeln!(md, "| Agreeing groups | {agreeing} |")?;
    writeln!(md)?;

    writeln!(md, "## Runs\n")?;
    for run in runs {
        let info: Vec<_> = run
            .report
            .run_info
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        writeln!(md, "- `{}` ({})", run.name, info.join(", "))?;
    }
    writeln!(md)?;

    writeln!(md, "## Rankings\n")?;
    writeln!(md, "| Percent | Threads | Phase | Runs | Agree | Consensus (mean Mops/s) |")?;
    writeln!(md, "|--------:|--------:|-------|-----:|:-----:|-------------------------|")?;
    for (&(percent, threads, phase), group) in groups {
        let consensus = group
            .consensus()
            .unwrap_or_default()
            .iter()
            .map(|c| match group.mean_mops(c) {
                Some(m) => format!("{c} ({m:.2})"),
                None => c.clone(),
            })
            .collect::<Vec<_>>()
            .join(" > ");
        writeln!(
            md,
            "| {percent}% | {threads} | {phase} | {} | {} | {consensus} |",
            group.rankings.len(),
            if group.agrees() { "yes" } else { "**no**" }
        )?;
    }

    let disagreeing: Vec<_> = groups.iter().filter(|(_, g)| !g.agrees()).collect();
    if !disagreeing.is_empty() {
        writeln!(md, "\n## Disagreements\n")?;
        for ((percent, threads, phase), group) in disagreeing {
            writeln!(md, "### {percent}% / {threads} threads / {phase}\n")?;
            for (run, ranking) in &group.rankings {
                writeln!(md, "- `{run}`: {}", ranking.join(" > "))?;
            }
            writeln!(md)?;
        }
    }
    Ok(md)
}

fn print_summary(groups: &BTreeMap<GroupKey, Group>) {
    println!("{}", "=".repeat(80));
    println!("RANKING SUMMARY");
    println!("{}", "=".repeat(80));
    println!(
        "{:>8} {:>8} {:>8} {:>6} {:>7}  Leader",
        "Percent", "Threads", "Phase", "Runs", "Agree"
    );
    println!("{}", "-".repeat(80));

    for (&(percent, threads, phase), group) in groups {
        let leader = group
            .consensus()
            .and_then(|r| r.first())
            .map_or("N/A", String::as_str);
        println!(
            "{:>7}% {:>8} {:>8} {:>6} {:>7}  {leader}",
            percent,
            threads,
            phase.name(),
            group.rankings.len(),
            if group.agrees() { "yes" } else { "NO" }
        );
    }

    let total = groups.len();
    let agreeing = groups.values().filter(|g| g.agrees()).count();
    println!("{}", "-".repeat(80));
    println!("{agreeing}/{total} groups rank candidates identically across runs");
}
