//! Result artifacts: the event stream as CSV and a JSON run summary.
//!
//! A run directory holds two files:
//! - `events.csv`: one row per resolved event, all instruments, record order
//! - `summary.json`: run id, stream digest, policy vs baseline metrics,
//!   grouped breakdowns and the final tracker state per instrument
//!
//! The summary carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use slotguard_core::{EventRecord, SlotSnapshot, StreamDigest};

use crate::config::RunId;
use crate::metrics::{group_stats, GroupBy, GroupStats, OutcomeStats};
use crate::runner::{InstrumentRun, RunOutput};

pub const SCHEMA_VERSION: u32 = 1;

pub const EVENTS_FILE: &str = "events.csv";
pub const SUMMARY_FILE: &str = "summary.json";

// ─── Summary ────────────────────────────────────────────────────────

/// Filtered policy next to the act-on-every-signal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyComparison {
    pub policy: OutcomeStats,
    pub baseline: OutcomeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub dataset_hash: String,
    pub digest: StreamDigest,
    pub candles: usize,
    pub warmup_candles: usize,
    pub no_signal: usize,
    pub unresolved: usize,
    pub metrics: PolicyComparison,
    pub tracker: Vec<SlotSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSection {
    pub group_by: GroupBy,
    pub groups: Vec<GroupStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub run_id: RunId,
    pub name: Option<String>,
    pub digest: StreamDigest,
    pub metrics: PolicyComparison,
    pub instruments: Vec<InstrumentSummary>,
    pub breakdowns: Vec<GroupSection>,
}

impl RunSummary {
    pub fn build(output: &RunOutput, group_by: &[GroupBy]) -> Self {
        let payout = output.config.payout;
        let records: Vec<EventRecord> = output.records().cloned().collect();
        let metrics = PolicyComparison {
            policy: OutcomeStats::from_records(&records),
            baseline: OutcomeStats::baseline(&records, &payout),
        };
        let instruments = output
            .instruments
            .iter()
            .map(|run| summarize_instrument(run, output))
            .collect();
        let breakdowns = group_by
            .iter()
            .map(|&by| GroupSection {
                group_by: by,
                groups: group_stats(&records, by),
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            run_id: output.run_id.clone(),
            name: output.config.name.clone(),
            digest: output.digest.clone(),
            metrics,
            instruments,
            breakdowns,
        }
    }
}

fn summarize_instrument(run: &InstrumentRun, output: &RunOutput) -> InstrumentSummary {
    let report = &run.report;
    InstrumentSummary {
        symbol: report.symbol.clone(),
        dataset_hash: run.dataset_hash.clone(),
        digest: run.digest.clone(),
        candles: report.candles,
        warmup_candles: report.warmup_candles,
        no_signal: report.no_signal,
        unresolved: report.unresolved,
        metrics: PolicyComparison {
            policy: OutcomeStats::from_records(&report.records),
            baseline: OutcomeStats::baseline(&report.records, &output.config.payout),
        },
        tracker: report.tracker.clone(),
    }
}

pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize run summary to JSON")
}

/// Parse a summary, rejecting schema versions newer than this build writes.
pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize run summary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export records as CSV. Optional fields are written as empty cells.
///
/// Columns: event_id, symbol, timestamp, slot, raw_signal, decision,
/// realized_direction, outcome, signal_correct, outcome_correct, pnl
pub fn export_events_csv<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "event_id",
        "symbol",
        "timestamp",
        "slot",
        "raw_signal",
        "decision",
        "realized_direction",
        "outcome",
        "signal_correct",
        "outcome_correct",
        "pnl",
    ])?;

    for r in records {
        wtr.write_record([
            &r.event_id.0.to_string(),
            &r.symbol,
            &r.timestamp.to_rfc3339(),
            &r.slot.to_string(),
            &r.raw_signal.to_string(),
            &r.decision.to_string(),
            &r.realized_direction.map(|d| d.to_string()).unwrap_or_default(),
            &r.outcome.to_string(),
            &r.signal_correct.to_string(),
            &r.outcome_correct.map(|c| c.to_string()).unwrap_or_default(),
            &format!("{:.4}", r.pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `events.csv` and a prebuilt `summary.json` for a run.
///
/// Files go into `{output_dir}/{run_id prefix}/`, so rerunning an identical
/// config overwrites its own artifacts. Returns the run directory.
pub fn write_artifacts(
    output: &RunOutput,
    summary: &RunSummary,
    output_dir: &Path,
) -> Result<PathBuf> {
    if summary.run_id != output.run_id {
        bail!(
            "summary belongs to run {} but output is run {}",
            summary.run_id,
            output.run_id
        );
    }
    let prefix: String = output.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(prefix);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let events_path = run_dir.join(EVENTS_FILE);
    std::fs::write(&events_path, export_events_csv(output.records())?)
        .with_context(|| format!("failed to write {}", events_path.display()))?;

    let summary_path = run_dir.join(SUMMARY_FILE);
    std::fs::write(&summary_path, export_summary_json(summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    Ok(run_dir)
}

/// Load the summary from a run directory written by [`write_artifacts`].
pub fn load_summary(dir: &Path) -> Result<RunSummary> {
    let path = dir.join(SUMMARY_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}
