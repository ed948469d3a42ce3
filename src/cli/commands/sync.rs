//! Sync command implementation.
//!
//! Runs one full tracking pass: credential, fetch, enrich, diff, save.

use std::path::PathBuf;

use console::style;

use crate::analysis::AnalysisOutcome;
use crate::cli::{runtime, Cli};
use crate::credential::{CredentialPrompt, CredentialProvider, NoPrompt, TerminalPrompt};
use crate::error::Result;
use crate::pipeline::{RunSummary, Tracker};
use crate::store::SaveOutcome;

/// Run the sync command.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;

    let provider = CredentialProvider::new(config.cookie_file()?);
    let mut prompt: Box<dyn CredentialPrompt> = if cli.no_prompt {
        Box::new(NoPrompt)
    } else {
        Box::new(TerminalPrompt::new())
    };
    let credential = provider.obtain(prompt.as_mut())?;

    let tracker = Tracker::new(config)?;
    let summary = runtime()?.block_on(tracker.run(&credential))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    match &summary.analysis {
        AnalysisOutcome::Changes(changes) => print!("{}", changes.render_report()),
        AnalysisOutcome::NoChanges => println!("No changes detected."),
        AnalysisOutcome::FirstRun => println!("First run: baseline recorded."),
        AnalysisOutcome::SkippedCorrupt { nameless_fraction } => println!(
            "{}",
            style(format!(
                "Analysis skipped: {:.0}% of names missing.",
                nameless_fraction * 100.0
            ))
            .yellow()
        ),
    }

    println!(
        "{} ({}): {} friends",
        summary.user.name,
        summary.user.id,
        summary.friends.len()
    );
    if summary.recovered > 0 {
        println!("  {} names restored from history", summary.recovered);
    }
    if summary.abandoned_batches > 0 {
        println!(
            "  {}",
            style(format!("{} detail batches failed", summary.abandoned_batches)).yellow()
        );
    }

    match &summary.save {
        SaveOutcome::Empty => println!("  Snapshot unchanged (empty list)"),
        SaveOutcome::Aborted { .. } => {
            println!("  {}", style("Snapshot not saved (names missing)").red());
        }
        SaveOutcome::Written { json, csv } => {
            for (label, result) in [("snapshot", json), ("export", csv)] {
                match result {
                    Ok(path) => println!("  Saved {label}: {}", path.display()),
                    Err(e) => println!("  {}", style(format!("Failed to save {label}: {e}")).red()),
                }
            }
        }
    }
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    let analysis = match &summary.analysis {
        AnalysisOutcome::Changes(changes) => serde_json::json!({
            "status": "changes",
            "removed": changes.removed,
            "added": changes.added,
        }),
        AnalysisOutcome::NoChanges => serde_json::json!({ "status": "no_changes" }),
        AnalysisOutcome::FirstRun => serde_json::json!({ "status": "first_run" }),
        AnalysisOutcome::SkippedCorrupt { nameless_fraction } => serde_json::json!({
            "status": "skipped",
            "namelessFraction": nameless_fraction,
        }),
    };

    let save = match &summary.save {
        SaveOutcome::Empty => serde_json::json!({ "status": "empty" }),
        SaveOutcome::Aborted { nameless_fraction } => serde_json::json!({
            "status": "aborted",
            "namelessFraction": nameless_fraction,
        }),
        SaveOutcome::Written { json, csv } => serde_json::json!({
            "status": "written",
            "snapshot": write_result_json(json),
            "export": write_result_json(csv),
        }),
    };

    serde_json::json!({
        "user": { "id": summary.user.id, "name": summary.user.name },
        "friendCount": summary.friends.len(),
        "recovered": summary.recovered,
        "abandonedBatches": summary.abandoned_batches,
        "loggedChanges": summary.logged_changes,
        "analysis": analysis,
        "save": save,
    })
}

fn write_result_json(result: &Result<PathBuf>) -> serde_json::Value {
    match result {
        Ok(path) => serde_json::json!({ "path": path.display().to_string() }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}
