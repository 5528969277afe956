//! Renders a finished `SolveResult` as JSON or as a human-readable table (§4.15, §6.3).

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use tabwriter::TabWriter;

use terr_algo::SolveResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Table,
}

pub fn render(result: &SolveResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Table => render_table(result),
    }
}

fn render_json(result: &SolveResult) -> Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), result)?;
    println!();
    Ok(())
}

fn render_table(result: &SolveResult) -> Result<()> {
    let stdout = std::io::stdout();
    let mut tw = TabWriter::new(stdout.lock());
    writeln!(tw, "account\trep\tpriority\tconfidence\trationale")?;
    for proposal in &result.proposals {
        writeln!(
            tw,
            "{}\t{}\t{}\t{:.2}\t{}",
            proposal.account_id, proposal.rep_id, proposal.priority_label, proposal.confidence, proposal.rationale
        )?;
    }
    tw.flush()?;

    if !result.unassigned.is_empty() {
        println!();
        let mut tw = TabWriter::new(std::io::stdout());
        writeln!(tw, "account\tcause\tdetail")?;
        for unassigned in &result.unassigned {
            writeln!(tw, "{}\t{}\t{}", unassigned.account_id, unassigned.cause, unassigned.detail)?;
        }
        tw.flush()?;
    }

    println!();
    println!(
        "{} of {} accounts assigned ({} unassigned) in {}ms, continuity {:.0}%, geography exact {:.0}%",
        result.proposals.len(),
        result.metrics.total_accounts,
        result.unassigned.len(),
        result.metrics.solve_time_ms,
        result.metrics.continuity_rate * 100.0,
        result.metrics.geography_exact_rate * 100.0,
    );

    if result.diagnostics.has_issues() {
        println!();
        println!("diagnostics ({}):", result.diagnostics.summary());
        for issue in &result.diagnostics.issues {
            println!("  {issue}");
        }
    }

    Ok(())
}
