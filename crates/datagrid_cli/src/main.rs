//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one in-memory grid session end to end and print the result.
//! - Keep output deterministic for a given seed.
//!
//! Usage: `datagrid_cli [seed]` (default seed 1).

use datagrid_core::{
    ExportFormat, GridConfig, GridSession, LoadOutcome, RowAction, ScrollMetrics, SyntheticSource,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let seed = match std::env::args().nth(1).map(|raw| raw.parse::<u64>()) {
        None => 1,
        Some(Ok(seed)) => seed,
        Some(Err(err)) => {
            eprintln!("invalid seed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(seed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("datagrid smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("datagrid_core ping={}", datagrid_core::ping());
    println!("datagrid_core version={}", datagrid_core::core_version());
    println!("default log level={}", datagrid_core::default_log_level());

    let mut session = GridSession::open(GridConfig::default(), SyntheticSource::new(seed))?;
    report_load("initial load", session.load_next())?;
    println!("rows after initial load={}", session.rows().len());

    let ids = session.rows().iter().take(3).map(|row| row.id).collect::<Vec<_>>();
    for row_id in &ids {
        session.toggle_row(*row_id)?;
    }
    if let Some(first) = ids.first() {
        session.toggle_row(*first)?;
        session.toggle_menu(*first)?;
        let outcome = session.invoke_action(*first, RowAction::ActionA)?;
        println!("{}", outcome.confirmation.unwrap_or_default());
    }
    println!(
        "{}",
        session
            .selection()
            .render()
            .unwrap_or_else(|| "no rows selected".to_string())
    );

    let scrolled = session.scroll_and_load(ScrollMetrics {
        scroll_top: 1_400.0,
        viewport_height: 600.0,
        document_height: 2_000.0,
    });
    report_load("scroll", scrolled)?;
    println!("rows after scroll={}", session.rows().len());

    if let Some(first) = ids.first() {
        session.start_salary_edit(*first)?;
        session.set_salary_input("95000")?;
        let update = session.save_salary()?;
        println!("salary update={}", update.to_request_json());
        println!("updated salary ids={:?}", session.salary_editor().updated_ids());
    }
    println!("events={}", session.drain_events().len());

    let csv = session.export(ExportFormat::Csv)?;
    println!("csv lines={}", csv.lines().count());
    Ok(())
}

fn report_load(
    stage: &str,
    outcome: Option<LoadOutcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Some(LoadOutcome::Failed(err)) => Err(format!("{stage}: {err}").into()),
        Some(LoadOutcome::Appended { added, total, .. }) => {
            println!("{stage}: loaded {added} row(s), {total} rendered");
            Ok(())
        }
        Some(LoadOutcome::Stale) => {
            println!("{stage}: stale page ignored");
            Ok(())
        }
        None => {
            println!("{stage}: no page requested");
            Ok(())
        }
    }
}
