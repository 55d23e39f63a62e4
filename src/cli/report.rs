//! Terminal rendering for suite reports, lifecycle walks and book listings.

use crate::contract::{LifecycleReport, SuiteReport};
use crate::error::Result;
use crate::models::Book;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn verdict_cell(passed: bool) -> Cell {
    if passed {
        Cell::new("PASS").fg(Color::Green)
    } else {
        Cell::new("FAIL").fg(Color::Red)
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

pub fn suite_table(report: &SuiteReport) -> Table {
    let mut table = new_table(&["Check", "Request", "Status", "Time", "Result", "Details"]);
    for outcome in &report.outcomes {
        let status = outcome
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let elapsed = outcome
            .elapsed_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&outcome.check.name),
            Cell::new(format!("{} {}", outcome.check.method, outcome.check.path)),
            Cell::new(status),
            Cell::new(elapsed),
            verdict_cell(outcome.passed()),
            Cell::new(outcome.failures.join("\n")),
        ]);
    }
    table
}

pub fn suite_summary(report: &SuiteReport) -> String {
    let line = format!(
        "{} passed, {} failed against {} ({})",
        report.passed(),
        report.failed(),
        report.base_url,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if report.is_success() {
        line.green().bold().to_string()
    } else {
        line.red().bold().to_string()
    }
}

pub fn lifecycle_table(report: &LifecycleReport) -> Table {
    let mut table = new_table(&["Step", "Result", "Details"]);
    for step in &report.steps {
        let verdict = if step.warning {
            Cell::new("WARN").fg(Color::Yellow)
        } else {
            verdict_cell(step.passed)
        };
        table.add_row(vec![Cell::new(&step.name), verdict, Cell::new(&step.detail)]);
    }
    table
}

pub fn books_table(books: &[Book]) -> Table {
    let mut table = new_table(&["ID", "Title", "Author"]);
    for book in books {
        table.add_row(vec![
            Cell::new(book.id),
            Cell::new(&book.book_name),
            Cell::new(&book.author),
        ]);
    }
    table
}
