//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{PortState, ScanReport};
use console::{style, Style};
use std::io::{self, Write};

/// Print results as a table on stdout.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, report)
}

/// Write the results table to any writer.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Starting {} scan at {}",
        style("portprobe").cyan().bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "Scan report for {}", style(&report.target).white().bold())?;
    writeln!(out)?;

    if report.service_detection {
        writeln!(
            out,
            "{:<13} {:<11} {:<11} {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold(),
            style("VERSION").bold()
        )?;
        writeln!(out, "{}", "-".repeat(48))?;
    } else {
        writeln!(
            out,
            "{:<13} {:<11} {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold()
        )?;
        writeln!(out, "{}", "-".repeat(35))?;
    }

    for result in &report.results {
        let state_style = match result.state {
            PortState::Open => Style::new().green().bold(),
            PortState::Closed => Style::new().red(),
            PortState::Filtered => Style::new().yellow(),
            PortState::TcpWrapped => Style::new().magenta(),
        };
        let port = format!("{}/tcp", result.port);
        // Pad before styling so escape codes do not skew the columns.
        let state = state_style.apply_to(format!("{:<11}", result.state));

        if report.service_detection {
            writeln!(
                out,
                "{:<13} {} {:<11} {}",
                port,
                state,
                result.service,
                printable(&result.version)
            )?;
        } else {
            writeln!(out, "{:<13} {} {}", port, state, result.service)?;
        }
    }

    if report.results.is_empty() {
        writeln!(out, "{}", style("No ports found").dim())?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Scan completed at {} ({} ports scanned, {} open, {:.2}s)",
        report.completed_at().format("%Y-%m-%d %H:%M:%S"),
        report.ports_scanned,
        style(report.open_ports).green(),
        report.duration_ms as f64 / 1000.0
    )?;

    Ok(())
}

/// Print an informational message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("::").cyan().bold(), msg);
}

/// Replace control and non-ASCII characters so raw banner text cannot
/// mangle the terminal.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c
            } else if c == '\t' {
                ' '
            } else {
                '.'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
