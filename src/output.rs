use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use serde::Serialize;

use crate::download::DownloadSummary;
use crate::session::{ProgressEvent, ProgressSink, SearchReport};

const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_search(report: &SearchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_download(summary: &DownloadSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_titles(titles: &[String]) -> io::Result<()> {
        Self::print_json(&titles)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TerminalProgress {
    last_draw: Mutex<Option<Instant>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            last_draw: Mutex::new(None),
        }
    }

    fn draw(&self, line: &str, force: bool) {
        let Ok(mut last) = self.last_draw.lock() else {
            return;
        };
        let now = Instant::now();
        if !force && last.is_some_and(|at| now.duration_since(at) < REDRAW_INTERVAL) {
            return;
        }
        *last = Some(now);

        let mut stderr = io::stderr();
        let _ = stderr
            .queue(MoveToColumn(0))
            .and_then(|out| out.queue(Clear(ClearType::CurrentLine)))
            .and_then(|out| out.queue(Print(line)));
        let _ = stderr.flush();
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Message(message) => {
                self.draw(&message, true);
                eprintln!();
            }
            ProgressEvent::Transfer {
                name,
                written,
                total,
            } => self.draw(&transfer_line(&name, written, total), false),
            ProgressEvent::TransferDone { name } => {
                self.draw(&format!("{name}: done"), true);
                eprintln!();
            }
        }
    }
}

pub fn transfer_line(name: &str, written: u64, total: u64) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        written as f64 / total as f64 * 100.0
    };
    format!(
        "{name}: {:.1} / {:.1} MB ({percent:.0}%)",
        written as f64 / 1024.0 / 1024.0,
        total as f64 / 1024.0 / 1024.0
    )
}

pub fn print_download_summary(summary: &DownloadSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{green}downloaded: {}{reset}", summary.success.len());
    for path in &summary.success {
        println!("{green}  {path}{reset}");
    }
    println!("{red}failed: {}{reset}", summary.failed.len());
    for path in &summary.failed {
        println!("{red}  {path}{reset}");
    }
    println!("{yellow}skipped: {}{reset}", summary.skipped.len());
    for skipped in &summary.skipped {
        println!("{yellow}  {} ({}){reset}", skipped.title, skipped.reason);
    }
}

pub fn print_search_summary(report: &SearchReport) {
    for geometry in &report.geometries {
        println!(
            "geometry {}: {} entries in {} requests, {} kept, {} new",
            geometry.index + 1,
            geometry.fetched,
            geometry.requests,
            geometry.after_filter,
            geometry.added
        );
    }
    println!("total scenes: {}", report.total_scenes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_line_reports_percent() {
        let line = transfer_line("S1A_X", 512 * 1024, 1024 * 1024);
        assert_eq!(line, "S1A_X: 0.5 / 1.0 MB (50%)");
        assert!(transfer_line("empty", 0, 0).ends_with("(0%)"));
    }
}
