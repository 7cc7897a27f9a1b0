// GridMind CLI - natural-language spreadsheet commands, headless

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};

use gridmind_config::{AssistDiagnostics, ResolvedAssistConfig, Settings};
use gridmind_core::RangeRef;
use gridmind_engine::{metrics, rules, spawn_refresh, ContextFeed, Dispatcher};
use gridmind_host::GridSheet;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_IO_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "gridmind")]
#[command(about = "Natural-language commands against spreadsheet data (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat over a CSV file
    #[command(after_help = "\
Examples:
  gridmind chat sales.csv
  gridmind chat data.csv --delimiter ';'

Inside the chat:
  :select A1:C5   change the selection
  help            list supported commands
  exit            leave")]
    Chat {
        /// CSV file to load (omit for an empty sheet)
        file: Option<PathBuf>,

        /// CSV delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Run a single command against a CSV file and print the response
    #[command(after_help = "\
Examples:
  gridmind ask 'sum the selected column' -f numbers.csv
  gridmind ask 'format as currency' -f sales.csv --select B2:B20")]
    Ask {
        /// The natural-language command
        utterance: String,

        /// CSV file to load
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Selection to operate on (defaults to the used range)
        #[arg(long)]
        select: Option<String>,

        /// CSV delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Show the resolved assist configuration
    Doctor,

    /// Suggest example commands, optionally filtered
    Suggest {
        /// Partial text to filter suggestions
        partial: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Chat { file, delimiter } => cmd_chat(file.as_deref(), delimiter),
        Commands::Ask { utterance, file, select, delimiter } => {
            cmd_ask(&utterance, &file, select.as_deref(), delimiter)
        }
        Commands::Doctor => cmd_doctor(),
        Commands::Suggest { partial } => cmd_suggest(partial.as_deref()),
    };

    metrics::flush();
    ExitCode::from(code)
}

// ── chat ────────────────────────────────────────────────────────────

fn cmd_chat(file: Option<&Path>, delimiter: char) -> u8 {
    let sheet = match file {
        Some(path) => match load_sheet(path, delimiter) {
            Ok(sheet) => sheet,
            Err(err) => {
                eprintln!("Error: {}", err);
                return EXIT_IO_ERROR;
            }
        },
        None => GridSheet::new("Sheet1"),
    };

    if let Some(path) = file {
        println!("Loaded {}", path.display());
    }
    println!("Type a command, 'help' for examples, 'exit' to quit.");

    let settings = Settings::load();
    let config = ResolvedAssistConfig::from_settings(&settings.assist);
    let mut dispatcher = Dispatcher::from_config(&config);

    // Display refresh runs independently of command processing; the two
    // meet only at the host's own lock.
    let host = Arc::new(Mutex::new(sheet));
    let feed = ContextFeed::new();
    let _refresh = spawn_refresh(
        Arc::clone(&host),
        feed.clone(),
        Duration::from_millis(settings.refresh_interval_ms.max(100)),
    );

    let stdin = io::stdin();
    loop {
        let snapshot = feed.latest();
        if snapshot.address.is_empty() {
            print!("gridmind> ");
        } else {
            print!("gridmind {}!{}> ", snapshot.worksheet, snapshot.address);
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                return EXIT_IO_ERROR;
            }
        }
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            "help" => {
                println!("{}", rules::help_text());
                println!("\nTry for example:");
                for example in rules::suggestions("") {
                    println!("  {}", example);
                }
                continue;
            }
            _ => {}
        }

        if let Some(range_text) = line.strip_prefix(":select") {
            match RangeRef::parse(range_text.trim()) {
                Ok(range) => {
                    host.lock().unwrap_or_else(|e| e.into_inner()).set_selection(range);
                    println!("Selection set to {}", range);
                }
                Err(err) => eprintln!("{}", err),
            }
            continue;
        }

        let response = {
            let mut guard = host.lock().unwrap_or_else(|e| e.into_inner());
            dispatcher.dispatch(&mut *guard, line).response
        };
        println!("{}", response);
    }

    println!("Bye.");
    EXIT_SUCCESS
}

// ── ask ─────────────────────────────────────────────────────────────

fn cmd_ask(utterance: &str, file: &Path, select: Option<&str>, delimiter: char) -> u8 {
    let mut sheet = match load_sheet(file, delimiter) {
        Ok(sheet) => sheet,
        Err(err) => {
            eprintln!("Error: {}", err);
            return EXIT_IO_ERROR;
        }
    };

    if let Some(select) = select {
        match RangeRef::parse(select) {
            Ok(range) => sheet.set_selection(range),
            Err(err) => {
                eprintln!("Error: {}", err);
                return EXIT_USAGE;
            }
        }
    }

    let config = ResolvedAssistConfig::load();
    let mut dispatcher = Dispatcher::from_config(&config);
    let outcome = dispatcher.dispatch(&mut sheet, utterance);
    println!("{}", outcome.response);

    if outcome.reports.iter().all(|r| r.succeeded()) {
        EXIT_SUCCESS
    } else {
        EXIT_ERROR
    }
}

// ── doctor ──────────────────────────────────────────────────────────

fn cmd_doctor() -> u8 {
    let config = ResolvedAssistConfig::load();
    print!("{}", AssistDiagnostics::from_resolved(&config));
    println!("Settings file:     {}", Settings::config_path_display());
    println!("Metrics file:      {}", metrics::metrics_path().display());
    EXIT_SUCCESS
}

// ── suggest ─────────────────────────────────────────────────────────

fn cmd_suggest(partial: Option<&str>) -> u8 {
    let hits = rules::suggestions(partial.unwrap_or(""));
    if hits.is_empty() {
        println!("No matching examples.");
    } else {
        for hit in hits {
            println!("{}", hit);
        }
    }
    EXIT_SUCCESS
}

// ── CSV loading ─────────────────────────────────────────────────────

fn load_sheet(path: &Path, delimiter: char) -> Result<GridSheet, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_path(path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("CSV parse error: {}", e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Sheet1".to_string());

    Ok(GridSheet::from_rows(name, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_host::SpreadsheetHost;
    use std::io::Write as _;

    #[test]
    fn test_load_sheet_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name,Amount").unwrap();
        writeln!(file, "pear,30").unwrap();
        writeln!(file, "apple,10").unwrap();
        file.flush().unwrap();

        let sheet = load_sheet(file.path(), ',').unwrap();
        assert_eq!(sheet.display_at(0, 0), "Name");
        assert_eq!(sheet.display_at(2, 1), "10");
        assert_eq!(
            sheet.selection().unwrap().unwrap().to_a1(),
            "A1:B3"
        );
    }

    #[test]
    fn test_load_sheet_missing_file() {
        let err = load_sheet(Path::new("/nonexistent/nope.csv"), ',').unwrap_err();
        assert!(err.contains("Cannot read"));
    }

    #[test]
    fn test_load_sheet_semicolon_delimiter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a;1").unwrap();
        writeln!(file, "b;2").unwrap();
        file.flush().unwrap();

        let sheet = load_sheet(file.path(), ';').unwrap();
        assert_eq!(sheet.display_at(1, 0), "b");
        assert_eq!(sheet.display_at(1, 1), "2");
    }
}
