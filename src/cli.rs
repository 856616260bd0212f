use std::fs;
use std::io;

use crate::config::ServerConfig;
use crate::data::export::write_csv;
use crate::data::import::{import_workbook, ImportError};
use crate::data::record::{AgricultureRecord, CpiRecord, Kind, PopulationRecord, Record};
use crate::data::store::RecordStore;
use crate::server;

const USAGE: &str = "usage: statdash <serve|import|clear|export|status>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Import,
    Clear,
    Export,
    Status,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("import") => Some(Command::Import),
        Some("clear") => Some(Command::Clear),
        Some("export") => Some(Command::Export),
        Some("status") => Some(Command::Status),
        _ => None,
    }
}

/// Dispatches a command line and returns the process exit code
/// (0 ok, 1 failure, 2 usage).
pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };

    match command {
        Command::Serve => handle_serve(config),
        Command::Import => handle_import(args, &config),
        Command::Clear => handle_clear(args, &config),
        Command::Export => handle_export(args, &config),
        Command::Status => handle_status(&config),
    }
}

fn handle_serve(config: ServerConfig) -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };
    match runtime.block_on(server::run_server(config)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_import(args: &[String], config: &ServerConfig) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: statdash import <workbook.xlsx>");
        return 2;
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("import failed: cannot read '{path}': {err}");
            return 1;
        }
    };
    let Some(store) = open_store(config) else {
        return 1;
    };

    match import_workbook(&store, &bytes) {
        Ok(report) => {
            println!(
                "import complete: rows={}, kinds={}",
                report.total_rows,
                report.labels().join(",")
            );
            for sheet in &report.imported {
                if !sheet.ignored_columns.is_empty() {
                    eprintln!(
                        "{}: ignored columns {}",
                        sheet.kind,
                        sheet.ignored_columns.join(", ")
                    );
                }
            }
            0
        }
        Err(ImportError::Partial { report, source }) => {
            eprintln!(
                "import failed: {source} (stored rows={}, kinds={})",
                report.total_rows,
                report.labels().join(",")
            );
            1
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}

fn handle_clear(args: &[String], config: &ServerConfig) -> i32 {
    let kind = match args.get(2) {
        Some(raw) => match Kind::from_slug(raw) {
            Some(kind) => Some(kind),
            None => {
                eprintln!("usage: statdash clear [cpi|population|agriculture]");
                return 2;
            }
        },
        None => None,
    };
    let Some(store) = open_store(config) else {
        return 1;
    };

    let result = match kind {
        Some(kind) => store.clear(kind),
        None => store.clear_all(),
    };
    match result {
        Ok(()) => {
            let target = kind.map_or("all collections", Kind::label);
            println!("cleared {target}");
            0
        }
        Err(err) => {
            eprintln!("clear failed: {err}");
            1
        }
    }
}

fn handle_export(args: &[String], config: &ServerConfig) -> i32 {
    let Some(kind) = args.get(2).and_then(|raw| Kind::from_slug(raw)) else {
        eprintln!("usage: statdash export <cpi|population|agriculture>");
        return 2;
    };
    let Some(store) = open_store(config) else {
        return 1;
    };

    let result = match kind {
        Kind::Cpi => export_kind::<CpiRecord>(&store),
        Kind::Population => export_kind::<PopulationRecord>(&store),
        Kind::Agriculture => export_kind::<AgricultureRecord>(&store),
    };
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn export_kind<R: Record>(store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.read_all::<R>()?;
    write_csv(&records, io::stdout().lock())?;
    Ok(())
}

fn handle_status(config: &ServerConfig) -> i32 {
    let Some(store) = open_store(config) else {
        return 1;
    };
    let status = match store.status() {
        Ok(status) => status,
        Err(err) => {
            eprintln!("status failed: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&status) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize status: {err}");
            1
        }
    }
}

fn open_store(config: &ServerConfig) -> Option<RecordStore> {
    match RecordStore::open(&config.data_dir) {
        Ok(store) => Some(store),
        Err(err) => {
            eprintln!("cannot open data directory: {err}");
            None
        }
    }
}
