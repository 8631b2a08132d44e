//! csvstore - A CSV-backed Document Store
//!
//! This is the main entry point for the csvstore command-line interface.
//! Every invocation runs one command and prints one JSON document.

use std::process::ExitCode;

use csvstore::db::{Action, Database, DatabaseConfig, Invocation, Response};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let invocation = match Invocation::parse(&args, DatabaseConfig::from_env()) {
        Ok(invocation) => invocation,
        Err(e) => return finish(&Response::from(e)),
    };

    match invocation.action {
        Action::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Action::Version => {
            println!("csvstore v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Action::Run(command) => {
            csvstore::init_logging(invocation.config.verbose);
            let response = match Database::open_with_config(invocation.config) {
                Ok(db) => db.run(&command),
                Err(e) => Response::from(e),
            };
            finish(&response)
        }
    }
}

fn finish(response: &Response) -> ExitCode {
    println!("{}", response.to_json());
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_help() {
    println!("csvstore - A CSV-backed Document Store");
    println!();
    println!("Usage: csvstore [OPTIONS] <COMMAND> <COLLECTION> [ARGS]");
    println!();
    println!("Commands:");
    println!("  create <collection> --fields a,b,c     Create a collection");
    println!("  add    <collection> --json '{{...}}'     Append a record");
    println!("  query  <collection> [--field F --value V]");
    println!("                                         List records, optionally filtered");
    println!("  delete <collection> --id ID            Delete records by id");
    println!("  update <collection> --id ID --json '{{...}}'");
    println!("                                         Merge fields into records by id");
    println!("  schema <collection>                    Show the field list");
    println!("  list                                   List collections");
    println!();
    println!("Options:");
    println!("  -d, --root PATH        Storage root (default: $CSVSTORE_ROOT or /tmp/agent_csv_db)");
    println!("  --ids hash|ulid        Id generation strategy (default: hash)");
    println!("  --sync                 Fsync after every write");
    println!("  -v, --verbose          Debug logging to stderr");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Examples:");
    println!("  csvstore create notes --fields id,text");
    println!("  csvstore add notes --json '{{\"text\": \"hello\"}}'");
    println!("  csvstore query notes --field text --value hello");
}
