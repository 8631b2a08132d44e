//! Command-line invocations.
//!
//! Turns the raw argument list into one [`Command`] plus the configuration to
//! run it with. Options may appear anywhere on the line.

use serde_json::Value;

use super::api::{DatabaseConfig, DatabaseError, DatabaseResult, IdStrategy};
use crate::storage::Filter;

/// One store operation, with its payload already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create { collection: String, fields: Vec<String> },
    Add { collection: String, data: Value },
    Query { collection: String, filter: Option<Filter> },
    Delete { collection: String, id: String },
    Update { collection: String, id: String, data: Value },
    Schema { collection: String },
    List,
}

impl Command {
    /// Command names, in the order shown by `--help`.
    pub const NAMES: &'static [&'static str] =
        &["create", "add", "query", "delete", "update", "schema", "list"];
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Run(Command),
    Help,
    Version,
}

/// A parsed command line.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: DatabaseConfig,
    pub action: Action,
}

/// Operation-specific `--flag value` pairs.
#[derive(Debug, Default)]
struct Options {
    fields: Option<String>,
    json: Option<String>,
    field: Option<String>,
    value: Option<String>,
    id: Option<String>,
}

impl Invocation {
    /// Parse arguments (without the program name) on top of `config`.
    pub fn parse(args: &[String], config: DatabaseConfig) -> DatabaseResult<Self> {
        let mut config = config;
        let mut options = Options::default();
        let mut positional: Vec<&str> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            match arg {
                "-h" | "--help" => {
                    return Ok(Self { config, action: Action::Help });
                }
                "--version" => {
                    return Ok(Self { config, action: Action::Version });
                }
                "-v" | "--verbose" => config.verbose = true,
                "--sync" => config.sync_writes = true,
                "-d" | "--root" => config.root = take_value(args, &mut i, arg)?.into(),
                "--ids" => config.id_strategy = take_value(args, &mut i, arg)?.parse::<IdStrategy>()?,
                "--fields" => options.fields = Some(take_value(args, &mut i, arg)?),
                "--json" => options.json = Some(take_value(args, &mut i, arg)?),
                "--field" => options.field = Some(take_value(args, &mut i, arg)?),
                "--value" => options.value = Some(take_value(args, &mut i, arg)?),
                "--id" => options.id = Some(take_value(args, &mut i, arg)?),
                other if other.starts_with('-') && other.len() > 1 => {
                    return Err(DatabaseError::Usage(format!("unknown option: {}", other)));
                }
                other => positional.push(other),
            }
            i += 1;
        }

        let command = build_command(&positional, options)?;
        Ok(Self {
            config,
            action: Action::Run(command),
        })
    }
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> DatabaseResult<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| DatabaseError::Usage(format!("{} requires a value", flag)))
}

fn build_command(positional: &[&str], options: Options) -> DatabaseResult<Command> {
    let (name, rest) = match positional.split_first() {
        Some((name, rest)) => (*name, rest),
        None => {
            return Err(DatabaseError::Usage(format!(
                "missing command (one of: {})",
                Command::NAMES.join(", ")
            )))
        }
    };

    if name == "list" {
        expect_arity(name, rest, 0)?;
        return Ok(Command::List);
    }

    expect_arity(name, rest, 1)?;
    let collection = rest[0].to_string();

    let command = match name {
        "create" => Command::Create {
            collection,
            fields: split_fields(&required(options.fields, "create", "--fields")?),
        },
        "add" => Command::Add {
            collection,
            data: decode_json(&required(options.json, "add", "--json")?)?,
        },
        "query" => Command::Query {
            collection,
            filter: match (options.field, options.value) {
                (Some(field), Some(value)) => Some(Filter::new(field, value)),
                (None, None) => None,
                _ => {
                    return Err(DatabaseError::Usage(
                        "--field and --value must be given together".into(),
                    ))
                }
            },
        },
        "delete" => Command::Delete {
            collection,
            id: required(options.id, "delete", "--id")?,
        },
        "update" => Command::Update {
            collection,
            id: required(options.id, "update", "--id")?,
            data: decode_json(&required(options.json, "update", "--json")?)?,
        },
        "schema" => Command::Schema { collection },
        other => {
            return Err(DatabaseError::Usage(format!(
                "unknown command '{}' (one of: {})",
                other,
                Command::NAMES.join(", ")
            )))
        }
    };
    Ok(command)
}

fn expect_arity(command: &str, rest: &[&str], expected: usize) -> DatabaseResult<()> {
    if rest.len() == expected {
        return Ok(());
    }
    let message = if expected == 0 {
        format!("'{}' takes no arguments", command)
    } else {
        format!("'{}' takes exactly one collection name", command)
    };
    Err(DatabaseError::Usage(message))
}

fn required(value: Option<String>, command: &str, flag: &str) -> DatabaseResult<String> {
    value.ok_or_else(|| DatabaseError::Usage(format!("'{}' requires {}", command, flag)))
}

/// Split a comma-separated field list, trimming whitespace around names.
fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_json(raw: &str) -> DatabaseResult<Value> {
    Ok(serde_json::from_str(raw)?)
}
