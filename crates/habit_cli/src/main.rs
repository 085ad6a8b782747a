//! Command-line front end for the habit tracker core.
//!
//! # Responsibility
//! - Load configuration from flags, environment and `.env`.
//! - Open (and migrate) the database, run one service call, print JSON.
//!
//! # Invariants
//! - Habit ids from the command line go through `parse_habit_id`.
//! - The connection is opened per invocation and passed down explicitly.

mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Command, HabitArgs};
use habit_core::db::open_db;
use habit_core::{
    default_log_level, init_logging, parse_habit_id, EntryService, HabitInput, HabitService,
    SetEntryInput, SqliteEntryRepository, SqliteHabitRepository,
};
use log::info;
use rusqlite::Connection;
use serde_json::{json, Value};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        habit_core::core_version()
    );

    let conn = open_db(&cli.database)
        .with_context(|| format!("failed to open database `{}`", cli.database.display()))?;
    let output = run(&conn, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(conn: &Connection, command: Command) -> Result<Value> {
    let habits = HabitService::new(SqliteHabitRepository::try_new(conn)?);
    let entries = EntryService::new(
        SqliteHabitRepository::try_new(conn)?,
        SqliteEntryRepository::try_new(conn)?,
    );

    let output = match command {
        Command::List => serde_json::to_value(habits.list_habits()?)?,
        Command::Get { id } => serde_json::to_value(habits.get_habit(parse_habit_id(&id)?)?)?,
        Command::Create(fields) => serde_json::to_value(habits.create_habit(&habit_input(fields))?)?,
        Command::Update { id, fields } => {
            let id = parse_habit_id(&id)?;
            serde_json::to_value(habits.update_habit(id, &habit_input(fields))?)?
        }
        Command::Delete { id } => {
            habits.delete_habit(parse_habit_id(&id)?)?;
            json!({ "message": "Habit deleted successfully" })
        }
        Command::Entries { id } => {
            serde_json::to_value(entries.list_entries(parse_habit_id(&id)?)?)?
        }
        Command::Toggle { id, date } => {
            let id = parse_habit_id(&id)?;
            serde_json::to_value(entries.toggle_entry(id, date.as_deref())?)?
        }
        Command::SetEntry {
            id,
            date,
            completed,
            notes,
        } => {
            let id = parse_habit_id(&id)?;
            let input = SetEntryInput {
                date,
                completed,
                notes,
            };
            serde_json::to_value(entries.set_entry(id, &input)?)?
        }
    };

    Ok(output)
}

fn habit_input(fields: HabitArgs) -> HabitInput {
    HabitInput {
        name: fields.name,
        description: fields.description,
        color: fields.color,
    }
}
