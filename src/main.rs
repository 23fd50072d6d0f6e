// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use wealthpath::{cli, commands, config::Config, db, utils::init_tracing};

fn main() -> Result<()> {
    init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let db_path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::db_path()?,
    };
    let conn = db::open_at(&db_path)?;
    let cfg = Config::load(&conn)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db_path.display());
        }
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("debt", sub)) => commands::debts::handle(&conn, &cfg, sub)?,
        Some(("calc", sub)) => commands::calc::handle(sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&conn, &cfg, sub)?,
        Some(("schedule", sub)) => commands::schedule::handle(&conn, sub)?,
        Some(("ledger", sub)) => commands::ledger::handle(&conn, &cfg, sub)?,
        Some(("savings", sub)) => commands::savings::handle(&conn, &cfg, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
