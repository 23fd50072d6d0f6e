// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{Config, KEYS};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let cfg = Config::load(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cfg)? {
                let rows = KEYS
                    .iter()
                    .map(|k| vec![k.to_string(), cfg.get(k).unwrap_or_default()])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").context("key")?;
            let value = sub.get_one::<String>("value").context("value")?;
            let cfg = Config::set(conn, key, value)?;
            println!("{} = {}", key, cfg.get(key).unwrap_or_default());
        }
        _ => {}
    }
    Ok(())
}
