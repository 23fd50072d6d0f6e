// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::MAX_PAYOFF_MONTHS;
use crate::errors::{EngineError, EngineResult};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

/// Settings handed to the services explicitly; nothing here reads the process
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub default_currency: String,
    pub default_user: i64,
    pub payoff_cap_months: u32,
    pub upcoming_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: "USD".into(),
            default_user: 1,
            payoff_cap_months: MAX_PAYOFF_MONTHS,
            upcoming_limit: 5,
        }
    }
}

pub const KEYS: [&str; 4] = [
    "default_currency",
    "default_user",
    "payoff_cap_months",
    "upcoming_limit",
];

impl Config {
    /// Defaults overlaid with whatever the `settings` table holds.
    pub fn load(conn: &Connection) -> EngineResult<Config> {
        let mut cfg = Config::default();
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            if KEYS.contains(&key.as_str()) {
                cfg.apply(&key, &value)
                    .map_err(|_| EngineError::Corrupt(format!("setting {}='{}'", key, value)))?;
            }
        }
        Ok(cfg)
    }

    /// Validates and persists one key.
    pub fn set(conn: &Connection, key: &str, value: &str) -> EngineResult<Config> {
        let mut cfg = Config::load(conn)?;
        cfg.apply(key, value)?;
        conn.execute(
            "INSERT INTO settings(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value.trim()],
        )?;
        Ok(cfg)
    }

    fn apply(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let value = value.trim();
        match key {
            "default_currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(EngineError::invalid(format!(
                        "currency must be a 3-letter code, got '{}'",
                        value
                    )));
                }
                self.default_currency = value.to_uppercase();
            }
            "default_user" => {
                self.default_user = value
                    .parse()
                    .map_err(|_| EngineError::invalid(format!("invalid user id '{}'", value)))?;
            }
            "payoff_cap_months" => {
                let months: u32 = value
                    .parse()
                    .map_err(|_| EngineError::invalid(format!("invalid month count '{}'", value)))?;
                if !(1..=1200).contains(&months) {
                    return Err(EngineError::invalid("payoff cap must be within 1..=1200 months"));
                }
                self.payoff_cap_months = months;
            }
            "upcoming_limit" => {
                let limit: usize = value
                    .parse()
                    .map_err(|_| EngineError::invalid(format!("invalid limit '{}'", value)))?;
                if limit == 0 {
                    return Err(EngineError::invalid("upcoming limit must be positive"));
                }
                self.upcoming_limit = limit;
            }
            other => {
                return Err(EngineError::invalid(format!(
                    "unknown setting '{}' (expected one of {})",
                    other,
                    KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "default_currency" => Some(self.default_currency.clone()),
            "default_user" => Some(self.default_user.to_string()),
            "payoff_cap_months" => Some(self.payoff_cap_months.to_string()),
            "upcoming_limit" => Some(self.upcoming_limit.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn defaults_without_settings() {
        assert_eq!(Config::load(&conn()).unwrap(), Config::default());
    }

    #[test]
    fn set_persists_and_normalises() {
        let conn = conn();
        Config::set(&conn, "default_currency", " eur ").unwrap();
        Config::set(&conn, "payoff_cap_months", "120").unwrap();
        let cfg = Config::load(&conn).unwrap();
        assert_eq!(cfg.default_currency, "EUR");
        assert_eq!(cfg.payoff_cap_months, 120);
        assert_eq!(cfg.get("upcoming_limit").as_deref(), Some("5"));
    }

    #[test]
    fn set_rejects_bad_values() {
        let conn = conn();
        assert!(Config::set(&conn, "payoff_cap_months", "0").is_err());
        assert!(Config::set(&conn, "default_currency", "dollars").is_err());
        assert!(Config::set(&conn, "theme", "dark").is_err());
        assert_eq!(Config::load(&conn).unwrap(), Config::default());
    }
}
