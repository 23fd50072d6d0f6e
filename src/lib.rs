// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Debt payoff projections, a loan interest calculator and a scheduler that
//! turns recurring income/expense definitions into ledger transactions.
//!
//! The pure calculators live in [`engine`]; [`store`] backs the scheduler
//! with SQLite and [`commands`] wires everything to the CLI.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod models;
pub mod money;
pub mod store;
pub mod utils;
