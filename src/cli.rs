// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Record id")
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn debt_fields(cmd: Command, required: bool) -> Command {
    let field = |name, help| if required { req(name, help) } else { opt(name, help) };
    cmd.arg(field("name", "Display name"))
        .arg(opt("type", "mortgage|auto_loan|student_loan|credit_card|personal_loan|other"))
        .arg(field("original", "Original principal"))
        .arg(opt("balance", "Current balance (defaults to the original amount)"))
        .arg(field("rate", "APR in percent, e.g. 5.5"))
        .arg(field("min-payment", "Minimum monthly payment"))
        .arg(opt("currency", "ISO currency code"))
        .arg(
            opt("due-day", "Day of month the payment is due")
                .value_parser(value_parser!(u32).range(1..=31)),
        )
        .arg(opt("start", "Start date YYYY-MM-DD"))
}

fn debt_cmd() -> Command {
    Command::new("debt")
        .about("Debts, payments and payoff plans")
        .subcommand_required(true)
        .subcommand(debt_fields(Command::new("add").about("Add a debt"), true))
        .subcommand(json_flags(Command::new("list").about("List debts")))
        .subcommand(json_flags(Command::new("show").about("Show one debt").arg(id_arg())))
        .subcommand(debt_fields(
            Command::new("update").about("Replace a debt's fields").arg(id_arg()),
            false,
        ))
        .subcommand(Command::new("rm").about("Delete a debt and its payments").arg(id_arg()))
        .subcommand(
            Command::new("pay")
                .about("Record a payment; interest is taken first")
                .arg(id_arg())
                .arg(req("amount", "Amount paid"))
                .arg(opt("date", "Payment date YYYY-MM-DD (default today)")),
        )
        .subcommand(json_flags(
            Command::new("payments").about("Payment history").arg(id_arg()),
        ))
        .subcommand(json_flags(
            Command::new("plan")
                .about("Simulate payoff at a flat monthly payment")
                .arg(id_arg())
                .arg(opt("monthly", "Monthly payment (default: the debt's minimum)"))
                .arg(opt("as-of", "Simulation start date YYYY-MM-DD (default today)"))
                .arg(opt("csv", "Write the amortization schedule to this CSV file")),
        ))
        .subcommand(json_flags(Command::new("summary").about("Totals across debts")))
}

fn recurring_fields(cmd: Command, required: bool) -> Command {
    let field = |name, help| if required { req(name, help) } else { opt(name, help) };
    cmd.arg(field("type", "income|expense"))
        .arg(field("amount", "Amount per occurrence"))
        .arg(opt("currency", "ISO currency code"))
        .arg(field("category", "Category"))
        .arg(opt("description", "Description"))
        .arg(field("frequency", "daily|weekly|biweekly|monthly|yearly"))
        .arg(field("start", "First occurrence YYYY-MM-DD"))
        .arg(opt("end", "Last allowed occurrence YYYY-MM-DD"))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Recurring income and expense definitions")
        .subcommand_required(true)
        .subcommand(recurring_fields(Command::new("add").about("Add a definition"), true))
        .subcommand(json_flags(Command::new("list").about("List definitions")))
        .subcommand(json_flags(Command::new("show").about("Show one definition").arg(id_arg())))
        .subcommand(
            recurring_fields(
                Command::new("update").about("Change selected fields").arg(id_arg()),
                false,
            )
            .arg(
                Arg::new("clear-end")
                    .long("clear-end")
                    .action(ArgAction::SetTrue)
                    .conflicts_with("end")
                    .help("Remove the end date"),
            )
            .arg(opt("active", "true|false").value_parser(value_parser!(bool))),
        )
        .subcommand(Command::new("pause").about("Stop generating").arg(id_arg()))
        .subcommand(Command::new("resume").about("Start generating again").arg(id_arg()))
        .subcommand(Command::new("rm").about("Delete a definition").arg(id_arg()))
        .subcommand(json_flags(
            Command::new("upcoming")
                .about("Next due definitions")
                .arg(opt("limit", "How many to show").value_parser(value_parser!(i64)))
                .arg(opt("as-of", "Reference date YYYY-MM-DD (default today)")),
        ))
}

fn transaction_fields(cmd: Command, required: bool) -> Command {
    let field = |name, help| if required { req(name, help) } else { opt(name, help) };
    cmd.arg(field("type", "income|expense"))
        .arg(field("amount", "Amount"))
        .arg(opt("currency", "ISO currency code"))
        .arg(field("category", "Category"))
        .arg(opt("description", "Description"))
        .arg(opt("date", "Date YYYY-MM-DD (default today)"))
}

fn ledger_cmd() -> Command {
    Command::new("ledger")
        .about("Ledger transactions")
        .subcommand_required(true)
        .subcommand(transaction_fields(
            Command::new("add").about("Record a manual transaction"),
            true,
        ))
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(opt("type", "income|expense"))
                .arg(opt("category", "Exact category"))
                .arg(opt("from", "Earliest date YYYY-MM-DD"))
                .arg(opt("to", "Latest date YYYY-MM-DD"))
                .arg(
                    opt("limit", "Maximum rows")
                        .value_parser(value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    opt("offset", "Rows to skip")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                ),
        ))
        .subcommand(json_flags(Command::new("show").about("Show one transaction").arg(id_arg())))
        .subcommand(transaction_fields(
            Command::new("update").about("Replace a transaction's fields").arg(id_arg()),
            false,
        ))
        .subcommand(Command::new("rm").about("Delete a transaction").arg(id_arg()))
}

fn savings_fields(cmd: Command, required: bool) -> Command {
    let field = |name, help| if required { req(name, help) } else { opt(name, help) };
    cmd.arg(field("name", "Goal name"))
        .arg(field("target", "Target amount"))
        .arg(opt("current", "Amount already saved"))
        .arg(opt("currency", "ISO currency code"))
        .arg(opt("target-date", "Target date YYYY-MM-DD"))
}

fn savings_cmd() -> Command {
    Command::new("savings")
        .about("Savings goals")
        .subcommand_required(true)
        .subcommand(savings_fields(Command::new("add").about("Add a goal"), true))
        .subcommand(json_flags(Command::new("list").about("List goals")))
        .subcommand(json_flags(Command::new("show").about("Show one goal").arg(id_arg())))
        .subcommand(
            savings_fields(
                Command::new("update").about("Replace a goal's fields").arg(id_arg()),
                false,
            )
            .arg(
                Arg::new("clear-date")
                    .long("clear-date")
                    .action(ArgAction::SetTrue)
                    .conflicts_with("target-date")
                    .help("Remove the target date"),
            ),
        )
        .subcommand(Command::new("rm").about("Delete a goal").arg(id_arg()))
        .subcommand(
            Command::new("contribute")
                .about("Add money to a goal")
                .arg(id_arg())
                .arg(req("amount", "Amount to add")),
        )
}

pub fn build_cli() -> Command {
    Command::new("wealthpath")
        .version(clap::crate_version!())
        .about("Debt payoff projections, interest calculator and recurring transaction scheduler")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite database path (default: platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .value_parser(value_parser!(i64))
                .help("Acting user id (default: configured default_user)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(debt_cmd())
        .subcommand(
            Command::new("calc")
                .about("Stand-alone calculators")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("interest")
                        .about("Fixed monthly payment, total payment and total interest")
                        .arg(req("principal", "Loan principal"))
                        .arg(req("rate", "APR in percent"))
                        .arg(req("term", "Term in months").allow_hyphen_values(true))
                        .arg(opt("payment-type", "fixed|minimum; others are computed as fixed").default_value("fixed"))
                        .arg(opt("as-of", "Start date YYYY-MM-DD (default today)")),
                )),
        )
        .subcommand(recurring_cmd())
        .subcommand(
            Command::new("schedule")
                .about("Recurring transaction generation")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("run")
                        .about("Materialize every due definition once")
                        .arg(opt("now", "Override the clock (RFC 3339 or YYYY-MM-DD)")),
                )),
        )
        .subcommand(ledger_cmd())
        .subcommand(savings_cmd())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_user_reaches_subcommands() {
        let m = build_cli().get_matches_from(["wealthpath", "debt", "list", "--user", "7"]);
        let (_, debt_m) = m.subcommand().unwrap();
        let (_, list_m) = debt_m.subcommand().unwrap();
        assert_eq!(list_m.get_one::<i64>("user"), Some(&7));
    }
}
