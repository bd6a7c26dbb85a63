// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::statements::{self, StatementFilter};
use crate::utils::{
    fmt_milli, id_for_account, maybe_print_json, parse_amount, parse_date, pretty_table,
    resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, &owner, sub)?,
        Some(("preview", sub)) => preview(conn, &owner, sub)?,
        Some(("close", sub)) => close(conn, &owner, sub)?,
        Some(("statements", sub)) => list(conn, &owner, sub)?,
        Some(("edit", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
            let due = parse_amount(sub.get_one::<String>("due").unwrap())?;
            statements::edit(conn, &owner, id, due)?;
            println!("Statement {} now due {}", id, fmt_milli(due));
        }
        Some(("next", sub)) => next(conn, &owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn date_or_today(sub: &clap::ArgMatches) -> Result<chrono::NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => parse_date(s),
        None => Ok(Utc::now().date_naive()),
    }
}

fn summary(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = statements::card_summaries(conn, owner, date_or_today(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|c| {
                vec![
                    c.account.clone(),
                    fmt_milli(c.current_owed),
                    c.credit_limit.map(fmt_milli).unwrap_or_default(),
                    c.available_credit.map(fmt_milli).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Card", "Owed", "Limit", "Available"], rows)
        );
    }
    Ok(())
}

fn preview(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, owner, sub.get_one::<String>("account").unwrap())?;
    let p = statements::preview(conn, owner, account_id, date_or_today(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &p)? {
        println!(
            "Period {} to {}, due {}: balance {}, minimum {}{}",
            p.period_start,
            p.statement_date,
            p.due_date,
            fmt_milli(p.statement_balance),
            fmt_milli(p.minimum_payment),
            if p.already_closed {
                " (already closed)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn close(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, owner, sub.get_one::<String>("account").unwrap())?;
    let override_due = sub
        .get_one::<String>("due")
        .map(|s| parse_amount(s))
        .transpose()?;
    let id = statements::close(conn, owner, account_id, date_or_today(sub)?, override_due)?;
    println!("Closed statement {}", id);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let filter = StatementFilter {
        account_id: sub
            .get_one::<String>("account")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        paid: match (sub.get_flag("paid"), sub.get_flag("unpaid")) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        },
    };
    let data = statements::list(conn, owner, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.account.clone(),
                    s.statement_date.clone(),
                    s.due_date.clone(),
                    fmt_milli(s.statement_balance),
                    fmt_milli(s.payment_due_amount),
                    fmt_milli(s.minimum_payment),
                    if s.is_paid {
                        format!("paid {}", fmt_milli(s.paid_amount))
                    } else {
                        "open".into()
                    },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Card", "Closed", "Due Date", "Balance", "Due", "Minimum", "Status"],
                rows,
            )
        );
    }
    Ok(())
}

fn next(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    match statements::next_statement(conn, owner, date_or_today(sub)?)? {
        Some(n) => {
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &n)? {
                println!(
                    "Next payment: {} due {} ({} days), est. monthly interest {}",
                    fmt_milli(n.statement.payment_due_amount),
                    n.statement.due_date,
                    n.days_until_due,
                    fmt_milli(n.monthly_interest_estimate)
                );
            }
        }
        None => println!("No unpaid statements"),
    }
    Ok(())
}
