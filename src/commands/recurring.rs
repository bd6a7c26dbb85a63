// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::models::{Cadence, RecurringKind};
use crate::recurring::{self, NewRecurring, RecurringPatch, RecurringTemplate};
use crate::utils::{
    fmt_milli, id_for_account, id_for_category, maybe_print_json, parse_amount, parse_date,
    pretty_table, resolve_owner,
};
use crate::{ledger, transfers};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &owner, sub)?,
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("edit", sub)) => edit(conn, &owner, sub)?,
        Some(("complete", sub)) => complete(conn, &owner, sub)?,
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
            recurring::delete(conn, &owner, id)?;
            println!("Removed recurring payment {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let input = NewRecurring {
        kind: RecurringKind::parse(sub.get_one::<String>("kind").unwrap())?,
        cadence: Cadence::parse(sub.get_one::<String>("cadence").unwrap())?,
        amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
        account_id: sub
            .get_one::<String>("account")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        to_account_id: sub
            .get_one::<String>("to")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        category_id: sub
            .get_one::<String>("category")
            .map(|c| id_for_category(conn, owner, c))
            .transpose()?,
        start_date: parse_date(sub.get_one::<String>("start").unwrap())?,
        day_of_month: sub
            .get_one::<String>("day")
            .map(|s| s.parse::<u32>())
            .transpose()?,
        month: sub
            .get_one::<String>("month")
            .map(|s| s.parse::<u32>())
            .transpose()?,
    };
    let id = recurring::create(conn, owner, &input)?;
    println!("Added recurring payment {}", id);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let today = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    let data = recurring::list(conn, owner, today, !sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.kind.clone(),
                    r.cadence.clone(),
                    fmt_milli(r.amount),
                    r.account.clone().unwrap_or_default(),
                    r.to_account.clone().unwrap_or_default(),
                    r.next_due.to_string(),
                    r.days_remaining.to_string(),
                    if r.is_active { String::new() } else { "inactive".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Kind", "Cadence", "Amount", "Account", "To", "Next Due", "Days", ""],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let patch = RecurringPatch {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        cadence: sub
            .get_one::<String>("cadence")
            .map(|s| Cadence::parse(s))
            .transpose()?,
        day_of_month: sub
            .get_one::<String>("day")
            .map(|s| s.parse::<u32>())
            .transpose()?,
        month: sub
            .get_one::<String>("month")
            .map(|s| s.parse::<u32>())
            .transpose()?,
        is_active: sub
            .get_one::<String>("active")
            .map(|s| s.parse::<bool>())
            .transpose()?,
    };
    recurring::edit(conn, owner, id, &patch)?;
    println!("Updated recurring payment {}", id);
    Ok(())
}

// Two steps: write the proposed ledger entry first, stamp completion only
// after that write succeeds.
fn complete(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let today = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    let item = recurring::get(conn, owner, id)?;
    let occurrence = recurring::next_due_date(&item, today);
    match recurring::template(&item, today)? {
        RecurringTemplate::Transaction(tx) => {
            ledger::create(conn, owner, &tx)?;
        }
        RecurringTemplate::Transfer(tr) => {
            transfers::create(conn, owner, &tr)?;
        }
    }
    recurring::complete(conn, owner, id, occurrence)?;
    println!("Completed occurrence of {} on {}", id, occurrence);
    Ok(())
}
