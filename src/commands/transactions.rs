// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::ledger::{self, NewTransaction, TxFilter, TxPatch};
use crate::utils::{
    fmt_milli, id_for_account, id_for_category, maybe_print_json, parse_amount, parse_date,
    parse_id_list, pretty_table, resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &owner, sub)?,
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("edit", sub)) => edit(conn, &owner, sub)?,
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
            ledger::delete(conn, &owner, id)?;
            println!("Removed transaction {}", id);
        }
        Some(("bulk-rm", sub)) => {
            let ids = parse_id_list(sub.get_one::<String>("ids").unwrap())?;
            let removed = ledger::bulk_delete(conn, &owner, &ids)?;
            println!("Removed {} of {} transactions", removed, ids.len());
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let category_id = sub
        .get_one::<String>("category")
        .map(|c| id_for_category(conn, owner, c))
        .transpose()?;

    let account_id = id_for_account(conn, owner, account_name)?;
    let id = ledger::create(
        conn,
        owner,
        &NewTransaction {
            account_id,
            amount,
            date,
            category_id,
        },
    )?;
    println!(
        "Recorded {} on {} (acct: {}, id: {})",
        fmt_milli(amount),
        date,
        account_name,
        id
    );
    Ok(())
}

fn edit(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let patch = TxPatch {
        account_id: sub
            .get_one::<String>("account")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        category_id: sub
            .get_one::<String>("category")
            .map(|c| id_for_category(conn, owner, c))
            .transpose()?,
        clear_category: sub.get_flag("clear-category"),
    };
    ledger::edit(conn, owner, id, &patch)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let filter = TxFilter {
        account_id: sub
            .get_one::<String>("account")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        category_id: sub
            .get_one::<String>("category")
            .map(|c| id_for_category(conn, owner, c))
            .transpose()?,
        from: sub
            .get_one::<String>("from")
            .map(|s| parse_date(s))
            .transpose()?,
        to: sub
            .get_one::<String>("to")
            .map(|s| parse_date(s))
            .transpose()?,
        limit: sub.get_one::<usize>("limit").copied(),
    };
    let data = ledger::list(conn, owner, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    fmt_milli(r.amount),
                    r.tx_type.clone(),
                    r.category.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Account", "Amount", "Type", "Category"], rows)
        );
    }
    Ok(())
}
