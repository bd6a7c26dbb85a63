// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::transfers::{self, NewTransfer, SideChange, TransferPatch};
use crate::utils::{
    fmt_milli, id_for_account, maybe_print_json, parse_amount, parse_date, parse_id_list,
    pretty_table, resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &owner, sub)?,
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("edit", sub)) => edit(conn, &owner, sub)?,
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
            transfers::delete(conn, &owner, id)?;
            println!("Removed transfer {}", id);
        }
        Some(("bulk-rm", sub)) => {
            let ids = parse_id_list(sub.get_one::<String>("ids").unwrap())?;
            let removed = transfers::bulk_delete(conn, &owner, &ids)?;
            println!("Removed {} of {} transfers", removed, ids.len());
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let charge = sub
        .get_one::<String>("charge")
        .map(|s| parse_amount(s))
        .transpose()?
        .unwrap_or(0);
    let from_account_id = sub
        .get_one::<String>("from")
        .map(|a| id_for_account(conn, owner, a))
        .transpose()?;
    let to_account_id = sub
        .get_one::<String>("to")
        .map(|a| id_for_account(conn, owner, a))
        .transpose()?;
    let statement_id = sub
        .get_one::<String>("statement")
        .map(|s| s.parse::<i64>())
        .transpose()?;

    let id = transfers::create(
        conn,
        owner,
        &NewTransfer {
            amount,
            charge,
            from_account_id,
            to_account_id,
            date: parse_date(sub.get_one::<String>("date").unwrap())?,
            notes: sub.get_one::<String>("notes").cloned(),
            statement_id,
        },
    )?;
    println!("Recorded transfer {} of {}", id, fmt_milli(amount));
    Ok(())
}

fn side_change(
    conn: &Connection,
    owner: &str,
    sub: &clap::ArgMatches,
    set_arg: &str,
    clear_arg: &str,
) -> Result<SideChange> {
    if sub.get_flag(clear_arg) {
        return Ok(SideChange::Clear);
    }
    match sub.get_one::<String>(set_arg) {
        Some(name) => Ok(SideChange::Set(id_for_account(conn, owner, name)?)),
        None => Ok(SideChange::Keep),
    }
}

fn edit(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let patch = TransferPatch {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        charge: sub
            .get_one::<String>("charge")
            .map(|s| parse_amount(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        notes: sub.get_one::<String>("notes").cloned(),
        from: side_change(conn, owner, sub, "from", "clear-from")?,
        to: side_change(conn, owner, sub, "to", "clear-to")?,
    };
    transfers::edit(conn, owner, id, &patch)?;
    println!("Updated transfer {}", id);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = sub
        .get_one::<String>("account")
        .map(|a| id_for_account(conn, owner, a))
        .transpose()?;
    let data = transfers::list(conn, owner, account_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    fmt_milli(r.amount),
                    fmt_milli(r.charge),
                    r.from_account.clone().unwrap_or_default(),
                    r.to_account.clone().unwrap_or_default(),
                    r.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Amount", "Charge", "From", "To", "Notes"],
                rows,
            )
        );
    }
    Ok(())
}
