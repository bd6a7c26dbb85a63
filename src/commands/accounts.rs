// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

use crate::accounts::{self, AccountPatch, NewAccount};
use crate::models::{AccountType, BillingConfig};
use crate::utils::{
    fmt_milli, maybe_print_json, parse_amount, parse_date, parse_id_list, pretty_table,
    resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &owner, sub)?,
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("set", sub)) => set(conn, &owner, sub)?,
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
            accounts::delete(conn, &owner, id)?;
            println!("Removed account {}", id);
        }
        Some(("bulk-rm", sub)) => {
            let ids = parse_id_list(sub.get_one::<String>("ids").unwrap())?;
            let removed = accounts::bulk_delete(conn, &owner, &ids)?;
            println!("Removed {} of {} accounts", removed, ids.len());
        }
        _ => {}
    }
    Ok(())
}

fn billing_from_args(sub: &clap::ArgMatches) -> Result<Option<BillingConfig>> {
    let close_day = sub
        .get_one::<String>("close-day")
        .map(|s| s.parse::<u32>().context("Bad --close-day"))
        .transpose()?;
    let close_at_month_end = sub.get_flag("month-end");
    let due_day = sub
        .get_one::<String>("due-day")
        .map(|s| s.parse::<u32>().context("Bad --due-day"))
        .transpose()?;
    let due_days = sub
        .get_one::<String>("due-days")
        .map(|s| s.parse::<i64>().context("Bad --due-days"))
        .transpose()?;
    let min_payment_pct = sub
        .get_one::<String>("min-pct")
        .map(|s| parse_amount(s))
        .transpose()?;
    let credit_limit = sub
        .get_one::<String>("limit")
        .map(|s| parse_amount(s))
        .transpose()?;
    let apr = sub
        .get_one::<String>("apr")
        .map(|s| parse_amount(s))
        .transpose()?;

    if close_day.is_none()
        && !close_at_month_end
        && due_day.is_none()
        && due_days.is_none()
        && min_payment_pct.is_none()
        && credit_limit.is_none()
        && apr.is_none()
    {
        return Ok(None);
    }
    Ok(Some(BillingConfig {
        close_day,
        close_at_month_end,
        due_day,
        due_days,
        min_payment_pct,
        credit_limit,
        apr,
    }))
}

fn add(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let account_type = AccountType::parse(sub.get_one::<String>("type").unwrap())?;
    let opening_balance = sub
        .get_one::<String>("opening")
        .map(|s| parse_amount(s))
        .transpose()?;
    let opening_date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };

    let id = accounts::create(
        conn,
        owner,
        &NewAccount {
            name: name.clone(),
            account_type,
            hidden: sub.get_flag("hidden"),
            opening_balance,
            opening_date,
            billing: billing_from_args(sub)?,
        },
    )?;
    println!("Added account '{}' ({}) with id {}", name, account_type.as_str(), id);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("as-of") {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    let data = accounts::list(conn, owner, as_of, sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name.clone(),
                    r.account_type.clone(),
                    if r.hidden { "yes".into() } else { String::new() },
                    fmt_milli(r.balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Type", "Hidden", "Balance"], rows)
        );
    }
    Ok(())
}

fn set(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let hidden = sub
        .get_one::<String>("hidden")
        .map(|s| s.parse::<bool>().context("Bad --hidden, use true or false"))
        .transpose()?;
    let patch = AccountPatch {
        name: sub.get_one::<String>("rename").cloned(),
        hidden,
        billing: billing_from_args(sub)?,
    };
    accounts::update(conn, owner, id, &patch)?;
    println!("Updated account {}", id);
    Ok(())
}
