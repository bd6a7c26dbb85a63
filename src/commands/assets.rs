// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::assets::{self, BuyInput, LotPatch, SellInput};
use crate::utils::{
    fmt_milli, id_for_account, maybe_print_json, parse_amount, parse_date, pretty_table,
    resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("buy", sub)) => buy(conn, &owner, sub)?,
        Some(("sell", sub)) => sell(conn, &owner, sub)?,
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("lots", sub)) => lots(conn, &owner, sub)?,
        Some(("edit-lot", sub)) => edit_lot(conn, &owner, sub)?,
        Some(("rm-lot", sub)) => {
            let lot_id: i64 = sub.get_one::<String>("lot").unwrap().parse()?;
            assets::delete_lot(conn, &owner, lot_id)?;
            println!("Removed lot {}", lot_id);
        }
        _ => {}
    }
    Ok(())
}

fn buy(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let account_id = id_for_account(conn, owner, sub.get_one::<String>("account").unwrap())?;
    let input = BuyInput {
        name: name.clone(),
        asset_type: sub.get_one::<String>("type").unwrap().clone(),
        unit: sub.get_one::<String>("unit").unwrap().clone(),
        quantity: *sub.get_one::<i64>("quantity").unwrap(),
        price: parse_amount(sub.get_one::<String>("price").unwrap())?,
        extra_charge: sub
            .get_one::<String>("extra")
            .map(|s| parse_amount(s))
            .transpose()?
            .unwrap_or(0),
        account_id,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
    };
    let asset_id = assets::buy(conn, owner, &input)?;
    println!(
        "Bought {} x '{}' (asset id {})",
        input.quantity, name, asset_id
    );
    Ok(())
}

fn sell(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let asset_id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let input = SellInput {
        quantity: *sub.get_one::<i64>("quantity").unwrap(),
        sale_amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
        extra_charge: sub
            .get_one::<String>("extra")
            .map(|s| parse_amount(s))
            .transpose()?
            .unwrap_or(0),
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
    };
    assets::sell(conn, owner, asset_id, &input)?;
    println!(
        "Sold {} units of asset {} for {}",
        input.quantity,
        asset_id,
        fmt_milli(input.sale_amount)
    );
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = assets::positions(conn, owner, sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    p.asset_type.clone(),
                    format!("{} {}", p.quantity, p.unit),
                    fmt_milli(p.average_cost),
                    fmt_milli(p.total_paid),
                    p.current_value.map(fmt_milli).unwrap_or_default(),
                    p.unrealized_profit.map(fmt_milli).unwrap_or_default(),
                    fmt_milli(p.realized_profit),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Name", "Type", "Holding", "Avg Cost", "Paid", "Value", "Unrealized",
                    "Realized",
                ],
                rows,
            )
        );
    }
    Ok(())
}

fn lots(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let asset_id: i64 = sub.get_one::<String>("id").unwrap().parse()?;
    let data = assets::lots(conn, owner, asset_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.date.to_string(),
                    l.quantity.to_string(),
                    fmt_milli(l.price),
                    l.sell_price.map(fmt_milli).unwrap_or_default(),
                    fmt_milli(l.extra_charge),
                    fmt_milli(l.total_paid),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Qty", "Price", "Sell Price", "Extra", "Paid"],
                rows,
            )
        );
    }
    Ok(())
}

fn edit_lot(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let lot_id: i64 = sub.get_one::<String>("lot").unwrap().parse()?;
    let patch = LotPatch {
        quantity: sub.get_one::<i64>("quantity").copied(),
        price: sub
            .get_one::<String>("price")
            .map(|s| parse_amount(s))
            .transpose()?,
        extra_charge: sub
            .get_one::<String>("extra")
            .map(|s| parse_amount(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
    };
    assets::edit_lot(conn, owner, lot_id, &patch)?;
    println!("Updated lot {}", lot_id);
    Ok(())
}
