// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::utils::{fmt_milli, maybe_print_json, parse_amount, pretty_table};

#[derive(Serialize)]
struct PriceRow {
    asset_type: String,
    price: i64,
    fetched_at: String,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let asset_type = sub.get_one::<String>("type").unwrap();
            let price = parse_amount(sub.get_one::<String>("price").unwrap())?;
            conn.execute(
                "INSERT INTO prices(asset_type, price) VALUES (?1, ?2)",
                params![asset_type, price],
            )?;
            println!("Recorded {} at {}", asset_type, fmt_milli(price));
        }
        Some(("list", sub)) => {
            let mut stmt = conn.prepare(
                "SELECT asset_type, price, fetched_at FROM prices p
                 WHERE id = (SELECT MAX(id) FROM prices WHERE asset_type = p.asset_type)
                 ORDER BY asset_type",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok(PriceRow {
                    asset_type: r.get(0)?,
                    price: r.get(1)?,
                    fetched_at: r.get(2)?,
                })
            })?;
            let mut data = Vec::new();
            for row in rows {
                data.push(row?);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows: Vec<Vec<String>> = data
                    .iter()
                    .map(|p| {
                        vec![
                            p.asset_type.clone(),
                            fmt_milli(p.price),
                            p.fetched_at.clone(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Type", "Price", "Fetched"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
