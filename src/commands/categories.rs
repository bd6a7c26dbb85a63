// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{pretty_table, resolve_owner};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, m)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "INSERT INTO categories(owner, name) VALUES (?1, ?2)",
                params![owner, name],
            )?;
            println!("Added category '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name FROM categories WHERE owner=?1 ORDER BY name")?;
            let rows = stmt.query_map(params![owner], |r| r.get::<_, String>(0))?;
            let mut data = Vec::new();
            for row in rows {
                data.push(vec![row?]);
            }
            println!("{}", pretty_table(&["Category"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "DELETE FROM categories WHERE owner=?1 AND name=?2",
                params![owner, name],
            )?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
