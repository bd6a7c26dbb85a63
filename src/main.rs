// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use tallybook::{cli, commands, db, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if let Some(owner) = sub.get_one::<String>("owner") {
                utils::set_default_owner(&conn, owner)?;
                println!("Default owner set to '{}'", owner);
            }
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("transfer", sub)) => commands::transfers::handle(&mut conn, sub)?,
        Some(("asset", sub)) => commands::assets::handle(&mut conn, sub)?,
        Some(("card", sub)) => commands::statements::handle(&mut conn, sub)?,
        Some(("recur", sub)) => commands::recurring::handle(&mut conn, sub)?,
        Some(("price", sub)) => commands::prices::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
