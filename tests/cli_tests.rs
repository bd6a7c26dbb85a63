// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use tallybook::{cli, commands, db, utils};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    utils::set_default_owner(&conn, "ana").unwrap();
    conn
}

#[test]
fn account_add_wires_through_the_cli() {
    let mut conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "tallybook", "account", "add", "--name", "Wallet", "--type", "CASH", "--opening",
        "250", "--date", "2025-01-01",
    ]);
    let Some(("account", sub)) = matches.subcommand() else {
        panic!("no account subcommand");
    };
    commands::accounts::handle(&mut conn, sub).unwrap();

    let (name, balance): (String, i64) = conn
        .query_row(
            "SELECT a.name, t.amount FROM accounts a JOIN transactions t ON t.account_id=a.id",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Wallet");
    assert_eq!(balance, 250_000);
}

#[test]
fn owner_flag_overrides_the_default() {
    let mut conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "tallybook", "account", "add", "--owner", "bob", "--name", "Wallet", "--type", "CASH",
    ]);
    let Some(("account", sub)) = matches.subcommand() else {
        panic!("no account subcommand");
    };
    commands::accounts::handle(&mut conn, sub).unwrap();

    let owner: String = conn
        .query_row("SELECT owner FROM accounts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(owner, "bob");
}

#[test]
fn card_close_requires_an_account() {
    let err = cli::build_cli().try_get_matches_from(["tallybook", "card", "close"]);
    assert!(err.is_err());
}

#[test]
fn missing_owner_is_a_clear_error() {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let matches =
        cli::build_cli().get_matches_from(["tallybook", "account", "list"]);
    let Some(("account", sub)) = matches.subcommand() else {
        panic!("no account subcommand");
    };
    let err = commands::accounts::handle(&mut conn, sub).unwrap_err();
    assert!(err.to_string().contains("--owner"));
}
