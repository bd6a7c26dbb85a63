// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use tallybook::accounts::{self, NewAccount};
use tallybook::balance::compute_balance;
use tallybook::db;
use tallybook::error::LedgerError;
use tallybook::ledger::{self, NewTransaction, TxFilter, TxPatch};
use tallybook::models::AccountType;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let account = accounts::create(
        &mut conn,
        "ana",
        &NewAccount {
            name: "Checking".into(),
            account_type: AccountType::Bank,
            hidden: false,
            opening_balance: Some(1_000_000),
            opening_date: d("2025-01-01"),
            billing: None,
        },
    )
    .unwrap();
    (conn, account)
}

fn tx(account_id: i64, amount: i64, date: &str) -> NewTransaction {
    NewTransaction {
        account_id,
        amount,
        date: d(date),
        category_id: None,
    }
}

#[test]
fn balance_is_the_sum_of_dated_rows() {
    let (conn, account) = setup();
    ledger::create(&conn, "ana", &tx(account, -250_000, "2025-02-10")).unwrap();
    ledger::create(&conn, "ana", &tx(account, 100_000, "2025-03-01")).unwrap();

    assert_eq!(
        compute_balance(&conn, "ana", d("2025-02-28"), Some(account), true).unwrap(),
        750_000
    );
    assert_eq!(
        compute_balance(&conn, "ana", d("2025-03-31"), Some(account), true).unwrap(),
        850_000
    );
}

#[test]
fn other_owners_rows_are_invisible() {
    let (mut conn, _account) = setup();
    let bobs = accounts::create(
        &mut conn,
        "bob",
        &NewAccount {
            name: "Checking".into(),
            account_type: AccountType::Bank,
            hidden: false,
            opening_balance: Some(5_000_000),
            opening_date: d("2025-01-01"),
            billing: None,
        },
    )
    .unwrap();

    assert!(matches!(
        ledger::create(&conn, "ana", &tx(bobs, -1_000, "2025-02-01")),
        Err(LedgerError::NotFound(_))
    ));
    assert_eq!(
        compute_balance(&conn, "ana", d("2025-12-31"), None, true).unwrap(),
        1_000_000
    );
    let rows = ledger::list(&conn, "ana", &TxFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].account, "Checking");
}

#[test]
fn system_rows_resist_direct_edits() {
    let (conn, account) = setup();
    // the INITIAL_BALANCE row from account creation
    let id: i64 = conn
        .query_row(
            "SELECT id FROM transactions WHERE account_id=?1",
            [account],
            |r| r.get(0),
        )
        .unwrap();
    let err = ledger::edit(
        &conn,
        "ana",
        id,
        &TxPatch {
            amount: Some(2_000_000),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::StructuralProtection(t) if t == "INITIAL_BALANCE"));
    assert!(matches!(
        ledger::delete(&conn, "ana", id),
        Err(LedgerError::StructuralProtection(_))
    ));
}

#[test]
fn bulk_create_rolls_back_on_any_failure() {
    let (mut conn, account) = setup();
    let err = ledger::bulk_create(
        &mut conn,
        "ana",
        &[
            tx(account, -10_000, "2025-02-01"),
            tx(9999, -10_000, "2025-02-01"), // unknown account
        ],
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE type='USER_CREATED'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn bulk_delete_skips_protected_and_foreign_rows() {
    let (mut conn, account) = setup();
    let mine = ledger::create(&conn, "ana", &tx(account, -10_000, "2025-02-01")).unwrap();
    let initial: i64 = conn
        .query_row(
            "SELECT id FROM transactions WHERE type='INITIAL_BALANCE'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    let removed = ledger::bulk_delete(&mut conn, "ana", &[mine, initial, 424242]).unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn list_filters_compose() {
    let (conn, account) = setup();
    conn.execute(
        "INSERT INTO categories(owner, name) VALUES ('ana', 'Groceries')",
        [],
    )
    .unwrap();
    let groceries = conn.last_insert_rowid();
    for day in ["2025-02-01", "2025-02-15", "2025-03-01"] {
        ledger::create(
            &conn,
            "ana",
            &NewTransaction {
                category_id: Some(groceries),
                ..tx(account, -5_000, day)
            },
        )
        .unwrap();
    }
    let rows = ledger::list(
        &conn,
        "ana",
        &TxFilter {
            category_id: Some(groceries),
            from: Some(d("2025-02-01")),
            to: Some(d("2025-02-28")),
            limit: Some(1),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2025-02-15"); // newest first
}
