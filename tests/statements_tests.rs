// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use tallybook::accounts::{self, NewAccount};
use tallybook::db;
use tallybook::error::LedgerError;
use tallybook::ledger::{self, NewTransaction};
use tallybook::models::{AccountType, BillingConfig};
use tallybook::statements::{self, StatementFilter};
use tallybook::transfers::{self, NewTransfer};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

// Card closes on the 25th, payment due 20 days later, 5% minimum.
fn setup() -> (Connection, i64, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let card = accounts::create(
        &mut conn,
        "ana",
        &NewAccount {
            name: "Visa".into(),
            account_type: AccountType::CreditCard,
            hidden: false,
            opening_balance: None,
            opening_date: d("2025-01-01"),
            billing: Some(BillingConfig {
                close_day: Some(25),
                due_days: Some(20),
                min_payment_pct: Some(5_000),
                credit_limit: Some(500_000),
                apr: Some(24_000),
                ..Default::default()
            }),
        },
    )
    .unwrap();
    let checking = accounts::create(
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
    (conn, card, checking)
}

fn spend(conn: &Connection, card: i64, amount: i64, date: &str) {
    ledger::create(
        conn,
        "ana",
        &NewTransaction {
            account_id: card,
            amount,
            date: d(date),
            category_id: None,
        },
    )
    .unwrap();
}

#[test]
fn close_snapshots_owed_and_minimum() {
    let (mut conn, card, _) = setup();
    spend(&conn, card, -100_000, "2025-05-10");
    let id = statements::close(&mut conn, "ana", card, d("2025-05-28"), None).unwrap();

    let s = statements::get(&conn, "ana", id).unwrap();
    assert_eq!(s.statement_date, d("2025-05-25"));
    assert_eq!(s.period_start, d("2025-04-26"));
    assert_eq!(s.due_date, d("2025-06-14"));
    assert_eq!(s.statement_balance, 100_000);
    assert_eq!(s.payment_due_amount, 100_000);
    assert_eq!(s.minimum_payment, 5_000); // 5% rounded up
    assert!(!s.is_overridden);
}

#[test]
fn closing_the_same_cycle_twice_conflicts() {
    let (mut conn, card, _) = setup();
    spend(&conn, card, -50_000, "2025-05-10");
    statements::close(&mut conn, "ana", card, d("2025-05-28"), None).unwrap();
    let err = statements::close(&mut conn, "ana", card, d("2025-05-30"), None).unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[test]
fn override_below_minimum_is_rejected() {
    let (mut conn, card, _) = setup();
    spend(&conn, card, -100_000, "2025-05-10");
    let err =
        statements::close(&mut conn, "ana", card, d("2025-05-28"), Some(4_000)).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let id = statements::close(&mut conn, "ana", card, d("2025-05-28"), Some(30_000)).unwrap();
    let s = statements::get(&conn, "ana", id).unwrap();
    assert_eq!(s.payment_due_amount, 30_000);
    assert!(s.is_overridden);
}

#[test]
fn paying_through_a_transfer_marks_the_statement() {
    let (mut conn, card, checking) = setup();
    spend(&conn, card, -100_000, "2025-05-10");
    let id = statements::close(&mut conn, "ana", card, d("2025-05-28"), None).unwrap();

    transfers::create(
        &mut conn,
        "ana",
        &NewTransfer {
            amount: 100_000,
            charge: 0,
            from_account_id: Some(checking),
            to_account_id: Some(card),
            date: d("2025-06-10"),
            notes: None,
            statement_id: Some(id),
        },
    )
    .unwrap();

    let s = statements::get(&conn, "ana", id).unwrap();
    assert!(s.is_paid);
    assert_eq!(s.paid_amount, 100_000);

    let unpaid = statements::list(
        &conn,
        "ana",
        &StatementFilter {
            paid: Some(false),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(unpaid.is_empty());
}

#[test]
fn next_statement_picks_earliest_unpaid_and_estimates_interest() {
    let (mut conn, card, _) = setup();
    spend(&conn, card, -100_000, "2025-05-10");
    statements::close(&mut conn, "ana", card, d("2025-05-28"), None).unwrap();
    spend(&conn, card, -40_000, "2025-06-05");
    statements::close(&mut conn, "ana", card, d("2025-06-26"), None).unwrap();

    let next = statements::next_statement(&conn, "ana", d("2025-06-01"))
        .unwrap()
        .unwrap();
    assert_eq!(next.statement.due_date, "2025-06-14");
    assert_eq!(next.days_until_due, 13);
    // 100_000 * 24% / 12
    assert_eq!(next.monthly_interest_estimate, 2_000);
}

#[test]
fn card_summaries_report_available_credit() {
    let (mut conn, card, _) = setup();
    spend(&conn, card, -120_000, "2025-05-10");
    let cards = statements::card_summaries(&conn, "ana", d("2025-05-31")).unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].current_owed, 120_000);
    assert_eq!(cards[0].available_credit, Some(380_000));
}
