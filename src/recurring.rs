// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::ledger::{NewTransaction, require_account};
use crate::models::{Cadence, Milli, RecurringKind, RecurringPayment};
use crate::transfers::NewTransfer;
use crate::utils::{clamped_date, shift_month};

#[derive(Debug, Clone)]
pub struct NewRecurring {
    pub kind: RecurringKind,
    pub cadence: Cadence,
    pub amount: Milli,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: NaiveDate,
    pub day_of_month: Option<u32>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RecurringPatch {
    pub amount: Option<Milli>,
    pub cadence: Option<Cadence>,
    pub day_of_month: Option<u32>,
    pub month: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringRow {
    pub id: i64,
    pub kind: String,
    pub cadence: String,
    pub amount: Milli,
    pub account: Option<String>,
    pub to_account: Option<String>,
    pub next_due: NaiveDate,
    pub days_remaining: i64,
    pub last_completed_at: Option<NaiveDate>,
    pub is_active: bool,
}

fn validate(input: &NewRecurring) -> Result<()> {
    if input.amount == 0 {
        return Err(LedgerError::validation("amount: must not be zero"));
    }
    match input.kind {
        RecurringKind::Transaction => {
            if input.account_id.is_none() {
                return Err(LedgerError::validation(
                    "accountId: required for a recurring transaction",
                ));
            }
        }
        RecurringKind::Transfer => {
            if input.account_id.is_none() && input.to_account_id.is_none() {
                return Err(LedgerError::validation(
                    "accountId: recurring transfer needs at least one side",
                ));
            }
        }
    }
    if let Some(d) = input.day_of_month {
        if !(1..=31).contains(&d) {
            return Err(LedgerError::validation("dayOfMonth: must be between 1 and 31"));
        }
    }
    if let Some(m) = input.month {
        if !(1..=12).contains(&m) {
            return Err(LedgerError::validation("month: must be between 1 and 12"));
        }
    }
    Ok(())
}

pub fn create(conn: &Connection, owner: &str, input: &NewRecurring) -> Result<i64> {
    validate(input)?;
    for acct in [input.account_id, input.to_account_id].into_iter().flatten() {
        require_account(conn, owner, acct)?;
    }
    conn.execute(
        "INSERT INTO recurring_payments(owner, type, cadence, amount, account_id, to_account_id,
                                        category_id, start_date, day_of_month, month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            owner,
            input.kind.as_str(),
            input.cadence.as_str(),
            input.amount,
            input.account_id,
            input.to_account_id,
            input.category_id,
            input.start_date.to_string(),
            input.day_of_month,
            input.month,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> Result<RecurringPayment> {
    let row = conn
        .query_row(
            "SELECT id, owner, type, cadence, amount, account_id, to_account_id, category_id,
                    start_date, day_of_month, month, last_completed_at, is_active
             FROM recurring_payments WHERE id=?1 AND owner=?2",
            params![id, owner],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, i64>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, Option<i64>>(6)?,
                    r.get::<_, Option<i64>>(7)?,
                    r.get::<_, NaiveDate>(8)?,
                    r.get::<_, Option<u32>>(9)?,
                    r.get::<_, Option<u32>>(10)?,
                    r.get::<_, Option<NaiveDate>>(11)?,
                    r.get::<_, bool>(12)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, kind, cadence, amount, account_id, to_account_id, category_id,
              start_date, day_of_month, month, last_completed_at, is_active)) = row
    else {
        return Err(LedgerError::not_found(format!("Recurring payment {}", id)));
    };
    Ok(RecurringPayment {
        id,
        owner,
        kind: RecurringKind::parse(&kind)?,
        cadence: Cadence::parse(&cadence)?,
        amount,
        account_id,
        to_account_id,
        category_id,
        start_date,
        day_of_month,
        month,
        last_completed_at,
        is_active,
    })
}

/// Next due date for a cadence rule. Deterministic in (item, today): the
/// seed is the last completion (or the start date if never completed), one
/// cadence step is applied if already completed once, then the date is
/// advanced step by step until it is not in the past. Day-of-month always
/// clamps to the target month, so a day-31 rule lands on Feb 28/29 and
/// never rolls over into March.
pub fn next_due_date(item: &RecurringPayment, today: NaiveDate) -> NaiveDate {
    let completed = item.last_completed_at.is_some();
    let seed = item.last_completed_at.unwrap_or(item.start_date);
    let target_day = item.day_of_month.unwrap_or(seed.day());
    let target_month = item.month.unwrap_or(seed.month());

    let mut due = match item.cadence {
        Cadence::Daily => {
            if completed {
                seed + Days::new(1)
            } else {
                seed
            }
        }
        Cadence::Monthly => {
            let (y, m) = if completed {
                shift_month(seed.year(), seed.month(), 1)
            } else {
                (seed.year(), seed.month())
            };
            clamped_date(y, m, target_day)
        }
        Cadence::Yearly => {
            let y = if completed { seed.year() + 1 } else { seed.year() };
            clamped_date(y, target_month, target_day)
        }
    };
    while due < today {
        due = match item.cadence {
            Cadence::Daily => due + Days::new(1),
            Cadence::Monthly => {
                let (y, m) = shift_month(due.year(), due.month(), 1);
                clamped_date(y, m, target_day)
            }
            Cadence::Yearly => clamped_date(due.year() + 1, target_month, target_day),
        };
    }
    due
}

pub fn days_remaining(item: &RecurringPayment, today: NaiveDate) -> i64 {
    (next_due_date(item, today) - today).num_days()
}

/// Pre-filled ledger write for one occurrence. This is the propose half of
/// the two-phase completion: the caller performs the actual ledger write
/// (transaction or transfer) and only then stamps completion.
#[derive(Debug, Clone)]
pub enum RecurringTemplate {
    Transaction(NewTransaction),
    Transfer(NewTransfer),
}

pub fn template(item: &RecurringPayment, today: NaiveDate) -> Result<RecurringTemplate> {
    let date = next_due_date(item, today);
    match item.kind {
        RecurringKind::Transaction => {
            let account_id = item.account_id.ok_or_else(|| {
                LedgerError::validation("accountId: recurring transaction has no account")
            })?;
            Ok(RecurringTemplate::Transaction(NewTransaction {
                account_id,
                amount: item.amount,
                date,
                category_id: item.category_id,
            }))
        }
        RecurringKind::Transfer => Ok(RecurringTemplate::Transfer(NewTransfer {
            amount: item.amount.abs(),
            charge: 0,
            from_account_id: item.account_id,
            to_account_id: item.to_account_id,
            date,
            notes: None,
            statement_id: None,
        })),
    }
}

/// Commit half of the two-phase completion: stamps last_completed_at and
/// nothing else. Never writes the ledger, never auto-executes.
pub fn complete(conn: &Connection, owner: &str, id: i64, completed_at: NaiveDate) -> Result<()> {
    let updated = conn.execute(
        "UPDATE recurring_payments SET last_completed_at=?3 WHERE id=?1 AND owner=?2",
        params![id, owner, completed_at.to_string()],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found(format!("Recurring payment {}", id)));
    }
    Ok(())
}

pub fn edit(conn: &Connection, owner: &str, id: i64, patch: &RecurringPatch) -> Result<()> {
    get(conn, owner, id)?;
    if let Some(d) = patch.day_of_month {
        if !(1..=31).contains(&d) {
            return Err(LedgerError::validation("dayOfMonth: must be between 1 and 31"));
        }
    }
    if let Some(m) = patch.month {
        if !(1..=12).contains(&m) {
            return Err(LedgerError::validation("month: must be between 1 and 12"));
        }
    }
    conn.execute(
        "UPDATE recurring_payments SET
            amount = COALESCE(?2, amount),
            cadence = COALESCE(?3, cadence),
            day_of_month = COALESCE(?4, day_of_month),
            month = COALESCE(?5, month),
            is_active = COALESCE(?6, is_active)
         WHERE id = ?1",
        params![
            id,
            patch.amount,
            patch.cadence.map(|c| c.as_str()),
            patch.day_of_month,
            patch.month,
            patch.is_active,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, owner: &str, id: i64) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM recurring_payments WHERE id=?1 AND owner=?2",
        params![id, owner],
    )?;
    if removed == 0 {
        return Err(LedgerError::not_found(format!("Recurring payment {}", id)));
    }
    Ok(())
}

pub fn list(
    conn: &Connection,
    owner: &str,
    today: NaiveDate,
    active_only: bool,
) -> Result<Vec<RecurringRow>> {
    let mut sql = String::from(
        "SELECT r.id, fa.name, ta.name FROM recurring_payments r
         LEFT JOIN accounts fa ON r.account_id = fa.id
         LEFT JOIN accounts ta ON r.to_account_id = ta.id
         WHERE r.owner = ?1",
    );
    if active_only {
        sql.push_str(" AND r.is_active = 1");
    }
    sql.push_str(" ORDER BY r.id");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![owner])?;
    let mut ids = Vec::new();
    while let Some(r) = rows.next()? {
        ids.push((
            r.get::<_, i64>(0)?,
            r.get::<_, Option<String>>(1)?,
            r.get::<_, Option<String>>(2)?,
        ));
    }
    drop(rows);
    drop(stmt);

    let mut data = Vec::with_capacity(ids.len());
    for (id, account, to_account) in ids {
        let item = get(conn, owner, id)?;
        let next_due = next_due_date(&item, today);
        data.push(RecurringRow {
            id,
            kind: item.kind.as_str().to_string(),
            cadence: item.cadence.as_str().to_string(),
            amount: item.amount,
            account,
            to_account,
            next_due,
            days_remaining: (next_due - today).num_days(),
            last_completed_at: item.last_completed_at,
            is_active: item.is_active,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn item(cadence: Cadence) -> RecurringPayment {
        RecurringPayment {
            id: 1,
            owner: "ana".into(),
            kind: RecurringKind::Transaction,
            cadence,
            amount: -5_000,
            account_id: Some(1),
            to_account_id: None,
            category_id: None,
            start_date: d("2025-01-31"),
            day_of_month: None,
            month: None,
            last_completed_at: None,
            is_active: true,
        }
    }

    #[test]
    fn monthly_day31_clamps_to_february() {
        let mut it = item(Cadence::Monthly);
        it.day_of_month = Some(31);
        it.last_completed_at = Some(d("2025-01-31"));
        assert_eq!(next_due_date(&it, d("2025-02-10")), d("2025-02-28"));
        // leap year
        let mut it = item(Cadence::Monthly);
        it.day_of_month = Some(31);
        it.start_date = d("2024-01-31");
        it.last_completed_at = Some(d("2024-01-31"));
        assert_eq!(next_due_date(&it, d("2024-02-10")), d("2024-02-29"));
    }

    #[test]
    fn never_completed_uses_start_date() {
        let it = item(Cadence::Daily);
        assert_eq!(next_due_date(&it, d("2025-01-20")), d("2025-01-31"));
        let it = item(Cadence::Monthly);
        assert_eq!(next_due_date(&it, d("2025-01-20")), d("2025-01-31"));
    }

    #[test]
    fn daily_advances_one_day_after_completion() {
        let mut it = item(Cadence::Daily);
        it.last_completed_at = Some(d("2025-02-01"));
        assert_eq!(next_due_date(&it, d("2025-02-01")), d("2025-02-02"));
    }

    #[test]
    fn overdue_items_catch_up_to_today() {
        let mut it = item(Cadence::Daily);
        it.last_completed_at = Some(d("2025-01-01"));
        assert_eq!(next_due_date(&it, d("2025-03-15")), d("2025-03-15"));

        let mut it = item(Cadence::Monthly);
        it.day_of_month = Some(31);
        it.last_completed_at = Some(d("2025-01-31"));
        // catches up through Feb 28, Mar 31, lands on Apr 30
        assert_eq!(next_due_date(&it, d("2025-04-05")), d("2025-04-30"));
    }

    #[test]
    fn yearly_uses_configured_month_and_clamps() {
        let mut it = item(Cadence::Yearly);
        it.start_date = d("2024-02-29");
        it.month = Some(2);
        it.day_of_month = Some(29);
        it.last_completed_at = Some(d("2024-02-29"));
        assert_eq!(next_due_date(&it, d("2024-03-01")), d("2025-02-28"));
    }

    #[test]
    fn same_input_same_output() {
        let mut it = item(Cadence::Monthly);
        it.day_of_month = Some(15);
        it.last_completed_at = Some(d("2025-03-15"));
        let a = next_due_date(&it, d("2025-03-20"));
        let b = next_due_date(&it, d("2025-03-20"));
        assert_eq!(a, b);
        assert_eq!(a, d("2025-04-15"));
    }

    #[test]
    fn days_remaining_counts_calendar_days() {
        let mut it = item(Cadence::Monthly);
        it.day_of_month = Some(15);
        // Jan 15 is already past, so the rule lands on Feb 15
        assert_eq!(days_remaining(&it, d("2025-01-20")), 26);
    }

    mod store {
        use super::*;

        fn setup() -> Connection {
            let mut conn = Connection::open_in_memory().unwrap();
            crate::db::init_schema(&mut conn).unwrap();
            conn.execute(
                "INSERT INTO accounts(id, owner, name, type) VALUES
                 (1, 'ana', 'Checking', 'BANK'),
                 (2, 'ana', 'Savings', 'BANK')",
                [],
            )
            .unwrap();
            conn
        }

        fn new_monthly() -> NewRecurring {
            NewRecurring {
                kind: RecurringKind::Transaction,
                cadence: Cadence::Monthly,
                amount: -12_000,
                account_id: Some(1),
                to_account_id: None,
                category_id: None,
                start_date: d("2025-01-05"),
                day_of_month: Some(5),
                month: None,
            }
        }

        #[test]
        fn complete_stamps_only_the_completion_date() {
            let conn = setup();
            let id = create(&conn, "ana", &new_monthly()).unwrap();
            complete(&conn, "ana", id, d("2025-02-05")).unwrap();
            let it = get(&conn, "ana", id).unwrap();
            assert_eq!(it.last_completed_at, Some(d("2025-02-05")));
            // no ledger row was written by complete
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }

        #[test]
        fn complete_is_owner_scoped() {
            let conn = setup();
            let id = create(&conn, "ana", &new_monthly()).unwrap();
            let err = complete(&conn, "bob", id, d("2025-02-05")).unwrap_err();
            assert!(matches!(err, LedgerError::NotFound(_)));
        }

        #[test]
        fn template_prefills_the_ledger_write() {
            let conn = setup();
            let id = create(&conn, "ana", &new_monthly()).unwrap();
            let it = get(&conn, "ana", id).unwrap();
            match template(&it, d("2025-01-20")).unwrap() {
                RecurringTemplate::Transaction(tx) => {
                    assert_eq!(tx.account_id, 1);
                    assert_eq!(tx.amount, -12_000);
                    assert_eq!(tx.date, d("2025-02-05"));
                }
                RecurringTemplate::Transfer(_) => panic!("expected transaction template"),
            }
        }

        #[test]
        fn transfer_kind_requires_a_side() {
            let conn = setup();
            let err = create(
                &conn,
                "ana",
                &NewRecurring {
                    kind: RecurringKind::Transfer,
                    account_id: None,
                    ..new_monthly()
                },
            )
            .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }

        #[test]
        fn edit_toggles_active_flag() {
            let conn = setup();
            let id = create(&conn, "ana", &new_monthly()).unwrap();
            edit(
                &conn,
                "ana",
                id,
                &RecurringPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
            let rows = list(&conn, "ana", d("2025-01-20"), true).unwrap();
            assert!(rows.is_empty());
            let rows = list(&conn, "ana", d("2025-01-20"), false).unwrap();
            assert_eq!(rows.len(), 1);
            assert!(!rows[0].is_active);
        }
    }
}
