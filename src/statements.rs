// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::balance::{compute_balance, owed};
use crate::error::{LedgerError, Result};
use crate::models::{BillingConfig, Milli, Statement};
use crate::utils::{clamped_date, days_in_month, div_ceil, div_round, shift_month};

/// Load and validate the billing configuration of a CREDIT_CARD account.
pub fn billing_config(conn: &Connection, owner: &str, account_id: i64) -> Result<BillingConfig> {
    let row: Option<(String, Option<u32>, bool, Option<u32>, Option<i64>, Option<i64>, Option<i64>, Option<i64>)> =
        conn.query_row(
            "SELECT type, close_day, close_at_month_end, due_day, due_days,
                    min_payment_pct, credit_limit, apr
             FROM accounts WHERE id=?1 AND owner=?2 AND deleted=0",
            params![account_id, owner],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                ))
            },
        )
        .optional()?;
    let (typ, close_day, close_at_month_end, due_day, due_days, min_payment_pct, credit_limit, apr) =
        row.ok_or_else(|| LedgerError::not_found(format!("Account {}", account_id)))?;
    if typ != "CREDIT_CARD" {
        return Err(LedgerError::validation(
            "accountId: statements only exist for credit card accounts",
        ));
    }
    let cfg = BillingConfig {
        close_day,
        close_at_month_end,
        due_day,
        due_days,
        min_payment_pct,
        credit_limit,
        apr,
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Statement close date within the given month: last calendar day under the
/// month-end flag, else the configured day clamped to the month's length.
pub fn close_date_for_month(year: i32, month: u32, cfg: &BillingConfig) -> NaiveDate {
    if cfg.close_at_month_end {
        clamped_date(year, month, days_in_month(year, month))
    } else {
        clamped_date(year, month, cfg.close_day.unwrap_or(1))
    }
}

pub fn most_recent_close_date(today: NaiveDate, cfg: &BillingConfig) -> NaiveDate {
    let this_month = close_date_for_month(today.year(), today.month(), cfg);
    if this_month <= today {
        this_month
    } else {
        let (y, m) = shift_month(today.year(), today.month(), -1);
        close_date_for_month(y, m, cfg)
    }
}

pub fn previous_close_date(statement_date: NaiveDate, cfg: &BillingConfig) -> NaiveDate {
    most_recent_close_date(statement_date - Days::new(1), cfg)
}

/// Due date for a statement: fixed offset when daysAfterClose is set, else
/// the next occurrence of the configured due day strictly after the close,
/// else close + 15 days.
pub fn payment_due_date(statement_date: NaiveDate, cfg: &BillingConfig) -> NaiveDate {
    if let Some(days) = cfg.due_days {
        return statement_date + Days::new(days.max(0) as u64);
    }
    if let Some(day) = cfg.due_day {
        let same_month = clamped_date(statement_date.year(), statement_date.month(), day);
        if same_month > statement_date {
            return same_month;
        }
        let (y, m) = shift_month(statement_date.year(), statement_date.month(), 1);
        return clamped_date(y, m, day);
    }
    statement_date + Days::new(15)
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementPreview {
    pub account_id: i64,
    pub period_start: NaiveDate,
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,
    pub statement_balance: Milli,
    pub minimum_payment: Milli,
    pub already_closed: bool,
}

pub fn preview(
    conn: &Connection,
    owner: &str,
    account_id: i64,
    today: NaiveDate,
) -> Result<StatementPreview> {
    let cfg = billing_config(conn, owner, account_id)?;
    let statement_date = most_recent_close_date(today, &cfg);
    let period_start = previous_close_date(statement_date, &cfg) + Days::new(1);
    let due_date = payment_due_date(statement_date, &cfg);

    let already_closed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM statements WHERE account_id=?1 AND statement_date=?2)",
        params![account_id, statement_date.to_string()],
        |r| r.get(0),
    )?;

    let balance = compute_balance(conn, owner, statement_date, Some(account_id), true)?;
    let statement_balance = owed(balance);
    let minimum_payment = match cfg.min_payment_pct {
        Some(pct) => statement_balance
            .min(div_ceil(statement_balance as i128 * pct as i128, 100_000)),
        None => 0,
    };

    Ok(StatementPreview {
        account_id,
        period_start,
        statement_date,
        due_date,
        statement_balance,
        minimum_payment,
        already_closed,
    })
}

/// Close the current billing period. The uniqueness constraint on
/// (account_id, statement_date) is the authoritative idempotency check; the
/// preview's already_closed read only exists for a friendlier early error.
pub fn close(
    conn: &mut Connection,
    owner: &str,
    account_id: i64,
    today: NaiveDate,
    override_due: Option<Milli>,
) -> Result<i64> {
    let p = preview(conn, owner, account_id, today)?;
    if p.already_closed {
        return Err(LedgerError::Conflict(format!(
            "Statement already closed for {}",
            p.statement_date
        )));
    }
    let due_amount = match override_due {
        Some(v) => {
            if v < p.minimum_payment {
                return Err(LedgerError::validation(
                    "paymentDueAmount: cannot be below the minimum payment",
                ));
            }
            v
        }
        None => p.statement_balance,
    };

    let inserted = conn.execute(
        "INSERT INTO statements(account_id, period_start, statement_date, due_date,
                                statement_balance, payment_due_amount, is_overridden,
                                minimum_payment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account_id,
            p.period_start.to_string(),
            p.statement_date.to_string(),
            p.due_date.to_string(),
            p.statement_balance,
            due_amount,
            override_due.is_some(),
            p.minimum_payment,
        ],
    );
    match inserted {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if LedgerError::is_unique_violation(&e) => Err(LedgerError::Conflict(format!(
            "Statement already closed for {}",
            p.statement_date
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn get(conn: &Connection, owner: &str, statement_id: i64) -> Result<Statement> {
    let row = conn
        .query_row(
            "SELECT s.id, s.account_id, s.period_start, s.statement_date, s.due_date,
                    s.statement_balance, s.payment_due_amount, s.is_overridden,
                    s.minimum_payment, s.paid_amount, s.is_paid, s.paid_at
             FROM statements s JOIN accounts a ON s.account_id = a.id
             WHERE s.id=?1 AND a.owner=?2",
            params![statement_id, owner],
            |r| {
                Ok(Statement {
                    id: r.get(0)?,
                    account_id: r.get(1)?,
                    period_start: r.get(2)?,
                    statement_date: r.get(3)?,
                    due_date: r.get(4)?,
                    statement_balance: r.get(5)?,
                    payment_due_amount: r.get(6)?,
                    is_overridden: r.get(7)?,
                    minimum_payment: r.get(8)?,
                    paid_amount: r.get(9)?,
                    is_paid: r.get(10)?,
                    paid_at: r.get(11)?,
                })
            },
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::not_found(format!("Statement {}", statement_id)))
}

/// Override the amount due on an existing statement. Bounded below by the
/// minimum payment recorded when the statement closed.
pub fn edit(conn: &Connection, owner: &str, statement_id: i64, new_due: Milli) -> Result<()> {
    let existing = get(conn, owner, statement_id)?;
    if new_due < existing.minimum_payment {
        return Err(LedgerError::validation(
            "paymentDueAmount: cannot be below the minimum payment",
        ));
    }
    conn.execute(
        "UPDATE statements SET payment_due_amount=?2, is_overridden=1 WHERE id=?1",
        params![statement_id, new_due],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
    pub account_id: Option<i64>,
    pub paid: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementRow {
    pub id: i64,
    pub account: String,
    pub period_start: String,
    pub statement_date: String,
    pub due_date: String,
    pub statement_balance: Milli,
    pub payment_due_amount: Milli,
    pub minimum_payment: Milli,
    pub is_overridden: bool,
    pub is_paid: bool,
    pub paid_amount: Milli,
}

pub fn list(conn: &Connection, owner: &str, filter: &StatementFilter) -> Result<Vec<StatementRow>> {
    let mut sql = String::from(
        "SELECT s.id, a.name, s.period_start, s.statement_date, s.due_date,
                s.statement_balance, s.payment_due_amount, s.minimum_payment,
                s.is_overridden, s.is_paid, s.paid_amount
         FROM statements s JOIN accounts a ON s.account_id = a.id
         WHERE a.owner = ?1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
    if let Some(acct) = filter.account_id {
        params_vec.push(Box::new(acct));
        sql.push_str(&format!(" AND s.account_id = ?{}", params_vec.len()));
    }
    if let Some(paid) = filter.paid {
        params_vec.push(Box::new(paid));
        sql.push_str(&format!(" AND s.is_paid = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY s.statement_date DESC, s.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(
        params_vec.iter().map(|p| p.as_ref()),
    ))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(StatementRow {
            id: r.get(0)?,
            account: r.get(1)?,
            period_start: r.get(2)?,
            statement_date: r.get(3)?,
            due_date: r.get(4)?,
            statement_balance: r.get(5)?,
            payment_due_amount: r.get(6)?,
            minimum_payment: r.get(7)?,
            is_overridden: r.get(8)?,
            is_paid: r.get(9)?,
            paid_amount: r.get(10)?,
        })
    }
    Ok(data)
}

#[derive(Debug, Clone, Serialize)]
pub struct NextStatement {
    pub statement: StatementRow,
    pub days_until_due: i64,
    /// Simple non-compounding one-month interest estimate on the amount due.
    pub monthly_interest_estimate: Milli,
}

pub fn next_statement(
    conn: &Connection,
    owner: &str,
    today: NaiveDate,
) -> Result<Option<NextStatement>> {
    let unpaid = list(
        conn,
        owner,
        &StatementFilter {
            paid: Some(false),
            ..Default::default()
        },
    )?;
    let Some(statement) = unpaid.into_iter().min_by_key(|s| s.due_date.clone()) else {
        return Ok(None);
    };
    let due: NaiveDate = statement
        .due_date
        .parse()
        .map_err(|_| LedgerError::validation("dueDate: bad stored date"))?;
    let apr: Option<i64> = conn.query_row(
        "SELECT apr FROM accounts WHERE id=(SELECT account_id FROM statements WHERE id=?1)",
        params![statement.id],
        |r| r.get(0),
    )?;
    let interest = match apr {
        Some(apr) => div_round(
            statement.payment_due_amount as i128 * apr as i128,
            1_200_000,
        )
        .max(0),
        None => 0,
    };
    Ok(Some(NextStatement {
        days_until_due: (due - today).num_days(),
        monthly_interest_estimate: interest,
        statement,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct CardSummary {
    pub account_id: i64,
    pub account: String,
    pub current_owed: Milli,
    pub credit_limit: Option<Milli>,
    pub available_credit: Option<Milli>,
}

/// Per-card headline view: current owed from the ledger, remaining credit
/// against the configured limit.
pub fn card_summaries(conn: &Connection, owner: &str, today: NaiveDate) -> Result<Vec<CardSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, credit_limit FROM accounts
         WHERE owner=?1 AND type='CREDIT_CARD' AND deleted=0 ORDER BY name",
    )?;
    let mut rows = stmt.query(params![owner])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let account_id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let credit_limit: Option<i64> = r.get(2)?;
        let current_owed = owed(compute_balance(conn, owner, today, Some(account_id), true)?);
        data.push(CardSummary {
            account_id,
            account: name,
            current_owed,
            credit_limit,
            available_credit: credit_limit.map(|l| l - current_owed),
        });
    }
    Ok(data)
}
