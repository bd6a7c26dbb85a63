// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::balance::compute_balance;
use crate::error::{LedgerError, Result};
use crate::ledger::insert_system_tx;
use crate::models::{Account, AccountType, BillingConfig, Milli, TxType};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub hidden: bool,
    pub opening_balance: Option<Milli>,
    pub opening_date: NaiveDate,
    pub billing: Option<BillingConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub hidden: Option<bool>,
    pub billing: Option<BillingConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub hidden: bool,
    pub balance: Milli,
}

fn check_billing(account_type: AccountType, billing: Option<&BillingConfig>) -> Result<()> {
    match account_type {
        AccountType::CreditCard => billing
            .ok_or_else(|| {
                LedgerError::validation(
                    "closeDay: credit card needs a statement close day or the month-end flag",
                )
            })?
            .validate(),
        _ => {
            if billing.is_some() {
                return Err(LedgerError::validation(
                    "closeDay: billing configuration only applies to credit cards",
                ));
            }
            Ok(())
        }
    }
}

/// Create an account; an opening balance becomes one INITIAL_BALANCE ledger
/// row so that balances stay pure sums over the transaction log.
pub fn create(conn: &mut Connection, owner: &str, input: &NewAccount) -> Result<i64> {
    check_billing(input.account_type, input.billing.as_ref())?;
    let billing = input.billing.clone().unwrap_or_default();

    let dbtx = conn.transaction()?;
    let inserted = dbtx.execute(
        "INSERT INTO accounts(owner, name, type, hidden, close_day, close_at_month_end,
                              due_day, due_days, min_payment_pct, credit_limit, apr)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            owner,
            input.name,
            input.account_type.as_str(),
            input.hidden,
            billing.close_day,
            billing.close_at_month_end,
            billing.due_day,
            billing.due_days,
            billing.min_payment_pct,
            billing.credit_limit,
            billing.apr,
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(e) if LedgerError::is_unique_violation(&e) => {
            return Err(LedgerError::Conflict(format!(
                "Account '{}' already exists",
                input.name
            )));
        }
        Err(e) => return Err(e.into()),
    }
    let account_id = dbtx.last_insert_rowid();
    if let Some(opening) = input.opening_balance {
        if opening != 0 {
            insert_system_tx(
                &dbtx,
                account_id,
                opening,
                TxType::InitialBalance,
                input.opening_date,
                None,
            )?;
        }
    }
    dbtx.commit()?;
    Ok(account_id)
}

pub fn get(conn: &Connection, owner: &str, account_id: i64) -> Result<Account> {
    let row = conn
        .query_row(
            "SELECT id, owner, name, type, hidden, deleted, close_day, close_at_month_end,
                    due_day, due_days, min_payment_pct, credit_limit, apr
             FROM accounts WHERE id=?1 AND owner=?2 AND deleted=0",
            params![account_id, owner],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, bool>(4)?,
                    r.get::<_, bool>(5)?,
                    r.get::<_, Option<u32>>(6)?,
                    r.get::<_, bool>(7)?,
                    r.get::<_, Option<u32>>(8)?,
                    r.get::<_, Option<i64>>(9)?,
                    r.get::<_, Option<i64>>(10)?,
                    r.get::<_, Option<i64>>(11)?,
                    r.get::<_, Option<i64>>(12)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, name, typ, hidden, deleted, close_day, close_at_month_end, due_day,
              due_days, min_payment_pct, credit_limit, apr)) = row
    else {
        return Err(LedgerError::not_found(format!("Account {}", account_id)));
    };
    let account_type = AccountType::parse(&typ)?;
    let billing = match account_type {
        AccountType::CreditCard => Some(BillingConfig {
            close_day,
            close_at_month_end,
            due_day,
            due_days,
            min_payment_pct,
            credit_limit,
            apr,
        }),
        _ => None,
    };
    Ok(Account {
        id,
        owner,
        name,
        account_type,
        hidden,
        deleted,
        billing,
    })
}

pub fn update(conn: &Connection, owner: &str, account_id: i64, patch: &AccountPatch) -> Result<()> {
    let existing = get(conn, owner, account_id)?;
    if let Some(billing) = &patch.billing {
        check_billing(existing.account_type, Some(billing))?;
        conn.execute(
            "UPDATE accounts SET close_day=?2, close_at_month_end=?3, due_day=?4, due_days=?5,
                    min_payment_pct=?6, credit_limit=?7, apr=?8
             WHERE id=?1",
            params![
                account_id,
                billing.close_day,
                billing.close_at_month_end,
                billing.due_day,
                billing.due_days,
                billing.min_payment_pct,
                billing.credit_limit,
                billing.apr,
            ],
        )?;
    }
    conn.execute(
        "UPDATE accounts SET name = COALESCE(?2, name), hidden = COALESCE(?3, hidden) WHERE id=?1",
        params![account_id, patch.name, patch.hidden],
    )?;
    Ok(())
}

/// Soft delete: the account and its history stay in the store but drop out
/// of every balance and listing.
pub fn delete(conn: &Connection, owner: &str, account_id: i64) -> Result<()> {
    let removed = conn.execute(
        "UPDATE accounts SET deleted=1 WHERE id=?1 AND owner=?2 AND deleted=0",
        params![account_id, owner],
    )?;
    if removed == 0 {
        return Err(LedgerError::not_found(format!("Account {}", account_id)));
    }
    Ok(())
}

pub fn bulk_delete(conn: &Connection, owner: &str, ids: &[i64]) -> Result<usize> {
    let mut removed = 0;
    for &id in ids {
        removed += conn.execute(
            "UPDATE accounts SET deleted=1 WHERE id=?1 AND owner=?2 AND deleted=0",
            params![id, owner],
        )?;
    }
    Ok(removed)
}

pub fn list(
    conn: &Connection,
    owner: &str,
    as_of: NaiveDate,
    include_hidden: bool,
) -> Result<Vec<AccountRow>> {
    let mut sql = String::from(
        "SELECT id, name, type, hidden FROM accounts WHERE owner=?1 AND deleted=0",
    );
    if !include_hidden {
        sql.push_str(" AND hidden=0");
    }
    sql.push_str(" ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![owner])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        data.push(AccountRow {
            id,
            name: r.get(1)?,
            account_type: r.get(2)?,
            hidden: r.get(3)?,
            balance: compute_balance(conn, owner, as_of, Some(id), true)?,
        });
    }
    Ok(data)
}
