// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::models::{Milli, TxType};

/// Input for a user-entered ledger row. System rows (transfers, asset legs)
/// are written by their owning aggregate, never through this struct.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub amount: Milli,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TxPatch {
    pub account_id: Option<i64>,
    pub amount: Option<Milli>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub clear_category: bool,
}

/// Explicit predicate object for ledger listing; each set field adds one
/// AND clause.
#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TxRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub amount: Milli,
    pub tx_type: String,
    pub category: Option<String>,
    pub transfer_id: Option<i64>,
}

/// Resolve an account to its type, scoped to the caller. Missing and
/// not-owned produce the same NotFound.
pub(crate) fn require_account(conn: &Connection, owner: &str, account_id: i64) -> Result<String> {
    let typ: Option<String> = conn
        .query_row(
            "SELECT type FROM accounts WHERE id=?1 AND owner=?2 AND deleted=0",
            params![account_id, owner],
            |r| r.get(0),
        )
        .optional()?;
    typ.ok_or_else(|| LedgerError::not_found(format!("Account {}", account_id)))
}

pub fn create(conn: &Connection, owner: &str, tx: &NewTransaction) -> Result<i64> {
    require_account(conn, owner, tx.account_id)?;
    conn.execute(
        "INSERT INTO transactions(account_id, amount, type, date, category_id)
         VALUES (?1, ?2, 'USER_CREATED', ?3, ?4)",
        params![tx.account_id, tx.amount, tx.date.to_string(), tx.category_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All-or-nothing batch insert of user rows.
pub fn bulk_create(conn: &mut Connection, owner: &str, txs: &[NewTransaction]) -> Result<Vec<i64>> {
    let dbtx = conn.transaction()?;
    let mut ids = Vec::with_capacity(txs.len());
    for tx in txs {
        ids.push(create(&dbtx, owner, tx)?);
    }
    dbtx.commit()?;
    Ok(ids)
}

struct OwnedTx {
    account_id: i64,
    tx_type: TxType,
}

fn load_owned(conn: &Connection, owner: &str, id: i64) -> Result<OwnedTx> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT t.account_id, t.type FROM transactions t
             JOIN accounts a ON t.account_id = a.id
             WHERE t.id=?1 AND a.owner=?2",
            params![id, owner],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let (account_id, typ) = row.ok_or_else(|| LedgerError::not_found(format!("Transaction {}", id)))?;
    Ok(OwnedTx {
        account_id,
        tx_type: TxType::parse(&typ)?,
    })
}

pub fn edit(conn: &Connection, owner: &str, id: i64, patch: &TxPatch) -> Result<()> {
    let existing = load_owned(conn, owner, id)?;
    if existing.tx_type != TxType::UserCreated {
        return Err(LedgerError::StructuralProtection(
            existing.tx_type.as_str().to_string(),
        ));
    }
    let account_id = match patch.account_id {
        Some(new_acct) => {
            require_account(conn, owner, new_acct)?;
            new_acct
        }
        None => existing.account_id,
    };
    conn.execute(
        "UPDATE transactions SET
            account_id = ?2,
            amount = COALESCE(?3, amount),
            date = COALESCE(?4, date),
            category_id = CASE WHEN ?6 THEN NULL ELSE COALESCE(?5, category_id) END
         WHERE id = ?1",
        params![
            id,
            account_id,
            patch.amount,
            patch.date.map(|d| d.to_string()),
            patch.category_id,
            patch.clear_category,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, owner: &str, id: i64) -> Result<()> {
    let existing = load_owned(conn, owner, id)?;
    if existing.tx_type != TxType::UserCreated {
        return Err(LedgerError::StructuralProtection(
            existing.tx_type.as_str().to_string(),
        ));
    }
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(())
}

/// Best-effort bulk delete: the set silently shrinks to USER_CREATED rows
/// owned by the caller. Returns how many rows went away.
pub fn bulk_delete(conn: &mut Connection, owner: &str, ids: &[i64]) -> Result<usize> {
    let dbtx = conn.transaction()?;
    let mut removed = 0;
    {
        let mut stmt = dbtx.prepare_cached(
            "DELETE FROM transactions WHERE id IN (
                SELECT t.id FROM transactions t
                JOIN accounts a ON t.account_id = a.id
                WHERE t.id=?1 AND a.owner=?2 AND t.type='USER_CREATED'
            )",
        )?;
        for id in ids {
            removed += stmt.execute(params![id, owner])?;
        }
    }
    dbtx.commit()?;
    Ok(removed)
}

pub fn list(conn: &Connection, owner: &str, filter: &TxFilter) -> Result<Vec<TxRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, a.name, t.amount, t.type, c.name, t.transfer_id
         FROM transactions t
         JOIN accounts a ON t.account_id = a.id
         LEFT JOIN categories c ON t.category_id = c.id
         WHERE a.owner = ?1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
    if let Some(acct) = filter.account_id {
        params_vec.push(Box::new(acct));
        sql.push_str(&format!(" AND t.account_id = ?{}", params_vec.len()));
    }
    if let Some(cat) = filter.category_id {
        params_vec.push(Box::new(cat));
        sql.push_str(&format!(" AND t.category_id = ?{}", params_vec.len()));
    }
    if let Some(from) = filter.from {
        params_vec.push(Box::new(from.to_string()));
        sql.push_str(&format!(" AND t.date >= ?{}", params_vec.len()));
    }
    if let Some(to) = filter.to {
        params_vec.push(Box::new(to.to_string()));
        sql.push_str(&format!(" AND t.date <= ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = filter.limit {
        params_vec.push(Box::new(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(
        params_vec.iter().map(|p| p.as_ref()),
    ))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(TxRow {
            id: r.get(0)?,
            date: r.get(1)?,
            account: r.get(2)?,
            amount: r.get(3)?,
            tx_type: r.get(4)?,
            category: r.get(5)?,
            transfer_id: r.get(6)?,
        });
    }
    Ok(data)
}

// System-row helpers for the owning aggregates. These bypass structural
// protection on purpose; the aggregate is responsible for consistency.

pub(crate) fn insert_system_tx(
    conn: &Connection,
    account_id: i64,
    amount: Milli,
    tx_type: TxType,
    date: NaiveDate,
    transfer_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions(account_id, amount, type, date, transfer_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account_id,
            amount,
            tx_type.as_str(),
            date.to_string(),
            transfer_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_system_tx(
    conn: &Connection,
    id: i64,
    account_id: i64,
    amount: Milli,
    tx_type: TxType,
    date: NaiveDate,
) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET account_id=?2, amount=?3, type=?4, date=?5 WHERE id=?1",
        params![id, account_id, amount, tx_type.as_str(), date.to_string()],
    )?;
    Ok(())
}

pub(crate) fn delete_system_tx(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO accounts(id, owner, name, type) VALUES
             (1, 'ana', 'Wallet', 'CASH'),
             (2, 'bob', 'Wallet', 'CASH')",
            [],
        )
        .unwrap();
        conn
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn new_tx(account_id: i64, amount: Milli) -> NewTransaction {
        NewTransaction {
            account_id,
            amount,
            date: d("2025-03-01"),
            category_id: None,
        }
    }

    #[test]
    fn create_rejects_foreign_account() {
        let conn = setup();
        let err = create(&conn, "ana", &new_tx(2, 1000)).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn edit_and_delete_protect_system_rows() {
        let conn = setup();
        let id = insert_system_tx(&conn, 1, -5000, TxType::AssetBuy, d("2025-03-01"), None).unwrap();
        let err = edit(&conn, "ana", id, &TxPatch::default()).unwrap_err();
        assert!(matches!(err, LedgerError::StructuralProtection(t) if t == "ASSET_BUY"));
        let err = delete(&conn, "ana", id).unwrap_err();
        assert!(matches!(err, LedgerError::StructuralProtection(_)));
    }

    #[test]
    fn edit_patches_only_set_fields() {
        let conn = setup();
        let id = create(&conn, "ana", &new_tx(1, 1000)).unwrap();
        edit(
            &conn,
            "ana",
            id,
            &TxPatch {
                amount: Some(2000),
                ..Default::default()
            },
        )
        .unwrap();
        let (amount, date): (i64, String) = conn
            .query_row(
                "SELECT amount, date FROM transactions WHERE id=?1",
                params![id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount, 2000);
        assert_eq!(date, "2025-03-01");
    }

    #[test]
    fn bulk_delete_is_best_effort() {
        let mut conn = setup();
        let user_id = create(&conn, "ana", &new_tx(1, 1000)).unwrap();
        let sys_id =
            insert_system_tx(&conn, 1, -5000, TxType::PeerTransfer, d("2025-03-02"), None).unwrap();
        let foreign: i64 = {
            conn.execute(
                "INSERT INTO transactions(account_id, amount, type, date) VALUES (2, 100, 'USER_CREATED', '2025-03-03')",
                [],
            )
            .unwrap();
            conn.last_insert_rowid()
        };
        let removed = bulk_delete(&mut conn, "ana", &[user_id, sys_id, foreign, 999]).unwrap();
        assert_eq!(removed, 1);
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 2);
    }

    #[test]
    fn list_composes_filters() {
        let conn = setup();
        for (amount, date) in [(1000, "2025-01-01"), (2000, "2025-02-01"), (3000, "2025-03-01")] {
            create(
                &conn,
                "ana",
                &NewTransaction {
                    account_id: 1,
                    amount,
                    date: d(date),
                    category_id: None,
                },
            )
            .unwrap();
        }
        let rows = list(
            &conn,
            "ana",
            &TxFilter {
                from: Some(d("2025-01-15")),
                to: Some(d("2025-02-15")),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 2000);

        let rows = list(
            &conn,
            "ana",
            &TxFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2025-03-01");
    }
}
