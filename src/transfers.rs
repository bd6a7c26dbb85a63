// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::ledger::{delete_system_tx, insert_system_tx, require_account, update_system_tx};
use crate::models::{Milli, Transfer, TxType};

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub amount: Milli,
    pub charge: Milli,
    pub from_account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Statement being paid by this transfer, if any.
    pub statement_id: Option<i64>,
}

/// Tri-state change for one side of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SideChange {
    #[default]
    Keep,
    Clear,
    Set(i64),
}

impl SideChange {
    fn apply(&self, current: Option<i64>) -> Option<i64> {
        match self {
            SideChange::Keep => current,
            SideChange::Clear => None,
            SideChange::Set(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferPatch {
    pub amount: Option<Milli>,
    pub charge: Option<Milli>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub from: SideChange,
    pub to: SideChange,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferRow {
    pub id: i64,
    pub date: String,
    pub amount: Milli,
    pub charge: Milli,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub notes: Option<String>,
}

fn side_type(other_side_set: bool) -> TxType {
    if other_side_set {
        TxType::PeerTransfer
    } else {
        TxType::SelfTransfer
    }
}

fn validate_sides(
    conn: &Connection,
    owner: &str,
    from: Option<i64>,
    to: Option<i64>,
) -> Result<()> {
    if from.is_none() && to.is_none() {
        return Err(LedgerError::validation(
            "fromAccountId: transfer needs at least one side",
        ));
    }
    if let Some(id) = from {
        require_account(conn, owner, id)?;
    }
    if let Some(id) = to {
        require_account(conn, owner, id)?;
    }
    Ok(())
}

pub fn create(conn: &mut Connection, owner: &str, input: &NewTransfer) -> Result<i64> {
    validate_sides(conn, owner, input.from_account_id, input.to_account_id)?;
    if input.amount <= 0 {
        return Err(LedgerError::validation("amount: must be positive"));
    }

    let dbtx = conn.transaction()?;
    dbtx.execute(
        "INSERT INTO transfers(owner, amount, charge, from_account_id, to_account_id, date, notes, statement_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            owner,
            input.amount,
            input.charge,
            input.from_account_id,
            input.to_account_id,
            input.date.to_string(),
            input.notes,
            input.statement_id,
        ],
    )?;
    let transfer_id = dbtx.last_insert_rowid();

    let mut from_tx_id = None;
    let mut to_tx_id = None;
    if let Some(acct) = input.from_account_id {
        from_tx_id = Some(insert_system_tx(
            &dbtx,
            acct,
            -(input.amount + input.charge),
            side_type(input.to_account_id.is_some()),
            input.date,
            Some(transfer_id),
        )?);
    }
    if let Some(acct) = input.to_account_id {
        to_tx_id = Some(insert_system_tx(
            &dbtx,
            acct,
            input.amount,
            side_type(input.from_account_id.is_some()),
            input.date,
            Some(transfer_id),
        )?);
    }
    dbtx.execute(
        "UPDATE transfers SET from_tx_id=?2, to_tx_id=?3 WHERE id=?1",
        params![transfer_id, from_tx_id, to_tx_id],
    )?;

    if let Some(stmt_id) = input.statement_id {
        mark_statement_paid(&dbtx, owner, stmt_id, input.amount, input.date)?;
    }

    dbtx.commit()?;
    Ok(transfer_id)
}

/// Record a payment against a closed statement.
fn mark_statement_paid(
    conn: &Connection,
    owner: &str,
    statement_id: i64,
    amount: Milli,
    date: NaiveDate,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE statements SET paid_amount = paid_amount + ?2, is_paid = 1, paid_at = ?3
         WHERE id = ?1 AND account_id IN (SELECT id FROM accounts WHERE owner = ?4)",
        params![statement_id, amount, date.to_string(), owner],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found(format!(
            "Statement {}",
            statement_id
        )));
    }
    Ok(())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> Result<Transfer> {
    let row = conn
        .query_row(
            "SELECT id, owner, amount, charge, from_account_id, to_account_id,
                    from_tx_id, to_tx_id, date, notes, statement_id
             FROM transfers WHERE id=?1 AND owner=?2",
            params![id, owner],
            |r| {
                Ok(Transfer {
                    id: r.get(0)?,
                    owner: r.get(1)?,
                    amount: r.get(2)?,
                    charge: r.get(3)?,
                    from_account_id: r.get(4)?,
                    to_account_id: r.get(5)?,
                    from_tx_id: r.get(6)?,
                    to_tx_id: r.get(7)?,
                    date: r.get(8)?,
                    notes: r.get(9)?,
                    statement_id: r.get(10)?,
                })
            },
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::not_found(format!("Transfer {}", id)))
}

/// Reconcile one side of an edited transfer against its existing ledger row:
/// absent->present inserts, present->present updates in place,
/// present->absent deletes, absent->absent is a no-op.
fn reconcile_side(
    conn: &Connection,
    transfer_id: i64,
    existing_tx: Option<i64>,
    new_account: Option<i64>,
    amount: Milli,
    tx_type: TxType,
    date: NaiveDate,
) -> Result<Option<i64>> {
    match (existing_tx, new_account) {
        (None, None) => Ok(None),
        (None, Some(acct)) => Ok(Some(insert_system_tx(
            conn,
            acct,
            amount,
            tx_type,
            date,
            Some(transfer_id),
        )?)),
        (Some(tx_id), Some(acct)) => {
            update_system_tx(conn, tx_id, acct, amount, tx_type, date)?;
            Ok(Some(tx_id))
        }
        (Some(tx_id), None) => {
            delete_system_tx(conn, tx_id)?;
            Ok(None)
        }
    }
}

pub fn edit(conn: &mut Connection, owner: &str, id: i64, patch: &TransferPatch) -> Result<()> {
    let existing = get(conn, owner, id)?;

    let amount = patch.amount.unwrap_or(existing.amount);
    let charge = patch.charge.unwrap_or(existing.charge);
    let date = patch.date.unwrap_or(existing.date);
    let notes = patch.notes.clone().or(existing.notes);
    let from_account = patch.from.apply(existing.from_account_id);
    let to_account = patch.to.apply(existing.to_account_id);

    validate_sides(conn, owner, from_account, to_account)?;
    if amount <= 0 {
        return Err(LedgerError::validation("amount: must be positive"));
    }

    let dbtx = conn.transaction()?;
    let from_tx_id = reconcile_side(
        &dbtx,
        id,
        existing.from_tx_id,
        from_account,
        -(amount + charge),
        side_type(to_account.is_some()),
        date,
    )?;
    let to_tx_id = reconcile_side(
        &dbtx,
        id,
        existing.to_tx_id,
        to_account,
        amount,
        side_type(from_account.is_some()),
        date,
    )?;
    dbtx.execute(
        "UPDATE transfers SET amount=?2, charge=?3, from_account_id=?4, to_account_id=?5,
                from_tx_id=?6, to_tx_id=?7, date=?8, notes=?9
         WHERE id=?1",
        params![
            id,
            amount,
            charge,
            from_account,
            to_account,
            from_tx_id,
            to_tx_id,
            date.to_string(),
            notes,
        ],
    )?;
    dbtx.commit()?;
    Ok(())
}

/// Deleting a transfer removes both linked ledger rows atomically.
pub fn delete(conn: &mut Connection, owner: &str, id: i64) -> Result<()> {
    let existing = get(conn, owner, id)?;
    let dbtx = conn.transaction()?;
    for tx_id in [existing.from_tx_id, existing.to_tx_id].into_iter().flatten() {
        delete_system_tx(&dbtx, tx_id)?;
    }
    dbtx.execute("DELETE FROM transfers WHERE id=?1", params![id])?;
    dbtx.commit()?;
    Ok(())
}

/// Best-effort: rows not owned by the caller are skipped, each owned
/// transfer cascades like a single delete.
pub fn bulk_delete(conn: &mut Connection, owner: &str, ids: &[i64]) -> Result<usize> {
    let mut removed = 0;
    for &id in ids {
        match delete(conn, owner, id) {
            Ok(()) => removed += 1,
            Err(LedgerError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

pub fn list(conn: &Connection, owner: &str, account_id: Option<i64>) -> Result<Vec<TransferRow>> {
    let mut sql = String::from(
        "SELECT tr.id, tr.date, tr.amount, tr.charge, fa.name, ta.name, tr.notes
         FROM transfers tr
         LEFT JOIN accounts fa ON tr.from_account_id = fa.id
         LEFT JOIN accounts ta ON tr.to_account_id = ta.id
         WHERE tr.owner = ?1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
    if let Some(acct) = account_id {
        params_vec.push(Box::new(acct));
        sql.push_str(" AND (tr.from_account_id = ?2 OR tr.to_account_id = ?2)");
    }
    sql.push_str(" ORDER BY tr.date DESC, tr.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(
        params_vec.iter().map(|p| p.as_ref()),
    ))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(TransferRow {
            id: r.get(0)?,
            date: r.get(1)?,
            amount: r.get(2)?,
            charge: r.get(3)?,
            from_account: r.get(4)?,
            to_account: r.get(5)?,
            notes: r.get(6)?,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO accounts(id, owner, name, type) VALUES
             (1, 'ana', 'Checking', 'BANK'),
             (2, 'ana', 'Savings', 'BANK'),
             (3, 'bob', 'Wallet', 'CASH')",
            [],
        )
        .unwrap();
        conn
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn two_sided(amount: Milli, charge: Milli) -> NewTransfer {
        NewTransfer {
            amount,
            charge,
            from_account_id: Some(1),
            to_account_id: Some(2),
            date: d("2025-04-01"),
            notes: None,
            statement_id: None,
        }
    }

    fn tx_rows(conn: &Connection, transfer_id: i64) -> Vec<(i64, i64, String)> {
        let mut stmt = conn
            .prepare(
                "SELECT account_id, amount, type FROM transactions WHERE transfer_id=?1 ORDER BY id",
            )
            .unwrap();
        let rows = stmt
            .query_map(params![transfer_id], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn create_two_sided_writes_peer_pair() {
        let mut conn = setup();
        let id = create(&mut conn, "ana", &two_sided(10_000, 500)).unwrap();
        let rows = tx_rows(&conn, id);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (1, -10_500, "PEER_TRANSFER".to_string()));
        assert_eq!(rows[1], (2, 10_000, "PEER_TRANSFER".to_string()));
    }

    #[test]
    fn create_one_sided_is_self_transfer() {
        let mut conn = setup();
        let id = create(
            &mut conn,
            "ana",
            &NewTransfer {
                to_account_id: None,
                ..two_sided(7_000, 0)
            },
        )
        .unwrap();
        let rows = tx_rows(&conn, id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], (1, -7_000, "SELF_TRANSFER".to_string()));
    }

    #[test]
    fn create_rejects_empty_and_foreign_sides() {
        let mut conn = setup();
        let err = create(
            &mut conn,
            "ana",
            &NewTransfer {
                from_account_id: None,
                to_account_id: None,
                ..two_sided(1_000, 0)
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = create(
            &mut conn,
            "ana",
            &NewTransfer {
                to_account_id: Some(3),
                ..two_sided(1_000, 0)
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn edit_two_sided_to_one_sided_deletes_exactly_the_cleared_leg() {
        let mut conn = setup();
        let id = create(&mut conn, "ana", &two_sided(10_000, 500)).unwrap();
        edit(
            &mut conn,
            "ana",
            id,
            &TransferPatch {
                to: SideChange::Clear,
                ..Default::default()
            },
        )
        .unwrap();
        let rows = tx_rows(&conn, id);
        assert_eq!(rows.len(), 1);
        // remaining from-side is updated in place, now a SELF_TRANSFER
        assert_eq!(rows[0], (1, -10_500, "SELF_TRANSFER".to_string()));
        let tr = get(&conn, "ana", id).unwrap();
        assert_eq!(tr.to_account_id, None);
        assert_eq!(tr.to_tx_id, None);
        assert!(tr.from_tx_id.is_some());
    }

    #[test]
    fn edit_inserts_a_newly_present_side() {
        let mut conn = setup();
        let id = create(
            &mut conn,
            "ana",
            &NewTransfer {
                to_account_id: None,
                ..two_sided(5_000, 0)
            },
        )
        .unwrap();
        edit(
            &mut conn,
            "ana",
            id,
            &TransferPatch {
                to: SideChange::Set(2),
                ..Default::default()
            },
        )
        .unwrap();
        let rows = tx_rows(&conn, id);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (1, -5_000, "PEER_TRANSFER".to_string()));
        assert_eq!(rows[1], (2, 5_000, "PEER_TRANSFER".to_string()));
    }

    #[test]
    fn edit_amount_updates_both_legs_in_place() {
        let mut conn = setup();
        let id = create(&mut conn, "ana", &two_sided(10_000, 500)).unwrap();
        let before = tx_rows(&conn, id);
        edit(
            &mut conn,
            "ana",
            id,
            &TransferPatch {
                amount: Some(20_000),
                ..Default::default()
            },
        )
        .unwrap();
        let after = tx_rows(&conn, id);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], (1, -20_500, "PEER_TRANSFER".to_string()));
        assert_eq!(after[1], (2, 20_000, "PEER_TRANSFER".to_string()));
        // same ledger rows, never duplicated
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn delete_cascades_both_legs() {
        let mut conn = setup();
        let id = create(&mut conn, "ana", &two_sided(10_000, 0)).unwrap();
        delete(&mut conn, "ana", id).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(matches!(
            get(&conn, "ana", id),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn bulk_delete_skips_foreign_transfers() {
        let mut conn = setup();
        let id = create(&mut conn, "ana", &two_sided(10_000, 0)).unwrap();
        let removed = bulk_delete(&mut conn, "bob", &[id]).unwrap();
        assert_eq!(removed, 0);
        let removed = bulk_delete(&mut conn, "ana", &[id, 999]).unwrap();
        assert_eq!(removed, 1);
    }
}
