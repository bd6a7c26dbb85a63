// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::Milli;

/// Point-in-time balance derived by summation over the ledger. Soft-deleted
/// accounts never contribute; hidden accounts only when asked for.
pub fn compute_balance(
    conn: &Connection,
    owner: &str,
    as_of: NaiveDate,
    account_id: Option<i64>,
    include_hidden: bool,
) -> Result<Milli> {
    let mut sql = String::from(
        "SELECT COALESCE(SUM(t.amount), 0) FROM transactions t
         JOIN accounts a ON t.account_id = a.id
         WHERE a.owner = ?1 AND a.deleted = 0 AND t.date <= ?2",
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(owner.to_string()), Box::new(as_of.to_string())];
    if let Some(id) = account_id {
        sql.push_str(" AND a.id = ?3");
        params.push(Box::new(id));
    }
    if !include_hidden {
        sql.push_str(" AND a.hidden = 0");
    }
    let mut stmt = conn.prepare_cached(&sql)?;
    let total: i64 = stmt.query_row(
        rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        |r| r.get(0),
    )?;
    Ok(total)
}

/// Credit-card "currently owed" view of a balance.
pub fn owed(balance: Milli) -> Milli {
    (-balance).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO accounts(id, owner, name, type) VALUES
             (1, 'ana', 'Wallet', 'CASH'),
             (2, 'ana', 'Stash', 'BANK'),
             (3, 'bob', 'Wallet', 'CASH')",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE accounts SET hidden=1 WHERE id=2",
            [],
        )
        .unwrap();
        for (acct, amount, date) in [
            (1, 10_000, "2025-01-05"),
            (1, -2_500, "2025-01-10"),
            (2, 50_000, "2025-01-07"),
            (3, 99_000, "2025-01-01"),
        ] {
            conn.execute(
                "INSERT INTO transactions(account_id, amount, type, date) VALUES (?1, ?2, 'USER_CREATED', ?3)",
                params![acct, amount, date],
            )
            .unwrap();
        }
        conn
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn sums_only_owner_accounts() {
        let conn = setup();
        let b = compute_balance(&conn, "ana", d("2025-01-31"), None, true).unwrap();
        assert_eq!(b, 57_500);
    }

    #[test]
    fn respects_as_of_cutoff() {
        let conn = setup();
        let b = compute_balance(&conn, "ana", d("2025-01-06"), None, true).unwrap();
        assert_eq!(b, 10_000);
    }

    #[test]
    fn excludes_hidden_unless_asked() {
        let conn = setup();
        let b = compute_balance(&conn, "ana", d("2025-01-31"), None, false).unwrap();
        assert_eq!(b, 7_500);
    }

    #[test]
    fn single_account_restriction() {
        let conn = setup();
        let b = compute_balance(&conn, "ana", d("2025-01-31"), Some(2), true).unwrap();
        assert_eq!(b, 50_000);
    }

    #[test]
    fn soft_deleted_accounts_do_not_count() {
        let conn = setup();
        conn.execute("UPDATE accounts SET deleted=1 WHERE id=1", [])
            .unwrap();
        let b = compute_balance(&conn, "ana", d("2025-01-31"), None, true).unwrap();
        assert_eq!(b, 50_000);
    }

    #[test]
    fn owed_is_negated_and_floored() {
        assert_eq!(owed(-12_000), 12_000);
        assert_eq!(owed(5_000), 0);
        assert_eq!(owed(0), 0);
    }
}
