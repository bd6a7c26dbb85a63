// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tallybook", "tallybook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tallybook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        hidden INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        -- billing configuration, CREDIT_CARD only
        close_day INTEGER,
        close_at_month_end INTEGER NOT NULL DEFAULT 0,
        due_day INTEGER,
        due_days INTEGER,
        min_payment_pct INTEGER, -- milli-percent
        credit_limit INTEGER,    -- milli-units
        apr INTEGER,             -- milli-percent
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(owner, name)
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(owner, name)
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        amount INTEGER NOT NULL, -- milli-units
        type TEXT NOT NULL DEFAULT 'USER_CREATED',
        date TEXT NOT NULL,
        category_id INTEGER,
        transfer_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

    CREATE TABLE IF NOT EXISTS transfers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        amount INTEGER NOT NULL,
        charge INTEGER NOT NULL DEFAULT 0,
        from_account_id INTEGER,
        to_account_id INTEGER,
        from_tx_id INTEGER,
        to_tx_id INTEGER,
        date TEXT NOT NULL,
        notes TEXT,
        statement_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(from_account_id) REFERENCES accounts(id),
        FOREIGN KEY(to_account_id) REFERENCES accounts(id),
        FOREIGN KEY(statement_id) REFERENCES statements(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS assets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        unit TEXT NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 0,
        average_cost INTEGER NOT NULL DEFAULT 0,
        extra_charge INTEGER NOT NULL DEFAULT 0,
        total_paid INTEGER NOT NULL DEFAULT 0,
        account_id INTEGER NOT NULL,
        is_sold INTEGER NOT NULL DEFAULT 0,
        sold_at TEXT,
        sell_amount INTEGER,
        UNIQUE(owner, name, type),
        FOREIGN KEY(account_id) REFERENCES accounts(id)
    );

    CREATE TABLE IF NOT EXISTS asset_lots(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL, -- positive = buy, negative = sell
        unit TEXT NOT NULL,
        price INTEGER NOT NULL,    -- cost per unit at lot time
        sell_price INTEGER,
        extra_charge INTEGER NOT NULL DEFAULT 0,
        total_paid INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        buy_tx_id INTEGER,
        return_tx_id INTEGER,
        profit_tx_id INTEGER,
        FOREIGN KEY(asset_id) REFERENCES assets(id) ON DELETE CASCADE,
        FOREIGN KEY(account_id) REFERENCES accounts(id)
    );
    CREATE INDEX IF NOT EXISTS idx_asset_lots_asset ON asset_lots(asset_id);

    CREATE TABLE IF NOT EXISTS statements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        period_start TEXT NOT NULL,
        statement_date TEXT NOT NULL, -- plain calendar date, one per account per close day
        due_date TEXT NOT NULL,
        statement_balance INTEGER NOT NULL,
        payment_due_amount INTEGER NOT NULL,
        is_overridden INTEGER NOT NULL DEFAULT 0,
        minimum_payment INTEGER NOT NULL DEFAULT 0,
        paid_amount INTEGER NOT NULL DEFAULT 0,
        is_paid INTEGER NOT NULL DEFAULT 0,
        paid_at TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(account_id, statement_date),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS recurring_payments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        type TEXT NOT NULL,    -- TRANSACTION | TRANSFER
        cadence TEXT NOT NULL, -- DAILY | MONTHLY | YEARLY
        amount INTEGER NOT NULL,
        account_id INTEGER,
        to_account_id INTEGER,
        category_id INTEGER,
        start_date TEXT NOT NULL,
        day_of_month INTEGER,
        month INTEGER,
        last_completed_at TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(to_account_id) REFERENCES accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    -- Price feed, written by an out-of-scope ingestion job. Keyed by asset
    -- type, most recent fetch wins.
    CREATE TABLE IF NOT EXISTS prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_type TEXT NOT NULL,
        price INTEGER NOT NULL, -- milli-units per unit
        fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_prices_type ON prices(asset_type);
    "#,
    )?;
    Ok(())
}
