// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::ledger::{delete_system_tx, insert_system_tx, require_account};
use crate::models::{Asset, AssetLot, Milli, TxType};
use crate::utils::div_round;

#[derive(Debug, Clone)]
pub struct BuyInput {
    pub name: String,
    pub asset_type: String,
    pub unit: String,
    pub quantity: i64,
    pub price: Milli,
    pub extra_charge: Milli,
    pub account_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SellInput {
    pub quantity: i64,
    pub sale_amount: Milli,
    pub extra_charge: Milli,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct LotPatch {
    pub quantity: Option<i64>,
    pub price: Option<Milli>,
    pub extra_charge: Option<Milli>,
    pub date: Option<NaiveDate>,
}

/// Read model row: booked position enriched with the latest feed price.
#[derive(Debug, Clone, Serialize)]
pub struct AssetPosition {
    pub id: i64,
    pub name: String,
    pub asset_type: String,
    pub unit: String,
    pub quantity: i64,
    pub average_cost: Milli,
    pub total_paid: Milli,
    pub is_sold: bool,
    pub last_price: Option<Milli>,
    pub current_value: Option<Milli>,
    pub unrealized_profit: Option<Milli>,
    pub realized_profit: Milli,
}

pub fn get(conn: &Connection, owner: &str, asset_id: i64) -> Result<Asset> {
    let row = conn
        .query_row(
            "SELECT id, owner, name, type, unit, quantity, average_cost, extra_charge,
                    total_paid, account_id, is_sold, sold_at, sell_amount
             FROM assets WHERE id=?1 AND owner=?2",
            params![asset_id, owner],
            |r| {
                Ok(Asset {
                    id: r.get(0)?,
                    owner: r.get(1)?,
                    name: r.get(2)?,
                    asset_type: r.get(3)?,
                    unit: r.get(4)?,
                    quantity: r.get(5)?,
                    average_cost: r.get(6)?,
                    extra_charge: r.get(7)?,
                    total_paid: r.get(8)?,
                    account_id: r.get(9)?,
                    is_sold: r.get(10)?,
                    sold_at: r.get(11)?,
                    sell_amount: r.get(12)?,
                })
            },
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::not_found(format!("Asset {}", asset_id)))
}

pub fn find(conn: &Connection, owner: &str, name: &str, asset_type: &str) -> Result<Asset> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM assets WHERE owner=?1 AND name=?2 AND type=?3",
            params![owner, name, asset_type],
            |r| r.get(0),
        )
        .optional()?;
    match id {
        Some(id) => get(conn, owner, id),
        None => Err(LedgerError::not_found(format!("Asset '{}'", name))),
    }
}

/// Recompute the asset aggregates as literal sums over its lots. Returns the
/// resulting quantity. average_cost is a display figure derived from
/// sum(price*qty); the sell path allocates cost from total_paid by ratio, so
/// the two can drift apart by rounding.
fn recompute(conn: &Connection, asset_id: i64) -> Result<i64> {
    let (qty, total_paid, extra, price_qty): (i64, i64, i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(quantity),0), COALESCE(SUM(total_paid),0),
                COALESCE(SUM(extra_charge),0), COALESCE(SUM(price*quantity),0)
         FROM asset_lots WHERE asset_id=?1",
        params![asset_id],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )?;
    let average_cost = if qty > 0 {
        div_round(price_qty as i128, qty as i128)
    } else {
        0
    };
    conn.execute(
        "UPDATE assets SET quantity=?2, total_paid=?3, extra_charge=?4, average_cost=?5,
                is_sold = CASE WHEN ?2 > 0 THEN 0 ELSE is_sold END,
                sold_at = CASE WHEN ?2 > 0 THEN NULL ELSE sold_at END,
                sell_amount = CASE WHEN ?2 > 0 THEN NULL ELSE sell_amount END
         WHERE id=?1",
        params![asset_id, qty, total_paid, extra, average_cost],
    )?;
    Ok(qty)
}

/// Buy: ledger debit, find-or-create the asset by (owner, name, type),
/// append a positive lot, re-derive the aggregates. One atomic unit.
pub fn buy(conn: &mut Connection, owner: &str, input: &BuyInput) -> Result<i64> {
    if input.quantity <= 0 {
        return Err(LedgerError::validation("quantity: must be positive"));
    }
    if input.price < 0 || input.extra_charge < 0 {
        return Err(LedgerError::validation("price: must not be negative"));
    }
    require_account(conn, owner, input.account_id)?;

    let dbtx = conn.transaction()?;
    let asset_id: Option<i64> = dbtx
        .query_row(
            "SELECT id FROM assets WHERE owner=?1 AND name=?2 AND type=?3",
            params![owner, input.name, input.asset_type],
            |r| r.get(0),
        )
        .optional()?;
    let asset_id = match asset_id {
        Some(id) => id,
        None => {
            dbtx.execute(
                "INSERT INTO assets(owner, name, type, unit, account_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![owner, input.name, input.asset_type, input.unit, input.account_id],
            )?;
            dbtx.last_insert_rowid()
        }
    };

    let total_paid = input.quantity * input.price + input.extra_charge;
    let buy_tx_id = insert_system_tx(
        &dbtx,
        input.account_id,
        -total_paid,
        TxType::AssetBuy,
        input.date,
        None,
    )?;
    dbtx.execute(
        "INSERT INTO asset_lots(asset_id, quantity, unit, price, extra_charge, total_paid,
                                account_id, date, buy_tx_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            asset_id,
            input.quantity,
            input.unit,
            input.price,
            input.extra_charge,
            total_paid,
            input.account_id,
            input.date.to_string(),
            buy_tx_id,
        ],
    )?;
    recompute(&dbtx, asset_id)?;
    dbtx.commit()?;
    Ok(asset_id)
}

/// Sell part or all of a position. Cost is allocated proportionally from the
/// cumulative basis, not matched lot by lot. A profitable sale books a
/// principal return leg plus an income leg; a loss books the actual sale
/// amount as the return leg and no income leg.
pub fn sell(conn: &mut Connection, owner: &str, asset_id: i64, input: &SellInput) -> Result<()> {
    let asset = get(conn, owner, asset_id)?;
    if input.quantity <= 0 {
        return Err(LedgerError::validation("quantity: must be positive"));
    }
    if input.quantity > asset.quantity {
        return Err(LedgerError::validation(
            "quantity: cannot sell more than you own",
        ));
    }
    if input.sale_amount < 0 || input.extra_charge < 0 {
        return Err(LedgerError::validation("saleAmount: must not be negative"));
    }

    let principal = div_round(
        asset.total_paid as i128 * input.quantity as i128,
        asset.quantity as i128,
    );
    let profit = input.sale_amount - principal - input.extra_charge;
    let return_amount = if profit < 0 { input.sale_amount } else { principal };

    let dbtx = conn.transaction()?;
    let return_tx_id = insert_system_tx(
        &dbtx,
        asset.account_id,
        return_amount,
        TxType::AssetReturn,
        input.date,
        None,
    )?;
    let profit_tx_id = if profit > 0 {
        Some(insert_system_tx(
            &dbtx,
            asset.account_id,
            profit,
            TxType::AssetSell,
            input.date,
            None,
        )?)
    } else {
        None
    };

    let sell_price = div_round(input.sale_amount as i128, input.quantity as i128);
    dbtx.execute(
        "INSERT INTO asset_lots(asset_id, quantity, unit, price, sell_price, extra_charge,
                                total_paid, account_id, date, return_tx_id, profit_tx_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            asset_id,
            -input.quantity,
            asset.unit,
            asset.average_cost,
            sell_price,
            input.extra_charge,
            -principal,
            asset.account_id,
            input.date.to_string(),
            return_tx_id,
            profit_tx_id,
        ],
    )?;

    let qty = recompute(&dbtx, asset_id)?;
    if qty == 0 {
        // sold out: the row stays, flagged
        dbtx.execute(
            "UPDATE assets SET is_sold=1, sold_at=?2, sell_amount=?3 WHERE id=?1",
            params![asset_id, input.date.to_string(), input.sale_amount],
        )?;
    }
    dbtx.commit()?;
    Ok(())
}

fn load_lot(conn: &Connection, owner: &str, lot_id: i64) -> Result<AssetLot> {
    let row = conn
        .query_row(
            "SELECT l.id, l.asset_id, l.quantity, l.unit, l.price, l.sell_price,
                    l.extra_charge, l.total_paid, l.account_id, l.date,
                    l.buy_tx_id, l.return_tx_id, l.profit_tx_id
             FROM asset_lots l JOIN assets s ON l.asset_id = s.id
             WHERE l.id=?1 AND s.owner=?2",
            params![lot_id, owner],
            |r| {
                Ok(AssetLot {
                    id: r.get(0)?,
                    asset_id: r.get(1)?,
                    quantity: r.get(2)?,
                    unit: r.get(3)?,
                    price: r.get(4)?,
                    sell_price: r.get(5)?,
                    extra_charge: r.get(6)?,
                    total_paid: r.get(7)?,
                    account_id: r.get(8)?,
                    date: r.get(9)?,
                    buy_tx_id: r.get(10)?,
                    return_tx_id: r.get(11)?,
                    profit_tx_id: r.get(12)?,
                })
            },
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::not_found(format!("Asset lot {}", lot_id)))
}

/// Drop the asset aggregate with everything it owns: lots and their linked
/// ledger rows. Only reachable through the zero-quantity edit/delete paths.
fn delete_asset(conn: &Connection, asset_id: i64) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT buy_tx_id, return_tx_id, profit_tx_id FROM asset_lots WHERE asset_id=?1",
    )?;
    let mut rows = stmt.query(params![asset_id])?;
    let mut tx_ids: Vec<i64> = Vec::new();
    while let Some(r) = rows.next()? {
        for i in 0..3 {
            if let Some(id) = r.get::<_, Option<i64>>(i)? {
                tx_ids.push(id);
            }
        }
    }
    drop(rows);
    drop(stmt);
    for id in tx_ids {
        delete_system_tx(conn, id)?;
    }
    // lots cascade via FK
    conn.execute("DELETE FROM assets WHERE id=?1", params![asset_id])?;
    Ok(())
}

/// Correct a historical buy. Sell lots are owned by the sale that created
/// them and cannot be reshaped here.
pub fn edit_lot(conn: &mut Connection, owner: &str, lot_id: i64, patch: &LotPatch) -> Result<()> {
    let lot = load_lot(conn, owner, lot_id)?;
    if lot.quantity < 0 {
        return Err(LedgerError::validation(
            "lot: only buy lots can be edited; delete the sale instead",
        ));
    }
    let quantity = patch.quantity.unwrap_or(lot.quantity);
    let price = patch.price.unwrap_or(lot.price);
    let extra_charge = patch.extra_charge.unwrap_or(lot.extra_charge);
    let date = patch.date.unwrap_or(lot.date);
    if quantity < 0 || price < 0 || extra_charge < 0 {
        return Err(LedgerError::validation("lot: values must not be negative"));
    }
    let total_paid = quantity * price + extra_charge;

    let dbtx = conn.transaction()?;
    dbtx.execute(
        "UPDATE asset_lots SET quantity=?2, price=?3, extra_charge=?4, total_paid=?5, date=?6
         WHERE id=?1",
        params![
            lot_id,
            quantity,
            price,
            extra_charge,
            total_paid,
            date.to_string()
        ],
    )?;
    if let Some(tx_id) = lot.buy_tx_id {
        crate::ledger::update_system_tx(
            &dbtx,
            tx_id,
            lot.account_id,
            -total_paid,
            TxType::AssetBuy,
            date,
        )?;
    }
    let qty = recompute(&dbtx, lot.asset_id)?;
    if qty < 0 {
        return Err(LedgerError::validation(
            "quantity: edit would leave more sold than bought",
        ));
    }
    if qty == 0 {
        delete_asset(&dbtx, lot.asset_id)?;
    }
    dbtx.commit()?;
    Ok(())
}

/// Remove a lot and cascade-delete whichever ledger rows it produced.
pub fn delete_lot(conn: &mut Connection, owner: &str, lot_id: i64) -> Result<()> {
    let lot = load_lot(conn, owner, lot_id)?;
    let dbtx = conn.transaction()?;
    dbtx.execute("DELETE FROM asset_lots WHERE id=?1", params![lot_id])?;
    for tx_id in [lot.buy_tx_id, lot.return_tx_id, lot.profit_tx_id]
        .into_iter()
        .flatten()
    {
        delete_system_tx(&dbtx, tx_id)?;
    }
    let qty = recompute(&dbtx, lot.asset_id)?;
    if qty < 0 {
        return Err(LedgerError::validation(
            "quantity: delete would leave more sold than bought",
        ));
    }
    if qty == 0 {
        delete_asset(&dbtx, lot.asset_id)?;
    }
    dbtx.commit()?;
    Ok(())
}

pub fn lots(conn: &Connection, owner: &str, asset_id: i64) -> Result<Vec<AssetLot>> {
    get(conn, owner, asset_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, asset_id, quantity, unit, price, sell_price, extra_charge, total_paid,
                account_id, date, buy_tx_id, return_tx_id, profit_tx_id
         FROM asset_lots WHERE asset_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![asset_id], |r| {
        Ok(AssetLot {
            id: r.get(0)?,
            asset_id: r.get(1)?,
            quantity: r.get(2)?,
            unit: r.get(3)?,
            price: r.get(4)?,
            sell_price: r.get(5)?,
            extra_charge: r.get(6)?,
            total_paid: r.get(7)?,
            account_id: r.get(8)?,
            date: r.get(9)?,
            buy_tx_id: r.get(10)?,
            return_tx_id: r.get(11)?,
            profit_tx_id: r.get(12)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Realized profit booked by this asset's sell lots, independent of the
/// current market price.
pub fn realized_profit(conn: &Connection, asset_id: i64) -> Result<Milli> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(sell_price * -quantity + total_paid - extra_charge), 0)
         FROM asset_lots WHERE asset_id=?1 AND quantity < 0",
        params![asset_id],
        |r| r.get(0),
    )?;
    Ok(total)
}

pub fn positions(conn: &Connection, owner: &str, include_sold: bool) -> Result<Vec<AssetPosition>> {
    let mut sql = String::from(
        "SELECT a.id, a.name, a.type, a.unit, a.quantity, a.average_cost, a.total_paid,
                a.is_sold,
                (SELECT p.price FROM prices p WHERE p.asset_type = a.type
                 ORDER BY p.fetched_at DESC, p.id DESC LIMIT 1)
         FROM assets a WHERE a.owner = ?1",
    );
    if !include_sold {
        sql.push_str(" AND a.is_sold = 0");
    }
    sql.push_str(" ORDER BY a.name");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![owner])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let quantity: i64 = r.get(4)?;
        let total_paid: i64 = r.get(6)?;
        let last_price: Option<i64> = r.get(8)?;
        let current_value = last_price.map(|p| p * quantity);
        data.push(AssetPosition {
            id,
            name: r.get(1)?,
            asset_type: r.get(2)?,
            unit: r.get(3)?,
            quantity,
            average_cost: r.get(5)?,
            total_paid,
            is_sold: r.get(7)?,
            last_price,
            current_value,
            unrealized_profit: current_value.map(|v| v - total_paid),
            realized_profit: realized_profit(conn, id)?,
        });
    }
    Ok(data)
}
