// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// All monetary values are signed integers in milli-units (value x 1000).
pub type Milli = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Cash,
    Bank,
    CreditCard,
    Loan,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Bank => "BANK",
            AccountType::CreditCard => "CREDIT_CARD",
            AccountType::Loan => "LOAN",
            AccountType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Ok(AccountType::Cash),
            "BANK" => Ok(AccountType::Bank),
            "CREDIT_CARD" => Ok(AccountType::CreditCard),
            "LOAN" => Ok(AccountType::Loan),
            "OTHER" => Ok(AccountType::Other),
            other => Err(LedgerError::validation(format!(
                "Unknown account type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    UserCreated,
    InitialBalance,
    PeerTransfer,
    SelfTransfer,
    AssetBuy,
    AssetReturn,
    AssetSell,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::UserCreated => "USER_CREATED",
            TxType::InitialBalance => "INITIAL_BALANCE",
            TxType::PeerTransfer => "PEER_TRANSFER",
            TxType::SelfTransfer => "SELF_TRANSFER",
            TxType::AssetBuy => "ASSET_BUY",
            TxType::AssetReturn => "ASSET_RETURN",
            TxType::AssetSell => "ASSET_SELL",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "USER_CREATED" => Ok(TxType::UserCreated),
            "INITIAL_BALANCE" => Ok(TxType::InitialBalance),
            "PEER_TRANSFER" => Ok(TxType::PeerTransfer),
            "SELF_TRANSFER" => Ok(TxType::SelfTransfer),
            "ASSET_BUY" => Ok(TxType::AssetBuy),
            "ASSET_RETURN" => Ok(TxType::AssetReturn),
            "ASSET_SELL" => Ok(TxType::AssetSell),
            other => Err(LedgerError::validation(format!(
                "Unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// Billing configuration, present only on CREDIT_CARD accounts. A valid
/// config carries at least one close-day strategy and one due strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    pub close_day: Option<u32>,
    pub close_at_month_end: bool,
    pub due_day: Option<u32>,
    pub due_days: Option<i64>,
    /// Minimum payment percentage in milli-percent (2.5% -> 2500).
    pub min_payment_pct: Option<Milli>,
    pub credit_limit: Option<Milli>,
    /// APR in milli-percent.
    pub apr: Option<Milli>,
}

impl BillingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.close_day.is_none() && !self.close_at_month_end {
            return Err(LedgerError::validation(
                "closeDay: credit card needs a statement close day or the month-end flag",
            ));
        }
        if self.due_day.is_none() && self.due_days.is_none() {
            return Err(LedgerError::validation(
                "dueDay: credit card needs a payment due day or days-after-close",
            ));
        }
        if let Some(d) = self.close_day {
            if !(1..=31).contains(&d) {
                return Err(LedgerError::validation("closeDay: must be between 1 and 31"));
            }
        }
        if let Some(d) = self.due_day {
            if !(1..=31).contains(&d) {
                return Err(LedgerError::validation("dueDay: must be between 1 and 31"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub account_type: AccountType,
    pub hidden: bool,
    pub deleted: bool,
    pub billing: Option<BillingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub amount: Milli,
    pub tx_type: TxType,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub transfer_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub owner: String,
    pub amount: Milli,
    pub charge: Milli,
    pub from_account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub from_tx_id: Option<i64>,
    pub to_tx_id: Option<i64>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub statement_id: Option<i64>,
}

/// Merged holding keyed by (owner, name, type). Aggregate fields are always
/// the literal sums over this asset's lots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub asset_type: String,
    pub unit: String,
    pub quantity: i64,
    pub average_cost: Milli,
    pub extra_charge: Milli,
    pub total_paid: Milli,
    pub account_id: i64,
    pub is_sold: bool,
    pub sold_at: Option<NaiveDate>,
    pub sell_amount: Option<Milli>,
}

/// One discrete buy (positive quantity) or sell (negative quantity) event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLot {
    pub id: i64,
    pub asset_id: i64,
    pub quantity: i64,
    pub unit: String,
    pub price: Milli,
    pub sell_price: Option<Milli>,
    pub extra_charge: Milli,
    pub total_paid: Milli,
    pub account_id: i64,
    pub date: NaiveDate,
    pub buy_tx_id: Option<i64>,
    pub return_tx_id: Option<i64>,
    pub profit_tx_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub account_id: i64,
    pub period_start: NaiveDate,
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,
    pub statement_balance: Milli,
    pub payment_due_amount: Milli,
    pub is_overridden: bool,
    pub minimum_payment: Milli,
    pub paid_amount: Milli,
    pub is_paid: bool,
    pub paid_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurringKind {
    Transaction,
    Transfer,
}

impl RecurringKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringKind::Transaction => "TRANSACTION",
            RecurringKind::Transfer => "TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRANSACTION" => Ok(RecurringKind::Transaction),
            "TRANSFER" => Ok(RecurringKind::Transfer),
            other => Err(LedgerError::validation(format!(
                "Unknown recurring payment type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    Daily,
    Monthly,
    Yearly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "DAILY",
            Cadence::Monthly => "MONTHLY",
            Cadence::Yearly => "YEARLY",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Cadence::Daily),
            "MONTHLY" => Ok(Cadence::Monthly),
            "YEARLY" => Ok(Cadence::Yearly),
            other => Err(LedgerError::validation(format!(
                "Unknown cadence '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPayment {
    pub id: i64,
    pub owner: String,
    pub kind: RecurringKind,
    pub cadence: Cadence,
    pub amount: Milli,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: NaiveDate,
    pub day_of_month: Option<u32>,
    pub month: Option<u32>,
    pub last_completed_at: Option<NaiveDate>,
    pub is_active: bool,
}
