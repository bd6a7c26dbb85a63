// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::Milli;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse a decimal money string into signed milli-units without going
/// through floating point. Accepts up to three fractional digits.
pub fn parse_amount(s: &str) -> Result<Milli> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1i64, r),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, frac) = match rest.split_once('.') {
        Some((w, f)) => (w, f),
        None => (rest, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(anyhow!("Invalid amount '{}'", s));
    }
    if frac.len() > 3 {
        return Err(anyhow!(
            "Invalid amount '{}': at most 3 decimal places supported",
            s
        ));
    }
    let whole_v: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .with_context(|| format!("Invalid amount '{}'", s))?
    };
    let mut frac_v: i64 = 0;
    if !frac.is_empty() {
        frac_v = frac
            .parse()
            .with_context(|| format!("Invalid amount '{}'", s))?;
        for _ in frac.len()..3 {
            frac_v *= 10;
        }
    }
    Ok(sign * (whole_v * 1000 + frac_v))
}

pub fn fmt_milli(v: Milli) -> String {
    let sign = if v < 0 { "-" } else { "" };
    let a = v.unsigned_abs();
    format!("{}{}.{:03}", sign, a / 1000, a % 1000)
}

/// Integer division rounding half away from zero.
pub fn div_round(num: i128, den: i128) -> i64 {
    debug_assert!(den != 0);
    let (num, den, sign) = if (num < 0) != (den < 0) {
        (num.abs(), den.abs(), -1i128)
    } else {
        (num.abs(), den.abs(), 1i128)
    };
    (sign * ((num * 2 + den) / (den * 2))) as i64
}

/// Integer division rounding toward positive infinity.
pub fn div_ceil(num: i128, den: i128) -> i64 {
    debug_assert!(den > 0);
    if num <= 0 {
        (num / den) as i64
    } else {
        ((num + den - 1) / den) as i64
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month out of range"),
    }
}

/// Build a date in (year, month) with the day clamped to that month's length.
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    // day is in range after the clamp
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Shift (year, month) by a signed number of months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero = year * 12 + month as i32 - 1 + delta;
    (zero.div_euclid(12), (zero.rem_euclid(12) + 1) as u32)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn parse_id_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .with_context(|| format!("Bad id '{}'", part.trim()))
        })
        .collect()
}

pub fn id_for_account(conn: &Connection, owner: &str, name: &str) -> Result<i64> {
    let mut stmt =
        conn.prepare("SELECT id FROM accounts WHERE owner=?1 AND name=?2 AND deleted=0")?;
    let id: i64 = stmt
        .query_row(params![owner, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, owner: &str, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE owner=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner, name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

// Caller identity. The CLI stands in for the out-of-scope auth layer: the
// owner comes from --owner or the default_owner setting.
pub fn get_default_owner(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_owner'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_default_owner(conn: &Connection, owner: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_owner', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![owner],
    )?;
    Ok(())
}

pub fn resolve_owner(conn: &Connection, m: &clap::ArgMatches) -> Result<String> {
    if let Some(o) = m.get_one::<String>("owner") {
        return Ok(o.trim().to_string());
    }
    get_default_owner(conn)?
        .ok_or_else(|| anyhow!("No owner given; pass --owner or run 'tallybook init --owner NAME'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_handles_fractions_and_signs() {
        assert_eq!(parse_amount("12.5").unwrap(), 12500);
        assert_eq!(parse_amount("-0.001").unwrap(), -1);
        assert_eq!(parse_amount("100").unwrap(), 100_000);
        assert_eq!(parse_amount(" 3.250 ").unwrap(), 3250);
        assert!(parse_amount("1.2345").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn fmt_milli_round_trips() {
        assert_eq!(fmt_milli(12500), "12.500");
        assert_eq!(fmt_milli(-1), "-0.001");
        assert_eq!(fmt_milli(0), "0.000");
    }

    #[test]
    fn div_round_half_away_from_zero() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(-5, 2), -3);
        assert_eq!(div_round(4, 2), 2);
        assert_eq!(div_round(1, 3), 0);
        assert_eq!(div_round(2, 3), 1);
    }

    #[test]
    fn div_ceil_rounds_up() {
        assert_eq!(div_ceil(1, 3), 1);
        assert_eq!(div_ceil(3, 3), 1);
        assert_eq!(div_ceil(0, 3), 0);
        assert_eq!(div_ceil(-1, 3), 0);
    }

    #[test]
    fn clamped_date_respects_month_length() {
        assert_eq!(
            clamped_date(2025, 2, 31),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            clamped_date(2024, 2, 31),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            clamped_date(2025, 6, 15),
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
    }

    #[test]
    fn shift_month_wraps_years() {
        assert_eq!(shift_month(2025, 1, -1), (2024, 12));
        assert_eq!(shift_month(2025, 12, 1), (2026, 1));
        assert_eq!(shift_month(2025, 6, 0), (2025, 6));
        assert_eq!(shift_month(2025, 3, -15), (2023, 12));
    }
}
