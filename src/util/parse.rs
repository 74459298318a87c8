/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use crate::{Error, Result};

/// Number of decimals in one TON.
pub const TON_DECIMALS: usize = 9;

/// One TON expressed in nano.
pub const NANO_PER_TON: u64 = 1_000_000_000;

/// Parse a numeric stack value. Accepts plain decimal, or hexadecimal
/// with an `0x` prefix, both with an optional leading `-`.
pub fn parse_stack_number(value: &str) -> Result<i128> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let (radix, body) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };

    // Only the sign handled above is allowed
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(Error::ParseFailed("invalid stack number"))
    }

    let magnitude = u128::from_str_radix(body, radix)?;
    let number = if negative { 0i128.checked_sub_unsigned(magnitude) } else { i128::try_from(magnitude).ok() };

    number.ok_or(Error::ParseFailed("stack number out of range"))
}

/// Convert a decimal TON amount (e.g. `"1.5"`) into nano units.
/// At most 9 decimal places are accepted.
pub fn to_nano(amount: &str) -> Result<u64> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(Error::InvalidAmount(amount.to_string()))
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if frac.len() > TON_DECIMALS ||
        !whole.chars().all(|c| c.is_ascii_digit()) ||
        !frac.chars().all(|c| c.is_ascii_digit()) ||
        (whole.is_empty() && frac.is_empty())
    {
        return Err(Error::InvalidAmount(amount.to_string()))
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse()? };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<width$}", width = TON_DECIMALS).parse()?
    };

    whole
        .checked_mul(NANO_PER_TON)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| Error::InvalidAmount(amount.to_string()))
}

/// Render nano units as a decimal TON string without trailing zeros.
pub fn from_nano(nano: u64) -> String {
    let whole = nano / NANO_PER_TON;
    let frac = nano % NANO_PER_TON;
    if frac == 0 {
        return whole.to_string()
    }

    let frac = format!("{frac:0>width$}", width = TON_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
