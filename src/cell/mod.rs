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

//! TON cell primitives.
//!
//! Cells, builders, parsers, bags of cells and addresses come from
//! `tonlib-core`. This module adds what the loyalty contracts need on
//! top: guarded BoC decoding of untrusted indexer replies, snake-string
//! fields, and address parsing into our [`Error`] type.

use std::str::FromStr;

pub use tonlib_core::{
    cell::{ArcCell, BagOfCells, Cell, CellBuilder, CellParser, TonCellError},
    TonAddress,
};

use crate::{Error, Result};

/// Bag-of-cells encoding and decoding
pub mod boc;

/// Snake-layout strings
pub mod snake;
pub use snake::{load_byte_string, load_snake_string, snake_cell};

/// Parse a raw (`wc:hex`) or user-friendly address.
///
/// [`TonAddress`] equality only considers the workchain and account
/// hash, so every spelling of one account compares equal.
pub fn parse_address(address: &str) -> Result<TonAddress> {
    let address = address.trim();
    TonAddress::from_str(address).map_err(|_| Error::InvalidAddress(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = "EQBWArzgGY3kDWzaq_kW-pcKUI4B4sZWuosyLQdc3LXlYZPv";
    const DEMO_RAW: &str = "0:5602bce0198de40d6cdaabf916fa970a508e01e2c656ba8b322d075cdcb5e561";
    const ZERO_NON_BOUNCEABLE: &str = "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ";
    const ZERO_BOUNCEABLE: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

    #[test]
    fn address_spellings_compare_equal() {
        let friendly = parse_address(DEMO).unwrap();
        let raw = parse_address(DEMO_RAW).unwrap();
        assert_eq!(friendly, raw);
        assert_eq!(friendly.workchain, 0);

        assert_eq!(parse_address(ZERO_BOUNCEABLE).unwrap(), parse_address(ZERO_NON_BOUNCEABLE).unwrap());
        assert_eq!(parse_address(&format!("  {DEMO}\n")).unwrap(), friendly);

        let master = parse_address("Ef8zMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzM0vF").unwrap();
        assert_eq!(master.workchain, -1);
    }

    #[test]
    fn invalid_addresses() {
        for bad in ["", "EQabc", "not-an-address", "0:zz", "EQBWArzgGY3kDWzaq_kW-pcKUI4B4sZWuosyLQdc3LXlYZPw"] {
            assert!(matches!(parse_address(bad), Err(Error::InvalidAddress(_))), "{bad}");
        }
    }
}
