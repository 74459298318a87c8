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

use super::{Cell, CellBuilder};
use crate::{Error, Result};

/// Whole bytes that fit in the 1023 data bits of one cell
pub const SNAKE_SEGMENT_BYTES: usize = 127;

/// Build a snake-layout string: the bytes fill this cell, and the
/// overflow continues in a chain of first references.
pub fn snake_cell(text: &str) -> Result<Cell> {
    let mut tail: Option<Cell> = None;

    for segment in text.as_bytes().chunks(SNAKE_SEGMENT_BYTES).rev() {
        let mut builder = CellBuilder::new();
        builder.store_slice(segment)?;
        if let Some(next) = tail.take() {
            builder.store_child(next)?;
        }
        tail = Some(builder.build()?);
    }

    match tail {
        Some(cell) => Ok(cell),
        None => Ok(CellBuilder::new().build()?),
    }
}

/// Whole data bytes of a cell
fn whole_bytes(cell: &Cell) -> &[u8] {
    let data = cell.data();
    &data[..(cell.bit_len() / 8).min(data.len())]
}

/// Read a snake-layout string starting at `cell`. Fails when a segment
/// is not a whole number of bytes, or the bytes are not UTF-8.
pub fn load_snake_string(cell: &Cell) -> Result<String> {
    let mut bytes = vec![];
    let mut current = cell;

    loop {
        if current.bit_len() % 8 != 0 {
            return Err(Error::DecodeError("string segment is not byte aligned"))
        }
        bytes.extend_from_slice(whole_bytes(current));

        match current.references().first() {
            Some(next) => current = next.as_ref(),
            None => break,
        }
    }

    Ok(String::from_utf8(bytes)?)
}

/// Read 8-bit characters of `cell` up to the first zero byte. Each byte
/// maps to the character of the same code, trailing partial bits are
/// ignored.
pub fn load_byte_string(cell: &Cell) -> String {
    whole_bytes(cell).iter().take_while(|b| **b != 0).map(|b| char::from(*b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printable_ascii() -> String {
        (0x20u8..=0x7e).map(char::from).collect()
    }

    #[test]
    fn printable_ascii_within_one_segment() {
        let charset = printable_ascii();
        for len in 0..=charset.len() {
            let text = &charset[..len];
            let cell = snake_cell(text).unwrap();
            assert!(cell.references().is_empty());
            assert_eq!(load_snake_string(&cell).unwrap(), text);
        }

        let full = charset.repeat(2)[..SNAKE_SEGMENT_BYTES].to_string();
        let cell = snake_cell(&full).unwrap();
        assert_eq!(cell.bit_len(), SNAKE_SEGMENT_BYTES * 8);
        assert!(cell.references().is_empty());
        assert_eq!(load_snake_string(&cell).unwrap(), full);
    }

    #[test]
    fn printable_ascii_across_segments() {
        let long = printable_ascii().repeat(5);
        for len in (SNAKE_SEGMENT_BYTES + 1)..=long.len() {
            let text = &long[..len];
            let cell = snake_cell(text).unwrap();
            assert_eq!(cell.bit_len(), SNAKE_SEGMENT_BYTES * 8);
            assert_eq!(cell.references().len(), 1);
            assert_eq!(load_snake_string(&cell).unwrap(), text);
        }
    }

    #[test]
    fn segment_layout() {
        let root = snake_cell(&"x".repeat(300)).unwrap();
        assert_eq!(root.bit_len(), 127 * 8);
        let second = &root.references()[0];
        assert_eq!(second.bit_len(), 127 * 8);
        let third = &second.references()[0];
        assert_eq!(third.bit_len(), 46 * 8);
        assert!(third.references().is_empty());

        assert_eq!(load_snake_string(&snake_cell("Café ☕ loyalty").unwrap()).unwrap(), "Café ☕ loyalty");
    }

    #[test]
    fn unaligned_and_invalid() {
        let mut b = CellBuilder::new();
        b.store_u32(3, 0b101).unwrap();
        assert!(load_snake_string(&b.build().unwrap()).is_err());

        let mut b = CellBuilder::new();
        b.store_slice(&[0xff, 0xfe]).unwrap();
        assert!(load_snake_string(&b.build().unwrap()).is_err());
    }

    #[test]
    fn byte_string() {
        let mut b = CellBuilder::new();
        b.store_slice(b"Gold\0tail").unwrap();
        assert_eq!(load_byte_string(&b.build().unwrap()), "Gold");

        let mut b = CellBuilder::new();
        b.store_slice(&[0x43, 0xe9]).unwrap();
        b.store_u32(3, 1).unwrap();
        assert_eq!(load_byte_string(&b.build().unwrap()), "Cé");
    }
}
