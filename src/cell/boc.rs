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

use super::{ArcCell, BagOfCells, Cell};
use crate::{util::encoding::base64, Error, Result};

const GENERIC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];
const INDEXED_MAGIC: [u8; 4] = [0x68, 0xff, 0x65, 0xf3];
const INDEXED_CRC32_MAGIC: [u8; 4] = [0xac, 0xc3, 0xa7, 0x28];

/// A serialized cell is at least its two descriptor bytes.
const MIN_CELL_BYTES: u64 = 2;

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// Validate the counts of a BoC header against the length of the buffer.
///
/// Indexer replies are untrusted, and a header may announce billions of
/// cells in a few dozen bytes. Such input is rejected here, before the
/// parser sizes anything from it.
pub fn check_header(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 6 {
        return Err(Error::DecodeError("BoC shorter than its header"))
    }

    let magic = &bytes[..4];
    if magic != GENERIC_MAGIC && magic != INDEXED_MAGIC && magic != INDEXED_CRC32_MAGIC {
        return Err(Error::DecodeError("unknown BoC magic"))
    }

    let size_bytes = (bytes[4] & 0x07) as usize;
    let off_bytes = bytes[5] as usize;
    if size_bytes == 0 || size_bytes > 4 || off_bytes == 0 || off_bytes > 8 {
        return Err(Error::DecodeError("invalid BoC field sizes"))
    }

    let header_len = 6 + 3 * size_bytes + off_bytes;
    if bytes.len() < header_len {
        return Err(Error::DecodeError("truncated BoC header"))
    }

    let cells = read_be(&bytes[6..6 + size_bytes]);
    let roots = read_be(&bytes[6 + size_bytes..6 + 2 * size_bytes]);
    let cells_size = read_be(&bytes[6 + 3 * size_bytes..header_len]);
    let payload = (bytes.len() - header_len) as u64;

    if cells == 0 || roots == 0 || roots > cells {
        return Err(Error::DecodeError("invalid BoC cell counts"))
    }

    if cells.saturating_mul(MIN_CELL_BYTES) > payload || cells_size > payload {
        return Err(Error::DecodeError("BoC header exceeds its payload"))
    }

    Ok(())
}

/// Deserialize a single-root bag of cells.
pub fn from_bytes(bytes: &[u8]) -> Result<ArcCell> {
    check_header(bytes)?;
    let boc = BagOfCells::parse(bytes)?;
    Ok(boc.single_root()?.clone())
}

/// Deserialize a single-root bag of cells from base64 (either alphabet).
pub fn from_base64(b64: &str) -> Result<ArcCell> {
    let bytes = base64::decode(b64).ok_or(Error::DecodeError("invalid base64"))?;
    from_bytes(&bytes)
}

/// Serialize a cell tree with a CRC32C trailer.
pub fn to_bytes(root: &Cell) -> Result<Vec<u8>> {
    Ok(BagOfCells::from_root(root.clone()).serialize(true)?)
}

/// Serialize a cell tree as standard base64.
pub fn to_base64(root: &Cell) -> Result<String> {
    Ok(base64::encode(&to_bytes(root)?))
}
