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

#![forbid(unsafe_code)]

//! Base64 as used by the TON toolchain. BoC payloads are encoded with
//! the standard alphabet. Decoding also accepts the URL-safe alphabet
//! some indexers reply with, with or without padding.

const STD_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode a byte slice into a padded base64 string (standard alphabet)
pub fn encode(data: &[u8]) -> String {
    let alphabet = STD_ALPHABET;
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let n = (b0 << 16) | (b1 << 8) | b2;

        out.push(alphabet[(n >> 18) as usize & 63] as char);
        out.push(alphabet[(n >> 12) as usize & 63] as char);

        if chunk.len() > 1 {
            out.push(alphabet[(n >> 6) as usize & 63] as char);
        } else {
            out.push('=');
        }

        if chunk.len() > 2 {
            out.push(alphabet[n as usize & 63] as char);
        } else {
            out.push('=');
        }
    }

    out
}


fn sextet(byte: u8) -> Option<u32> {
    let v = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' | b'-' => 62,
        b'/' | b'_' => 63,
        _ => return None,
    };
    Some(v as u32)
}

/// Tries to decode a base64 string into a byte vector.
/// Returns `None` if something fails.
pub fn decode(data: &str) -> Option<Vec<u8>> {
    let data = data.trim();
    if !data.is_ascii() || data.is_empty() {
        return None
    }

    let unpadded = data.trim_end_matches('=');
    if data.len() - unpadded.len() > 2 {
        return None
    }

    let bytes = unpadded.as_bytes();
    if bytes.len() % 4 == 1 {
        return None
    }

    let mut out = Vec::with_capacity(bytes.len() * 3 / 4);
    for chunk in bytes.chunks(4) {
        let mut n = 0u32;
        for (i, &b) in chunk.iter().enumerate() {
            n |= sextet(b)? << (18 - 6 * i);
        }

        out.push((n >> 16) as u8);
        if chunk.len() > 2 {
            out.push((n >> 8) as u8);
        }
        if chunk.len() > 3 {
            out.push(n as u8);
        }
    }

    Some(out)
}
