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

//! Typed get-method stack values.
//!
//! The indexer returns each stack entry as a `[kind, value]` pair. Entries
//! are parsed into [`StackItem`] once, and every decoding helper below is
//! total: malformed input degrades to an empty string or zero.

use log::debug;

use crate::{
    cell::{boc, load_byte_string, load_snake_string, ArcCell},
    util::{
        json::{json_field, json_field_str, json_str, JsonArray, JsonNum, JsonStr, JsonValue},
        parse::parse_stack_number,
    },
    Error,
};

/// One value of a get-method result stack.
#[derive(Clone, Debug, PartialEq)]
pub enum StackItem {
    Cell(ArcCell),
    Slice(ArcCell),
    Num(i128),
    Null,
}

impl StackItem {
    /// The underlying cell of `Cell` and `Slice` items.
    pub fn as_cell(&self) -> Option<&ArcCell> {
        match self {
            Self::Cell(c) | Self::Slice(c) => Some(c),
            _ => None,
        }
    }

    /// Decode a string value, see [`decode_string`].
    pub fn to_string_lossy(&self) -> String {
        decode_string(self)
    }
}

fn cell_from_json(value: Option<&JsonValue>) -> Option<ArcCell> {
    let value = value?;
    let b64 = match value {
        JsonStr(s) => s.as_str(),
        _ => json_field_str(value, "bytes").or_else(|| json_field_str(value, "b64"))?,
    };

    match boc::from_base64(b64) {
        Ok(cell) => Some(cell),
        Err(e) => {
            debug!(target: "indexer::stack::cell_from_json", "Undecodable cell: {}", e);
            None
        }
    }
}

fn num_from_json(value: Option<&JsonValue>) -> Option<i128> {
    match value? {
        JsonStr(s) => parse_stack_number(s).ok(),
        JsonNum(n) if n.fract() == 0.0 => Some(*n as i128),
        _ => None,
    }
}

impl From<&JsonValue> for StackItem {
    /// Accepts `["cell", {"bytes": b64}]`, `["cell", b64]`, `["slice", ..]`,
    /// `["num", "0x2a"]`, `["int", "42"]` and `["null"]`, as well as the
    /// `{"type": .., "value": ..}` object form. Anything else is `Null`.
    fn from(value: &JsonValue) -> Self {
        let (kind, inner) = match value {
            JsonArray(pair) => match pair.first() {
                Some(JsonStr(kind)) => (kind.as_str(), pair.get(1)),
                _ => return Self::Null,
            },
            _ => match json_field_str(value, "type") {
                Some(kind) => (kind, json_field(value, "value")),
                None => return Self::Null,
            },
        };

        let item = match kind {
            "cell" | "tvm.Cell" => cell_from_json(inner).map(Self::Cell),
            "slice" | "tvm.Slice" => cell_from_json(inner).map(Self::Slice),
            "num" | "int" | "number" => num_from_json(inner).map(Self::Num),
            _ => None,
        };

        item.unwrap_or(Self::Null)
    }
}

/// Parse a whole stack. A non-array value yields an empty stack.
pub fn parse_stack(value: &JsonValue) -> Vec<StackItem> {
    match value {
        JsonArray(items) => items.iter().map(StackItem::from).collect(),
        _ => vec![],
    }
}

/// Decode a stack item as text.
///
/// Cells and slices are read as snake strings, falling back to 8-bit
/// characters up to the first zero byte. Numbers render in decimal.
pub fn decode_string(item: &StackItem) -> String {
    match item {
        StackItem::Cell(cell) | StackItem::Slice(cell) => match load_snake_string(cell) {
            Ok(s) => s,
            Err(e) => {
                debug!(target: "indexer::stack::decode_string", "Falling back to byte string: {}", e);
                load_byte_string(cell)
            }
        },
        StackItem::Num(n) => n.to_string(),
        StackItem::Null => String::new(),
    }
}

/// Decode a stack item as a number. Anything but `Num` yields 0.
pub fn decode_number(item: &StackItem) -> i128 {
    match item {
        StackItem::Num(n) => *n,
        _ => 0,
    }
}

/// Decode the first stack item as text, `""` on an empty stack.
pub fn decode_stack_string(stack: &[StackItem]) -> String {
    stack.first().map(decode_string).unwrap_or_default()
}

/// Decode the first stack item as a number, 0 on an empty stack.
pub fn decode_stack_number(stack: &[StackItem]) -> i128 {
    stack.first().map(decode_number).unwrap_or(0)
}

/// Outbound get-method argument.
#[derive(Clone, Debug, PartialEq)]
pub enum StackArg {
    Num(i128),
    Cell(ArcCell),
    Slice(ArcCell),
}

impl TryFrom<&StackArg> for JsonValue {
    type Error = Error;

    fn try_from(arg: &StackArg) -> Result<JsonValue, Error> {
        let (kind, value) = match arg {
            StackArg::Num(n) => ("num", n.to_string()),
            StackArg::Cell(c) => ("tvm.Cell", boc::to_base64(c)?),
            StackArg::Slice(c) => ("tvm.Slice", boc::to_base64(c)?),
        };
        Ok(JsonArray(vec![json_str(kind), JsonStr(value)]))
    }
}
