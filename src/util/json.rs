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

use std::collections::HashMap;

pub use tinyjson::JsonValue::{
    self, Array as JsonArray, Null as JsonNull, Number as JsonNum, Object as JsonObj,
    String as JsonStr,
};

use crate::{Error, Result};

// helper functions
pub fn json_map<const N: usize>(vals: [(&str, JsonValue); N]) -> JsonValue {
    JsonObj(HashMap::from(vals.map(|(k, v)| (k.to_string(), v))))
}

pub fn json_str(val: &str) -> JsonValue {
    JsonStr(val.to_string())
}

/// Look up `key` in a JSON object. `None` for missing keys or non-objects.
pub fn json_field<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    value.get::<HashMap<String, JsonValue>>()?.get(key)
}

/// Look up a string field.
pub fn json_field_str<'a>(value: &'a JsonValue, key: &str) -> Option<&'a str> {
    json_field(value, key)?.get::<String>().map(String::as_str)
}

/// Read an unsigned integer that may be encoded either as a JSON number
/// or as a decimal string. The indexer uses both forms.
pub fn json_as_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonNum(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        JsonStr(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Look up an unsigned integer field, see [`json_as_u64`].
pub fn json_field_u64(value: &JsonValue, key: &str) -> Option<u64> {
    json_as_u64(json_field(value, key)?)
}

/// Parse a JSON document from a string.
pub fn json_parse(data: &str) -> Result<JsonValue> {
    data.parse::<JsonValue>().map_err(Error::from)
}
