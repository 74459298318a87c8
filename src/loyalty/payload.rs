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

//! Outbound loyalty contract payloads and the wallet transaction envelope.

use std::collections::HashMap;

use crate::{
    cell::{boc, parse_address, snake_cell, Cell, CellBuilder},
    util::json::{json_str, JsonArray, JsonNum, JsonObj, JsonStr, JsonValue},
    Error, Result,
};

/// Value attached to registration, check-in and redemption calls (0.05 TON)
pub const ACTION_FEE_NANO: u64 = 50_000_000;

/// Value attached to the bare join call (0.02 TON)
pub const JOIN_FEE_NANO: u64 = 20_000_000;

/// Seconds a transaction request stays valid
pub const VALID_FOR_SECS: i64 = 300;

/// Loyalty contract operation codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpCode {
    Register = 1,
    Purchase = 2,
    CheckIn = 3,
    Redeem = 5,
    Tip = 7,
}

impl OpCode {
    pub fn from_u32(op: u32) -> Option<Self> {
        match op {
            1 => Some(Self::Register),
            2 => Some(Self::Purchase),
            3 => Some(Self::CheckIn),
            5 => Some(Self::Redeem),
            7 => Some(Self::Tip),
            _ => None,
        }
    }
}

/// Start a call body with the op code and the given address inline.
fn begin_call(op: OpCode, address: &str) -> Result<CellBuilder> {
    let address = parse_address(address)?;
    let mut builder = CellBuilder::new();
    builder.store_u32(32, op as u32)?.store_address(&address)?;
    Ok(builder)
}

/// Encode `op:uint32`, the address, and each string field as its own
/// referenced snake-string cell.
pub fn encode_call(op: OpCode, address: &str, fields: &[&str]) -> Result<Cell> {
    let mut builder = begin_call(op, address)?;
    for field in fields {
        builder.store_child(snake_cell(field)?)?;
    }
    Ok(builder.build()?)
}

/// Customer registration / join
pub fn register_payload(wallet: &str) -> Result<Cell> {
    encode_call(OpCode::Register, wallet, &[])
}

/// Business registration sent to the factory contract
pub fn business_registration_payload(
    sender: &str,
    name: &str,
    description: &str,
    category: &str,
) -> Result<Cell> {
    encode_call(OpCode::Register, sender, &[name, description, category])
}

/// Free-amount payment, credited to `wallet`
pub fn payment_payload(wallet: &str) -> Result<Cell> {
    encode_call(OpCode::Purchase, wallet, &[])
}

/// Catalog purchase of a fixed nano amount
pub fn purchase_payload(amount: u64) -> Result<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_u32(32, OpCode::Purchase as u32)?.store_u64(64, amount)?;
    Ok(builder.build()?)
}

/// Daily check-in. The streak day saturates at 255.
pub fn check_in_payload(wallet: &str, next_streak_day: u64) -> Result<Cell> {
    let day = u8::try_from(next_streak_day).unwrap_or(u8::MAX);
    let mut builder = begin_call(OpCode::CheckIn, wallet)?;
    builder.store_u32(8, day as u32)?;
    Ok(builder.build()?)
}

/// Reward redemption for `points`
pub fn redeem_payload(wallet: &str, points: u64) -> Result<Cell> {
    let mut builder = begin_call(OpCode::Redeem, wallet)?;
    builder.store_u64(64, points)?;
    Ok(builder.build()?)
}

/// Tip addressed to a staff member
pub fn tip_payload(staff: &str) -> Result<Cell> {
    encode_call(OpCode::Tip, staff, &[])
}

/// One message of a wallet transaction request
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionMessage {
    /// Destination contract
    pub address: String,
    /// Attached value in nano TON
    pub amount: u64,
    pub payload: Cell,
}

/// Transaction request handed to the wallet
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRequest {
    /// Unix time after which the wallet must reject the request
    pub valid_until: i64,
    pub messages: Vec<TransactionMessage>,
}

impl TransactionRequest {
    /// A request with a single message, valid for [`VALID_FOR_SECS`] from `now`.
    pub fn single(address: &str, amount: u64, payload: Cell, now: i64) -> Self {
        Self {
            valid_until: now + VALID_FOR_SECS,
            messages: vec![TransactionMessage {
                address: address.trim().to_string(),
                amount,
                payload,
            }],
        }
    }
}

impl TryFrom<&TransactionMessage> for JsonValue {
    type Error = Error;

    fn try_from(m: &TransactionMessage) -> Result<JsonValue> {
        Ok(JsonObj(HashMap::from([
            ("address".to_string(), json_str(&m.address)),
            ("amount".to_string(), JsonStr(m.amount.to_string())),
            ("payload".to_string(), JsonStr(boc::to_base64(&m.payload)?)),
        ])))
    }
}

impl TryFrom<&TransactionRequest> for JsonValue {
    type Error = Error;

    fn try_from(t: &TransactionRequest) -> Result<JsonValue> {
        let messages = t.messages.iter().map(JsonValue::try_from).collect::<Result<Vec<_>>>()?;

        Ok(JsonObj(HashMap::from([
            ("validUntil".to_string(), JsonNum(t.valid_until as f64)),
            ("messages".to_string(), JsonArray(messages)),
        ])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::{load_snake_string, CellParser, TonAddress},
        util::json::json_field,
    };

    const WALLET: &str = "Ef8zMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzM0vF";

    fn read_header(p: &mut CellParser) -> (u32, TonAddress) {
        (p.load_u32(32).unwrap(), p.load_address().unwrap())
    }

    #[test]
    fn business_registration_layout() {
        let cell = business_registration_payload(WALLET, "Demo Cafe", "Best coffee", "cafe").unwrap();
        assert_eq!(cell.bit_len(), 32 + 267);
        assert_eq!(cell.references().len(), 3);

        let (op, addr) = read_header(&mut cell.parser());
        assert_eq!(op, 1);
        assert_eq!(addr, parse_address(WALLET).unwrap());

        let fields: Vec<String> = cell.references().iter().map(|r| load_snake_string(r).unwrap()).collect();
        assert_eq!(fields, ["Demo Cafe", "Best coffee", "cafe"]);
    }

    #[test]
    fn action_layouts() {
        let cell = check_in_payload(WALLET, 4).unwrap();
        let mut p = cell.parser();
        assert_eq!(read_header(&mut p).0, 3);
        assert_eq!(p.load_u32(8).unwrap(), 4);

        let cell = check_in_payload(WALLET, 300).unwrap();
        let mut p = cell.parser();
        read_header(&mut p);
        assert_eq!(p.load_u32(8).unwrap(), 255);

        let cell = redeem_payload(WALLET, 150).unwrap();
        let mut p = cell.parser();
        assert_eq!(read_header(&mut p).0, 5);
        assert_eq!(p.load_u64(64).unwrap(), 150);

        let cell = purchase_payload(5_000_000_000).unwrap();
        assert_eq!(cell.bit_len(), 32 + 64);
        let mut p = cell.parser();
        assert_eq!(p.load_u32(32).unwrap(), 2);
        assert_eq!(p.load_u64(64).unwrap(), 5_000_000_000);

        let tip = tip_payload(WALLET).unwrap();
        assert_eq!(read_header(&mut tip.parser()).0, 7);
        let payment = payment_payload(WALLET).unwrap();
        assert_eq!(read_header(&mut payment.parser()).0, 2);

        assert_eq!(OpCode::from_u32(7), Some(OpCode::Tip));
        assert_eq!(OpCode::from_u32(4), None);
    }

    #[test]
    fn invalid_address() {
        assert!(matches!(register_payload("not-an-address"), Err(Error::InvalidAddress(_))));
        assert!(encode_call(OpCode::Tip, "EQabc", &["x"]).is_err());
    }

    #[test]
    fn envelope() {
        let payload = register_payload(WALLET).unwrap();
        let tx = TransactionRequest::single(" EQcontract ", JOIN_FEE_NANO, payload.clone(), 1000);
        assert_eq!(tx.valid_until, 1300);

        let json = JsonValue::try_from(&tx).unwrap();
        let messages = json_field(&json, "messages").unwrap().get::<Vec<JsonValue>>().unwrap();
        let msg = &messages[0];
        assert_eq!(json_field(msg, "address").unwrap().get::<String>().unwrap(), "EQcontract");
        assert_eq!(json_field(msg, "amount").unwrap().get::<String>().unwrap(), "20000000");

        let b64 = json_field(msg, "payload").unwrap().get::<String>().unwrap();
        assert_eq!(*boc::from_base64(b64).unwrap(), payload);
    }
}
