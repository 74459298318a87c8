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

use log::debug;

use super::stack::{parse_stack, StackItem};
use crate::{
    cell::{boc, parse_address, ArcCell, TonAddress},
    util::json::{json_as_u64, json_field, json_field_str, json_field_u64, JsonNum, JsonStr, JsonValue},
    Error, Result,
};

/// Reply of a `runGetMethod` call
#[derive(Clone, Debug, PartialEq)]
pub struct GetMethodResult {
    pub exit_code: i64,
    pub gas_used: u64,
    pub stack: Vec<StackItem>,
}

impl TryFrom<&JsonValue> for GetMethodResult {
    type Error = Error;

    fn try_from(value: &JsonValue) -> Result<Self> {
        let Some(stack) = json_field(value, "stack") else {
            return Err(Error::UnexpectedIndexerReply("runGetMethod result has no stack".to_string()))
        };

        let exit_code = match json_field(value, "exit_code") {
            Some(JsonNum(n)) => *n as i64,
            Some(JsonStr(s)) => s.parse().unwrap_or(0),
            _ => 0,
        };

        Ok(Self {
            exit_code,
            gas_used: json_field_u64(value, "gas_used").unwrap_or(0),
            stack: parse_stack(stack),
        })
    }
}

/// Inbound message of an indexed transaction
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    /// Sender, empty for external messages
    pub source: String,
    pub destination: String,
    /// Attached value in nano TON
    pub value: u64,
    /// Decoded message body, if it was a raw BoC
    pub body: Option<ArcCell>,
    /// Explicit op code reported by the indexer, if any
    pub op_code: Option<u32>,
}

impl InboundMessage {
    /// Op code of the message: the leading 32 bits of the body when
    /// present, else the indexer-reported `op_code`, else 0.
    pub fn op_code(&self) -> u32 {
        if let Some(body) = &self.body {
            if let Ok(op) = body.parser().load_u32(32) {
                return op
            }
        }
        self.op_code.unwrap_or(0)
    }

    /// Whether this message was sent by `wallet` to `contract`. Addresses
    /// are compared by account, so raw and friendly forms match.
    pub fn is_between(&self, wallet: &TonAddress, contract: &TonAddress) -> bool {
        let source = parse_address(&self.source).ok();
        let destination = parse_address(&self.destination).ok();
        source.as_ref() == Some(wallet) && destination.as_ref() == Some(contract)
    }
}

fn parse_op_code(value: &JsonValue) -> Option<u32> {
    match value {
        JsonNum(n) if *n >= 0.0 => Some(*n as u32),
        JsonStr(s) => crate::util::parse::parse_stack_number(s).ok().map(|n| n as u32),
        _ => None,
    }
}

impl From<&JsonValue> for InboundMessage {
    fn from(value: &JsonValue) -> Self {
        let msg_data = json_field(value, "msg_data");

        let body = msg_data
            .and_then(|d| json_field_str(d, "body"))
            .filter(|b| !b.is_empty())
            .and_then(|b| match boc::from_base64(b) {
                Ok(cell) => Some(cell),
                Err(e) => {
                    debug!(target: "indexer::types::InboundMessage", "Undecodable body: {}", e);
                    None
                }
            });

        let op_code = json_field(value, "op_code")
            .or_else(|| msg_data.and_then(|d| json_field(d, "op_code")))
            .and_then(parse_op_code);

        Self {
            source: json_field_str(value, "source").unwrap_or_default().to_string(),
            destination: json_field_str(value, "destination").unwrap_or_default().to_string(),
            value: json_field_u64(value, "value").unwrap_or(0),
            body,
            op_code,
        }
    }
}

/// A transaction as returned by `getTransactions`
#[derive(Clone, Debug, PartialEq)]
pub struct IndexerTransaction {
    /// Unix time of the transaction
    pub utime: u64,
    pub lt: String,
    pub hash: String,
    pub fee: u64,
    pub in_msg: Option<InboundMessage>,
}

impl From<&JsonValue> for IndexerTransaction {
    fn from(value: &JsonValue) -> Self {
        let tx_id = json_field(value, "transaction_id");
        let id_str =
            |key: &str| tx_id.and_then(|t| json_field_str(t, key)).unwrap_or_default().to_string();

        Self {
            utime: json_field(value, "utime").and_then(json_as_u64).unwrap_or(0),
            lt: id_str("lt"),
            hash: id_str("hash"),
            fee: json_field_u64(value, "fee").unwrap_or(0),
            in_msg: json_field(value, "in_msg").filter(|m| m.is_object()).map(InboundMessage::from),
        }
    }
}

/// Account state as returned by `getAddressInformation`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressInformation {
    /// Balance in nano TON
    pub balance: u64,
    /// `active`, `uninitialized` or `frozen`
    pub state: String,
    pub last_transaction_lt: Option<String>,
    pub sync_utime: u64,
}

impl AddressInformation {
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

impl From<&JsonValue> for AddressInformation {
    fn from(value: &JsonValue) -> Self {
        Self {
            balance: json_field_u64(value, "balance").unwrap_or(0),
            state: json_field_str(value, "state").unwrap_or("uninitialized").to_string(),
            last_transaction_lt: json_field(value, "last_transaction_id")
                .and_then(|t| json_field_str(t, "lt"))
                .map(String::from),
            sync_utime: json_field_u64(value, "sync_utime").unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cell::CellBuilder, util::json::json_parse};

    const EMPTY_CELL_BOC: &str = "te6cckEBAQEAAgAAAEysuc0=";

    const WALLET: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";
    const CONTRACT: &str = "EQBWArzgGY3kDWzaq_kW-pcKUI4B4sZWuosyLQdc3LXlYZPv";

    #[test]
    fn transaction_with_body() {
        let mut b = CellBuilder::new();
        b.store_u32(32, 3).unwrap();
        let body = boc::to_base64(&b.build().unwrap()).unwrap();

        let raw = format!(
            r#"{{"utime": 1700000000, "fee": "1000",
                "transaction_id": {{"lt": "47", "hash": "abc="}},
                "in_msg": {{"source": "{WALLET}", "destination": "{CONTRACT}",
                           "value": "50000000", "msg_data": {{"body": "{body}"}}}}}}"#
        );
        let tx = IndexerTransaction::from(&json_parse(&raw).unwrap());
        assert_eq!(tx.utime, 1_700_000_000);
        assert_eq!(tx.lt, "47");
        assert_eq!(tx.fee, 1000);

        let msg = tx.in_msg.unwrap();
        assert_eq!(msg.value, 50_000_000);
        assert_eq!(msg.op_code(), 3);

        let wallet = parse_address(WALLET).unwrap();
        let contract = parse_address(CONTRACT).unwrap();
        assert!(msg.is_between(&wallet, &contract));
        assert!(!msg.is_between(&contract, &wallet));
    }

    #[test]
    fn op_code_fallbacks() {
        let v = json_parse(r#"{"source": "", "destination": "", "value": 0, "op_code": "0x2"}"#).unwrap();
        assert_eq!(InboundMessage::from(&v).op_code(), 2);

        let v = json_parse(r#"{"source": "", "msg_data": {"body": "", "op_code": 7}}"#).unwrap();
        assert_eq!(InboundMessage::from(&v).op_code(), 7);

        let raw = format!(r#"{{"msg_data": {{"body": "{EMPTY_CELL_BOC}"}}}}"#);
        let msg = InboundMessage::from(&json_parse(&raw).unwrap());
        assert!(msg.body.is_some());
        assert_eq!(msg.op_code(), 0);
    }

    #[test]
    fn get_method_and_account() {
        let v = json_parse(r#"{"gas_used": 500, "exit_code": 0, "stack": [["num", "0x3"]]}"#).unwrap();
        let res = GetMethodResult::try_from(&v).unwrap();
        assert_eq!(res.stack, vec![StackItem::Num(3)]);
        assert_eq!(res.gas_used, 500);

        assert!(GetMethodResult::try_from(&json_parse("{}").unwrap()).is_err());

        let v = json_parse(
            r#"{"balance": "123", "state": "active", "sync_utime": 5,
                "last_transaction_id": {"lt": "9", "hash": "x"}}"#,
        )
        .unwrap();
        let info = AddressInformation::from(&v);
        assert!(info.is_active());
        assert_eq!(info.balance, 123);
        assert_eq!(info.last_transaction_lt.as_deref(), Some("9"));
    }
}
