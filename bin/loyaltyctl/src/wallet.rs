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

use async_trait::async_trait;
use log::info;

use loyaltylayer::{
    loyalty::{TransactionRequest, WalletConnector},
    util::json::JsonValue,
    Error, Result,
};

/// Hands transaction requests to an external signer by printing them as
/// JSON. With `dry_run` set the request is refused after printing, so no
/// local state changes.
pub struct PrintWallet {
    address: Option<String>,
    dry_run: bool,
}

impl PrintWallet {
    pub fn new(address: Option<String>, dry_run: bool) -> Self {
        Self { address, dry_run }
    }
}

#[async_trait]
impl WalletConnector for PrintWallet {
    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let json = JsonValue::try_from(request)?.format()?;
        println!("{}", json);

        if self.dry_run {
            return Err(Error::WalletRejected("dry run".to_string()))
        }

        info!(target: "loyaltyctl::wallet", "Transaction request handed off for signing");
        Ok(String::new())
    }
}
