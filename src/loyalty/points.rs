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

//! Point earning rules, both for local bookkeeping after an action and
//! for the on-chain estimate computed from indexed transactions.

use log::debug;

use super::payload::OpCode;
use crate::{cell::TonAddress, indexer::IndexerTransaction, util::time::Timestamp};

/// Smallest inbound value counted as a loyalty transaction (0.05 TON)
pub const MIN_ONCHAIN_VALUE: u64 = 50_000_000;

/// Points granted on registration
pub const WELCOME_BONUS: u64 = 100;

/// Points credited by the contract for one inbound message.
/// Purchases earn one point per 0.1 TON, at least one.
pub fn onchain_points(op: u32, value: u64) -> u64 {
    match OpCode::from_u32(op) {
        Some(OpCode::Purchase) => (value / 100_000_000).max(1),
        Some(OpCode::Register) => 10,
        Some(OpCode::CheckIn) => 5,
        Some(OpCode::Tip) => 2,
        _ => 0,
    }
}

/// Local points for a free-amount payment: 10 per TON, rounded, at least one.
pub fn payment_points(amount: u64) -> u64 {
    (amount.saturating_add(50_000_000) / 100_000_000).max(1)
}

/// Local points for a tip: 5 per TON, rounded, at least one.
pub fn tip_points(amount: u64) -> u64 {
    (amount.saturating_add(100_000_000) / 200_000_000).max(1)
}

/// Local points for a check-in given the streak before it.
pub fn check_in_points(streak_days: u64) -> u64 {
    match streak_days {
        30.. => 50,
        7.. => 25,
        _ => 10,
    }
}

/// Customer standing derived from the indexer's transaction history
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OnChainSnapshot {
    pub points: u64,
    pub total_visits: u64,
    pub is_registered: bool,
    pub transaction_count: u64,
    /// Time of the newest counted transaction
    pub last_activity: Option<Timestamp>,
}

impl OnChainSnapshot {
    /// Aggregate the transactions sent by `wallet` to `contract` with at
    /// least [`MIN_ONCHAIN_VALUE`] attached. `txs` is newest first.
    pub fn from_transactions(txs: &[IndexerTransaction], wallet: &TonAddress, contract: &TonAddress) -> Self {
        let mut snapshot = Self::default();

        for tx in txs {
            let Some(msg) = &tx.in_msg else { continue };
            if !msg.is_between(wallet, contract) || msg.value < MIN_ONCHAIN_VALUE {
                continue
            }

            let op = msg.op_code();
            let points = onchain_points(op, msg.value);
            debug!(
                target: "loyalty::points::snapshot",
                "Counting tx {} (op={}, value={}) for {} points", tx.hash, op, msg.value, points,
            );

            if snapshot.last_activity.is_none() {
                snapshot.last_activity = Some(Timestamp(tx.utime as i64));
            }
            snapshot.points = snapshot.points.saturating_add(points);
            snapshot.transaction_count += 1;
        }

        snapshot.total_visits = snapshot.transaction_count;
        snapshot.is_registered = snapshot.transaction_count > 0;
        snapshot
    }
}
