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

/// Customer, business and tier types
pub mod model;
pub use model::{Action, Business, CustomerRecord, Reward, Tier};

/// Category templates and demo data
pub mod catalog;

/// Outbound contract payloads
pub mod payload;
pub use payload::{OpCode, TransactionMessage, TransactionRequest};

/// Deep links and business ids
pub mod deeplink;

/// Point earning rules and on-chain snapshots
pub mod points;
pub use points::OnChainSnapshot;

/// Local/on-chain reconciliation
pub mod reconcile;
pub use reconcile::{MergePolicy, PointsDivergence, ReconcileOutcome};

pub mod service;
pub use service::{BusinessMetadata, LoyaltyService, ServiceSettings, SyncReport, WalletConnector};
