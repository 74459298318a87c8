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

use std::{fmt, str::FromStr};

use log::{info, warn};

use super::{
    model::{CustomerRecord, Tier},
    points::OnChainSnapshot,
};
use crate::{Error, Result};

/// How points are merged when the chain reports a different visit count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the larger of the local and on-chain balances
    #[default]
    KeepMax,
    /// Take the on-chain balance as is
    TrustChain,
}

impl FromStr for MergePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "keep-max" | "keepmax" => Ok(Self::KeepMax),
            "trust-chain" | "trustchain" => Ok(Self::TrustChain),
            _ => Err(Error::ParseFailed("unknown merge policy")),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::KeepMax => write!(f, "keep-max"),
            Self::TrustChain => write!(f, "trust-chain"),
        }
    }
}

/// The chain reports fewer points than the local record keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointsDivergence {
    pub local: u64,
    pub chain: u64,
}

/// Result of a reconciliation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Whether the record was modified
    pub changed: bool,
    pub divergence: Option<PointsDivergence>,
}

/// Merge an on-chain snapshot into the local record. Nothing happens
/// unless the visit counts differ.
pub fn reconcile(
    record: &mut CustomerRecord,
    snapshot: &OnChainSnapshot,
    policy: MergePolicy,
) -> ReconcileOutcome {
    if snapshot.total_visits == record.total_visits {
        return ReconcileOutcome::default()
    }

    let mut divergence = None;
    let points = match policy {
        MergePolicy::KeepMax => {
            if snapshot.points < record.points {
                warn!(
                    target: "loyalty::reconcile",
                    "Chain reports {} points for {} at {}, local keeps {}",
                    snapshot.points, record.wallet_address, record.business_id, record.points,
                );
                divergence = Some(PointsDivergence { local: record.points, chain: snapshot.points });
            }
            record.points.max(snapshot.points)
        }
        MergePolicy::TrustChain => snapshot.points,
    };

    info!(
        target: "loyalty::reconcile",
        "Synced {} at {}: visits {} -> {}, points {} -> {}",
        record.wallet_address, record.business_id, record.total_visits, snapshot.total_visits,
        record.points, points,
    );

    record.total_visits = snapshot.total_visits;
    record.points = points;
    record.tier = Tier::from_visits(snapshot.total_visits);

    ReconcileOutcome { changed: true, divergence }
}
