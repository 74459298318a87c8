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

use std::{collections::HashMap, fmt};

use crate::{
    util::{
        json::{
            json_as_u64, json_field, json_field_str, json_field_u64, json_str, JsonArray, JsonNum,
            JsonObj, JsonStr, JsonValue,
        },
        parse::{from_nano, to_nano},
    },
    Error, Result,
};

/// Coarse loyalty rank derived from the visit count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    #[default]
    New,
    Member,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn from_visits(visits: u64) -> Self {
        match visits {
            20.. => Self::Gold,
            10.. => Self::Silver,
            5.. => Self::Bronze,
            1.. => Self::Member,
            0 => Self::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Member => "Member",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }

    /// Case-insensitive parse. Unknown names map to `New`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "member" => Self::Member,
            "bronze" => Self::Bronze,
            "silver" => Self::Silver,
            "gold" => Self::Gold,
            _ => Self::New,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reward a customer can redeem points for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub points: u64,
    pub description: String,
}

/// A catalog purchase with a fixed price and point award
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub name: String,
    /// Price in nano TON
    pub amount: u64,
    pub points: u64,
}

/// A business running a loyalty program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub contract_address: String,
    pub rewards: Vec<Reward>,
    pub actions: Vec<Action>,
}

impl Business {
    pub fn reward(&self, id: &str) -> Result<&Reward> {
        self.rewards.iter().find(|r| r.id == id).ok_or_else(|| Error::RewardNotFound(id.to_string()))
    }

    pub fn action(&self, id: &str) -> Result<&Action> {
        self.actions.iter().find(|a| a.id == id).ok_or_else(|| Error::ActionNotFound(id.to_string()))
    }
}

/// A customer's standing with one business, keyed by (wallet, business)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRecord {
    pub wallet_address: String,
    pub business_id: String,
    pub points: u64,
    pub total_visits: u64,
    pub streak_days: u64,
    pub tier: Tier,
    /// Total spent in nano TON
    pub total_spent: u64,
    /// ISO `YYYY-MM-DD`
    pub member_since: String,
    /// ISO `YYYY-MM-DD`
    pub last_visit: String,
    pub is_registered: bool,
}

impl CustomerRecord {
    /// Fresh record for a customer who just joined.
    pub fn new(wallet_address: &str, business_id: &str, today: &str) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            business_id: business_id.to_string(),
            points: 0,
            total_visits: 0,
            streak_days: 0,
            tier: Tier::New,
            total_spent: 0,
            member_since: today.to_string(),
            last_visit: today.to_string(),
            is_registered: false,
        }
    }
}

fn json_u64(v: u64) -> JsonValue {
    JsonNum(v as f64)
}

/// Amounts are written as decimal TON strings, and read back from either
/// a string or a JSON number.
fn amount_from_json(value: Option<&JsonValue>) -> Option<u64> {
    match value? {
        JsonStr(s) => to_nano(s).ok(),
        JsonNum(n) if *n >= 0.0 => to_nano(&n.to_string()).ok(),
        _ => None,
    }
}

impl From<&Reward> for JsonValue {
    fn from(r: &Reward) -> JsonValue {
        JsonObj(HashMap::from([
            ("id".to_string(), json_str(&r.id)),
            ("name".to_string(), json_str(&r.name)),
            ("points".to_string(), json_u64(r.points)),
            ("description".to_string(), json_str(&r.description)),
        ]))
    }
}

impl TryFrom<&JsonValue> for Reward {
    type Error = Error;

    fn try_from(value: &JsonValue) -> Result<Self> {
        let (Some(id), Some(points)) = (json_field_str(value, "id"), json_field_u64(value, "points"))
        else {
            return Err(Error::ParseFailed("Reward has no valid id/points"))
        };

        Ok(Self {
            id: id.to_string(),
            name: json_field_str(value, "name").unwrap_or(id).to_string(),
            points,
            description: json_field_str(value, "description").unwrap_or_default().to_string(),
        })
    }
}

impl From<&Action> for JsonValue {
    fn from(a: &Action) -> JsonValue {
        JsonObj(HashMap::from([
            ("id".to_string(), json_str(&a.id)),
            ("name".to_string(), json_str(&a.name)),
            ("amount".to_string(), JsonStr(from_nano(a.amount))),
            ("points".to_string(), json_u64(a.points)),
        ]))
    }
}

impl TryFrom<&JsonValue> for Action {
    type Error = Error;

    fn try_from(value: &JsonValue) -> Result<Self> {
        let (Some(id), Some(amount), Some(points)) = (
            json_field_str(value, "id"),
            amount_from_json(json_field(value, "amount")),
            json_field_u64(value, "points"),
        ) else {
            return Err(Error::ParseFailed("Action has no valid id/amount/points"))
        };

        Ok(Self {
            id: id.to_string(),
            name: json_field_str(value, "name").unwrap_or(id).to_string(),
            amount,
            points,
        })
    }
}

impl From<&Business> for JsonValue {
    fn from(b: &Business) -> JsonValue {
        JsonObj(HashMap::from([
            ("businessId".to_string(), json_str(&b.id)),
            ("name".to_string(), json_str(&b.name)),
            ("description".to_string(), json_str(&b.description)),
            ("category".to_string(), json_str(&b.category)),
            ("contractAddress".to_string(), json_str(&b.contract_address)),
            ("rewards".to_string(), JsonArray(b.rewards.iter().map(JsonValue::from).collect())),
            ("actions".to_string(), JsonArray(b.actions.iter().map(JsonValue::from).collect())),
        ]))
    }
}

/// Parse a JSON list, skipping entries that fail to parse.
/// `None` if the field is missing or not an array.
pub(crate) fn json_list<T>(value: &JsonValue, key: &str) -> Option<Vec<T>>
where
    T: for<'a> TryFrom<&'a JsonValue>,
{
    let items = json_field(value, key)?.get::<Vec<JsonValue>>()?;
    Some(items.iter().filter_map(|i| T::try_from(i).ok()).collect())
}

impl From<&CustomerRecord> for JsonValue {
    fn from(c: &CustomerRecord) -> JsonValue {
        JsonObj(HashMap::from([
            ("walletAddress".to_string(), json_str(&c.wallet_address)),
            ("businessId".to_string(), json_str(&c.business_id)),
            ("points".to_string(), json_u64(c.points)),
            ("totalVisits".to_string(), json_u64(c.total_visits)),
            ("streakDays".to_string(), json_u64(c.streak_days)),
            ("tier".to_string(), json_str(c.tier.as_str())),
            ("totalSpent".to_string(), JsonStr(from_nano(c.total_spent))),
            ("memberSince".to_string(), json_str(&c.member_since)),
            ("lastVisit".to_string(), json_str(&c.last_visit)),
            ("isRegistered".to_string(), JsonValue::Boolean(c.is_registered)),
        ]))
    }
}

impl TryFrom<&JsonValue> for CustomerRecord {
    type Error = Error;

    fn try_from(value: &JsonValue) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::ParseFailed("Customer record is not an object"))
        }

        let (Some(wallet_address), Some(business_id)) =
            (json_field_str(value, "walletAddress"), json_field_str(value, "businessId"))
        else {
            return Err(Error::ParseFailed("Customer record has no wallet/business"))
        };

        let count = |key: &str| json_field(value, key).and_then(json_as_u64).unwrap_or(0);
        let date = |key: &str| json_field_str(value, key).unwrap_or_default().to_string();

        Ok(Self {
            wallet_address: wallet_address.to_string(),
            business_id: business_id.to_string(),
            points: count("points"),
            total_visits: count("totalVisits"),
            streak_days: count("streakDays"),
            tier: Tier::parse(json_field_str(value, "tier").unwrap_or_default()),
            total_spent: amount_from_json(json_field(value, "totalSpent")).unwrap_or(0),
            member_since: date("memberSince"),
            last_visit: date("lastVisit"),
            is_registered: matches!(json_field(value, "isRegistered"), Some(JsonValue::Boolean(true))),
        })
    }
}
