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

//! Local persistence of customer records and joined businesses.

use log::{debug, warn};
use sled_overlay::sled;

use crate::{
    loyalty::{
        catalog::{template_for, DEFAULT_CONTRACT_ADDRESS, DEFAULT_DESCRIPTION},
        deeplink::{format_business_name, DEFAULT_CATEGORY},
        model::{json_list, Business, CustomerRecord},
    },
    util::json::{json_field_str, json_parse, JsonValue},
    Result,
};

/// Sled tree holding all loyalty records
const SLED_LOYALTY_TREE: &[u8] = b"_loyalty";

const CUSTOMER_PREFIX: &str = "customer_";
const BUSINESS_PREFIX: &str = "business_";

fn customer_key(wallet: &str, business_id: &str) -> String {
    format!("{}{}_{}", CUSTOMER_PREFIX, wallet, business_id)
}

fn business_key(business_id: &str) -> String {
    format!("{}{}", BUSINESS_PREFIX, business_id)
}

/// Build a business from stored JSON, filling whatever is missing.
fn business_from_json(business_id: &str, value: &JsonValue) -> Business {
    let category = json_field_str(value, "category").unwrap_or(DEFAULT_CATEGORY);
    let (rewards, actions) = template_for(category);

    let name = match json_field_str(value, "name") {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => format_business_name(business_id),
    };

    let contract_address = match json_field_str(value, "contractAddress") {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => DEFAULT_CONTRACT_ADDRESS.to_string(),
    };

    let rewards = json_list(value, "rewards").filter(|r: &Vec<_>| !r.is_empty()).unwrap_or(rewards);
    let actions = json_list(value, "actions").filter(|a: &Vec<_>| !a.is_empty()).unwrap_or(actions);

    Business {
        id: business_id.to_string(),
        name,
        description: json_field_str(value, "description").unwrap_or(DEFAULT_DESCRIPTION).to_string(),
        category: category.to_string(),
        contract_address,
        rewards,
        actions,
    }
}

/// Business shown for a record whose metadata is missing or unreadable
pub fn default_business(business_id: &str) -> Business {
    let (rewards, actions) = template_for(DEFAULT_CATEGORY);
    Business {
        id: business_id.to_string(),
        name: format_business_name(business_id),
        description: DEFAULT_DESCRIPTION.to_string(),
        category: DEFAULT_CATEGORY.to_string(),
        contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
        rewards,
        actions,
    }
}

/// The `LocalStore` is a `sled` tree keyed by `customer_<wallet>_<business>`
/// and `business_<business>`, with JSON documents as values.
#[derive(Clone)]
pub struct LocalStore(pub sled::Tree);

impl LocalStore {
    /// Opens a new or existing `LocalStore` on the given sled database.
    pub fn new(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(SLED_LOYALTY_TREE)?;
        Ok(Self(tree))
    }

    fn get_json(&self, key: &str) -> Result<Option<JsonValue>> {
        let Some(found) = self.0.get(key.as_bytes())? else { return Ok(None) };

        let parsed = std::str::from_utf8(&found).map_err(crate::Error::from).and_then(json_parse);
        match parsed {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(target: "store::get_json", "Ignoring malformed entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn put_json(&self, key: &str, value: &JsonValue) -> Result<()> {
        let data = value.stringify()?;
        self.0.insert(key.as_bytes(), data.as_bytes())?;
        debug!(target: "store::put_json", "Stored {}", key);
        Ok(())
    }

    /// Fetch the record of `wallet` at `business_id`.
    pub fn get_customer(&self, wallet: &str, business_id: &str) -> Result<Option<CustomerRecord>> {
        let key = customer_key(wallet, business_id);
        let Some(value) = self.get_json(&key)? else { return Ok(None) };

        match CustomerRecord::try_from(&value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(target: "store::get_customer", "Ignoring malformed record {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Write a customer record, replacing any previous one.
    pub fn put_customer(&self, record: &CustomerRecord) -> Result<()> {
        let key = customer_key(&record.wallet_address, &record.business_id);
        self.put_json(&key, &JsonValue::from(record))
    }

    /// Fetch a business. Missing fields are filled with defaults.
    pub fn get_business(&self, business_id: &str) -> Result<Option<Business>> {
        let Some(value) = self.get_json(&business_key(business_id))? else { return Ok(None) };
        if !value.is_object() {
            return Ok(None)
        }
        Ok(Some(business_from_json(business_id, &value)))
    }

    pub fn put_business(&self, business: &Business) -> Result<()> {
        self.put_json(&business_key(&business.id), &JsonValue::from(business))
    }

    /// Ids of all businesses `wallet` has a record with.
    /// This scans every customer key of the wallet.
    pub fn business_ids_for_customer(&self, wallet: &str) -> Result<Vec<String>> {
        let prefix = format!("{}{}_", CUSTOMER_PREFIX, wallet);
        let mut ids = vec![];

        for entry in self.0.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            let key = String::from_utf8(key.to_vec())?;
            if let Some(id) = key.strip_prefix(&prefix) {
                ids.push(id.to_string());
            }
        }

        Ok(ids)
    }

    /// All businesses joined by `wallet` together with the customer record.
    pub fn joined_businesses(&self, wallet: &str) -> Result<Vec<(Business, CustomerRecord)>> {
        let mut ret = vec![];

        for id in self.business_ids_for_customer(wallet)? {
            let Some(record) = self.get_customer(wallet, &id)? else { continue };
            let business = match self.get_business(&id)? {
                Some(b) => b,
                None => default_business(&id),
            };
            ret.push((business, record));
        }

        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::{catalog::business_from_template, model::Tier};

    const WALLET: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

    fn store() -> LocalStore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        LocalStore::new(&db).unwrap()
    }

    #[test]
    fn customer_records() {
        let store = store();
        assert!(store.get_customer(WALLET, "cafe-1").unwrap().is_none());

        let mut rec = CustomerRecord::new(WALLET, "cafe-1", "2026-03-01");
        rec.points = 40;
        rec.total_visits = 6;
        rec.tier = Tier::Bronze;
        store.put_customer(&rec).unwrap();
        assert_eq!(store.get_customer(WALLET, "cafe-1").unwrap(), Some(rec.clone()));

        rec.points = 10;
        store.put_customer(&rec).unwrap();
        assert_eq!(store.get_customer(WALLET, "cafe-1").unwrap().unwrap().points, 10);

        store.0.insert(customer_key(WALLET, "broken-2").as_bytes(), b"{not json".to_vec()).unwrap();
        assert!(store.get_customer(WALLET, "broken-2").unwrap().is_none());
    }

    #[test]
    fn businesses() {
        let store = store();
        let cafe = business_from_template("cafe-1", "Cafe", "Coffee", "cafe", DEFAULT_CONTRACT_ADDRESS);
        store.put_business(&cafe).unwrap();
        assert_eq!(store.get_business("cafe-1").unwrap(), Some(cafe));

        store.0.insert(business_key("demo-shop-7").as_bytes(), br#"{"category": "retail"}"#.to_vec()).unwrap();
        let partial = store.get_business("demo-shop-7").unwrap().unwrap();
        assert_eq!(partial.name, "Shop");
        assert_eq!(partial.description, DEFAULT_DESCRIPTION);
        assert_eq!(partial.contract_address, DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(partial.rewards, template_for("retail").0);

        store.0.insert(business_key("bad").as_bytes(), b"\xff\xfe".to_vec()).unwrap();
        assert!(store.get_business("bad").unwrap().is_none());
    }

    #[test]
    fn joined() {
        let store = store();
        let other = "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ";

        store.put_customer(&CustomerRecord::new(WALLET, "demo-cafe-1", "2026-03-01")).unwrap();
        store.put_customer(&CustomerRecord::new(WALLET, "ton-books-2", "2026-03-02")).unwrap();
        store.put_customer(&CustomerRecord::new(other, "ton-books-2", "2026-03-02")).unwrap();
        store
            .put_business(&business_from_template(
                "ton-books-2",
                "TON Books",
                "Books",
                "retail",
                DEFAULT_CONTRACT_ADDRESS,
            ))
            .unwrap();

        let mut ids = store.business_ids_for_customer(WALLET).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["demo-cafe-1", "ton-books-2"]);

        let joined = store.joined_businesses(WALLET).unwrap();
        assert_eq!(joined.len(), 2);
        let (missing, rec) = joined.iter().find(|(b, _)| b.id == "demo-cafe-1").unwrap();
        assert_eq!(missing.category, DEFAULT_CATEGORY);
        assert_eq!(missing.description, DEFAULT_DESCRIPTION);
        assert_eq!(rec.member_since, "2026-03-01");

        assert_eq!(store.business_ids_for_customer(other).unwrap(), vec!["ton-books-2"]);
    }
}
