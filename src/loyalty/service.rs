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

//! Customer and business operations on top of the indexer, the local
//! store and a connected wallet.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use super::{
    catalog::{business_from_template, demo_businesses, DEFAULT_CONTRACT_ADDRESS},
    deeplink::parse_link,
    model::{Business, CustomerRecord, Tier},
    payload::{
        business_registration_payload, check_in_payload, payment_payload, purchase_payload,
        redeem_payload, register_payload, tip_payload, TransactionRequest, ACTION_FEE_NANO,
        JOIN_FEE_NANO,
    },
    points::{check_in_points, payment_points, tip_points, OnChainSnapshot, WELCOME_BONUS},
    reconcile::{reconcile, MergePolicy, ReconcileOutcome},
};
use crate::{
    cell::{load_snake_string, parse_address, Cell},
    indexer::{
        stack::{decode_stack_number, decode_string, StackArg, StackItem},
        AddressInformation, IndexerClient,
    },
    store::{default_business, LocalStore},
    util::time::{today, unix_millis, Timestamp},
    Error, Result,
};

/// Name the factory reports for unset slots
const UNNAMED_BUSINESS: &str = "Unnamed Business";

/// A wallet able to sign and send transaction requests.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Address of the connected account, `None` when disconnected.
    fn address(&self) -> Option<String>;

    /// Ask the wallet to sign and send `request`. Returns the signed
    /// message BoC as reported by the wallet.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String>;
}

/// Tunables of a [`LoyaltyService`]
#[derive(Clone, Debug)]
pub struct ServiceSettings {
    /// Factory contract listing registered businesses
    pub factory_address: Option<String>,
    /// Contract used when a link carries none
    pub fallback_contract: String,
    /// Serve demo businesses when the factory listing is empty or fails
    pub fallback_enabled: bool,
    pub merge_policy: MergePolicy,
    /// Number of transactions fetched for a snapshot
    pub tx_limit: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            factory_address: None,
            fallback_contract: DEFAULT_CONTRACT_ADDRESS.to_string(),
            fallback_enabled: false,
            merge_policy: MergePolicy::default(),
            tx_limit: 15,
        }
    }
}

/// Metadata a business contract reports about itself
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusinessMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Result of a [`LoyaltyService::sync`] call
#[derive(Clone, Debug)]
pub struct SyncReport {
    pub record: CustomerRecord,
    pub snapshot: OnChainSnapshot,
    pub outcome: ReconcileOutcome,
}

/// Id given to a business found in the factory listing
fn listed_business_id(name: &str, index: u64) -> String {
    let slug = name.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    format!("business-{}-{}", slug, index)
}

fn listed_business(name: &str, description: &str, category: &str, index: u64, contract: &str) -> Business {
    let description = if description.is_empty() { "No description available" } else { description };
    let category = if category.is_empty() { "General" } else { category };
    business_from_template(&listed_business_id(name, index), name, description, category, contract)
}

fn is_listable(name: &str) -> bool {
    !name.trim().is_empty() && name != UNNAMED_BUSINESS
}

/// Walk the `get_all_businesses` linked list. Every node carries name,
/// description and category refs, and optionally the next node as a
/// fourth ref. Parsing stops at the first malformed node.
pub fn parse_business_list(root: &Cell, contract: &str) -> Vec<Business> {
    let mut businesses = vec![];
    let mut current = Some(root);
    let mut index = 0;

    while let Some(cell) = current.take() {
        let refs = cell.references();
        if refs.len() < 3 {
            break
        }

        let mut fields = Vec::with_capacity(3);
        for field in &refs[..3] {
            match load_snake_string(field) {
                Ok(s) => fields.push(s),
                Err(e) => {
                    warn!(target: "loyalty::service::parse_business_list", "Malformed node: {}", e);
                    return businesses
                }
            }
        }

        if is_listable(&fields[0]) {
            businesses.push(listed_business(&fields[0], &fields[1], &fields[2], index, contract));
            index += 1;
        }

        current = refs.get(3).map(|next| next.as_ref());
    }

    businesses
}

/// Loyalty operations for the wallet connected through a [`WalletConnector`]
pub struct LoyaltyService {
    indexer: Arc<IndexerClient>,
    store: LocalStore,
    wallet: Arc<dyn WalletConnector>,
    settings: ServiceSettings,
}

impl LoyaltyService {
    pub fn new(
        indexer: Arc<IndexerClient>,
        store: LocalStore,
        wallet: Arc<dyn WalletConnector>,
        settings: ServiceSettings,
    ) -> Self {
        Self { indexer, store, wallet, settings }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn wallet_address(&self) -> Result<String> {
        self.wallet.address().filter(|a| !a.trim().is_empty()).ok_or(Error::WalletNotConnected)
    }

    fn business(&self, business_id: &str) -> Result<Business> {
        Ok(self.store.get_business(business_id)?.unwrap_or_else(|| default_business(business_id)))
    }

    fn customer(&self, wallet: &str, business_id: &str) -> Result<CustomerRecord> {
        self.store
            .get_customer(wallet, business_id)?
            .ok_or_else(|| Error::CustomerNotFound(business_id.to_string()))
    }

    fn registered_customer(&self, wallet: &str, business_id: &str) -> Result<CustomerRecord> {
        let record = self.customer(wallet, business_id)?;
        if !record.is_registered {
            return Err(Error::CustomerNotRegistered)
        }
        Ok(record)
    }

    /// Build a single-message request to `address`.
    fn request(&self, address: &str, amount: u64, payload: Cell) -> Result<TransactionRequest> {
        if address.trim().is_empty() {
            return Err(Error::MissingContractAddress)
        }
        Ok(TransactionRequest::single(address, amount, payload, Timestamp::current_time().0))
    }

    async fn send(&self, request: TransactionRequest) -> Result<String> {
        debug!(
            target: "loyalty::service::send",
            "Sending {} message(s), valid until {}", request.messages.len(), request.valid_until,
        );

        match self.wallet.send_transaction(&request).await {
            Ok(boc) => Ok(boc),
            Err(e) => {
                error!(target: "loyalty::service::send", "Wallet did not send the transaction: {}", e);
                Err(e)
            }
        }
    }

    /// Join a business from a deep link, web link or plain name. An
    /// existing record for the business is kept as is.
    pub fn join(&self, link: &str) -> Result<(Business, CustomerRecord)> {
        let wallet = self.wallet_address()?;
        let business = parse_link(link, &self.settings.fallback_contract)?.into_business(unix_millis()?);

        let record = match self.store.get_customer(&wallet, &business.id)? {
            Some(record) => record,
            None => CustomerRecord::new(&wallet, &business.id, &today()),
        };

        self.store.put_business(&business)?;
        self.store.put_customer(&record)?;

        info!(target: "loyalty::service::join", "Joined {} ({})", business.name, business.id);
        Ok((business, record))
    }

    /// Bare join call to a business contract, for wallets that want to
    /// announce themselves without the local flow.
    pub fn join_payload(&self, contract: &str) -> Result<TransactionRequest> {
        let wallet = self.wallet_address()?;
        self.request(contract, JOIN_FEE_NANO, register_payload(&wallet)?)
    }

    /// Register with a joined business. Registering twice is refused, so
    /// the welcome bonus is granted once.
    pub async fn register(&self, business_id: &str) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        let mut record = self.customer(&wallet, business_id)?;
        if record.is_registered {
            return Err(Error::CustomerAlreadyRegistered)
        }
        let business = self.business(business_id)?;

        let payload = register_payload(&wallet)?;
        self.send(self.request(&business.contract_address, ACTION_FEE_NANO, payload)?).await?;

        let date = today();
        record.points = record.points.saturating_add(WELCOME_BONUS);
        record.total_visits = 1;
        record.streak_days = 1;
        record.tier = Tier::from_visits(record.total_visits);
        record.member_since = date.clone();
        record.last_visit = date;
        record.is_registered = true;
        self.store.put_customer(&record)?;

        info!(target: "loyalty::service::register", "Registered {} at {}", wallet, business_id);
        Ok(record)
    }

    /// Register a new business with the factory contract.
    pub async fn register_business(&self, name: &str, description: &str, category: &str) -> Result<String> {
        let wallet = self.wallet_address()?;
        let Some(factory) = &self.settings.factory_address else {
            return Err(Error::MissingContractAddress)
        };

        let payload = business_registration_payload(&wallet, name, description, category)?;
        let boc = self.send(self.request(factory, ACTION_FEE_NANO, payload)?).await?;

        info!(target: "loyalty::service::register_business", "Registered business {}", name);
        Ok(boc)
    }

    /// Daily check-in.
    pub async fn check_in(&self, business_id: &str) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        let mut record = self.registered_customer(&wallet, business_id)?;
        let business = self.business(business_id)?;

        let payload = check_in_payload(&wallet, record.streak_days + 1)?;
        self.send(self.request(&business.contract_address, ACTION_FEE_NANO, payload)?).await?;

        let earned = check_in_points(record.streak_days);
        record.points = record.points.saturating_add(earned);
        record.total_visits = record.total_visits.saturating_add(1);
        record.streak_days = record.streak_days.saturating_add(1);
        record.tier = Tier::from_visits(record.total_visits);
        record.last_visit = today();
        self.store.put_customer(&record)?;

        info!(
            target: "loyalty::service::check_in",
            "Checked in at {}: +{} points, streak {}", business_id, earned, record.streak_days,
        );
        Ok(record)
    }

    /// Pay `amount` nano TON to the business contract.
    pub async fn pay(&self, business_id: &str, amount: u64) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        if amount == 0 {
            return Err(Error::InvalidAmount("payment must be positive".to_string()))
        }

        let mut record = self.customer(&wallet, business_id)?;
        let business = self.business(business_id)?;

        let payload = payment_payload(&wallet)?;
        self.send(self.request(&business.contract_address, amount, payload)?).await?;

        let earned = payment_points(amount);
        record.points = record.points.saturating_add(earned);
        record.total_visits = record.total_visits.saturating_add(1);
        record.total_spent = record.total_spent.saturating_add(amount);
        record.tier = Tier::from_visits(record.total_visits);
        record.last_visit = today();
        self.store.put_customer(&record)?;

        // The next snapshot has to see this payment
        self.indexer.clear_cache().await;

        info!(target: "loyalty::service::pay", "Paid {} nano at {}: +{} points", amount, business_id, earned);
        Ok(record)
    }

    /// Buy a catalog action of the business.
    pub async fn purchase(&self, business_id: &str, action_id: &str) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        let mut record = self.registered_customer(&wallet, business_id)?;
        let business = self.business(business_id)?;
        let action = business.action(action_id)?;

        let payload = purchase_payload(action.amount)?;
        self.send(self.request(&business.contract_address, action.amount, payload)?).await?;

        record.points = record.points.saturating_add(action.points);
        record.total_visits = record.total_visits.saturating_add(1);
        record.total_spent = record.total_spent.saturating_add(action.amount);
        record.tier = Tier::from_visits(record.total_visits);
        record.last_visit = today();
        self.store.put_customer(&record)?;

        info!(
            target: "loyalty::service::purchase",
            "Bought {} at {}: +{} points", action.name, business_id, action.points,
        );
        Ok(record)
    }

    /// Tip `staff` with `amount` nano TON.
    pub async fn tip(&self, business_id: &str, staff: &str, amount: u64) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        if amount == 0 {
            return Err(Error::InvalidAmount("tip must be positive".to_string()))
        }

        let mut record = self.customer(&wallet, business_id)?;
        let business = self.business(business_id)?;

        let payload = tip_payload(staff)?;
        self.send(self.request(&business.contract_address, amount, payload)?).await?;

        let earned = tip_points(amount);
        record.points = record.points.saturating_add(earned);
        record.last_visit = today();
        self.store.put_customer(&record)?;

        info!(target: "loyalty::service::tip", "Tipped {} nano at {}: +{} points", amount, business_id, earned);
        Ok(record)
    }

    /// Redeem a reward of the business.
    pub async fn redeem(&self, business_id: &str, reward_id: &str) -> Result<CustomerRecord> {
        let wallet = self.wallet_address()?;
        let mut record = self.customer(&wallet, business_id)?;
        let business = self.business(business_id)?;
        let reward = business.reward(reward_id)?;

        if record.points < reward.points {
            return Err(Error::InsufficientPoints(reward.points - record.points))
        }

        if !record.is_registered {
            return Err(Error::CustomerNotRegistered)
        }

        let payload = redeem_payload(&wallet, reward.points)?;
        self.send(self.request(&business.contract_address, ACTION_FEE_NANO, payload)?).await?;

        record.points -= reward.points;
        self.store.put_customer(&record)?;

        info!(target: "loyalty::service::redeem", "Redeemed {} at {}", reward.name, business_id);
        Ok(record)
    }

    /// On-chain standing of `wallet` with the business contract.
    pub async fn snapshot(&self, wallet: &str, contract: &str) -> Result<OnChainSnapshot> {
        let wallet_addr = parse_address(wallet)?;
        let contract_addr = parse_address(contract)?;

        let txs = self.indexer.get_transactions(contract, self.settings.tx_limit).await?;
        Ok(OnChainSnapshot::from_transactions(&txs, &wallet_addr, &contract_addr))
    }

    /// Fetch the on-chain snapshot of the connected wallet and merge it
    /// into the local record.
    pub async fn sync(&self, business_id: &str) -> Result<SyncReport> {
        let wallet = self.wallet_address()?;
        let mut record = self.customer(&wallet, business_id)?;
        let business = self.business(business_id)?;

        let snapshot = self.snapshot(&wallet, &business.contract_address).await?;
        let outcome = reconcile(&mut record, &snapshot, self.settings.merge_policy);
        if outcome.changed {
            self.store.put_customer(&record)?;
        }

        Ok(SyncReport { record, snapshot, outcome })
    }

    /// Balance and state of a contract account.
    pub async fn contract_info(&self, address: &str) -> Result<AddressInformation> {
        self.indexer.get_address_information(address).await
    }

    /// Read name, description and category from a business contract.
    /// Fails only when none of the three could be fetched.
    pub async fn business_metadata(&self, address: &str) -> Result<BusinessMetadata> {
        let methods = ["get_business_name", "get_business_description", "get_business_category"];
        let mut results = self.indexer.run_get_methods_sequentially(address, &methods).await;

        if results.iter().all(|r| r.is_err()) {
            return results.swap_remove(0).map(|_| BusinessMetadata::default())
        }

        let mut fields = results.into_iter().map(|r| match r {
            Ok(res) => res.stack.first().map(decode_string).unwrap_or_default(),
            Err(_) => String::new(),
        });

        Ok(BusinessMetadata {
            name: fields.next().unwrap_or_default(),
            description: fields.next().unwrap_or_default(),
            category: fields.next().unwrap_or_default(),
        })
    }

    /// Businesses registered with the factory contract.
    pub async fn list_businesses(&self) -> Result<Vec<Business>> {
        let listed = match &self.settings.factory_address {
            Some(factory) => self.list_from_factory(factory).await,
            None => Err(Error::MissingContractAddress),
        };

        match listed {
            Ok(businesses) if !businesses.is_empty() => Ok(businesses),
            _ if self.settings.fallback_enabled => {
                warn!(target: "loyalty::service::list_businesses", "Using demo businesses");
                Ok(demo_businesses(&self.settings.fallback_contract))
            }
            other => other,
        }
    }

    async fn list_from_factory(&self, factory: &str) -> Result<Vec<Business>> {
        let count = self.indexer.run_get_method(factory, "get_business_count", &[]).await?;
        let count = decode_stack_number(&count.stack).max(0);
        info!(target: "loyalty::service::list_from_factory", "Factory reports {} businesses", count);

        let mut businesses = vec![];
        for i in 0..count {
            let args = [StackArg::Num(i)];
            let res = match self.indexer.run_get_method(factory, "get_business_by_index", &args).await {
                Ok(res) => res,
                Err(e) => {
                    debug!(target: "loyalty::service::list_from_factory", "Business {} failed: {}", i, e);
                    continue
                }
            };

            if res.stack.len() < 3 {
                continue
            }

            let name = decode_string(&res.stack[0]);
            if !is_listable(&name) {
                continue
            }
            let description = decode_string(&res.stack[1]);
            let category = decode_string(&res.stack[2]);
            businesses.push(listed_business(
                &name,
                &description,
                &category,
                i as u64,
                &self.settings.fallback_contract,
            ));
        }

        if !businesses.is_empty() {
            return Ok(businesses)
        }

        let all = self.indexer.run_get_method(factory, "get_all_businesses", &[]).await?;
        match all.stack.first() {
            Some(StackItem::Cell(root)) => Ok(parse_business_list(root, &self.settings.fallback_contract)),
            _ => Ok(vec![]),
        }
    }
}
