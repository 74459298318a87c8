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

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sled_overlay::sled;

use loyaltylayer::{
    cell::{boc, snake_cell, CellBuilder},
    indexer::{HttpRequest, HttpResponse, HttpTransport, IndexerClient, IndexerSettings},
    loyalty::{
        model::Tier, LoyaltyService, MergePolicy, PointsDivergence, ServiceSettings,
        TransactionRequest, WalletConnector,
    },
    store::LocalStore,
    util::json::{json_field, json_field_str, json_parse, JsonValue},
    Error, Result,
};

const WALLET: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";
const CONTRACT: &str = "EQBWArzgGY3kDWzaq_kW-pcKUI4B4sZWuosyLQdc3LXlYZPv";
const FACTORY: &str = "Ef8zMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzM0vF";
const STAFF: &str = "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ";

/// Wallet that records every request, optionally refusing them.
struct MockWallet {
    address: Option<String>,
    reject: bool,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl MockWallet {
    fn new(address: Option<&str>, reject: bool) -> Arc<Self> {
        Arc::new(Self { address: address.map(String::from), reject, sent: Mutex::new(vec![]) })
    }

    fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        if self.reject {
            return Err(Error::WalletRejected("User declined".to_string()))
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok("te6cc".to_string())
    }
}

/// Indexer answering from a fixed transaction list and per-method stacks.
/// Get-methods without an entry report exit code 11.
#[derive(Default)]
struct ChainMock {
    transactions: String,
    stacks: HashMap<String, String>,
}

fn envelope(result: &str) -> HttpResponse {
    HttpResponse { status: 200, body: format!(r#"{{"ok": true, "result": {}}}"#, result) }
}

#[async_trait]
impl HttpTransport for ChainMock {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if request.url.path().ends_with("getTransactions") {
            return Ok(envelope(&self.transactions))
        }

        let body = json_parse(request.body.as_deref().unwrap_or("{}"))?;
        let method = json_field_str(&body, "method").unwrap_or_default().to_string();

        // Indexed calls are keyed `method:index`
        let key = match json_field(&body, "stack").and_then(|s| s.get::<Vec<JsonValue>>()) {
            Some(args) if !args.is_empty() => {
                let arg = args[0].get::<Vec<JsonValue>>().and_then(|a| a.get(1)).and_then(|v| v.get::<String>());
                format!("{}:{}", method, arg.cloned().unwrap_or_default())
            }
            _ => method,
        };

        let reply = match self.stacks.get(&key) {
            Some(stack) => format!(r#"{{"exit_code": 0, "gas_used": 0, "stack": {}}}"#, stack),
            None => r#"{"exit_code": 11, "stack": []}"#.to_string(),
        };
        Ok(envelope(&reply))
    }
}

fn cell_item(s: &str) -> String {
    format!(r#"["cell", {{"bytes": "{}"}}]"#, boc::to_base64(&snake_cell(s).unwrap()).unwrap())
}

fn op_body(op: u32) -> String {
    let mut b = CellBuilder::new();
    b.store_u32(32, op).unwrap();
    boc::to_base64(&b.build().unwrap()).unwrap()
}

fn transactions(ops: &[(u32, u64)]) -> String {
    let txs: Vec<String> = ops
        .iter()
        .enumerate()
        .map(|(i, (op, value))| {
            format!(
                r#"{{"utime": {}, "transaction_id": {{"lt": "{}", "hash": "h{}"}}, "fee": "1000",
                    "in_msg": {{"source": "{}", "destination": "{}", "value": "{}",
                    "msg_data": {{"body": "{}"}}}}}}"#,
                1_760_000_000 - i as u64,
                100 - i,
                i,
                WALLET,
                CONTRACT,
                value,
                op_body(*op)
            )
        })
        .collect();
    format!("[{}]", txs.join(","))
}

fn new_service(
    chain: ChainMock,
    wallet: Arc<MockWallet>,
    settings: ServiceSettings,
) -> Result<(LoyaltyService, sled::Db)> {
    let db = sled::Config::new().temporary(true).open()?;
    let store = LocalStore::new(&db)?;

    let indexer_settings = IndexerSettings {
        endpoint: "https://indexer.test/api/v2/".to_string(),
        min_request_interval: Duration::ZERO,
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    };
    let indexer = Arc::new(IndexerClient::new(indexer_settings, Arc::new(chain))?);

    Ok((LoyaltyService::new(indexer, store, wallet, settings), db))
}

fn cafe_link() -> String {
    format!("loyalty://business/Demo%20Cafe/{}/cafe", CONTRACT)
}

fn leading_op(request: &TransactionRequest) -> u32 {
    request.messages[0].payload.parser().load_u32(32).unwrap()
}

fn init_logger() {
    // Tests share one process, so only the first init succeeds
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        //simplelog::LevelFilter::Debug,
        simplelog::ConfigBuilder::new().build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

#[test]
fn customer_lifecycle() -> Result<()> {
    init_logger();

    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = new_service(ChainMock::default(), wallet.clone(), ServiceSettings::default())?;

    let (business, record) = service.join(&cafe_link())?;
    assert!(business.id.starts_with("demo-cafe-"));
    assert_eq!(business.name, "Demo Cafe");
    assert_eq!(business.contract_address, CONTRACT);
    assert_eq!(record.points, 0);
    assert_eq!(record.tier, Tier::New);
    assert!(!record.is_registered);
    let id = business.id;

    smol::block_on(async {
        assert!(matches!(service.check_in(&id).await, Err(Error::CustomerNotRegistered)));
        assert!(wallet.sent().is_empty());

        let rec = service.register(&id).await?;
        assert_eq!((rec.points, rec.total_visits, rec.streak_days), (100, 1, 1));
        assert_eq!(rec.tier, Tier::Member);
        assert!(rec.is_registered);

        let rec = service.check_in(&id).await?;
        assert_eq!((rec.points, rec.total_visits, rec.streak_days), (110, 2, 2));

        let rec = service.pay(&id, 1_000_000_000).await?;
        assert_eq!((rec.points, rec.total_visits), (120, 3));
        assert_eq!(rec.total_spent, 1_000_000_000);

        let rec = service.purchase(&id, "coffee-purchase").await?;
        assert_eq!((rec.points, rec.total_visits), (125, 4));
        assert_eq!(rec.total_spent, 6_000_000_000);

        assert!(matches!(
            service.redeem(&id, "breakfast-combo").await,
            Err(Error::InsufficientPoints(25))
        ));
        assert!(matches!(service.redeem(&id, "gift-card").await, Err(Error::RewardNotFound(_))));

        let rec = service.redeem(&id, "free-coffee").await?;
        assert_eq!(rec.points, 75);

        let rec = service.tip(&id, STAFF, 1_000_000_000).await?;
        assert_eq!((rec.points, rec.total_visits), (80, 4));

        assert!(matches!(service.pay(&id, 0).await, Err(Error::InvalidAmount(_))));
        Ok::<(), Error>(())
    })?;

    let sent = wallet.sent();
    let ops: Vec<u32> = sent.iter().map(leading_op).collect();
    assert_eq!(ops, vec![1, 3, 2, 2, 5, 7]);
    assert!(sent.iter().all(|r| r.messages[0].address == CONTRACT));
    assert_eq!(sent[0].messages[0].amount, 50_000_000);
    assert_eq!(sent[2].messages[0].amount, 1_000_000_000);
    assert_eq!(sent[3].messages[0].amount, 5_000_000_000);

    let stored = service.store().get_customer(WALLET, &id)?.unwrap();
    assert_eq!(stored.points, 80);
    assert_eq!(stored.tier, Tier::Member);
    Ok(())
}

#[test]
fn wallet_failures_leave_records_alone() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), true);
    let (service, _db) = new_service(ChainMock::default(), wallet, ServiceSettings::default())?;

    let (business, _) = service.join(&cafe_link())?;
    let res = smol::block_on(service.register(&business.id));
    assert!(matches!(res, Err(Error::WalletRejected(_))));

    let stored = service.store().get_customer(WALLET, &business.id)?.unwrap();
    assert!(!stored.is_registered);
    assert_eq!(stored.points, 0);

    let disconnected = MockWallet::new(None, false);
    let (service, _db) = service_with(disconnected)?;
    assert!(matches!(service.join(&cafe_link()), Err(Error::WalletNotConnected)));
    assert!(matches!(
        smol::block_on(service.register("demo-cafe-1")),
        Err(Error::WalletNotConnected)
    ));
    Ok(())
}

#[test]
fn registration_is_granted_once() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = service_with(wallet.clone())?;
    let (business, _) = service.join(&cafe_link())?;
    let id = business.id;

    smol::block_on(async {
        service.register(&id).await?;
        service.check_in(&id).await?;
        service.check_in(&id).await?;

        assert!(matches!(service.register(&id).await, Err(Error::CustomerAlreadyRegistered)));
        Ok::<(), Error>(())
    })?;

    let stored = service.store().get_customer(WALLET, &id)?.unwrap();
    assert_eq!((stored.points, stored.total_visits, stored.streak_days), (120, 3, 3));

    // The refused registration never reached the wallet
    let ops: Vec<u32> = wallet.sent().iter().map(leading_op).collect();
    assert_eq!(ops, vec![1, 3, 3]);
    Ok(())
}

#[test]
fn redeem_requires_registration() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = service_with(wallet.clone())?;
    let (business, _) = service.join(&cafe_link())?;
    let id = business.id;

    smol::block_on(async {
        // Points check comes first
        assert!(matches!(service.redeem(&id, "free-coffee").await, Err(Error::InsufficientPoints(50))));

        let rec = service.pay(&id, 60_000_000_000).await?;
        assert_eq!(rec.points, 600);
        assert!(!rec.is_registered);

        assert!(matches!(service.redeem(&id, "free-coffee").await, Err(Error::CustomerNotRegistered)));
        Ok::<(), Error>(())
    })?;

    assert_eq!(service.store().get_customer(WALLET, &id)?.unwrap().points, 600);
    assert_eq!(wallet.sent().len(), 1);
    Ok(())
}

#[test]
fn oversized_amounts_saturate() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = service_with(wallet)?;
    let (business, _) = service.join(&cafe_link())?;
    let id = business.id;

    let per_payment = u64::MAX / 100_000_000;
    smol::block_on(async {
        let rec = service.pay(&id, u64::MAX).await?;
        assert_eq!(rec.total_spent, u64::MAX);
        assert_eq!(rec.points, per_payment);

        let rec = service.pay(&id, u64::MAX).await?;
        assert_eq!(rec.total_spent, u64::MAX);
        assert_eq!(rec.points, 2 * per_payment);
        Ok::<(), Error>(())
    })?;

    let stored = service.store().get_customer(WALLET, &id)?.unwrap();
    assert_eq!(stored.total_spent, u64::MAX);
    Ok(())
}

fn service_with(wallet: Arc<MockWallet>) -> Result<(LoyaltyService, sled::Db)> {
    new_service(ChainMock::default(), wallet, ServiceSettings::default())
}

#[test]
fn sync_reconciles_with_chain() -> Result<()> {
    init_logger();

    let chain = ChainMock {
        transactions: transactions(&[(3, 50_000_000); 6]),
        ..Default::default()
    };
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = new_service(chain, wallet, ServiceSettings::default())?;

    let (business, _) = service.join(&cafe_link())?;
    smol::block_on(async {
        service.register(&business.id).await?;
        let report = service.sync(&business.id).await?;

        assert_eq!(report.snapshot.total_visits, 6);
        assert_eq!(report.snapshot.points, 30);
        assert!(report.outcome.changed);
        assert_eq!(report.outcome.divergence, Some(PointsDivergence { local: 100, chain: 30 }));
        assert_eq!(report.record.total_visits, 6);
        assert_eq!(report.record.points, 100);
        assert_eq!(report.record.tier, Tier::Bronze);

        // Second pass sees equal visit counts
        let report = service.sync(&business.id).await?;
        assert!(!report.outcome.changed);
        Ok::<(), Error>(())
    })?;

    let stored = service.store().get_customer(WALLET, &business.id)?.unwrap();
    assert_eq!(stored.total_visits, 6);
    Ok(())
}

#[test]
fn sync_trusting_chain() -> Result<()> {
    let chain = ChainMock {
        transactions: transactions(&[(2, 2_000_000_000), (1, 50_000_000), (2, 10_000_000)]),
        ..Default::default()
    };
    let settings = ServiceSettings { merge_policy: MergePolicy::TrustChain, ..Default::default() };
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = new_service(chain, wallet, settings)?;

    let (business, _) = service.join(&cafe_link())?;
    let report = smol::block_on(service.sync(&business.id))?;

    // The 0.01 TON message is below the counting threshold
    assert_eq!(report.snapshot.total_visits, 2);
    assert_eq!(report.record.points, 20 + 10);
    assert_eq!(report.record.tier, Tier::Member);
    assert_eq!(report.outcome.divergence, None);
    Ok(())
}

#[test]
fn business_listing() -> Result<()> {
    init_logger();

    let mut stacks = HashMap::new();
    stacks.insert("get_business_count".to_string(), r#"[["num", "0x2"]]"#.to_string());
    stacks.insert(
        "get_business_by_index:0".to_string(),
        format!("[{}, {}, {}]", cell_item("Cafe Luna"), cell_item("Espresso bar"), cell_item("cafe")),
    );
    stacks.insert(
        "get_business_by_index:1".to_string(),
        format!("[{}, {}, {}]", cell_item("Unnamed Business"), cell_item(""), cell_item("")),
    );

    let settings = ServiceSettings { factory_address: Some(FACTORY.to_string()), ..Default::default() };
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = new_service(ChainMock { stacks, ..Default::default() }, wallet, settings)?;

    let listed = smol::block_on(service.list_businesses())?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "business-cafe-luna-0");
    assert_eq!(listed[0].description, "Espresso bar");
    assert_eq!(listed[0].rewards[0].id, "free-coffee");
    Ok(())
}

#[test]
fn business_listing_from_linked_cells() -> Result<()> {
    let mut tail = CellBuilder::new();
    tail.store_child(snake_cell("Book Nook")?)?
        .store_child(snake_cell("Used books")?)?
        .store_child(snake_cell("retail")?)?;
    let mut head = CellBuilder::new();
    head.store_child(snake_cell("Cafe Luna")?)?
        .store_child(snake_cell("")?)?
        .store_child(snake_cell("")?)?
        .store_child(tail.build()?)?;

    let mut stacks = HashMap::new();
    stacks.insert("get_business_count".to_string(), r#"[["num", "0"]]"#.to_string());
    stacks.insert(
        "get_all_businesses".to_string(),
        format!(r#"[["cell", {{"bytes": "{}"}}]]"#, boc::to_base64(&head.build()?)?),
    );

    let settings = ServiceSettings { factory_address: Some(FACTORY.to_string()), ..Default::default() };
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = new_service(ChainMock { stacks, ..Default::default() }, wallet, settings)?;

    let listed = smol::block_on(service.list_businesses())?;
    let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["business-cafe-luna-0", "business-book-nook-1"]);
    assert_eq!(listed[0].category, "General");
    assert_eq!(listed[1].description, "Used books");
    Ok(())
}

#[test]
fn business_listing_fallback() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), false);

    let (service, _db) = new_service(ChainMock::default(), wallet.clone(), ServiceSettings::default())?;
    assert!(matches!(smol::block_on(service.list_businesses()), Err(Error::MissingContractAddress)));

    let settings = ServiceSettings { fallback_enabled: true, ..Default::default() };
    let (service, _db) = new_service(ChainMock::default(), wallet.clone(), settings)?;
    let listed = smol::block_on(service.list_businesses())?;
    assert_eq!(listed.len(), 5);
    assert_eq!(listed[0].id, "ton-coffee-1");

    // Without fallback the factory error is surfaced
    let settings = ServiceSettings { factory_address: Some(FACTORY.to_string()), ..Default::default() };
    let (service, _db) = new_service(ChainMock::default(), wallet, settings)?;
    assert!(matches!(smol::block_on(service.list_businesses()), Err(Error::GetMethodNotFound(_))));
    Ok(())
}

#[test]
fn business_metadata_partial() -> Result<()> {
    let mut stacks = HashMap::new();
    stacks.insert("get_business_name".to_string(), format!("[{}]", cell_item("Cafe Luna")));
    stacks.insert("get_business_description".to_string(), format!("[{}]", cell_item("Espresso")));

    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) =
        new_service(ChainMock { stacks, ..Default::default() }, wallet, ServiceSettings::default())?;

    let meta = smol::block_on(service.business_metadata(CONTRACT))?;
    assert_eq!(meta.name, "Cafe Luna");
    assert_eq!(meta.description, "Espresso");
    assert_eq!(meta.category, "");

    let (service, _db) =
        new_service(ChainMock::default(), MockWallet::new(None, false), ServiceSettings::default())?;
    assert!(smol::block_on(service.business_metadata(CONTRACT)).is_err());
    Ok(())
}

#[test]
fn join_payload_request() -> Result<()> {
    let wallet = MockWallet::new(Some(WALLET), false);
    let (service, _db) = service_with(wallet)?;

    let request = service.join_payload(CONTRACT)?;
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].amount, 20_000_000);
    assert_eq!(leading_op(&request), 1);

    let json = JsonValue::try_from(&request)?.stringify()?;
    assert!(json.contains(r#""amount":"20000000""#));
    assert!(matches!(service.join_payload(""), Err(Error::MissingContractAddress)));
    Ok(())
}
