//! End-to-end flows against an in-memory ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ton_cell::{BagOfCells, Cell, CellBuilder, CellSlice, MsgAddress};
use ton_contracts::{
    CollectionConfig, CollectionOperation, Contract, ContractError, DeployManifest,
    GetMethodProvider, InternalMessage, ItemConfig, ItemOperation, NftCollection, NftItem,
    SendMode, Sender, SimpleToken, StackEntry, TokenConfig, TokenOperation, TransportError,
};

fn addr(byte: u8) -> MsgAddress {
    MsgAddress::Internal {
        workchain: 0,
        address: [byte; 32],
    }
}

fn code(tag: u32) -> Cell {
    let mut builder = CellBuilder::new();
    builder.store_u32(tag).unwrap();
    builder.build().unwrap()
}

/// Minimal token ledger: applies mint/transfer bodies sent by one wallet
/// and answers the token's get methods.
struct FakeLedger {
    wallet: MsgAddress,
    state: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    deployed: Vec<MsgAddress>,
    log: Vec<InternalMessage>,
    balances: HashMap<MsgAddress, u128>,
    total_supply: u128,
}

impl FakeLedger {
    fn new(wallet: MsgAddress) -> Self {
        Self {
            wallet,
            state: Mutex::new(LedgerState::default()),
        }
    }
}

#[async_trait::async_trait]
impl Sender for FakeLedger {
    fn address(&self) -> Option<&MsgAddress> {
        Some(&self.wallet)
    }

    async fn send(&self, message: InternalMessage) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if message.is_deploy() {
            state.deployed.push(message.to.clone());
        } else if !state.deployed.contains(&message.to) {
            return Err(TransportError::new(format!("{} is not deployed", message.to)));
        }

        match TokenOperation::decode(&message.body) {
            Ok(TokenOperation::Mint { to, amount }) => {
                *state.balances.entry(to).or_default() += amount;
                state.total_supply += amount;
            }
            Ok(TokenOperation::Transfer { to, amount }) => {
                let from = state.balances.entry(self.wallet.clone()).or_default();
                if *from < amount {
                    return Err(TransportError::new("insufficient balance"));
                }
                *from -= amount;
                *state.balances.entry(to).or_default() += amount;
            }
            _ => {}
        }
        state.log.push(message);
        Ok(())
    }
}

#[async_trait::async_trait]
impl GetMethodProvider for FakeLedger {
    async fn run_get_method(
        &self,
        _address: &MsgAddress,
        method: &str,
        args: Vec<StackEntry>,
    ) -> Result<Vec<StackEntry>, TransportError> {
        let state = self.state.lock().unwrap();
        match (method, args.as_slice()) {
            ("get_total_supply", []) => Ok(vec![StackEntry::uint(state.total_supply)]),
            ("get_balance", [StackEntry::Slice(cell)]) => {
                let owner = CellSlice::new(cell)
                    .load_address()
                    .map_err(TransportError::new)?;
                Ok(vec![StackEntry::uint(
                    state.balances.get(&owner).copied().unwrap_or(0),
                )])
            }
            _ => Err(TransportError::new(format!("unknown get method {}", method))),
        }
    }
}

#[test]
fn test_token_deploy_and_mint_encoding_is_reproducible() {
    let owner = addr(0x0A);
    let receiver = addr(0x0B);
    let token_code = code(0x70C3);

    let run = || {
        let config = TokenConfig::new(owner.clone());
        let token = SimpleToken::create_from_config(&config, token_code.clone()).unwrap();
        let body = TokenOperation::Mint {
            to: receiver.clone(),
            amount: 1000,
        }
        .encode()
        .unwrap();
        (token, body)
    };

    let (token, body) = run();
    let (token_again, body_again) = run();
    assert_eq!(token.address(), token_again.address());
    assert_eq!(
        BagOfCells::from_root(body.clone()).serialize().unwrap(),
        BagOfCells::from_root(body_again).serialize().unwrap()
    );

    // Address is the hash of StateInit{code, data} built by hand.
    let mut data = CellBuilder::new();
    data.store_address(&owner).unwrap();
    data.store_uint128(0, 128).unwrap();
    data.store_ref(Arc::new(Cell::empty())).unwrap();
    let mut state_init = CellBuilder::new();
    state_init.store_bits(&[false, false, true]).unwrap();
    state_init.store_ref(Arc::new(token_code.clone())).unwrap();
    state_init.store_bit(true).unwrap();
    state_init.store_ref(Arc::new(data.build().unwrap())).unwrap();
    state_init.store_bit(false).unwrap();
    assert_eq!(token.address().hash_part(), Some(&state_init.build().unwrap().hash()));
    assert!(token.user_friendly_address(false).unwrap().starts_with("EQ"));

    // opcode(32) ++ address(receiver) ++ uint(1000, 128)
    let mut expected = CellBuilder::new();
    expected.store_u32(0x4d494e54).unwrap();
    expected.store_address(&receiver).unwrap();
    expected.store_uint128(1000, 128).unwrap();
    let expected = expected.build().unwrap();
    assert_eq!(body.data(), expected.data());
    assert_eq!(body.bit_len(), expected.bit_len());
}

#[tokio::test]
async fn test_token_lifecycle() {
    let owner = addr(0x01);
    let holder = addr(0x02);
    let ledger = FakeLedger::new(owner.clone());

    let token = SimpleToken::create_from_config(&TokenConfig::new(owner.clone()), code(1)).unwrap();

    // Minting before deploy is rejected by the ledger and surfaced as is.
    let err = token.send_mint(&ledger, 50_000_000, &owner, 1).await.unwrap_err();
    assert!(matches!(err, ContractError::Transport(_)));

    token.send_deploy(&ledger, 50_000_000).await.unwrap();
    token.send_mint(&ledger, 50_000_000, &owner, 1000).await.unwrap();
    token.send_transfer(&ledger, 80_000_000, &holder, 250).await.unwrap();

    assert_eq!(token.get_total_supply(&ledger).await.unwrap(), 1000);
    assert_eq!(token.get_balance(&ledger, &owner).await.unwrap(), 750);
    assert_eq!(token.get_balance(&ledger, &holder).await.unwrap(), 250);

    // A handle bound by address talks to the same contract.
    let bound = SimpleToken::create_from_address(token.address().clone());
    assert_eq!(bound.get_total_supply(&ledger).await.unwrap(), 1000);
    // Its deploy is a bare empty message: no StateInit, nothing changes.
    bound.send_deploy(&ledger, 1).await.unwrap();
    assert_eq!(bound.get_total_supply(&ledger).await.unwrap(), 1000);

    let state = ledger.state.lock().unwrap();
    assert_eq!(state.log.len(), 4);
    assert!(state.log[3].init.is_none());
    assert!(state.log[3].body.is_empty());
    assert_eq!(state.log[3].to, *token.address());
    assert!(state
        .log
        .iter()
        .all(|m| m.send_mode == SendMode::PAY_GAS_SEPARATELY && m.bounce));
    assert_eq!(state.log[2].value, 80_000_000);
}

#[tokio::test]
async fn test_collection_and_item_flow() {
    let owner = addr(0x01);
    let ledger = FakeLedger::new(owner.clone());
    let item_code = code(0x17E4);

    let collection = NftCollection::create_from_config(
        &CollectionConfig::new(owner.clone(), item_code.clone()).with_next_index(3),
        code(0xC011),
    )
    .unwrap();
    collection.send_deploy(&ledger, 50_000_000).await.unwrap();
    collection.send_mint(&ledger, 20_000_000).await.unwrap();

    let item = NftItem::create_from_config(&ItemConfig, item_code).unwrap();
    item.send_deploy(&ledger, 50_000_000).await.unwrap();
    item.send_transfer(&ledger, 50_000_000, &addr(0x09)).await.unwrap();

    let state = ledger.state.lock().unwrap();
    assert_eq!(state.deployed, vec![collection.address().clone(), item.address().clone()]);
    assert_eq!(
        CollectionOperation::decode(&state.log[1].body).unwrap(),
        CollectionOperation::Mint
    );
    assert_eq!(
        ItemOperation::decode(&state.log[3].body).unwrap(),
        ItemOperation::Transfer { new_owner: addr(0x09) }
    );
    // The collection mint is not a token mint, so no supply appeared.
    assert_eq!(state.total_supply, 0);
}

#[test]
fn test_manifest_matches_direct_construction() {
    let owner = addr(0x01);
    let code_boc = BagOfCells::from_root(code(0x70C3)).serialize_to_base64().unwrap();
    let json = format!(
        r#"{{"kind": "token", "owner": "{}", "code": "{}"}}"#,
        owner.to_user_friendly(true, false).unwrap(),
        code_boc
    );

    let deployment = DeployManifest::from_json(&json).unwrap().into_config().unwrap();
    let direct = SimpleToken::create_from_config(&TokenConfig::new(owner), code(0x70C3)).unwrap();

    assert_eq!(&deployment.address().unwrap(), direct.address());
}
