//! Deploy-time configuration for each contract kind.
//!
//! Each config serializes to the exact data cell the contract stores at
//! deployment. Field order and widths are fixed:
//!
//! | Kind       | Data cell                                               |
//! |------------|---------------------------------------------------------|
//! | Token      | owner:MsgAddress total_supply:uint128(=0) ^Cell(empty)  |
//! | Collection | owner:MsgAddress next_index:uint64 ^item_code           |
//! | Item       | (empty)                                                 |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ton_cell::{Cell, MsgAddress};

use crate::encoder::{AMOUNT_BITS, BodyEncoder};
use crate::error::ContractResult;

/// Width of the collection's next item index.
pub const NEXT_INDEX_BITS: usize = 64;

/// Contract kinds this crate knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// Fungible SimpleToken.
    Token,
    /// NFT collection.
    Collection,
    /// NFT item.
    Item,
}

impl ContractKind {
    /// Contract name, as reported in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::Token => "SimpleToken",
            ContractKind::Collection => "NFTCollection",
            ContractKind::Item => "NFTItem",
        }
    }
}

/// SimpleToken deploy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Address allowed to mint.
    pub owner: MsgAddress,
}

impl TokenConfig {
    /// Create a token config.
    pub fn new(owner: MsgAddress) -> Self {
        Self { owner }
    }

    /// Serialize to the initial data cell. Total supply always starts at
    /// zero and the balances dictionary root is always the empty cell.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        BodyEncoder::new()
            .append_address(&self.owner)?
            .append_uint("total_supply", 0, AMOUNT_BITS)?
            .append_ref(Arc::new(Cell::empty()))?
            .finalize()
    }
}

/// NFTCollection deploy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Collection owner.
    pub owner: MsgAddress,
    /// Index the next minted item receives.
    pub next_index: u64,
    /// Code of the NFTItem contract.
    pub item_code: Arc<Cell>,
}

impl CollectionConfig {
    /// Create a collection config with `next_index = 0`.
    pub fn new(owner: MsgAddress, item_code: impl Into<Arc<Cell>>) -> Self {
        Self {
            owner,
            next_index: 0,
            item_code: item_code.into(),
        }
    }

    /// Set the starting item index.
    pub fn with_next_index(mut self, next_index: u64) -> Self {
        self.next_index = next_index;
        self
    }

    /// Serialize to the initial data cell.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        BodyEncoder::new()
            .append_address(&self.owner)?
            .append_uint("next_index", self.next_index as u128, NEXT_INDEX_BITS)?
            .append_ref(self.item_code.clone())?
            .finalize()
    }
}

/// NFTItem deploy configuration. Items carry no deploy-time fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemConfig;

impl ItemConfig {
    /// Serialize to the initial data cell, which is always empty.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        BodyEncoder::new().finalize()
    }
}

/// Deploy configuration of any supported contract kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractConfig {
    Token(TokenConfig),
    Collection(CollectionConfig),
    Item(ItemConfig),
}

impl ContractConfig {
    /// Kind of contract this config deploys.
    pub fn kind(&self) -> ContractKind {
        match self {
            ContractConfig::Token(_) => ContractKind::Token,
            ContractConfig::Collection(_) => ContractKind::Collection,
            ContractConfig::Item(_) => ContractKind::Item,
        }
    }

    /// Serialize to the initial data cell.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        match self {
            ContractConfig::Token(config) => config.to_cell(),
            ContractConfig::Collection(config) => config.to_cell(),
            ContractConfig::Item(config) => config.to_cell(),
        }
    }
}

impl From<TokenConfig> for ContractConfig {
    fn from(config: TokenConfig) -> Self {
        ContractConfig::Token(config)
    }
}

impl From<CollectionConfig> for ContractConfig {
    fn from(config: CollectionConfig) -> Self {
        ContractConfig::Collection(config)
    }
}

impl From<ItemConfig> for ContractConfig {
    fn from(config: ItemConfig) -> Self {
        ContractConfig::Item(config)
    }
}
