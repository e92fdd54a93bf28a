//! NFTCollection contract interface.
//!
//! The collection deploys items from the item code it was configured with,
//! numbering them from `next_index`. Minting is a bare opcode: the
//! attached value funds the new item.

use ton_cell::{Cell, MsgAddress};

use crate::config::CollectionConfig;
use crate::contract::{self, Contract, expect_end, split_opcode};
use crate::encoder::BodyEncoder;
use crate::error::{ContractError, ContractResult};
use crate::provider::Sender;
use crate::state_init::StateInit;

/// NFTCollection operation codes.
pub mod opcodes {
    /// Mint the next item. Same value as the token's mint, no payload.
    pub const OP_MINT: u32 = 0x4d494e54;
}

use opcodes::OP_MINT;

/// A message understood by the NFTCollection contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOperation {
    /// Empty body sent alongside the StateInit.
    Deploy,
    /// Mint the next item.
    Mint,
}

impl CollectionOperation {
    /// Encode the message body.
    pub fn encode(&self) -> ContractResult<Cell> {
        match self {
            CollectionOperation::Deploy => BodyEncoder::new().finalize(),
            CollectionOperation::Mint => BodyEncoder::new().append_opcode(OP_MINT)?.finalize(),
        }
    }

    /// Decode a message body in the NFTCollection context.
    pub fn decode(body: &Cell) -> ContractResult<Self> {
        let Some((opcode, slice)) = split_opcode(body)? else {
            return Ok(CollectionOperation::Deploy);
        };
        if opcode != OP_MINT {
            return Err(ContractError::UnknownOpcode {
                opcode,
                contract: NftCollection::NAME,
            });
        }
        expect_end(&slice)?;
        Ok(CollectionOperation::Mint)
    }
}

/// NFTCollection contract handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftCollection {
    address: MsgAddress,
    init: Option<StateInit>,
}

impl Contract for NftCollection {
    const NAME: &'static str = "NFTCollection";
    type Config = CollectionConfig;

    fn serialize_config(config: &CollectionConfig) -> ContractResult<Cell> {
        config.to_cell()
    }

    fn from_parts(address: MsgAddress, init: Option<StateInit>) -> Self {
        Self { address, init }
    }

    fn address(&self) -> &MsgAddress {
        &self.address
    }

    fn init(&self) -> Option<&StateInit> {
        self.init.as_ref()
    }
}

impl NftCollection {
    /// Deploy the collection. Requires a handle created from a config.
    pub async fn send_deploy<S>(&self, via: &S, value: u128) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        contract::send_deploy(self, via, value).await
    }

    /// Mint the next item, funding it with `value`.
    pub async fn send_mint<S>(&self, via: &S, value: u128) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        let body = CollectionOperation::Mint.encode()?;
        contract::send_body(self, via, value, body, "mint").await
    }
}
