//! NFTItem contract interface.

use ton_cell::{Cell, MsgAddress};

use crate::config::ItemConfig;
use crate::contract::{self, Contract, expect_end, malformed, split_opcode};
use crate::encoder::BodyEncoder;
use crate::error::{ContractError, ContractResult};
use crate::provider::Sender;
use crate::state_init::StateInit;

/// NFTItem operation codes.
pub mod opcodes {
    /// Hand the item to a new owner.
    pub const OP_TRANSFER: u32 = 0x5fcc3d14;
}

use opcodes::OP_TRANSFER;

/// A message understood by the NFTItem contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOperation {
    /// Empty body sent alongside the StateInit.
    Deploy,
    /// transfer#5fcc3d14 new_owner:MsgAddress
    Transfer { new_owner: MsgAddress },
}

impl ItemOperation {
    /// Encode the message body.
    pub fn encode(&self) -> ContractResult<Cell> {
        match self {
            ItemOperation::Deploy => BodyEncoder::new().finalize(),
            ItemOperation::Transfer { new_owner } => BodyEncoder::new()
                .append_opcode(OP_TRANSFER)?
                .append_address(new_owner)?
                .finalize(),
        }
    }

    /// Decode a message body in the NFTItem context.
    pub fn decode(body: &Cell) -> ContractResult<Self> {
        let Some((opcode, mut slice)) = split_opcode(body)? else {
            return Ok(ItemOperation::Deploy);
        };
        if opcode != OP_TRANSFER {
            return Err(ContractError::UnknownOpcode {
                opcode,
                contract: NftItem::NAME,
            });
        }
        let new_owner = slice.load_address().map_err(malformed)?;
        expect_end(&slice)?;
        Ok(ItemOperation::Transfer { new_owner })
    }
}

/// NFTItem contract handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftItem {
    address: MsgAddress,
    init: Option<StateInit>,
}

impl Contract for NftItem {
    const NAME: &'static str = "NFTItem";
    type Config = ItemConfig;

    fn serialize_config(config: &ItemConfig) -> ContractResult<Cell> {
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

impl NftItem {
    /// Deploy the item. Requires a handle created from a config.
    pub async fn send_deploy<S>(&self, via: &S, value: u128) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        contract::send_deploy(self, via, value).await
    }

    /// Transfer ownership of the item to `new_owner`.
    pub async fn send_transfer<S>(
        &self,
        via: &S,
        value: u128,
        new_owner: &MsgAddress,
    ) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        let body = ItemOperation::Transfer {
            new_owner: new_owner.clone(),
        }
        .encode()?;
        contract::send_body(self, via, value, body, "transfer").await
    }
}
