//! # ton-contracts
//!
//! Typed wrappers for three TON contracts:
//!
//! - **SimpleToken**: a single-contract fungible token with owner-only mint
//!   and holder-to-holder transfer.
//! - **NFTCollection**: mints NFT items from the item code it was deployed
//!   with.
//! - **NFTItem**: a single NFT that can be handed to a new owner.
//!
//! For each contract the crate knows the deploy-time data layout, how the
//! contract address follows from code and data, and the exact bit layout of
//! every message body. Network access is left to the caller through the
//! [`Sender`] and [`GetMethodProvider`] traits.
//!
//! ## Message bodies
//!
//! | Contract      | Operation | Opcode       | Payload                         |
//! |---------------|-----------|--------------|---------------------------------|
//! | SimpleToken   | mint      | `0x4d494e54` | to:MsgAddress amount:uint128    |
//! | SimpleToken   | transfer  | `0x5452414e` | to:MsgAddress amount:uint128    |
//! | NFTCollection | mint      | `0x4d494e54` | (none)                          |
//! | NFTItem       | transfer  | `0x5fcc3d14` | new_owner:MsgAddress            |
//! | any           | deploy    | (none)       | empty body, StateInit attached  |
//!
//! Opcodes are scoped per contract: the token and the collection share
//! `0x4d494e54` with different payloads, so bodies are only meaningful in
//! the context of a handle type.
//!
//! ## Example
//!
//! ```
//! use ton_cell::{CellBuilder, MsgAddress};
//! use ton_contracts::{Contract, SimpleToken, TokenConfig, TokenOperation};
//!
//! let owner = MsgAddress::Internal { workchain: 0, address: [0x11; 32] };
//! let mut code = CellBuilder::new();
//! code.store_u32(0xC0DE).unwrap();
//!
//! let config = TokenConfig::new(owner.clone());
//! let token = SimpleToken::create_from_config(&config, code.build().unwrap()).unwrap();
//! println!("token address: {}", token.user_friendly_address(false).unwrap());
//!
//! let body = TokenOperation::Mint { to: owner, amount: 1000 }.encode().unwrap();
//! assert_eq!(body.bit_len(), 32 + 267 + 128);
//! ```

pub mod collection;
pub mod config;
pub mod contract;
pub mod encoder;
pub mod error;
pub mod item;
pub mod manifest;
pub mod message;
pub mod provider;
pub mod state_init;
pub mod token;

pub use collection::{CollectionOperation, NftCollection};
pub use config::{CollectionConfig, ContractConfig, ContractKind, ItemConfig, TokenConfig};
pub use contract::Contract;
pub use encoder::{BodyEncoder, parse_amount};
pub use error::{ContractError, ContractResult, TransportError};
pub use item::{ItemOperation, NftItem};
pub use manifest::{DeployManifest, Deployment};
pub use message::{InternalMessage, SendMode};
pub use provider::{GetMethodProvider, Sender, StackEntry};
pub use state_init::{BASECHAIN, MASTERCHAIN, StateInit, contract_address};
pub use token::{SimpleToken, TokenOperation};
