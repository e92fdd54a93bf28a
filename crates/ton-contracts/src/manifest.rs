//! Deploy manifests.
//!
//! A manifest is a JSON description of one deployment, e.g.
//!
//! ```json
//! {
//!   "kind": "collection",
//!   "owner": "0:4f2c...",
//!   "next_index": 0,
//!   "code": "te6cckEB...",
//!   "item_code": "b5ee9c72..."
//! }
//! ```
//!
//! Code blobs are BoC strings, either base64 or hex.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ton_cell::{BagOfCells, Cell, MsgAddress};

use crate::collection::NftCollection;
use crate::config::{CollectionConfig, ContractConfig, ContractKind, ItemConfig, TokenConfig};
use crate::contract::Contract;
use crate::error::{ContractError, ContractResult};
use crate::item::NftItem;
use crate::state_init::{BASECHAIN, StateInit, contract_address};
use crate::token::SimpleToken;

fn default_workchain() -> i32 {
    BASECHAIN
}

/// File-level description of a single contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployManifest {
    /// Contract kind.
    pub kind: ContractKind,
    /// Owner address (token and collection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// First item index (collection only, defaults to 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_index: Option<u64>,
    /// Contract code as a base64 or hex BoC.
    pub code: String,
    /// Item code as a base64 or hex BoC (collection only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    /// Target workchain.
    #[serde(default = "default_workchain")]
    pub workchain: i32,
}

/// A manifest resolved into typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub config: ContractConfig,
    pub code: Arc<Cell>,
    pub workchain: i32,
}

impl Deployment {
    /// StateInit this deployment sends.
    pub fn state_init(&self) -> ContractResult<StateInit> {
        Ok(StateInit::new(self.code.clone(), self.config.to_cell()?))
    }

    /// Address the contract will live at.
    pub fn address(&self) -> ContractResult<MsgAddress> {
        contract_address(self.workchain, &self.state_init()?)
    }

    /// Token handle, if this deploys a token.
    pub fn token(&self) -> ContractResult<Option<SimpleToken>> {
        match &self.config {
            ContractConfig::Token(config) => {
                SimpleToken::create_from_config_in(config, self.code.clone(), self.workchain)
                    .map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Collection handle, if this deploys a collection.
    pub fn collection(&self) -> ContractResult<Option<NftCollection>> {
        match &self.config {
            ContractConfig::Collection(config) => {
                NftCollection::create_from_config_in(config, self.code.clone(), self.workchain)
                    .map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Item handle, if this deploys an item.
    pub fn item(&self) -> ContractResult<Option<NftItem>> {
        match &self.config {
            ContractConfig::Item(config) => {
                NftItem::create_from_config_in(config, self.code.clone(), self.workchain).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl DeployManifest {
    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> ContractResult<Self> {
        serde_json::from_str(json).map_err(|e| ContractError::InvalidManifest(e.to_string()))
    }

    /// Render the manifest as pretty JSON.
    pub fn to_json(&self) -> ContractResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ContractError::InvalidManifest(e.to_string()))
    }

    /// Resolve addresses and code blobs into a typed deployment.
    pub fn into_config(self) -> ContractResult<Deployment> {
        let code = decode_blob("code", &self.code)?;

        if self.kind != ContractKind::Collection {
            if self.next_index.is_some() {
                return Err(unexpected_field("next_index", self.kind));
            }
            if self.item_code.is_some() {
                return Err(unexpected_field("item_code", self.kind));
            }
        }

        let config = match self.kind {
            ContractKind::Token => {
                let owner = parse_owner(self.owner.as_deref())?;
                ContractConfig::Token(TokenConfig::new(owner))
            }
            ContractKind::Collection => {
                let owner = parse_owner(self.owner.as_deref())?;
                let item_code = self
                    .item_code
                    .as_deref()
                    .ok_or_else(|| {
                        ContractError::InvalidManifest("collection requires item_code".to_string())
                    })?;
                let config = CollectionConfig::new(owner, decode_blob("item_code", item_code)?)
                    .with_next_index(self.next_index.unwrap_or(0));
                ContractConfig::Collection(config)
            }
            ContractKind::Item => {
                if self.owner.is_some() {
                    return Err(unexpected_field("owner", self.kind));
                }
                ContractConfig::Item(ItemConfig)
            }
        };

        Ok(Deployment {
            config,
            code,
            workchain: self.workchain,
        })
    }
}

fn unexpected_field(field: &str, kind: ContractKind) -> ContractError {
    ContractError::InvalidManifest(format!("{} is not used by {}", field, kind.name()))
}

fn parse_owner(owner: Option<&str>) -> ContractResult<MsgAddress> {
    let owner =
        owner.ok_or_else(|| ContractError::InvalidManifest("owner is required".to_string()))?;
    let address = owner
        .parse::<MsgAddress>()
        .map_err(|e| ContractError::InvalidManifest(format!("owner: {}", e)))?;
    if !address.is_internal() {
        return Err(ContractError::InvalidManifest(format!(
            "owner must be an internal address, got {:?}",
            owner
        )));
    }
    Ok(address)
}

/// Decode a single-root BoC given as hex or base64.
fn decode_blob(field: &str, blob: &str) -> ContractResult<Arc<Cell>> {
    let blob = blob.trim();
    let is_hex = !blob.is_empty()
        && blob.len().is_multiple_of(2)
        && blob.bytes().all(|b| b.is_ascii_hexdigit());

    let boc = if is_hex {
        BagOfCells::deserialize_from_hex(blob)
    } else {
        BagOfCells::deserialize_from_base64(blob)
    }
    .map_err(|e| ContractError::InvalidManifest(format!("{}: {}", field, e)))?;

    boc.single_root()
        .cloned()
        .map_err(|e| ContractError::InvalidManifest(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_cell::CellBuilder;

    const OWNER: &str = "0:1111111111111111111111111111111111111111111111111111111111111111";

    fn code_cell(tag: u32) -> Cell {
        let mut builder = CellBuilder::new();
        builder.store_u32(tag).unwrap();
        builder.build().unwrap()
    }

    fn base64_boc(tag: u32) -> String {
        BagOfCells::from_root(code_cell(tag)).serialize_to_base64().unwrap()
    }

    fn hex_boc(tag: u32) -> String {
        hex::encode(BagOfCells::from_root(code_cell(tag)).serialize().unwrap())
    }

    #[test]
    fn test_token_manifest() {
        let json = format!(
            r#"{{"kind": "token", "owner": "{}", "code": "{}"}}"#,
            OWNER,
            base64_boc(1)
        );
        let deployment = DeployManifest::from_json(&json).unwrap().into_config().unwrap();

        assert_eq!(deployment.workchain, 0);
        assert_eq!(deployment.code.hash(), code_cell(1).hash());
        let owner: MsgAddress = OWNER.parse().unwrap();
        assert_eq!(deployment.config, ContractConfig::Token(TokenConfig::new(owner.clone())));

        let token = deployment.token().unwrap().unwrap();
        assert_eq!(token.address(), &deployment.address().unwrap());
        assert_eq!(
            token.address(),
            SimpleToken::create_from_config(&TokenConfig::new(owner), code_cell(1))
                .unwrap()
                .address()
        );
        assert!(deployment.collection().unwrap().is_none());
    }

    #[test]
    fn test_collection_manifest_with_hex_code() {
        let json = format!(
            concat!(
                r#"{{"kind": "collection", "owner": "{}", "next_index": 5, "#,
                r#""code": "{}", "item_code": "{}", "workchain": -1}}"#
            ),
            OWNER,
            hex_boc(2),
            base64_boc(3)
        );
        let deployment = DeployManifest::from_json(&json).unwrap().into_config().unwrap();

        let ContractConfig::Collection(config) = &deployment.config else {
            panic!("expected collection config");
        };
        assert_eq!(config.next_index, 5);
        assert_eq!(config.item_code.hash(), code_cell(3).hash());
        assert_eq!(deployment.address().unwrap().workchain(), Some(-1));
        assert!(deployment.collection().unwrap().is_some());
    }

    #[test]
    fn test_item_manifest() {
        let json = format!(r#"{{"kind": "item", "code": "{}"}}"#, base64_boc(4));
        let deployment = DeployManifest::from_json(&json).unwrap().into_config().unwrap();
        assert_eq!(deployment.config, ContractConfig::Item(ItemConfig));
        assert!(deployment.item().unwrap().is_some());
    }

    #[test]
    fn test_manifest_errors() {
        let cases = [
            format!(r#"{{"kind": "token", "code": "{}"}}"#, base64_boc(1)),
            format!(
                r#"{{"kind": "collection", "owner": "{}", "code": "{}"}}"#,
                OWNER,
                base64_boc(1)
            ),
            format!(r#"{{"kind": "item", "code": "{}", "next_index": 1}}"#, base64_boc(1)),
            format!(
                r#"{{"kind": "token", "owner": "not an address", "code": "{}"}}"#,
                base64_boc(1)
            ),
            format!(r#"{{"kind": "token", "owner": "{}", "code": "!!"}}"#, OWNER),
        ];
        for json in &cases {
            let result = DeployManifest::from_json(json).and_then(DeployManifest::into_config);
            assert!(
                matches!(result, Err(ContractError::InvalidManifest(_))),
                "{json} should be rejected"
            );
        }

        assert!(matches!(
            DeployManifest::from_json(r#"{"kind": "wallet", "code": ""}"#),
            Err(ContractError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_manifest_json_roundtrip() {
        let manifest = DeployManifest {
            kind: ContractKind::Item,
            owner: None,
            next_index: None,
            code: base64_boc(4),
            item_code: None,
            workchain: 0,
        };
        let json = manifest.to_json().unwrap();
        assert!(!json.contains("owner"));
        assert_eq!(DeployManifest::from_json(&json).unwrap(), manifest);
    }
}
