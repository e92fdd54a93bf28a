//! SimpleToken contract interface.
//!
//! A single-contract fungible token: the owner mints to any address and
//! holders transfer between each other. Balances live in a dictionary inside
//! the token contract itself, so there are no per-holder wallet contracts.
//!
//! Message bodies:
//!
//! ```text
//! mint#4d494e54 to:MsgAddress amount:uint128 = TokenMsg;
//! transfer#5452414e to:MsgAddress amount:uint128 = TokenMsg;
//! ```

use ton_cell::{Cell, MsgAddress};
use tracing::trace;

use crate::config::TokenConfig;
use crate::contract::{self, Contract, expect_end, malformed, split_opcode};
use crate::encoder::{AMOUNT_BITS, BodyEncoder};
use crate::error::{ContractError, ContractResult};
use crate::provider::{GetMethodProvider, Sender, StackEntry};
use crate::state_init::StateInit;

/// SimpleToken operation codes.
pub mod opcodes {
    /// Mint new tokens to an address ("MINT").
    pub const OP_MINT: u32 = 0x4d494e54;

    /// Transfer tokens to an address ("TRAN").
    pub const OP_TRANSFER: u32 = 0x5452414e;
}

use opcodes::{OP_MINT, OP_TRANSFER};

/// A message understood by the SimpleToken contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOperation {
    /// Empty body sent alongside the StateInit.
    Deploy,
    /// Mint `amount` to `to`.
    Mint { to: MsgAddress, amount: u128 },
    /// Transfer `amount` from the sender to `to`.
    Transfer { to: MsgAddress, amount: u128 },
}

impl TokenOperation {
    /// Encode the message body.
    pub fn encode(&self) -> ContractResult<Cell> {
        match self {
            TokenOperation::Deploy => BodyEncoder::new().finalize(),
            TokenOperation::Mint { to, amount } => encode_movement(OP_MINT, to, *amount),
            TokenOperation::Transfer { to, amount } => encode_movement(OP_TRANSFER, to, *amount),
        }
    }

    /// Decode a message body in the SimpleToken context.
    pub fn decode(body: &Cell) -> ContractResult<Self> {
        let Some((opcode, mut slice)) = split_opcode(body)? else {
            return Ok(TokenOperation::Deploy);
        };

        let operation = match opcode {
            OP_MINT | OP_TRANSFER => {
                let to = slice.load_address().map_err(malformed)?;
                let amount = slice.load_uint128(AMOUNT_BITS).map_err(malformed)?;
                if opcode == OP_MINT {
                    TokenOperation::Mint { to, amount }
                } else {
                    TokenOperation::Transfer { to, amount }
                }
            }
            other => {
                return Err(ContractError::UnknownOpcode {
                    opcode: other,
                    contract: SimpleToken::NAME,
                });
            }
        };

        expect_end(&slice)?;
        Ok(operation)
    }

    /// Opcode of this operation, `None` for deploy.
    pub fn opcode(&self) -> Option<u32> {
        match self {
            TokenOperation::Deploy => None,
            TokenOperation::Mint { .. } => Some(OP_MINT),
            TokenOperation::Transfer { .. } => Some(OP_TRANSFER),
        }
    }
}

fn encode_movement(opcode: u32, to: &MsgAddress, amount: u128) -> ContractResult<Cell> {
    BodyEncoder::new()
        .append_opcode(opcode)?
        .append_address(to)?
        .append_uint("amount", amount, AMOUNT_BITS)?
        .finalize()
}

/// SimpleToken contract handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleToken {
    address: MsgAddress,
    init: Option<StateInit>,
}

impl Contract for SimpleToken {
    const NAME: &'static str = "SimpleToken";
    type Config = TokenConfig;

    fn serialize_config(config: &TokenConfig) -> ContractResult<Cell> {
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

impl SimpleToken {
    /// Deploy the token. Requires a handle created from a config.
    pub async fn send_deploy<S>(&self, via: &S, value: u128) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        contract::send_deploy(self, via, value).await
    }

    /// Mint `amount` tokens to `to`. Only the owner's mint is accepted on
    /// chain.
    pub async fn send_mint<S>(
        &self,
        via: &S,
        value: u128,
        to: &MsgAddress,
        amount: u128,
    ) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        let body = TokenOperation::Mint {
            to: to.clone(),
            amount,
        }
        .encode()?;
        contract::send_body(self, via, value, body, "mint").await
    }

    /// Transfer `amount` tokens from the sender to `to`.
    pub async fn send_transfer<S>(
        &self,
        via: &S,
        value: u128,
        to: &MsgAddress,
        amount: u128,
    ) -> ContractResult<()>
    where
        S: Sender + ?Sized,
    {
        let body = TokenOperation::Transfer {
            to: to.clone(),
            amount,
        }
        .encode()?;
        contract::send_body(self, via, value, body, "transfer").await
    }

    /// Total number of tokens minted so far.
    ///
    /// Calls the `get_total_supply` get method.
    pub async fn get_total_supply<P>(&self, provider: &P) -> ContractResult<u128>
    where
        P: GetMethodProvider + ?Sized,
    {
        self.run_uint_getter(provider, "get_total_supply", Vec::new()).await
    }

    /// Token balance of `owner`.
    ///
    /// Calls the `get_balance` get method with the owner address as a slice.
    pub async fn get_balance<P>(&self, provider: &P, owner: &MsgAddress) -> ContractResult<u128>
    where
        P: GetMethodProvider + ?Sized,
    {
        let args = vec![StackEntry::address(owner)?];
        self.run_uint_getter(provider, "get_balance", args).await
    }

    async fn run_uint_getter<P>(
        &self,
        provider: &P,
        method: &str,
        args: Vec<StackEntry>,
    ) -> ContractResult<u128>
    where
        P: GetMethodProvider + ?Sized,
    {
        trace!("Running {} on {}", method, self.address);
        let stack = provider.run_get_method(&self.address, method, args).await?;

        match stack.as_slice() {
            [entry] => entry.as_uint().ok_or_else(|| {
                ContractError::UnexpectedResult(format!(
                    "{} returned {} instead of a non-negative int",
                    method,
                    describe(entry)
                ))
            }),
            other => Err(ContractError::UnexpectedResult(format!(
                "{} returned {} stack entries, expected 1",
                method,
                other.len()
            ))),
        }
    }
}

fn describe(entry: &StackEntry) -> String {
    match entry {
        StackEntry::Int {
            negative: true,
            magnitude,
        } => format!("-{}", magnitude),
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::parse_amount;
    use crate::error::TransportError;
    use crate::message::{InternalMessage, SendMode};
    use std::sync::Mutex;
    use ton_cell::{CellBuilder, CellSlice};

    fn addr(byte: u8) -> MsgAddress {
        MsgAddress::Internal {
            workchain: 0,
            address: [byte; 32],
        }
    }

    fn code() -> Cell {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x70AC0DE).unwrap();
        builder.build().unwrap()
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<InternalMessage>>,
    }

    #[async_trait::async_trait]
    impl Sender for RecordingSender {
        fn address(&self) -> Option<&MsgAddress> {
            None
        }

        async fn send(&self, message: InternalMessage) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    struct FixedProvider(Vec<StackEntry>);

    #[async_trait::async_trait]
    impl GetMethodProvider for FixedProvider {
        async fn run_get_method(
            &self,
            _address: &MsgAddress,
            _method: &str,
            _args: Vec<StackEntry>,
        ) -> Result<Vec<StackEntry>, TransportError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_opcodes() {
        assert_eq!(opcodes::OP_MINT.to_be_bytes(), *b"MINT");
        assert_eq!(opcodes::OP_TRANSFER.to_be_bytes(), *b"TRAN");
    }

    #[test]
    fn test_mint_body_layout() {
        let body = TokenOperation::Mint {
            to: addr(0x22),
            amount: 1000,
        }
        .encode()
        .unwrap();

        assert_eq!(body.bit_len(), 32 + MsgAddress::STD_BITS + 128);
        assert_eq!(body.reference_count(), 0);

        let mut slice = CellSlice::new(&body);
        assert_eq!(slice.load_u32().unwrap(), 0x4d494e54);
        assert_eq!(slice.load_address().unwrap(), addr(0x22));
        assert_eq!(slice.load_uint128(128).unwrap(), 1000);
    }

    #[test]
    fn test_transfer_differs_from_mint_only_by_opcode() {
        let mint = TokenOperation::Mint {
            to: addr(1),
            amount: 5,
        }
        .encode()
        .unwrap();
        let transfer = TokenOperation::Transfer {
            to: addr(1),
            amount: 5,
        }
        .encode()
        .unwrap();

        assert_eq!(&transfer.data()[..4], b"TRAN");
        assert_eq!(&mint.data()[4..], &transfer.data()[4..]);
    }

    #[test]
    fn test_amount_range() {
        let max = parse_amount("340282366920938463463374607431768211455").unwrap();
        let body = TokenOperation::Mint {
            to: addr(1),
            amount: max,
        }
        .encode()
        .unwrap();
        assert_eq!(
            TokenOperation::decode(&body).unwrap(),
            TokenOperation::Mint {
                to: addr(1),
                amount: u128::MAX
            }
        );

        assert!(matches!(
            parse_amount("340282366920938463463374607431768211456"),
            Err(ContractError::Range { .. })
        ));
        assert!(matches!(parse_amount("-1000"), Err(ContractError::Range { .. })));
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            TokenOperation::decode(&Cell::empty()).unwrap(),
            TokenOperation::Deploy
        );

        let op = TokenOperation::Transfer {
            to: addr(9),
            amount: 250,
        };
        let decoded = TokenOperation::decode(&op.encode().unwrap()).unwrap();
        assert_eq!(decoded, op);
        assert_eq!(decoded.opcode(), Some(OP_TRANSFER));

        let mint = TokenOperation::Mint {
            to: addr(9),
            amount: 250,
        };
        assert_eq!(mint.opcode(), Some(OP_MINT));
    }

    #[test]
    fn test_decode_rejects_bad_bodies() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x5fcc3d14).unwrap();
        assert!(matches!(
            TokenOperation::decode(&builder.build().unwrap()),
            Err(ContractError::UnknownOpcode { opcode: 0x5fcc3d14, .. })
        ));

        // MINT without its payload.
        let mut builder = CellBuilder::new();
        builder.store_u32(OP_MINT).unwrap();
        assert!(matches!(
            TokenOperation::decode(&builder.build().unwrap()),
            Err(ContractError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_send_mint() {
        let token = SimpleToken::create_from_address(addr(0xAA));
        let sender = RecordingSender::default();

        token.send_mint(&sender, 50_000_000, &addr(0x22), 1000).await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, addr(0xAA));
        assert_eq!(sent[0].value, 50_000_000);
        assert_eq!(sent[0].send_mode, SendMode::PAY_GAS_SEPARATELY);
        assert!(sent[0].init.is_none());
        assert_eq!(
            TokenOperation::decode(&sent[0].body).unwrap(),
            TokenOperation::Mint {
                to: addr(0x22),
                amount: 1000
            }
        );
    }

    #[tokio::test]
    async fn test_send_deploy_attaches_state_init() {
        let token = SimpleToken::create_from_config(&TokenConfig::new(addr(0x01)), code()).unwrap();
        let sender = RecordingSender::default();

        token.send_deploy(&sender, 50_000_000).await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].to, *token.address());
        assert_eq!(sent[0].init.as_ref(), token.init());
        assert!(sent[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_send_deploy_by_address_sends_bare_message() {
        let token = SimpleToken::create_from_address(addr(0xAA));
        let sender = RecordingSender::default();

        token.send_deploy(&sender, 1).await.unwrap();
        assert!(matches!(token.state_init(), Err(ContractError::MissingStateInit)));

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, addr(0xAA));
        assert_eq!(sent[0].value, 1);
        assert!(!sent[0].is_deploy());
        assert!(sent[0].body.is_empty());
        assert!(sent[0].bounce);
        assert_eq!(sent[0].send_mode, SendMode::PAY_GAS_SEPARATELY);
        assert_eq!(TokenOperation::decode(&sent[0].body).unwrap().opcode(), None);
    }

    #[tokio::test]
    async fn test_get_total_supply() {
        let token = SimpleToken::create_from_address(addr(0xAA));

        let provider = FixedProvider(vec![StackEntry::uint(1000)]);
        assert_eq!(token.get_total_supply(&provider).await.unwrap(), 1000);

        let provider = FixedProvider(vec![StackEntry::int(-1)]);
        assert!(matches!(
            token.get_total_supply(&provider).await,
            Err(ContractError::UnexpectedResult(_))
        ));

        let provider = FixedProvider(Vec::new());
        assert!(matches!(
            token.get_balance(&provider, &addr(1)).await,
            Err(ContractError::UnexpectedResult(_))
        ));
    }
}
