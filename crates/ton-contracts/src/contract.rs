//! Behaviour shared by every contract handle.
//!
//! A handle is either bound by address (already deployed, no StateInit) or
//! bound by config (address derived from code and data, StateInit kept for
//! the deploy message). Handles are immutable after construction.

use std::sync::Arc;

use ton_cell::{Cell, CellError, CellSlice, MsgAddress};
use tracing::debug;

use crate::error::{ContractError, ContractResult};
use crate::message::InternalMessage;
use crate::provider::Sender;
use crate::state_init::{BASECHAIN, StateInit, contract_address};

/// A typed handle to one kind of contract.
pub trait Contract: Sized {
    /// Contract name used in logs and errors.
    const NAME: &'static str;

    /// Deploy-time configuration.
    type Config;

    /// Serialize a config into the initial data cell.
    fn serialize_config(config: &Self::Config) -> ContractResult<Cell>;

    /// Assemble a handle from its parts.
    fn from_parts(address: MsgAddress, init: Option<StateInit>) -> Self;

    /// Contract address.
    fn address(&self) -> &MsgAddress;

    /// Code and data, present only on handles created from a config.
    fn init(&self) -> Option<&StateInit>;

    /// Bind to an already deployed contract.
    fn create_from_address(address: MsgAddress) -> Self {
        Self::from_parts(address, None)
    }

    /// Bind to the contract that `config` and `code` deploy to in the
    /// basechain.
    fn create_from_config(
        config: &Self::Config,
        code: impl Into<Arc<Cell>>,
    ) -> ContractResult<Self> {
        Self::create_from_config_in(config, code, BASECHAIN)
    }

    /// Bind to the contract that `config` and `code` deploy to in
    /// `workchain`.
    fn create_from_config_in(
        config: &Self::Config,
        code: impl Into<Arc<Cell>>,
        workchain: i32,
    ) -> ContractResult<Self> {
        let data = Self::serialize_config(config)?;
        let init = StateInit::new(code, data);
        let address = contract_address(workchain, &init)?;
        debug!("{} bound by config at {}", Self::NAME, address);
        Ok(Self::from_parts(address, Some(init)))
    }

    /// Code and data, or `MissingStateInit` for an address-bound handle.
    fn state_init(&self) -> ContractResult<&StateInit> {
        self.init().ok_or(ContractError::MissingStateInit)
    }

    /// Bounceable user-friendly form of the address.
    fn user_friendly_address(&self, testnet: bool) -> Option<String> {
        self.address().to_user_friendly(true, testnet)
    }
}

/// Send `body` to `contract` through `via`, attaching `value`.
pub(crate) async fn send_body<C, S>(
    contract: &C,
    via: &S,
    value: u128,
    body: Cell,
    operation: &'static str,
) -> ContractResult<()>
where
    C: Contract,
    S: Sender + ?Sized,
{
    let message = InternalMessage::new(contract.address().clone(), value, body);
    deliver(C::NAME, via, message, operation).await
}

/// Send the deploy message: an empty body, carrying the StateInit when the
/// handle has one. An address-bound handle sends the bare empty message.
pub(crate) async fn send_deploy<C, S>(contract: &C, via: &S, value: u128) -> ContractResult<()>
where
    C: Contract,
    S: Sender + ?Sized,
{
    let mut message = InternalMessage::new(contract.address().clone(), value, Cell::empty());
    if let Some(init) = contract.init() {
        message = message.with_init(init.clone());
    }
    deliver(C::NAME, via, message, "deploy").await
}

async fn deliver<S>(
    name: &'static str,
    via: &S,
    message: InternalMessage,
    operation: &'static str,
) -> ContractResult<()>
where
    S: Sender + ?Sized,
{
    debug!(
        "{} {} -> {} value={} mode={} body={}",
        name,
        operation,
        message.to,
        message.value,
        message.send_mode,
        hex::encode(message.body.hash())
    );
    via.send(message).await?;
    Ok(())
}

/// Split a body into its opcode and the remaining payload.
///
/// Returns `None` for the empty body.
pub(crate) fn split_opcode(body: &Cell) -> ContractResult<Option<(u32, CellSlice<'_>)>> {
    if body.bit_len() == 0 && body.reference_count() == 0 {
        return Ok(None);
    }
    let mut slice = CellSlice::new(body);
    let opcode = slice.load_u32().map_err(malformed)?;
    Ok(Some((opcode, slice)))
}

/// Fail if the payload has anything left after decoding.
pub(crate) fn expect_end(slice: &CellSlice<'_>) -> ContractResult<()> {
    if !slice.is_empty() {
        return Err(ContractError::MalformedBody(format!(
            "{} trailing bits, {} trailing refs",
            slice.bits_left(),
            slice.refs_left()
        )));
    }
    Ok(())
}

/// A body that ran out of data while decoding.
pub(crate) fn malformed(err: CellError) -> ContractError {
    ContractError::MalformedBody(err.to_string())
}
