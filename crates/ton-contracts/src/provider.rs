//! Transport and query seams.
//!
//! Contract handles never talk to the network themselves. Delivery goes
//! through a [`Sender`] and get-method queries through a
//! [`GetMethodProvider`], both supplied by the caller. Retries, timeouts
//! and deploy-completion polling are the implementor's business.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};

use crate::error::{ContractResult, TransportError};
use crate::message::InternalMessage;

/// Something that can deliver internal messages, usually a wallet.
#[async_trait::async_trait]
pub trait Sender: Send + Sync {
    /// Address the messages originate from, if known.
    fn address(&self) -> Option<&MsgAddress>;

    /// Deliver one internal message.
    async fn send(&self, message: InternalMessage) -> Result<(), TransportError>;
}

/// Something that can run get methods on deployed contracts.
#[async_trait::async_trait]
pub trait GetMethodProvider: Send + Sync {
    /// Run `method` on `address` with `args` and return the result stack,
    /// top of stack last.
    async fn run_get_method(
        &self,
        address: &MsgAddress,
        method: &str,
        args: Vec<StackEntry>,
    ) -> Result<Vec<StackEntry>, TransportError>;
}

/// A TVM stack value as exchanged with a [`GetMethodProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    /// Null.
    Null,
    /// Integer in sign-magnitude form.
    Int { negative: bool, magnitude: u128 },
    /// Cell.
    Cell(Arc<Cell>),
    /// Slice covering a whole cell.
    Slice(Arc<Cell>),
}

impl StackEntry {
    /// Non-negative integer entry.
    pub fn uint(value: u128) -> Self {
        StackEntry::Int {
            negative: false,
            magnitude: value,
        }
    }

    /// Signed integer entry.
    pub fn int(value: i128) -> Self {
        StackEntry::Int {
            negative: value < 0,
            magnitude: value.unsigned_abs(),
        }
    }

    /// Slice entry holding a single address.
    pub fn address(address: &MsgAddress) -> ContractResult<Self> {
        let mut builder = CellBuilder::new();
        builder.store_address(address)?;
        Ok(StackEntry::Slice(Arc::new(builder.build()?)))
    }

    /// The value of a non-negative integer entry.
    ///
    /// Negative zero counts as zero.
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            StackEntry::Int {
                negative: false,
                magnitude,
            } => Some(*magnitude),
            StackEntry::Int {
                negative: true,
                magnitude: 0,
            } => Some(0),
            _ => None,
        }
    }

    /// Entry type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            StackEntry::Null => "null",
            StackEntry::Int { .. } => "int",
            StackEntry::Cell(_) => "cell",
            StackEntry::Slice(_) => "slice",
        }
    }
}
