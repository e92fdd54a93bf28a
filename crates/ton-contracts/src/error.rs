//! Error types for contract encoding and contract handles.

use thiserror::Error;
use ton_cell::CellError;

/// Errors that can occur while encoding, deriving or sending.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A numeric field does not fit its declared unsigned width.
    #[error("{field} = {value} does not fit in {bits} unsigned bits")]
    Range {
        field: &'static str,
        value: String,
        bits: usize,
    },

    /// A cell would exceed 1023 bits or 4 references.
    #[error("Cell capacity exceeded: {0}")]
    Capacity(String),

    /// Code or data cell cannot be used for address derivation.
    #[error("Invalid blob: {0}")]
    InvalidBlob(String),

    /// Failure reported by the transport or query collaborator.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Any other cell primitive failure.
    #[error("Cell error: {0}")]
    Cell(CellError),

    /// The handle was bound by address and carries no code/data.
    #[error("Contract has no state init (bound by address)")]
    MissingStateInit,

    /// The opcode is not one this contract kind understands.
    #[error("Unknown opcode 0x{opcode:08x} for {contract}")]
    UnknownOpcode { opcode: u32, contract: &'static str },

    /// Message body has leftover or missing fields.
    #[error("Malformed message body: {0}")]
    MalformedBody(String),

    /// Get method returned a stack of the wrong shape.
    #[error("Unexpected get method result: {0}")]
    UnexpectedResult(String),

    /// Deploy manifest could not be parsed or resolved.
    #[error("Invalid deploy manifest: {0}")]
    InvalidManifest(String),
}

impl From<CellError> for ContractError {
    fn from(err: CellError) -> Self {
        match err {
            CellError::DataTooLong(_) | CellError::TooManyRefs(_) => {
                ContractError::Capacity(err.to_string())
            }
            CellError::IntegerOverflow { value, bits } => ContractError::Range {
                field: "value",
                value,
                bits,
            },
            other => ContractError::Cell(other),
        }
    }
}

/// Opaque error surfaced unchanged from the transport collaborator.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    /// Wrap any error produced by a transport implementation.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;
