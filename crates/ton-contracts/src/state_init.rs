//! StateInit and contract address derivation.
//!
//! A contract's address is the representation hash of its StateInit cell
//! in the chosen workchain:
//!
//! ```text
//! _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
//!   code:(Maybe ^Cell) data:(Maybe ^Cell)
//!   library:(Maybe ^Cell) = StateInit;
//! ```
//!
//! Only code and data are ever present here, so the cell is always the
//! five bits `0 0 1 1 0` with two references.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MAX_CELL_DEPTH, MsgAddress};
use tracing::trace;

use crate::error::{ContractError, ContractResult};

/// The primary workchain.
pub const BASECHAIN: i32 = 0;

/// The masterchain.
pub const MASTERCHAIN: i32 = -1;

/// Code and initial data of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    /// Compiled contract code.
    pub code: Arc<Cell>,
    /// Initial persistent data.
    pub data: Arc<Cell>,
}

impl StateInit {
    /// Create a StateInit from code and data cells.
    pub fn new(code: impl Into<Arc<Cell>>, data: impl Into<Arc<Cell>>) -> Self {
        Self {
            code: code.into(),
            data: data.into(),
        }
    }

    /// Serialize to the StateInit cell.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_bit(false)?; // split_depth
        builder.store_bit(false)?; // special
        builder.store_bit(true)?;
        builder.store_ref(self.code.clone())?;
        builder.store_bit(true)?;
        builder.store_ref(self.data.clone())?;
        builder.store_bit(false)?; // library
        Ok(builder.build()?)
    }

    /// Derive the address this StateInit deploys to.
    pub fn address(&self, workchain: i32) -> ContractResult<MsgAddress> {
        contract_address(workchain, self)
    }
}

/// Derive a contract address from its StateInit.
///
/// Pure: the same `(workchain, code, data)` always yields the same address.
/// Fails with `Range` if the workchain does not fit the int8 address field
/// and with `InvalidBlob` if code or data is deeper than the ledger accepts.
pub fn contract_address(workchain: i32, init: &StateInit) -> ContractResult<MsgAddress> {
    if i8::try_from(workchain).is_err() {
        return Err(ContractError::Range {
            field: "workchain",
            value: workchain.to_string(),
            bits: 8,
        });
    }

    for (name, cell) in [("code", &init.code), ("data", &init.data)] {
        if cell.depth() >= MAX_CELL_DEPTH {
            return Err(ContractError::InvalidBlob(format!(
                "{} cell depth {} exceeds {}",
                name,
                cell.depth(),
                MAX_CELL_DEPTH - 1
            )));
        }
    }

    let cell = init.to_cell().map_err(|e| ContractError::InvalidBlob(e.to_string()))?;
    let address = MsgAddress::Internal {
        workchain,
        address: cell.hash(),
    };
    trace!("Derived contract address {}", address);
    Ok(address)
}
