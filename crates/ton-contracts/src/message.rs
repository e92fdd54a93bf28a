//! Internal messages handed to the transport.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};

use crate::error::ContractResult;
use crate::state_init::StateInit;

/// Send mode flags of an outgoing internal message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SendMode(u8);

impl SendMode {
    /// Fees are deducted from the attached value.
    pub const ORDINARY: SendMode = SendMode(0);
    /// Sender pays forwarding fees separately from the attached value.
    pub const PAY_GAS_SEPARATELY: SendMode = SendMode(1);
    /// Errors during the action phase are ignored.
    pub const IGNORE_ERRORS: SendMode = SendMode(2);
    /// Carry the remaining value of the inbound message.
    pub const CARRY_ALL_REMAINING_INCOMING_VALUE: SendMode = SendMode(64);
    /// Carry the whole remaining balance.
    pub const CARRY_ALL_BALANCE: SendMode = SendMode(128);

    /// Create from raw flag bits.
    pub const fn from_bits(bits: u8) -> Self {
        SendMode(bits)
    }

    /// Raw flag bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag of `other` is set.
    pub const fn contains(self, other: SendMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SendMode {
    type Output = SendMode;

    fn bitor(self, rhs: SendMode) -> SendMode {
        SendMode(self.0 | rhs.0)
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An internal message from a sender to a contract.
///
/// Contract handles produce these; the [`Sender`](crate::Sender) wraps them
/// into whatever its wallet signs and delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMessage {
    /// Destination contract.
    pub to: MsgAddress,
    /// Native coins attached, in nanotons.
    pub value: u128,
    /// Bounce back on failure.
    pub bounce: bool,
    /// Send mode flags.
    pub send_mode: SendMode,
    /// Code and data to deploy with this message.
    pub init: Option<StateInit>,
    /// Message body.
    pub body: Arc<Cell>,
}

impl InternalMessage {
    /// Create a bounceable message paying gas separately.
    pub fn new(to: MsgAddress, value: u128, body: impl Into<Arc<Cell>>) -> Self {
        Self {
            to,
            value,
            bounce: true,
            send_mode: SendMode::PAY_GAS_SEPARATELY,
            init: None,
            body: body.into(),
        }
    }

    /// Attach a StateInit.
    pub fn with_init(mut self, init: StateInit) -> Self {
        self.init = Some(init);
        self
    }

    /// Set bounce flag.
    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    /// Set send mode.
    pub fn with_send_mode(mut self, send_mode: SendMode) -> Self {
        self.send_mode = send_mode;
        self
    }

    /// True if this message deploys its destination.
    pub fn is_deploy(&self) -> bool {
        self.init.is_some()
    }

    /// Serialize as a relaxed internal message (`MessageRelaxed`).
    ///
    /// Source, fees and timestamps are left zero; the sending wallet fills
    /// them in on chain. StateInit and body always go into references.
    pub fn to_cell(&self) -> ContractResult<Cell> {
        let mut builder = CellBuilder::new();

        // int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_bit(self.bounce)?;
        builder.store_bit(false)?;

        // src:MsgAddress dest:MsgAddressInt
        builder.store_address(&MsgAddress::Null)?;
        builder.store_address(&self.to)?;

        // value:CurrencyCollection
        builder.store_coins(self.value)?;
        builder.store_bit(false)?;

        // ihr_fee fwd_fee created_lt created_at
        builder.store_coins(0)?;
        builder.store_coins(0)?;
        builder.store_u64(0)?;
        builder.store_u32(0)?;

        // init:(Maybe (Either StateInit ^StateInit))
        match &self.init {
            Some(init) => {
                builder.store_bit(true)?;
                builder.store_bit(true)?;
                builder.store_ref(Arc::new(init.to_cell()?))?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        // body:(Either X ^X)
        builder.store_bit(true)?;
        builder.store_ref(self.body.clone())?;

        Ok(builder.build()?)
    }
}
