//! Message addresses and their text forms.
//!
//! Two text forms exist for a standard address: raw (`-1:3f9a...`) and
//! user-friendly, 48 characters of base64 over tag, workchain, account id
//! and a CRC-16/XMODEM checksum.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};

use crate::{CellError, CellResult, crc16_xmodem};

const BOUNCEABLE: u8 = 0x11;
const NON_BOUNCEABLE: u8 = 0x51;
const TESTNET_ONLY: u8 = 0x80;

/// Decoded length of a user-friendly address.
const FRIENDLY_BYTES: usize = 36;

/// Address field of a message or of contract data.
///
/// ```
/// use ton_cell::MsgAddress;
///
/// let owner: MsgAddress = "0:4f2a000000000000000000000000000000000000000000000000000000000001"
///     .parse()
///     .unwrap();
/// assert_eq!(owner.workchain(), Some(0));
/// assert!(owner.to_user_friendly(true, false).unwrap().starts_with("EQ"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MsgAddress {
    /// addr_none
    #[default]
    Null,

    /// addr_extern: `len` bits, left aligned in `data`.
    External { len: u16, data: Vec<u8> },

    /// addr_std without anycast.
    Internal { workchain: i32, address: [u8; 32] },
}

impl MsgAddress {
    /// Bits taken by an addr_std: tag, anycast flag, int8 workchain, 256-bit id.
    pub const STD_BITS: usize = 2 + 1 + 8 + 256;

    /// Raw `workchain:hex` form. Empty for addr_none.
    pub fn to_raw_string(&self) -> String {
        match self {
            MsgAddress::Null => String::new(),
            MsgAddress::External { len, data } => format!("extern:{}:{}", len, hex::encode(data)),
            MsgAddress::Internal { workchain, address } => {
                format!("{}:{}", workchain, hex::encode(address))
            }
        }
    }

    /// URL-safe user-friendly form.
    ///
    /// `None` unless this is an internal address whose workchain fits in
    /// one signed byte.
    pub fn to_user_friendly(&self, bounceable: bool, testnet: bool) -> Option<String> {
        let MsgAddress::Internal { workchain, address } = self else {
            return None;
        };
        let workchain = i8::try_from(*workchain).ok()?;

        let mut tag = if bounceable { BOUNCEABLE } else { NON_BOUNCEABLE };
        if testnet {
            tag |= TESTNET_ONLY;
        }

        let mut raw = Vec::with_capacity(FRIENDLY_BYTES);
        raw.extend([tag, workchain as u8]);
        raw.extend_from_slice(address);
        let checksum = crc16_xmodem(&raw);
        raw.extend(checksum.to_be_bytes());

        Some(URL_SAFE_NO_PAD.encode(&raw))
    }

    pub fn workchain(&self) -> Option<i32> {
        match self {
            MsgAddress::Internal { workchain, .. } => Some(*workchain),
            _ => None,
        }
    }

    /// Account id of an internal address.
    pub fn hash_part(&self) -> Option<&[u8; 32]> {
        match self {
            MsgAddress::Internal { address, .. } => Some(address),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, MsgAddress::Internal { .. })
    }
}

fn parse_raw(workchain: &str, account: &str) -> CellResult<MsgAddress> {
    let workchain = workchain
        .parse::<i32>()
        .map_err(|e| CellError::InvalidAddress(format!("workchain {:?}: {}", workchain, e)))?;
    let mut address = [0u8; 32];
    hex::decode_to_slice(account, &mut address)
        .map_err(|e| CellError::InvalidAddress(format!("account id {:?}: {}", account, e)))?;
    Ok(MsgAddress::Internal { workchain, address })
}

fn parse_friendly(text: &str) -> CellResult<MsgAddress> {
    let engine = if text.contains(['-', '_']) { &URL_SAFE } else { &STANDARD };
    let raw = engine
        .decode(text)
        .map_err(|e| CellError::InvalidBase64(e.to_string()))?;
    let Ok(raw) = <[u8; FRIENDLY_BYTES]>::try_from(raw) else {
        return Err(CellError::InvalidAddress(format!(
            "{:?} does not decode to {} bytes",
            text, FRIENDLY_BYTES
        )));
    };

    let (body, checksum) = raw.split_at(34);
    let computed = crc16_xmodem(body);
    if checksum != computed.to_be_bytes() {
        return Err(CellError::InvalidAddress(format!(
            "checksum {} does not match {:04x}",
            hex::encode(checksum),
            computed
        )));
    }

    if !matches!(raw[0] & !TESTNET_ONLY, BOUNCEABLE | NON_BOUNCEABLE) {
        return Err(CellError::InvalidAddress(format!("tag byte 0x{:02x}", raw[0])));
    }

    let mut address = [0u8; 32];
    address.copy_from_slice(&raw[2..34]);
    Ok(MsgAddress::Internal {
        workchain: raw[1] as i8 as i32,
        address,
    })
}

impl FromStr for MsgAddress {
    type Err = CellError;

    /// Accepts the raw form, the user-friendly form in either base64
    /// alphabet, and blank input as addr_none.
    fn from_str(s: &str) -> CellResult<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(MsgAddress::Null);
        }
        if let Some((workchain, account)) = text.split_once(':') {
            return parse_raw(workchain, account);
        }
        if text.len() == 48 {
            return parse_friendly(text);
        }
        Err(CellError::InvalidAddress(format!("cannot read {:?} as an address", text)))
    }
}

impl fmt::Display for MsgAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw_string())
    }
}
