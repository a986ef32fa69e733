use std::fmt;
use std::str::FromStr;

use rand::RngCore;

/// Length in bytes of a peer's public identifier.
pub const PEER_ID_LEN: usize = 32;

/// Fixed-length public identifier a server is addressed by.
///
/// Rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    pub fn from_bytes(bytes: [u8; PEER_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// A fresh random identifier.
    pub fn random() -> Self {
        let mut bytes = [0u8; PEER_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PEER_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParsePeerIdError {
    #[error("peer id is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("peer id must be 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for PeerId {
    type Err = ParsePeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        let len = bytes.len();
        let bytes: [u8; PEER_ID_LEN] = bytes
            .try_into()
            .map_err(|_| ParsePeerIdError::Length(len))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", &self.to_hex()[..8])
    }
}
