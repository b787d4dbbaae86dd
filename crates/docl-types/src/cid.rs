use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Prefix of identifiers minted by DocLedger's own blob stores.
const NATIVE_PREFIX: &str = "b3";

/// Upper bound on identifier length accepted from external stores.
const MAX_LEN: usize = 256;

/// Content identifier of a stored blob.
///
/// A `Cid` is opaque to the ledger: any non-empty printable string handed back
/// by a blob store is a valid key. DocLedger's own stores mint *native* CIDs,
/// `b3` followed by the lowercase hex BLAKE3 digest of the content, so the
/// digest can be recovered for on-read verification. Identical content always
/// produces the same native `Cid`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
    /// Validate and wrap an identifier returned by a blob store or a caller.
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        if s.is_empty() {
            return Err(TypeError::InvalidCid(s, "empty"));
        }
        if s.len() > MAX_LEN {
            return Err(TypeError::InvalidCid(s, "too long"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidCid(s, "contains whitespace or control characters"));
        }
        Ok(Self(s))
    }

    /// Mint a native CID from a 32-byte content digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(format!("{NATIVE_PREFIX}{}", hex::encode(digest)))
    }

    /// Recover the content digest of a native CID.
    ///
    /// Returns `None` for identifiers minted by foreign stores.
    pub fn digest(&self) -> Option<[u8; 32]> {
        let hex_part = self.0.strip_prefix(NATIVE_PREFIX)?;
        if hex_part.len() != 64 {
            return None;
        }
        let bytes = hex::decode(hex_part).ok()?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Some(out)
    }

    /// Returns `true` if this identifier was minted by a DocLedger store.
    pub fn is_native(&self) -> bool {
        self.digest().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (first 12 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.short())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
