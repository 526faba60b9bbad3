//! CAIP-2 chain identifiers and CAIP-style transaction hashes.
//!
//! Reference: spec.md GLOSSARY ("CAIP-2") and §6.5.

use std::fmt;

/// A CAIP-2 chain identifier, e.g. `eip155:11155111` or `solana:<hash>`.
///
/// Stored as the raw `<namespace>:<reference>` string rather than a parsed
/// struct: the namespace/reference split has no behavior of its own here,
/// only the sanitized-path and CAIP-tx-hash parsing do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    /// Wrap a raw CAIP-2 string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The chain family, used to pick EVM vs SVM resolver behavior (§4.6).
    pub fn family(&self) -> ChainFamily {
        if self.0.starts_with("eip155:") {
            ChainFamily::Evm
        } else if self.0.starts_with("solana:") {
            ChainFamily::Svm
        } else {
            ChainFamily::Unknown
        }
    }

    /// Filesystem-safe form: any char outside `[A-Za-z0-9_-]` becomes `_`.
    ///
    /// Reference: spec.md §6.3.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Borrow the raw CAIP-2 string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The chain family a [`ChainId`] belongs to.
///
/// Reference: spec.md §9 — "represent EVM vs SVM builders as a tagged
/// capability set, not inheritance."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    /// `eip155:*` — EVM-compatible chain.
    Evm,
    /// `solana:*` — SVM-style chain.
    Svm,
    /// Neither recognized prefix.
    Unknown,
}

/// A CAIP-style destination-chain transaction hash: `<chainID>:<raw-hash>`,
/// where `<chainID>` itself contains a `:` and the *last* `:` is the single
/// separator.
///
/// Reference: spec.md §6.5, §8 (`parseCAIPTxHash`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaipTxHash(pub String);

impl CaipTxHash {
    /// Build a CAIP tx hash from its chain id and raw hash parts.
    pub fn new(chain: &ChainId, raw_hash: &str) -> Self {
        Self(format!("{chain}:{raw_hash}"))
    }

    /// Split on the last `:` into `(chainID, rawHash)`.
    ///
    /// Fails on an empty string, a missing separator, or an empty chain-id
    /// or hash component.
    pub fn parse(&self) -> Result<(ChainId, &str), ParseCaipTxHashError> {
        parse_caip_tx_hash(&self.0)
    }

    /// Borrow the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaipTxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by [`parse_caip_tx_hash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCaipTxHashError {
    /// The input had no `:` separator at all, or too few segments.
    #[error("missing chain-id/hash separator in {0:?}")]
    MissingSeparator(String),
    /// Either side of the split separator was empty.
    #[error("empty chain-id or hash in {0:?}")]
    EmptyComponent(String),
}

/// Parse `"<chainID>:<rawHash>"` by splitting on the *last* `:`.
///
/// Reference: spec.md §8:
/// - `parseCAIPTxHash("eip155:11155111:0xdead") = ("eip155:11155111", "0xdead")`
/// - `parseCAIPTxHash("solana:ABC:XYZ") = ("solana:ABC", "XYZ")`
/// - `""`, `"0xabc"`, `"eip155:11155111:"`, `":0xabc"` all fail.
pub fn parse_caip_tx_hash(raw: &str) -> Result<(ChainId, &str), ParseCaipTxHashError> {
    let idx = raw
        .rfind(':')
        .ok_or_else(|| ParseCaipTxHashError::MissingSeparator(raw.to_string()))?;
    let (chain_part, hash_part) = (&raw[..idx], &raw[idx + 1..]);
    if chain_part.is_empty() || hash_part.is_empty() {
        return Err(ParseCaipTxHashError::EmptyComponent(raw.to_string()));
    }
    Ok((ChainId::new(chain_part), hash_part))
}
