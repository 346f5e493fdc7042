//! Contains the different kinds of RPC providers receipts can be fetched from.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The RPC provider kind identifies the L1 RPC provider or execution client,
/// used to hint at the optimal receipt fetching approach.
///
/// Receipts are encoded the same everywhere, but providers differ in which bulk receipt methods
/// they serve and what they charge for them.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcProviderKind {
    /// Alchemy.
    #[display("alchemy")]
    #[serde(rename = "alchemy")]
    Alchemy,
    /// QuickNode.
    #[display("quicknode")]
    #[serde(rename = "quicknode")]
    QuickNode,
    /// Infura.
    #[display("infura")]
    #[serde(rename = "infura")]
    Infura,
    /// Legacy open-ethereum / parity nodes.
    #[display("parity")]
    #[serde(rename = "parity")]
    Parity,
    /// Nethermind.
    #[display("nethermind")]
    #[serde(rename = "nethermind")]
    Nethermind,
    /// Geth with the `debug` namespace enabled.
    #[display("debug_geth")]
    #[serde(rename = "debug_geth")]
    DebugGeth,
    /// Erigon.
    #[display("erigon")]
    #[serde(rename = "erigon")]
    Erigon,
    /// Only try the standard, most basic receipt fetching.
    #[display("basic")]
    #[serde(rename = "basic")]
    Basic,
    /// Try any receipt fetching method.
    #[display("any")]
    #[serde(rename = "any")]
    Any,
    /// Try standard methods, including newer optimized standard RPC methods.
    #[display("standard")]
    #[serde(rename = "standard")]
    #[default]
    Standard,
}

impl RpcProviderKind {
    /// Contains all valid RPC provider kinds.
    pub const KINDS: [Self; 10] = [
        Self::Alchemy,
        Self::QuickNode,
        Self::Infura,
        Self::Parity,
        Self::Nethermind,
        Self::DebugGeth,
        Self::Erigon,
        Self::Basic,
        Self::Any,
        Self::Standard,
    ];

    /// Returns the string form of the kind, as accepted by [`FromStr`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alchemy => "alchemy",
            Self::QuickNode => "quicknode",
            Self::Infura => "infura",
            Self::Parity => "parity",
            Self::Nethermind => "nethermind",
            Self::DebugGeth => "debug_geth",
            Self::Erigon => "erigon",
            Self::Basic => "basic",
            Self::Any => "any",
            Self::Standard => "standard",
        }
    }
}

/// An unknown RPC provider kind was supplied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rpc kind: {0:?}")]
pub struct UnknownRpcProviderKind(pub String);

impl FromStr for RpcProviderKind {
    type Err = UnknownRpcProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KINDS
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownRpcProviderKind(s.to_string()))
    }
}
