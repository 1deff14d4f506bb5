//! # Bucket Registry & Transfer Compatibility Policy
//!
//! The same token exists in four places at once: as a native ledger asset
//! and as a contract-managed balance, on each of the two ledgers. Each of
//! those four (network × representation) balances is a **bucket**.
//!
//! ## The Four Buckets
//!
//! | Bucket | Network | Representation |
//! |--------|---------|----------------|
//! | `algorand-native` | Algorand | Native asset |
//! | `algorand-contract` | Algorand | Contract-managed |
//! | `voi-native` | Voi | Native asset |
//! | `voi-contract` | Voi | Contract-managed |
//!
//! ## Compatibility Policy
//!
//! `is_transfer_allowed` is the single predicate that gates every wizard
//! transition. Same-network moves are representation conversions
//! (deposit/withdraw). Cross-network moves go through the bridge relay,
//! which only settles into the native representation on the destination
//! side — so any move *into* a contract-managed bucket on the other
//! network is disallowed.

use serde::{Deserialize, Serialize};

/// One of the two ledgers the token lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The Algorand ledger.
    Algorand,
    /// The Voi ledger.
    Voi,
}

impl Network {
    /// The other ledger.
    ///
    /// Used by the bridge-status retry heuristic when the original
    /// destination turned out to be ambiguous.
    pub fn other(&self) -> Network {
        match self {
            Network::Algorand => Network::Voi,
            Network::Voi => Network::Algorand,
        }
    }

    /// Stable identifier used in config keys and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Algorand => "algorand",
            Network::Voi => "voi",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the token is held on a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Representation {
    /// First-class ledger asset (requires recipient opt-in).
    Native,
    /// Internal balance inside the token smart contract; converting
    /// to/from the native asset goes through deposit/withdraw calls.
    ContractManaged,
}

/// Identity of one of the exactly four buckets.
///
/// Network and representation are read from the identity itself, never
/// inferred from balances or live queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketId {
    AlgorandNative,
    AlgorandContract,
    VoiNative,
    VoiContract,
}

impl BucketId {
    /// All four buckets, in the fixed display order.
    pub const ALL: [BucketId; 4] = [
        BucketId::AlgorandNative,
        BucketId::AlgorandContract,
        BucketId::VoiNative,
        BucketId::VoiContract,
    ];

    /// The ledger this bucket lives on.
    pub fn network(&self) -> Network {
        match self {
            BucketId::AlgorandNative | BucketId::AlgorandContract => Network::Algorand,
            BucketId::VoiNative | BucketId::VoiContract => Network::Voi,
        }
    }

    /// How the token is held in this bucket.
    pub fn representation(&self) -> Representation {
        match self {
            BucketId::AlgorandNative | BucketId::VoiNative => Representation::Native,
            BucketId::AlgorandContract | BucketId::VoiContract => {
                Representation::ContractManaged
            }
        }
    }

    /// Stable identifier used in API payloads and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketId::AlgorandNative => "algorand-native",
            BucketId::AlgorandContract => "algorand-contract",
            BucketId::VoiNative => "voi-native",
            BucketId::VoiContract => "voi-contract",
        }
    }
}

impl std::fmt::Display for BucketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bucket with its balance as of the last refresh cycle.
///
/// Rebuilt from live balance queries by the balance refresher; immutable
/// between refreshes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Bucket identity.
    pub id: BucketId,

    /// The ledger this bucket lives on (derived from `id`).
    pub network: Network,

    /// Token representation (derived from `id`).
    pub representation: Representation,

    /// Balance in base units as of the last refresh.
    pub balance: u64,
}

impl Bucket {
    /// Build a bucket from its identity and a fetched balance.
    pub fn new(id: BucketId, balance: u64) -> Self {
        Self {
            id,
            network: id.network(),
            representation: id.representation(),
            balance,
        }
    }
}

/// Whether a transfer from one bucket to another is supported.
///
/// ## Policy Table
///
/// | from | to | same network | allowed |
/// |------|----|--------------|---------|
/// | any | same bucket | — | no |
/// | contract | native | yes | yes (withdraw) |
/// | native | contract | yes | yes (deposit) |
/// | native | native | no | yes (bridge) |
/// | contract | native | no | yes (withdraw, then bridge) |
/// | native | contract | no | no |
/// | contract | contract | no | no |
///
/// The relay settles into the native representation only, so nothing can
/// land directly in a contract-managed bucket on the other network.
pub fn is_transfer_allowed(from: BucketId, to: BucketId) -> bool {
    if from == to {
        return false;
    }

    if from.network() == to.network() {
        // Same network: only the two representation conversions exist.
        // from != to on the same network already implies the
        // representation differs.
        return true;
    }

    // Cross network: the destination must be the native representation.
    matches!(to.representation(), Representation::Native)
}

#[cfg(test)]
mod tests {
    use super::*;

    use BucketId::*;

    #[test]
    fn same_bucket_is_never_allowed() {
        for id in BucketId::ALL {
            assert!(!is_transfer_allowed(id, id), "{} -> {} must be false", id, id);
        }
    }

    #[test]
    fn policy_matches_table_for_all_ordered_pairs() {
        // (from, to, allowed) for all 12 ordered distinct pairs.
        let expected = [
            // Same-network conversions.
            (AlgorandNative, AlgorandContract, true),
            (AlgorandContract, AlgorandNative, true),
            (VoiNative, VoiContract, true),
            (VoiContract, VoiNative, true),
            // Cross-network into native: allowed.
            (AlgorandNative, VoiNative, true),
            (VoiNative, AlgorandNative, true),
            (AlgorandContract, VoiNative, true),
            (VoiContract, AlgorandNative, true),
            // Cross-network into contract-managed: disallowed.
            (AlgorandNative, VoiContract, false),
            (VoiNative, AlgorandContract, false),
            (AlgorandContract, VoiContract, false),
            (VoiContract, AlgorandContract, false),
        ];

        for (from, to, allowed) in expected {
            assert_eq!(
                is_transfer_allowed(from, to),
                allowed,
                "{} -> {} expected {}",
                from,
                to,
                allowed
            );
        }
    }

    #[test]
    fn identity_determines_network_and_representation() {
        assert_eq!(AlgorandContract.network(), Network::Algorand);
        assert_eq!(AlgorandContract.representation(), Representation::ContractManaged);
        assert_eq!(VoiNative.network(), Network::Voi);
        assert_eq!(VoiNative.representation(), Representation::Native);
    }

    #[test]
    fn network_other_flips() {
        assert_eq!(Network::Algorand.other(), Network::Voi);
        assert_eq!(Network::Voi.other(), Network::Algorand);
    }
}
