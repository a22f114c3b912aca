//! ## Domain separation for consensus signatures
//!
//! A signature made in one context must never verify in another, so each
//! context hashes its messages to `G2` under its own tag.  Callers pick
//! the tag; nothing here infers one.

use digest::Digest;
use sha2::Sha256;

/// Default tag for message signatures in the proof-of-possession scheme.
pub const DST_SIGNATURE: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Tag for proofs of possession, distinct from every signing tag.
pub const DST_POP: &[u8] = b"BLS_POP_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub const DST_ATTESTATION: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_ATTESTATION";
pub const DST_PROPOSAL: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_PROPOSAL";
pub const DST_SYNC_COMMITTEE: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_SYNC_COMMITTEE";
pub const DST_RANDAO: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_RANDAO";
pub const DST_VOLUNTARY_EXIT: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_VOLUNTARY_EXIT";

/// `SHA-256(domain || message_root)`, the value actually signed.
pub fn compute_signing_root(domain: &[u8; 32], message_root: &[u8; 32]) -> [u8; 32] {
    Sha256::new()
        .chain_update(domain)
        .chain_update(message_root)
        .finalize()
        .into()
}

/// `domain_type || SHA-256(fork_version || genesis_validators_root)[..28]`.
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    let fork_data_root = Sha256::new()
        .chain_update(fork_version)
        .chain_update(genesis_validators_root)
        .finalize();
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}
