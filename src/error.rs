//! ## Errors raised across the signature subsystem
//!
//! Every failure is one of four kinds.  Format errors are found by
//! looking at bytes alone, before any curve arithmetic runs.
//! Curve-membership errors mean the bytes parse but the point is
//! off the curve or outside the prime-order subgroup.  Semantic errors
//! are misuse of an API, like empty lists, zero weights or duplicate
//! signers.  Verification errors mean well-formed input failed a
//! cryptographic check.  A pairing check that merely returns false is
//! reported as `false` and never as an error.

use crate::serialize::PointError;

/// Coarse classification of a [`BlsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong length, bad flag bits or an out-of-range coordinate.
    Format,
    /// In-range coordinates that are off the curve or outside the subgroup.
    CurveMembership,
    /// Empty inputs, zero weights, duplicates, closed aggregators.
    Semantic,
    /// Well-formed input that failed a cryptographic check.
    Verification,
}

/// Errors produced by key handling, aggregation and batch verification.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlsError {
    #[error("public key must be 48 bytes, got {0}")]
    InvalidPubkeyLength(usize),
    #[error("public key has malformed compression flags or coordinate")]
    InvalidPubkeyFormat,
    #[error("public key is the point at infinity")]
    InfinitePubkey,
    #[error("signature must be 96 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("signature has malformed compression flags or coordinate")]
    InvalidSignatureFormat,
    #[error("signature is the point at infinity")]
    InfiniteSignature,
    #[error("invalid public key: {0}")]
    InvalidPubkey(#[source] PointError),
    #[error("invalid signature: {0}")]
    InvalidSignature(#[source] PointError),

    #[error("no public keys provided")]
    NoPubkeys,
    #[error("no signatures provided")]
    NoSignatures,
    #[error("no messages provided")]
    NoMessages,
    #[error("input counts differ: {left} vs {right}")]
    MismatchedLengths { left: usize, right: usize },
    #[error("weight of entry {index} is zero")]
    ZeroWeight { index: usize },
    #[error("duplicate public key")]
    DuplicatePubkey,
    #[error("duplicate batch entry tag")]
    DuplicateTag,
    #[error("signer {0} already contributed a partial signature")]
    DuplicateSigner(u32),
    #[error("batch aggregator is closed")]
    BatchClosed,
    #[error("batch is empty")]
    EmptyBatch,
    #[error("threshold not met: {collected} of {threshold} partial signatures")]
    ThresholdNotMet { collected: usize, threshold: usize },
    #[error("threshold must be at least one")]
    ZeroThreshold,
    #[error("domain separation tag is {0} bytes, at most 255 allowed")]
    DstTooLong(usize),
    #[error("cannot expand a message to {0} bytes")]
    InvalidExpandLength(usize),
    #[error("key material must be at least 32 bytes, got {0}")]
    InvalidKeyMaterial(usize),
    #[error("secret key is zero or not below the group order")]
    InvalidSecretKey,

    #[error("proof of possession verification failed")]
    PopFailed,
}

impl BlsError {
    /// Which of the four error kinds this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use BlsError::*;
        match self {
            InvalidPubkeyLength(_)
            | InvalidPubkeyFormat
            | InfinitePubkey
            | InvalidSignatureLength(_)
            | InvalidSignatureFormat
            | InfiniteSignature => ErrorKind::Format,
            InvalidPubkey(e) | InvalidSignature(e) => e.kind(),
            NoPubkeys | NoSignatures | NoMessages | MismatchedLengths { .. } | ZeroWeight { .. }
            | DuplicatePubkey | DuplicateTag | DuplicateSigner(_) | BatchClosed | EmptyBatch
            | ThresholdNotMet { .. } | ZeroThreshold | DstTooLong(_) | InvalidExpandLength(_)
            | InvalidKeyMaterial(_)
            | InvalidSecretKey => ErrorKind::Semantic,
            PopFailed => ErrorKind::Verification,
        }
    }
}

/// Result alias used throughout the crate.
pub type BlsResult<T> = Result<T, BlsError>;
