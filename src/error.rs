//! Errors raised while constructing fields.
//!
//! Arithmetic itself never returns an error: algorithms that may decline
//! return an [Option], and domain violations such as dividing by the zero
//! polynomial panic.

use thiserror::Error;

/// Failure to construct a finite field or an extension of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is not a prime")]
    NotPrime(u64),
    #[error("prime {0} does not fit in 63 bits")]
    TooLarge(u64),
    #[error("the minimal polynomial {0} is not monic")]
    NotMonic(String),
    #[error("the minimal polynomial {0} is reducible")]
    Reducible(String),
    #[error("an extension needs a minimal polynomial of degree at least one, got degree {0}")]
    InvalidDegree(usize),
}

/// An exponent or a total degree does not fit in the packed field width.
///
/// Arithmetic handles this internally, either by repacking to a wider
/// layout or by reporting that an exact result does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("exponent does not fit in {bits} bits")]
pub struct ExponentOverflow {
    pub bits: u32,
}
