//! fqmpoly is a library for sparse multivariate polynomials over finite fields.
//!
//! It provides prime fields and their algebraic extensions, polynomials with
//! exponents packed into machine words, heap-based multiplication and division,
//! square roots, and a modular GCD that keeps working over fields that are
//! too small to evaluate in.
//!
//! For example:
//!
//! ```
//! use std::sync::Arc;
//! use fqmpoly::domains::finite_field::Zp;
//! use fqmpoly::poly::{polynomial::MultivariatePolynomial, MonomialOrder, PolynomialContext};
//!
//! let field = Zp::new(7);
//! let ctx = Arc::new(PolynomialContext::from_names(&["x", "y"], MonomialOrder::DegRevLex));
//! let zero = MultivariatePolynomial::new(&field, ctx);
//! let (x, y) = (zero.variable(0), zero.variable(1));
//!
//! let a = &(&x + &y) * &(&x - &y);
//! let b = &(&x + &y) * &(&x + &y.one());
//! let g = a.gcd(&b).unwrap();
//! assert_eq!(g, &x + &y);
//! assert_eq!(a.divides(&g), Some(&x - &y));
//! ```
//!
//! Polynomials that are combined must share the same [PolynomialContext](poly::PolynomialContext),
//! which fixes the variables and the monomial order.

pub mod domains;
pub mod error;
pub mod poly;
