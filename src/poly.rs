//! Multivariate polynomials over finite fields.
//!
//! A [MultivariatePolynomial](polynomial::MultivariatePolynomial) stores its
//! terms in strictly decreasing order, with the exponents packed into machine
//! words by an [ExponentLayout](monomial::ExponentLayout). Arithmetic that can
//! produce many terms, such as multiplication and division, runs as a heap
//! merge over the packed exponents (see [heap]). The GCD is computed with
//! Brown's dense evaluation and interpolation algorithm (see [gcd]).
pub mod gcd;
pub mod heap;
pub mod monomial;
pub mod polynomial;
pub mod recursive;
pub mod univariate;

use std::fmt::{Display, Formatter};

use smartstring::{LazyCompact, SmartString};

/// The number of exponents that are stored inline before a heap allocation is made.
pub const INLINED_EXPONENTS: usize = 6;

/// A variable of a polynomial.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    Symbol(SmartString<LazyCompact>),
    /// An anonymous variable, printed as `_TMP_n`.
    Temporary(usize),
}

impl From<&str> for Variable {
    fn from(s: &str) -> Variable {
        Variable::Symbol(s.into())
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Symbol(s) => f.write_str(s),
            Variable::Temporary(t) => write!(f, "_TMP_{}", t),
        }
    }
}

/// A total order on monomials that is compatible with multiplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonomialOrder {
    /// Lexicographic order with `x_0 > x_1 > ...`.
    Lex,
    /// Total degree first, ties broken lexicographically.
    DegLex,
    /// Total degree first, ties broken by the smallest exponent of the last variable.
    DegRevLex,
}

impl MonomialOrder {
    /// Returns true if the order compares the total degree first.
    #[inline]
    pub fn is_graded(&self) -> bool {
        !matches!(self, MonomialOrder::Lex)
    }
}

/// The variables of a polynomial ring and the order of its monomials.
///
/// A context is immutable once created and is shared by all polynomials
/// of the same ring through an [Arc](std::sync::Arc).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PolynomialContext {
    variables: Vec<Variable>,
    order: MonomialOrder,
}

impl PolynomialContext {
    pub fn new(variables: Vec<Variable>, order: MonomialOrder) -> PolynomialContext {
        PolynomialContext { variables, order }
    }

    /// Create a context from variable names.
    pub fn from_names(names: &[&str], order: MonomialOrder) -> PolynomialContext {
        PolynomialContext {
            variables: names.iter().map(|n| Variable::from(*n)).collect(),
            order,
        }
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn order(&self) -> MonomialOrder {
        self.order
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}
