//! Polynomials in `x_0, ..., x_l` with dense univariate coefficients in `x_l`.
//!
//! This is the representation in which the dense GCD algorithm evaluates and
//! interpolates the last variable: a [RecursivePolynomial] at level `l` is a
//! sparse sum of monomials in `x_0, ..., x_{l-1}` (the prefix) with coefficients
//! in `F[x_l]`. Evaluating `x_l` at a point yields a polynomial at level `l - 1`,
//! where `x_{l-1}` in turn becomes the dense variable.

use std::cmp::Ordering;

use smallvec::{smallvec, SmallVec};

use super::polynomial::MultivariatePolynomial;
use super::univariate::UnivariatePolynomial;
use super::INLINED_EXPONENTS;
use crate::domains::algebraic_extension::AlgebraicExtension;
use crate::domains::{Field, GaloisField, Ring};

/// The exponents of `x_0, ..., x_{l-1}`.
pub type Prefix = SmallVec<[u64; INLINED_EXPONENTS]>;

/// A polynomial in `x_0, ..., x_{level}` stored as a sum of prefix monomials in
/// `x_0, ..., x_{level-1}` with dense coefficients in `x_{level}`.
///
/// The terms are sorted by decreasing lexicographic prefix and no coefficient is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecursivePolynomial<F: Ring> {
    pub(crate) terms: Vec<(Prefix, UnivariatePolynomial<F>)>,
    pub(crate) level: usize,
    pub(crate) field: F,
}

impl<F: Ring> RecursivePolynomial<F> {
    /// The zero polynomial at `level`.
    pub fn new(field: &F, level: usize) -> Self {
        RecursivePolynomial {
            terms: vec![],
            level,
            field: field.clone(),
        }
    }

    /// The constant polynomial `c(x_level)` at `level`.
    pub fn constant(field: &F, level: usize, c: UnivariatePolynomial<F>) -> Self {
        let mut r = Self::new(field, level);
        if !c.is_zero() {
            r.terms.push((smallvec![0; level], c));
        }
        r
    }

    /// Convert a polynomial whose used variables are `perm[0], ..., perm[l]`.
    /// Variable `perm[k]` becomes `x_k`, the last one is stored densely.
    ///
    /// Returns `None` if a dense exponent does not fit in a `usize`.
    pub fn from_polynomial(poly: &MultivariatePolynomial<F>, perm: &[usize]) -> Option<Self> {
        debug_assert!(!perm.is_empty());
        let level = perm.len() - 1;
        let last = perm[level];

        let mut entries: Vec<(Prefix, usize, F::Element)> = Vec::with_capacity(poly.nterms());
        for (i, c) in poly.coefficients.iter().enumerate() {
            let e = poly.exponents(i);
            debug_assert!(
                (0..poly.nvars()).all(|v| e[v] == 0 || perm.contains(&v)),
                "Variable outside of the permutation"
            );
            let prefix = perm[..level].iter().map(|v| e[*v]).collect();
            entries.push((prefix, usize::try_from(e[last]).ok()?, c.clone()));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0));

        let mut r = Self::new(&poly.field, level);
        let mut i = 0;
        while i < entries.len() {
            let mut j = i;
            let mut max_degree = 0;
            while j < entries.len() && entries[j].0 == entries[i].0 {
                max_degree = max_degree.max(entries[j].1);
                j += 1;
            }

            let mut coeffs = vec![poly.field.zero(); max_degree + 1];
            for (_, d, c) in &entries[i..j] {
                poly.field.add_assign(&mut coeffs[*d], c);
            }

            let u = UnivariatePolynomial::from_coefficients(&poly.field, coeffs);
            if !u.is_zero() {
                r.terms.push((entries[i].0.clone(), u));
            }
            i = j;
        }

        Some(r)
    }

    /// Convert back to a sparse polynomial in the ring of `template`, undoing the permutation.
    pub fn to_polynomial(
        &self,
        template: &MultivariatePolynomial<F>,
        perm: &[usize],
    ) -> MultivariatePolynomial<F> {
        debug_assert_eq!(perm.len(), self.level + 1);

        let mut terms = vec![];
        for (prefix, c) in &self.terms {
            for (d, cd) in c.coefficients.iter().enumerate() {
                if self.field.is_zero(cd) {
                    continue;
                }

                let mut e: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; template.nvars()];
                for (v, p) in perm.iter().zip(prefix) {
                    e[*v] = *p;
                }
                e[perm[self.level]] = d as u64;
                terms.push((cd.clone(), e));
            }
        }

        MultivariatePolynomial::from_terms(&template.field, template.context.clone(), terms)
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns true if the polynomial does not depend on any variable.
    pub fn is_constant(&self) -> bool {
        match self.terms.as_slice() {
            [] => true,
            [(prefix, c)] => prefix.iter().all(|e| *e == 0) && c.is_constant(),
            _ => false,
        }
    }

    /// The coefficient in `F[x_level]` of the largest prefix.
    ///
    /// # Panics
    /// Panics on the zero polynomial.
    pub fn lead_coefficient(&self) -> &UnivariatePolynomial<F> {
        &self.terms[0].1
    }

    /// The exponents of the lexicographically leading monomial in `x_0, ..., x_level`.
    pub fn leading_monomial(&self) -> Prefix {
        match self.terms.first() {
            Some((prefix, c)) => {
                let mut m = prefix.clone();
                m.push(c.degree() as u64);
                m
            }
            None => smallvec![0; self.level + 1],
        }
    }

    /// The degree in `x_level`.
    pub fn degree_last(&self) -> usize {
        self.terms.iter().map(|(_, c)| c.degree()).max().unwrap_or(0)
    }

    /// Multiply by a univariate polynomial in `x_level`.
    pub fn mul_last(&self, c: &UnivariatePolynomial<F>) -> Self {
        if c.is_zero() {
            return Self::new(&self.field, self.level);
        }
        if c.is_one() {
            return self.clone();
        }

        RecursivePolynomial {
            terms: self
                .terms
                .iter()
                .map(|(p, t)| (p.clone(), t * c))
                .collect(),
            level: self.level,
            field: self.field.clone(),
        }
    }

    /// Multiply every coefficient by a scalar.
    pub fn mul_scalar(self, c: &F::Element) -> Self {
        if self.field.is_zero(c) {
            return Self::new(&self.field, self.level);
        }

        RecursivePolynomial {
            terms: self
                .terms
                .into_iter()
                .map(|(p, t)| (p, t.mul_coeff(c)))
                .collect(),
            level: self.level,
            field: self.field,
        }
    }

    /// Lift an image at level `l - 1` to level `l`, as a polynomial that is constant in `x_l`.
    pub fn lift(&self) -> Self {
        let mut r = Self::new(&self.field, self.level + 1);
        for (prefix, c) in &self.terms {
            for (d, cd) in c.coefficients.iter().enumerate().rev() {
                if !self.field.is_zero(cd) {
                    let mut p = prefix.clone();
                    p.push(d as u64);
                    r.terms.push((p, UnivariatePolynomial::new(&self.field).constant(cd.clone())));
                }
            }
        }
        r
    }

    /// Map the coefficient of every term `i` to an element of `field`, collecting
    /// the terms of the image at level `l - 1`. The prefix exponent of `x_{l-1}`
    /// becomes the dense degree.
    fn reduce_last<E: Ring>(
        &self,
        field: &E,
        mut reduce: impl FnMut(usize, &UnivariatePolynomial<F>) -> E::Element,
    ) -> RecursivePolynomial<E> {
        debug_assert!(self.level > 0);
        let mut r = RecursivePolynomial::new(field, self.level - 1);

        let mut i = 0;
        while i < self.terms.len() {
            let outer = &self.terms[i].0[..self.level - 1];
            let mut j = i;
            let mut coeffs: Vec<E::Element> = vec![];
            while j < self.terms.len() && &self.terms[j].0[..self.level - 1] == outer {
                let (prefix, c) = &self.terms[j];
                let v = reduce(j, c);
                if !field.is_zero(&v) {
                    let d = prefix[self.level - 1] as usize;
                    if coeffs.is_empty() {
                        coeffs = vec![field.zero(); d + 1];
                    }
                    coeffs[d] = v;
                }
                j += 1;
            }

            if !coeffs.is_empty() {
                r.terms.push((
                    outer.iter().copied().collect(),
                    UnivariatePolynomial::from_coefficients(field, coeffs),
                ));
            }
            i = j;
        }

        r
    }

    /// Evaluate `x_level = alpha`, giving a polynomial at level `l - 1`.
    pub fn evaluate_last(&self, alpha: &F::Element) -> Self {
        self.reduce_last(&self.field, |_, c| c.evaluate(alpha))
    }

    /// Evaluate `x_level` at `alpha` and `-alpha` at the same time, by evaluating
    /// the even and odd parts of every coefficient at `alpha^2`.
    pub fn evaluate_last_pair(&self, alpha: &F::Element) -> (Self, Self) {
        let f = &self.field;
        let alpha2 = f.mul(alpha, alpha);
        let split: Vec<(F::Element, F::Element)> = self
            .terms
            .iter()
            .map(|(_, c)| {
                let (even, odd) = c.evaluate_even_odd(&alpha2);
                let odd = f.mul(&odd, alpha);
                (f.add(&even, &odd), f.sub(&even, &odd))
            })
            .collect();

        (
            self.reduce_last(f, |i, _| split[i].0.clone()),
            self.reduce_last(f, |i, _| split[i].1.clone()),
        )
    }

    /// Compute `self + c_new - c_old` coefficientwise, where `c_new` comes from the
    /// expanded image and `c_old` is the reduction of the current coefficient.
    /// The correction maps a difference in the image field to a polynomial
    /// in `x_level` that vanishes modulo the previous points.
    ///
    /// Returns true if any coefficient changed.
    fn interpolate_merge<E: Ring>(
        &mut self,
        image: &RecursivePolynomial<E>,
        reduce: impl Fn(&UnivariatePolynomial<F>) -> E::Element,
        correction: impl Fn(&E::Element) -> UnivariatePolynomial<F>,
    ) -> bool {
        debug_assert_eq!(image.level + 1, self.level);

        let ef = &image.field;
        let mut changed = false;
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut new = expanded_terms(image).peekable();
        let mut old = std::mem::take(&mut self.terms).into_iter().peekable();

        let mut update = |c: UnivariatePolynomial<F>, diff: E::Element| {
            if ef.is_zero(&diff) {
                c
            } else {
                changed = true;
                c + correction(&diff)
            }
        };

        loop {
            let order = match (old.peek(), new.peek()) {
                (Some((p, _)), Some((q, _))) => p.cmp(q),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => break,
            };

            let (prefix, c) = match order {
                Ordering::Greater => {
                    let Some((p, c)) = old.next() else { break };
                    let diff = ef.neg(&reduce(&c));
                    (p, update(c, diff))
                }
                Ordering::Less => {
                    let Some((q, v)) = new.next() else { break };
                    (q, update(UnivariatePolynomial::new(&self.field), v.clone()))
                }
                Ordering::Equal => {
                    let (Some((p, c)), Some((_, v))) = (old.next(), new.next()) else {
                        break;
                    };
                    let diff = ef.sub(v, &reduce(&c));
                    (p, update(c, diff))
                }
            };

            if !c.is_zero() {
                terms.push((prefix, c));
            }
        }

        self.terms = terms;
        changed
    }

    /// Like [Self::interpolate_merge], for an image whose expanded monomials
    /// are exactly the prefixes of `self`. Returns `None` without changing
    /// `self` if the shapes differ.
    fn interpolate_same_shape<E: Ring>(
        &mut self,
        image: &RecursivePolynomial<E>,
        reduce: impl Fn(&UnivariatePolynomial<F>) -> E::Element,
        correction: impl Fn(&E::Element) -> UnivariatePolynomial<F>,
    ) -> Option<bool> {
        let mut values = Vec::with_capacity(self.terms.len());
        let mut new = expanded_terms(image);
        for (p, _) in &self.terms {
            match new.next() {
                Some((q, v)) if &q == p => values.push(v),
                _ => return None,
            }
        }
        if new.next().is_some() {
            return None;
        }

        let ef = &image.field;
        let mut changed = false;
        for ((_, c), v) in self.terms.iter_mut().zip(values) {
            let diff = ef.sub(v, &reduce(c));
            if !ef.is_zero(&diff) {
                changed = true;
                *c = std::mem::replace(c, UnivariatePolynomial::new(&self.field)) + correction(&diff);
            }
        }

        // the corrections have a higher degree than the old coefficients, so no term vanishes
        debug_assert!(self.terms.iter().all(|(_, c)| !c.is_zero()));
        Some(changed)
    }
}

/// The terms of an image at level `l - 1` as `(prefix ++ [d], coefficient)` in decreasing order.
fn expanded_terms<E: Ring>(
    image: &RecursivePolynomial<E>,
) -> impl Iterator<Item = (Prefix, &E::Element)> + '_ {
    image.terms.iter().flat_map(move |(prefix, c)| {
        c.coefficients
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, cd)| !image.field.is_zero(cd))
            .map(move |(d, cd)| {
                let mut p = prefix.clone();
                p.push(d as u64);
                (p, cd)
            })
    })
}

impl<F: Field> RecursivePolynomial<F> {
    /// The gcd of all coefficients, as a monic polynomial in `x_level`.
    pub fn content_last(&self) -> UnivariatePolynomial<F> {
        let mut c = UnivariatePolynomial::new(&self.field);
        for (_, t) in &self.terms {
            c = c.gcd(t);
            if c.is_one() {
                break;
            }
        }
        c
    }

    /// Divide every coefficient by `c`, which must divide all of them.
    pub fn divexact_last(&self, c: &UnivariatePolynomial<F>) -> Self {
        if c.is_one() {
            return self.clone();
        }

        RecursivePolynomial {
            terms: self
                .terms
                .iter()
                .map(|(p, t)| (p.clone(), t.divexact(c)))
                .collect(),
            level: self.level,
            field: self.field.clone(),
        }
    }

    /// Update `self` with the image at `x_level = alpha`, where `self` is known
    /// modulo `modulus`. Returns true if `self` changed.
    pub fn interp_crt(
        &mut self,
        image: &Self,
        alpha: &F::Element,
        modulus: &UnivariatePolynomial<F>,
    ) -> bool {
        let f = self.field.clone();
        let minv = f.inv(&modulus.evaluate(alpha));
        self.interpolate_merge(
            image,
            |c| c.evaluate(alpha),
            |d| modulus.clone().mul_coeff(&f.mul(d, &minv)),
        )
    }

    /// The fast path of [Self::interp_crt] for an image with the same monomials as `self`.
    /// Returns `None` if the shapes differ.
    pub fn interp_mcrt(
        &mut self,
        image: &Self,
        alpha: &F::Element,
        modulus: &UnivariatePolynomial<F>,
    ) -> Option<bool> {
        let f = self.field.clone();
        let minv = f.inv(&modulus.evaluate(alpha));
        self.interpolate_same_shape(
            image,
            |c| c.evaluate(alpha),
            |d| modulus.clone().mul_coeff(&f.mul(d, &minv)),
        )
    }
}

impl<F: GaloisField> RecursivePolynomial<F> {
    /// Reduce the coefficients modulo the minimal polynomial of `ext`, whose
    /// generator takes the place of `x_level`.
    pub fn reduce_last_mod(&self, ext: &AlgebraicExtension<F>) -> RecursivePolynomial<AlgebraicExtension<F>> {
        self.reduce_last(ext, |_, c| ext.to_element(c))
    }

    /// Update `self` with an image modulo the minimal polynomial `m(x_level)` of
    /// the image field, where `self` is known modulo `modulus`, coprime to `m`.
    pub fn interp_crt_extension(
        &mut self,
        image: &RecursivePolynomial<AlgebraicExtension<F>>,
        modulus: &UnivariatePolynomial<F>,
    ) -> bool {
        let ext = image.field.clone();
        let minv = ext.inv(&ext.to_element(modulus));
        self.interpolate_merge(
            image,
            |c| ext.to_element(c),
            |d| modulus * &ext.to_polynomial(&ext.mul(d, &minv)),
        )
    }

    /// The fast path of [Self::interp_crt_extension]. Returns `None` if the shapes differ.
    pub fn interp_mcrt_extension(
        &mut self,
        image: &RecursivePolynomial<AlgebraicExtension<F>>,
        modulus: &UnivariatePolynomial<F>,
    ) -> Option<bool> {
        let ext = image.field.clone();
        let minv = ext.inv(&ext.to_element(modulus));
        self.interpolate_same_shape(
            image,
            |c| ext.to_element(c),
            |d| modulus * &ext.to_polynomial(&ext.mul(d, &minv)),
        )
    }
}

impl<F: GaloisField> RecursivePolynomial<AlgebraicExtension<F>> {
    /// Lift an image over an extension `F[v]/m(v)` to level `l + 1` over `F`,
    /// mapping `v` to `x_{l+1}`.
    pub fn lift_extension(&self) -> RecursivePolynomial<F> {
        let ext = &self.field;
        let mut r = RecursivePolynomial::new(ext.base(), self.level + 1);
        for (prefix, c) in &self.terms {
            for (d, cd) in c.coefficients.iter().enumerate().rev() {
                if !ext.is_zero(cd) {
                    let mut p = prefix.clone();
                    p.push(d as u64);
                    r.terms.push((p, ext.to_polynomial(cd)));
                }
            }
        }
        r
    }
}

impl<F: Ring> std::fmt::Display for RecursivePolynomial<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        for (i, (prefix, c)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "({})", c)?;
            for (v, e) in prefix.iter().enumerate() {
                if *e > 0 {
                    write!(f, "*x{}^{}", v, e)?;
                }
            }
        }
        Ok(())
    }
}
