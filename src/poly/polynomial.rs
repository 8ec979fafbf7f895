use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;

use smallvec::{smallvec, SmallVec};

use super::monomial::{bits_for_degrees, ExponentLayout, PackedExponents};
use super::{PolynomialContext, INLINED_EXPONENTS};
use crate::domains::{Field, GaloisField, Ring};
use crate::error::ExponentOverflow;

/// A sparse multivariate polynomial over a ring `F`.
///
/// The i-th term is stored as `coefficients[i]` and the packed exponents
/// `exponents[i * N..(i + 1) * N]`, where `N` is the number of words of the
/// [ExponentLayout]. Terms are sorted in strictly decreasing order, so the
/// first term is the leading term, and no coefficient is zero.
///
/// All operands of a binary operation must have the same field and an equal
/// context. This is checked in debug builds only.
#[derive(Clone)]
pub struct MultivariatePolynomial<F: Ring> {
    pub coefficients: Vec<F::Element>,
    pub(crate) exponents: Vec<u64>,
    pub field: F,
    pub(crate) layout: ExponentLayout,
    pub context: Arc<PolynomialContext>,
}

impl<F: Ring> MultivariatePolynomial<F> {
    /// Constructs a zero polynomial. Instead of using this constructor,
    /// prefer to create new polynomials from existing ones, so that the
    /// context and field are inherited.
    pub fn new(field: &F, context: Arc<PolynomialContext>) -> Self {
        Self::with_bits(field, context, 8)
    }

    /// Constructs a zero polynomial whose exponents are packed in fields of `bits` bits.
    pub fn with_bits(field: &F, context: Arc<PolynomialContext>, bits: u32) -> Self {
        Self {
            coefficients: vec![],
            exponents: vec![],
            field: field.clone(),
            layout: ExponentLayout::new(context.nvars(), context.order(), bits),
            context,
        }
    }

    /// Constructs a polynomial from terms in any order. Terms with equal
    /// exponents are merged.
    pub fn from_terms<E: AsRef<[u64]>>(
        field: &F,
        context: Arc<PolynomialContext>,
        terms: impl IntoIterator<Item = (F::Element, E)>,
    ) -> Self {
        let p = Self::new(field, context);
        p.rebuild(
            terms
                .into_iter()
                .map(|(c, e)| (c, e.as_ref().into()))
                .collect(),
            false,
        )
    }

    /// Constructs a zero polynomial, inheriting the field, context and layout from `self`.
    #[inline]
    pub fn zero(&self) -> Self {
        self.zero_with_capacity(0)
    }

    /// Constructs a zero polynomial with the given capacity,
    /// inheriting the field, context and layout from `self`.
    #[inline]
    pub fn zero_with_capacity(&self, cap: usize) -> Self {
        Self {
            coefficients: Vec::with_capacity(cap),
            exponents: Vec::with_capacity(cap * self.layout.words()),
            field: self.field.clone(),
            layout: self.layout.clone(),
            context: self.context.clone(),
        }
    }

    /// Constructs a constant polynomial, inheriting the field and context from `self`.
    #[inline]
    pub fn constant(&self, coeff: F::Element) -> Self {
        if self.field.is_zero(&coeff) {
            return self.zero();
        }

        let mut r = self.zero_with_capacity(1);
        r.coefficients.push(coeff);
        r.exponents.extend_from_slice(&self.layout.zero());
        r
    }

    #[inline]
    pub fn one(&self) -> Self {
        self.constant(self.field.one())
    }

    /// Constructs a polynomial with a single term.
    pub fn monomial(&self, coeff: F::Element, exponents: &[u64]) -> Self {
        debug_assert_eq!(exponents.len(), self.nvars());
        if self.field.is_zero(&coeff) {
            return self.zero();
        }

        let bits = bits_for_degrees(self.layout.order(), exponents).max(self.bits());
        let mut r = self.zero().with_layout_bits(bits);
        let e = r.layout.pack_unchecked(exponents);
        r.push_packed(coeff, &e);
        r
    }

    /// Constructs the polynomial `x_var`.
    pub fn variable(&self, var: usize) -> Self {
        let mut e: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; self.nvars()];
        e[var] = 1;
        self.monomial(self.field.one(), &e)
    }

    #[inline]
    pub fn layout(&self) -> &ExponentLayout {
        &self.layout
    }

    /// The width of the packed exponent fields.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.layout.bits()
    }

    /// Returns the number of variables in the polynomial.
    #[inline]
    pub fn nvars(&self) -> usize {
        self.context.nvars()
    }

    /// Returns the number of terms in the polynomial.
    #[doc(alias = "length")]
    #[inline]
    pub fn nterms(&self) -> usize {
        self.coefficients.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.nterms() == 0
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.is_constant() && !self.is_zero() && self.field.is_one(&self.coefficients[0])
    }

    /// Returns true if the polynomial is constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        match self.nterms() {
            0 => true,
            1 => self.packed(0).iter().all(|w| *w == 0),
            _ => false,
        }
    }

    /// Get the constant term of the polynomial.
    pub fn get_constant(&self) -> F::Element {
        match self.nterms() {
            0 => self.field.zero(),
            n if self.packed(n - 1).iter().all(|w| *w == 0) => self.coefficients[n - 1].clone(),
            _ => self.field.zero(),
        }
    }

    /// Returns the packed exponents of the `index`-th term.
    #[inline]
    pub fn packed(&self, index: usize) -> &[u64] {
        let w = self.layout.words();
        &self.exponents[index * w..(index + 1) * w]
    }

    /// Returns the exponents of the `index`-th term.
    #[inline]
    pub fn exponents(&self, index: usize) -> SmallVec<[u64; INLINED_EXPONENTS]> {
        self.layout.unpack(self.packed(index))
    }

    /// Returns the exponent of `var` in the `index`-th term.
    #[inline]
    pub fn exponent(&self, index: usize, var: usize) -> u64 {
        self.layout.exponent(self.packed(index), var)
    }

    /// Get the leading coefficient, or zero for the zero polynomial.
    pub fn lcoeff(&self) -> F::Element {
        match self.coefficients.first() {
            Some(c) => c.clone(),
            None => self.field.zero(),
        }
    }

    /// Get the exponents of the leading term.
    pub fn leading_exponents(&self) -> SmallVec<[u64; INLINED_EXPONENTS]> {
        if self.is_zero() {
            smallvec![0; self.nvars()]
        } else {
            self.exponents(0)
        }
    }

    /// Get the degree of the variable `var`. The zero polynomial has degree 0.
    pub fn degree(&self, var: usize) -> u64 {
        (0..self.nterms())
            .map(|i| self.exponent(i, var))
            .max()
            .unwrap_or(0)
    }

    /// Get the degree of every variable.
    pub fn degrees(&self) -> SmallVec<[u64; INLINED_EXPONENTS]> {
        let mut d: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; self.nvars()];
        for i in 0..self.nterms() {
            for (dd, e) in d.iter_mut().zip(self.exponents(i)) {
                *dd = (*dd).max(e);
            }
        }
        d
    }

    /// Get the total degree, saturating at `u64::MAX`.
    pub fn total_degree(&self) -> u64 {
        (0..self.nterms())
            .map(|i| self.layout.total_degree(self.packed(i)))
            .max()
            .map(|d| u64::try_from(d).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }

    /// Ensure that the buffers can hold at least `n` terms. The capacity grows geometrically.
    pub fn fit_length(&mut self, n: usize) {
        let cap = self.coefficients.capacity();
        if cap < n {
            let new_cap = n.max(2 * cap);
            self.coefficients.reserve(new_cap - self.nterms());
            self.exponents
                .reserve(new_cap * self.layout.words() - self.exponents.len());
        }
    }

    /// Append a term with packed exponents to the back, without any checks.
    #[inline]
    pub(crate) fn push_packed(&mut self, coeff: F::Element, exponents: &[u64]) {
        self.coefficients.push(coeff);
        self.exponents.extend_from_slice(exponents);
    }

    /// Append a term to the back, widening the exponent fields if needed.
    /// The polynomial may no longer be sorted; call [Self::canonicalize]
    /// after appending all terms.
    pub fn append_term(&mut self, coeff: F::Element, exponents: &[u64]) {
        if self.field.is_zero(&coeff) {
            return;
        }

        match self.layout.pack(exponents) {
            Ok(e) => self.push_packed(coeff, &e),
            Err(_) => {
                let bits = bits_for_degrees(self.layout.order(), exponents).max(self.bits());
                *self = self.with_layout_bits(bits);
                let e = self.layout.pack_unchecked(exponents);
                self.push_packed(coeff, &e);
            }
        }
    }

    /// Restore the canonical form after terms were appended in any order.
    pub fn canonicalize(&mut self) {
        self.sort_terms();
        self.combine_like_terms();
    }

    /// Sort the terms in decreasing order with a most significant digit
    /// binary radix sort on the masked exponent bits. Only the bits that
    /// differ between terms are inspected.
    pub fn sort_terms(&mut self) {
        let n = self.nterms();
        if n < 2 {
            return;
        }

        let keys: Vec<PackedExponents> = (0..n).map(|i| self.layout.key(self.packed(i))).collect();
        let mut relevant: PackedExponents = smallvec![0; self.layout.words()];
        for k in &keys[1..] {
            for ((r, a), b) in relevant.iter_mut().zip(k).zip(&keys[0]) {
                *r |= a ^ b;
            }
        }

        let mut perm: Vec<u32> = (0..n as u32).collect();
        radix_sort(&keys, &mut perm, &relevant, 0);

        let w = self.layout.words();
        let mut coefficients = Vec::with_capacity(n);
        let mut exponents = Vec::with_capacity(n * w);
        for i in perm {
            let i = i as usize;
            coefficients.push(self.coefficients[i].clone());
            exponents.extend_from_slice(&self.exponents[i * w..(i + 1) * w]);
        }
        self.coefficients = coefficients;
        self.exponents = exponents;
    }

    /// Merge adjacent terms with equal exponents and drop zero coefficients.
    pub fn combine_like_terms(&mut self) {
        let w = self.layout.words();
        let mut coefficients: Vec<F::Element> = Vec::with_capacity(self.nterms());
        let mut exponents: Vec<u64> = Vec::with_capacity(self.exponents.len());

        for (i, c) in std::mem::take(&mut self.coefficients).into_iter().enumerate() {
            let e = &self.exponents[i * w..(i + 1) * w];
            if !coefficients.is_empty() && &exponents[exponents.len() - w..] == e {
                if let Some(last) = coefficients.last_mut() {
                    self.field.add_assign(last, &c);
                }
                continue;
            }

            if coefficients.last().is_some_and(|l| self.field.is_zero(l)) {
                coefficients.pop();
                exponents.truncate(exponents.len() - w);
            }
            coefficients.push(c);
            exponents.extend_from_slice(e);
        }

        if coefficients.last().is_some_and(|l| self.field.is_zero(l)) {
            coefficients.pop();
            exponents.truncate(exponents.len() - w);
        }

        self.coefficients = coefficients;
        self.exponents = exponents;
    }

    /// Check if no exponent overflows, the terms are strictly decreasing
    /// and no coefficient is zero.
    pub fn is_canonical(&self) -> bool {
        if self.exponents.len() != self.nterms() * self.layout.words() {
            return false;
        }

        if self.coefficients.iter().any(|c| self.field.is_zero(c)) {
            return false;
        }

        if (0..self.nterms()).any(|i| self.layout.overflows(self.packed(i))) {
            return false;
        }

        (1..self.nterms())
            .all(|i| self.layout.cmp(self.packed(i - 1), self.packed(i)) == Ordering::Greater)
    }

    /// Panic if the polynomial is not in canonical form.
    pub fn assert_canonical(&self) {
        if !self.is_canonical() {
            panic!("Inconsistent polynomial: {:?}", self);
        }
    }

    /// Change the width of the exponent fields. The order of the terms is preserved.
    pub fn repack(&self, bits: u32) -> Result<Self, ExponentOverflow> {
        let layout = ExponentLayout::new(self.nvars(), self.layout.order(), bits);
        if layout == self.layout {
            return Ok(self.clone());
        }

        let mut exponents = Vec::with_capacity(self.nterms() * layout.words());
        for i in 0..self.nterms() {
            exponents.extend_from_slice(&layout.pack(&self.exponents(i))?);
        }

        Ok(Self {
            coefficients: self.coefficients.clone(),
            exponents,
            field: self.field.clone(),
            layout,
            context: self.context.clone(),
        })
    }

    /// Repack to at least `bits` bits. Widening always succeeds.
    pub(crate) fn with_layout_bits(&self, bits: u32) -> Self {
        if bits <= self.bits() {
            return self.clone();
        }

        let layout = ExponentLayout::new(self.nvars(), self.layout.order(), bits);
        let mut exponents = Vec::with_capacity(self.nterms() * layout.words());
        for i in 0..self.nterms() {
            exponents.extend_from_slice(&layout.pack_unchecked(&self.exponents(i)));
        }

        Self {
            coefficients: self.coefficients.clone(),
            exponents,
            field: self.field.clone(),
            layout,
            context: self.context.clone(),
        }
    }

    /// Bring two polynomials to the same exponent width.
    pub(crate) fn unify_bits<'a>(a: &'a Self, b: &'a Self) -> (Cow<'a, Self>, Cow<'a, Self>) {
        debug_assert_eq!(a.context, b.context);
        debug_assert_eq!(a.field, b.field);

        match a.bits().cmp(&b.bits()) {
            Ordering::Equal => (Cow::Borrowed(a), Cow::Borrowed(b)),
            Ordering::Less => (Cow::Owned(a.with_layout_bits(b.bits())), Cow::Borrowed(b)),
            Ordering::Greater => (Cow::Borrowed(a), Cow::Owned(b.with_layout_bits(a.bits()))),
        }
    }

    /// Build a polynomial from unpacked terms with the smallest width that fits.
    /// If `sorted` is false, the terms are sorted and merged.
    fn rebuild(&self, terms: Vec<(F::Element, SmallVec<[u64; INLINED_EXPONENTS]>)>, sorted: bool) -> Self {
        let mut degrees: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; self.nvars()];
        for (_, e) in &terms {
            for (d, e) in degrees.iter_mut().zip(e) {
                *d = (*d).max(*e);
            }
        }

        let bits = bits_for_degrees(self.layout.order(), &degrees);
        let mut r = Self::with_bits(&self.field, self.context.clone(), bits);
        r.fit_length(terms.len());
        for (c, e) in terms {
            if !self.field.is_zero(&c) {
                let p = r.layout.pack_unchecked(&e);
                r.push_packed(c, &p);
            }
        }

        if !sorted {
            r.canonicalize();
        }
        r
    }

    /// Add or subtract `other` by merging the sorted term lists.
    fn add_sub(&self, other: &Self, subtract: bool) -> Self {
        let (a, b) = Self::unify_bits(self, other);
        let mut res = a.zero_with_capacity(a.nterms() + b.nterms());

        let (mut i, mut j) = (0, 0);
        while i < a.nterms() && j < b.nterms() {
            match a.layout.cmp(a.packed(i), b.packed(j)) {
                Ordering::Greater => {
                    res.push_packed(a.coefficients[i].clone(), a.packed(i));
                    i += 1;
                }
                Ordering::Less => {
                    let c = if subtract {
                        a.field.neg(&b.coefficients[j])
                    } else {
                        b.coefficients[j].clone()
                    };
                    res.push_packed(c, b.packed(j));
                    j += 1;
                }
                Ordering::Equal => {
                    let c = if subtract {
                        a.field.sub(&a.coefficients[i], &b.coefficients[j])
                    } else {
                        a.field.add(&a.coefficients[i], &b.coefficients[j])
                    };
                    if !a.field.is_zero(&c) {
                        res.push_packed(c, a.packed(i));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        for i in i..a.nterms() {
            res.push_packed(a.coefficients[i].clone(), a.packed(i));
        }
        for j in j..b.nterms() {
            let c = if subtract {
                a.field.neg(&b.coefficients[j])
            } else {
                b.coefficients[j].clone()
            };
            res.push_packed(c, b.packed(j));
        }

        res
    }

    /// Multiply every coefficient by `coeff`.
    pub fn mul_coeff(mut self, coeff: &F::Element) -> Self {
        if self.field.is_zero(coeff) {
            return self.zero();
        }
        if self.field.is_one(coeff) {
            return self;
        }

        for c in &mut self.coefficients {
            self.field.mul_assign(c, coeff);
        }

        self
    }

    /// Replace `x_var` by `value`. The result has the same variables.
    pub fn evaluate(&self, var: usize, value: &F::Element) -> Self {
        let mut terms = Vec::with_capacity(self.nterms());
        for i in 0..self.nterms() {
            let mut e = self.exponents(i);
            let c = self
                .field
                .mul(&self.coefficients[i], &self.field.pow(value, e[var]));
            e[var] = 0;
            terms.push((c, e));
        }
        self.rebuild(terms, false)
    }

    /// Evaluate the polynomial at the point `values`.
    pub fn evaluate_all(&self, values: &[F::Element]) -> F::Element {
        debug_assert_eq!(values.len(), self.nvars());

        let mut res = self.field.zero();
        for i in 0..self.nterms() {
            let mut t = self.coefficients[i].clone();
            for (v, e) in values.iter().zip(self.exponents(i)) {
                if e > 0 {
                    self.field.mul_assign(&mut t, &self.field.pow(v, e));
                }
            }
            self.field.add_assign(&mut res, &t);
        }
        res
    }

    /// Substitute `x_i -> x_i^stride[i]` and multiply by `x^shift`.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` if an exponent does not fit in 64 bits.
    pub fn inflate(&self, shift: &[u64], stride: &[u64]) -> Self {
        debug_assert!(shift.len() == self.nvars() && stride.len() == self.nvars());

        let mut terms = Vec::with_capacity(self.nterms());
        for i in 0..self.nterms() {
            let mut e = self.exponents(i);
            for ((e, sh), st) in e.iter_mut().zip(shift).zip(stride) {
                *e = match e.checked_mul(*st).and_then(|x| x.checked_add(*sh)) {
                    Some(x) => x,
                    None => panic!("InvalidOperand: inflated exponent does not fit in 64 bits"),
                };
            }
            terms.push((self.coefficients[i].clone(), e));
        }

        let keeps_order =
            !self.layout.order().is_graded() && stride.iter().all(|s| *s > 0);
        self.rebuild(terms, keeps_order)
    }

    /// Undo [Self::inflate]: substitute `x_i^stride[i] -> x_i` after dividing by `x^shift`.
    /// A stride of zero requires that every exponent of that variable equals its shift.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` if an exponent is not of the form `shift + k * stride`.
    pub fn deflate(&self, shift: &[u64], stride: &[u64]) -> Self {
        debug_assert!(shift.len() == self.nvars() && stride.len() == self.nvars());

        let mut terms = Vec::with_capacity(self.nterms());
        for i in 0..self.nterms() {
            let mut e = self.exponents(i);
            for ((e, sh), st) in e.iter_mut().zip(shift).zip(stride) {
                let d = match e.checked_sub(*sh) {
                    Some(d) if *st == 0 && d == 0 => 0,
                    Some(d) if *st > 0 && d % st == 0 => d / st,
                    _ => panic!(
                        "InvalidOperand: exponent {} is not {} plus a multiple of {}",
                        e, sh, st
                    ),
                };
                *e = d;
            }
            terms.push((self.coefficients[i].clone(), e));
        }

        let keeps_order =
            !self.layout.order().is_graded() && stride.iter().all(|s| *s > 0);
        self.rebuild(terms, keeps_order)
    }

    /// Compute the largest `(shift, stride)` such that the polynomial is the
    /// inflation of another polynomial. A variable whose exponent is the same
    /// in every term has stride 0.
    pub fn deflation(
        &self,
    ) -> (
        SmallVec<[u64; INLINED_EXPONENTS]>,
        SmallVec<[u64; INLINED_EXPONENTS]>,
    ) {
        let mut shift: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; self.nvars()];
        let mut stride: SmallVec<[u64; INLINED_EXPONENTS]> = smallvec![0; self.nvars()];
        if self.is_zero() {
            return (shift, stride);
        }

        shift.copy_from_slice(&self.exponents(0));
        for i in 1..self.nterms() {
            for (s, e) in shift.iter_mut().zip(self.exponents(i)) {
                *s = (*s).min(e);
            }
        }

        for i in 0..self.nterms() {
            for ((st, s), e) in stride.iter_mut().zip(&shift).zip(self.exponents(i)) {
                *st = gcd_unsigned(*st, e - s);
            }
        }

        (shift, stride)
    }
}

impl<F: Field> MultivariatePolynomial<F> {
    /// Divide every coefficient by the leading coefficient.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` on the zero polynomial.
    pub fn make_monic(self) -> Self {
        if self.is_zero() {
            panic!("InvalidOperand: cannot make the zero polynomial monic");
        }

        let lc = self.lcoeff();
        if self.field.is_one(&lc) {
            return self;
        }

        let inv = self.field.inv(&lc);
        self.mul_coeff(&inv)
    }
}

impl<F: GaloisField> MultivariatePolynomial<F> {
    /// Compute `self^pow`.
    pub fn pow(&self, mut pow: usize) -> Self {
        if pow == 0 {
            return self.one();
        }

        let mut x = self.clone();
        let mut y = self.one();
        while pow != 1 {
            if pow % 2 == 1 {
                y = y.heap_mul(&x);
                pow -= 1;
            }

            x = x.heap_mul(&x);
            pow /= 2;
        }

        x.heap_mul(&y)
    }
}

pub(crate) fn gcd_unsigned(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Sort `perm` by decreasing key, starting at bit `pos` counted from the most significant bit.
fn radix_sort(keys: &[PackedExponents], perm: &mut [u32], relevant: &[u64], mut pos: usize) {
    let total = relevant.len() * 64;
    let mut perm = perm;
    while perm.len() > 1 && pos < total {
        let (w, b) = (pos / 64, 63 - pos % 64);
        pos += 1;
        if (relevant[w] >> b) & 1 == 0 {
            continue;
        }

        let mut split = 0;
        for j in 0..perm.len() {
            if (keys[perm[j] as usize][w] >> b) & 1 == 1 {
                perm.swap(split, j);
                split += 1;
            }
        }

        let (hi, lo) = std::mem::take(&mut perm).split_at_mut(split);
        radix_sort(keys, hi, relevant, pos);
        perm = lo;
    }
}

impl<F: Ring> std::fmt::Debug for MultivariatePolynomial<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "[]");
        }
        write!(f, "[ ")?;
        for i in 0..self.nterms() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{{ {:?}, {:?} }}",
                self.coefficients[i],
                self.exponents(i).as_slice()
            )?;
        }
        write!(f, " ]")
    }
}

impl<F: Ring> Display for MultivariatePolynomial<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        for i in 0..self.nterms() {
            if i > 0 {
                write!(f, "+")?;
            }

            let e = self.exponents(i);
            let c = &self.coefficients[i];
            let constant = e.iter().all(|x| *x == 0);
            let mut first = true;
            if constant || !self.field.is_one(c) {
                write!(f, "{}", self.field.printer(c))?;
                first = false;
            }

            for (v, e) in self.context.variables().iter().zip(&e) {
                if *e == 0 {
                    continue;
                }
                if !first {
                    write!(f, "*")?;
                }
                first = false;
                if *e == 1 {
                    write!(f, "{}", v)?;
                } else {
                    write!(f, "{}^{}", v, e)?;
                }
            }
        }
        Ok(())
    }
}

impl<F: Ring> PartialEq for MultivariatePolynomial<F> {
    fn eq(&self, other: &Self) -> bool {
        if self.nterms() != other.nterms() || self.coefficients != other.coefficients {
            return false;
        }

        if self.layout == other.layout {
            return self.exponents == other.exponents;
        }

        (0..self.nterms()).all(|i| self.exponents(i) == other.exponents(i))
    }
}

impl<F: Ring> Eq for MultivariatePolynomial<F> {}

impl<F: Ring> std::hash::Hash for MultivariatePolynomial<F> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coefficients.hash(state);
        for i in 0..self.nterms() {
            self.exponents(i).hash(state);
        }
    }
}

impl<'a, 'b, F: Ring> Add<&'a MultivariatePolynomial<F>> for &'b MultivariatePolynomial<F> {
    type Output = MultivariatePolynomial<F>;

    fn add(self, other: &'a MultivariatePolynomial<F>) -> Self::Output {
        self.add_sub(other, false)
    }
}

impl<F: Ring> Add for MultivariatePolynomial<F> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        if self.is_zero() {
            return other;
        }
        if other.is_zero() {
            return self;
        }
        self.add_sub(&other, false)
    }
}

impl<'a, 'b, F: Ring> Sub<&'a MultivariatePolynomial<F>> for &'b MultivariatePolynomial<F> {
    type Output = MultivariatePolynomial<F>;

    fn sub(self, other: &'a MultivariatePolynomial<F>) -> Self::Output {
        self.add_sub(other, true)
    }
}

impl<F: Ring> Sub for MultivariatePolynomial<F> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        self.add_sub(&other, true)
    }
}

impl<F: Ring> Neg for MultivariatePolynomial<F> {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        for c in &mut self.coefficients {
            *c = self.field.neg(c);
        }
        self
    }
}

impl<'a, 'b, F: GaloisField> Mul<&'a MultivariatePolynomial<F>> for &'b MultivariatePolynomial<F> {
    type Output = MultivariatePolynomial<F>;

    fn mul(self, rhs: &'a MultivariatePolynomial<F>) -> Self::Output {
        self.heap_mul(rhs)
    }
}

impl<'a, F: GaloisField> Mul<&'a MultivariatePolynomial<F>> for MultivariatePolynomial<F> {
    type Output = MultivariatePolynomial<F>;

    #[inline]
    fn mul(self, rhs: &'a MultivariatePolynomial<F>) -> Self::Output {
        self.heap_mul(rhs)
    }
}

impl<'a, F: Ring> AddAssign<&'a MultivariatePolynomial<F>> for MultivariatePolynomial<F> {
    fn add_assign(&mut self, rhs: &'a MultivariatePolynomial<F>) {
        *self = self.add_sub(rhs, false);
    }
}

impl<'a, F: Ring> SubAssign<&'a MultivariatePolynomial<F>> for MultivariatePolynomial<F> {
    fn sub_assign(&mut self, rhs: &'a MultivariatePolynomial<F>) {
        *self = self.add_sub(rhs, true);
    }
}

impl<'a, F: GaloisField> MulAssign<&'a MultivariatePolynomial<F>> for MultivariatePolynomial<F> {
    fn mul_assign(&mut self, rhs: &'a MultivariatePolynomial<F>) {
        *self = self.heap_mul(rhs);
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::MultivariatePolynomial;
    use crate::domains::finite_field::Zp;
    use crate::domains::Ring;
    use crate::poly::{MonomialOrder, PolynomialContext};

    fn context(order: MonomialOrder) -> Arc<PolynomialContext> {
        Arc::new(PolynomialContext::from_names(&["x", "y", "z"], order))
    }

    fn poly(f: &Zp, order: MonomialOrder, terms: &[(u64, [u64; 3])]) -> MultivariatePolynomial<Zp> {
        MultivariatePolynomial::from_terms(
            f,
            context(order),
            terms.iter().map(|(c, e)| (f.to_element(*c), *e)),
        )
    }

    #[test]
    fn canonical_form() {
        let f = Zp::new(7);
        for order in [
            MonomialOrder::Lex,
            MonomialOrder::DegLex,
            MonomialOrder::DegRevLex,
        ] {
            let p = poly(
                &f,
                order,
                &[
                    (1, [0, 0, 0]),
                    (3, [1, 2, 0]),
                    (2, [0, 0, 5]),
                    (4, [1, 2, 0]),
                    (5, [3, 0, 0]),
                    (6, [0, 0, 0]),
                ],
            );
            p.assert_canonical();
            // 3 + 4 and 1 + 6 cancel modulo 7
            assert_eq!(p.nterms(), 2);
            assert!(p.get_constant() == f.zero());
        }

        let p = poly(
            &f,
            MonomialOrder::Lex,
            &[(1, [0, 1, 0]), (2, [1, 0, 0]), (3, [0, 0, 4])],
        );
        assert_eq!(p.exponents(0).as_slice(), &[1, 0, 0]);
        assert_eq!(p.to_string(), "2*x+y+3*z^4");

        let p = poly(
            &f,
            MonomialOrder::DegRevLex,
            &[(1, [1, 0, 1]), (1, [0, 2, 0]), (1, [0, 0, 3])],
        );
        assert_eq!(p.to_string(), "z^3+y^2+x*z");
    }

    #[test]
    fn arithmetic() {
        let f = Zp::new(5);
        let a = poly(&f, MonomialOrder::Lex, &[(1, [1, 0, 0]), (1, [0, 0, 0])]);
        let b = poly(&f, MonomialOrder::Lex, &[(1, [1, 0, 0]), (4, [0, 1, 0])]);

        let s = &a + &b;
        assert_eq!(
            s,
            poly(
                &f,
                MonomialOrder::Lex,
                &[(2, [1, 0, 0]), (4, [0, 1, 0]), (1, [0, 0, 0])]
            )
        );
        assert!((&s - &s).is_zero());
        assert_eq!(&(&s - &a) - &b, a.zero());
        assert_eq!(-(a.clone()) + a.clone(), a.zero());

        let m = s.clone().make_monic();
        assert!(m.lcoeff() == f.one());
        assert_eq!(m.clone().make_monic(), m);

        let mut c = a.clone();
        c += &b;
        assert_eq!(c, s);
        c -= &b;
        assert_eq!(c, a);
    }

    #[test]
    #[should_panic(expected = "InvalidOperand")]
    fn monic_zero() {
        let f = Zp::new(5);
        let a = poly(&f, MonomialOrder::Lex, &[]);
        a.make_monic();
    }

    #[test]
    fn fit_length_reserves() {
        let f = Zp::new(5);
        let mut a = poly(&f, MonomialOrder::Lex, &[(1, [1, 0, 0]), (2, [0, 0, 0])]);
        let before = a.clone();
        a.fit_length(40);
        assert_eq!(a, before);
        assert_eq!(a.nterms(), 2);
        assert!(a.coefficients.capacity() >= 40);
        assert!(a.exponents.capacity() >= 40 * a.layout().words());

        a.append_term(f.one(), &[0, 1, 0]);
        a.canonicalize();
        assert_eq!(a.nterms(), 3);
    }

    #[test]
    fn widths() {
        let f = Zp::new(11);
        let a = poly(&f, MonomialOrder::DegLex, &[(1, [100, 0, 0]), (2, [0, 3, 0])]);
        assert_eq!(a.bits(), 8);

        let b = poly(&f, MonomialOrder::DegLex, &[(1, [1000, 0, 0])]);
        assert_eq!(b.bits(), 16);
        let s = &a + &b;
        assert_eq!(s.bits(), 16);
        assert_eq!(s.nterms(), 3);
        s.assert_canonical();

        let r = s.repack(64).unwrap();
        assert_eq!(r, s);
        assert!(s.repack(8).is_err());

        let mut t = a.clone();
        t.append_term(f.one(), &[0, 0, u64::MAX / 4]);
        t.canonicalize();
        assert_eq!(t.bits(), 64);
        assert_eq!(t.exponents(0).as_slice(), &[0, 0, u64::MAX / 4]);
        assert_eq!(t.degree(2), u64::MAX / 4);
    }

    #[test]
    fn evaluation() {
        let f = Zp::new(7);
        // x^2*y + 3*y*z + 2
        let p = poly(
            &f,
            MonomialOrder::Lex,
            &[(1, [2, 1, 0]), (3, [0, 1, 1]), (2, [0, 0, 0])],
        );
        let e = p.evaluate(1, &f.to_element(2));
        // 2*x^2 + 6*z + 2
        assert_eq!(
            e,
            poly(
                &f,
                MonomialOrder::Lex,
                &[(2, [2, 0, 0]), (6, [0, 0, 1]), (2, [0, 0, 0])]
            )
        );

        let v = p.evaluate_all(&[f.to_element(1), f.to_element(2), f.to_element(3)]);
        assert_eq!(v, f.to_element(2 + 18 + 2));
    }

    #[test]
    fn deflation() {
        let f = Zp::new(3);
        // x^5*y^2 + x^9*y^2 + x^1*y^2
        let p = poly(
            &f,
            MonomialOrder::DegRevLex,
            &[(1, [5, 2, 0]), (2, [9, 2, 0]), (1, [1, 2, 0])],
        );
        let (shift, stride) = p.deflation();
        assert_eq!(shift.as_slice(), &[1, 2, 0]);
        assert_eq!(stride.as_slice(), &[4, 0, 0]);

        let d = p.deflate(&shift, &stride);
        assert_eq!(
            d,
            poly(
                &f,
                MonomialOrder::DegRevLex,
                &[(2, [2, 0, 0]), (1, [1, 0, 0]), (1, [0, 0, 0])]
            )
        );

        let stride = [4, 1, 1];
        assert_eq!(d.inflate(&shift, &stride), p);
    }

    #[test]
    #[should_panic(expected = "InvalidOperand")]
    fn deflate_invalid() {
        let f = Zp::new(3);
        let p = poly(&f, MonomialOrder::Lex, &[(1, [3, 0, 0]), (1, [0, 0, 0])]);
        p.deflate(&[0, 0, 0], &[2, 1, 1]);
    }
}
