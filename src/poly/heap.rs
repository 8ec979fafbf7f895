//! Heap based multiplication, division and root extraction.
//!
//! All operations walk the products of pairs of terms in decreasing order with a
//! [MonomialHeap], so the full product is never materialized. The heap contains
//! every monomial at most once: products that share a monomial are chained
//! together and popped at the same time.

use std::borrow::Cow;
use std::collections::BinaryHeap;

use ahash::{HashMap, HashMapExt};
use smallvec::SmallVec;
use tracing::debug;

use super::monomial::{bits_for_degrees, fix_bits, PackedExponents};
use super::polynomial::MultivariatePolynomial;
use super::INLINED_EXPONENTS;
use crate::domains::{GaloisField, Ring};
use crate::error::ExponentOverflow;

const NIL: u32 = u32::MAX;

struct HeapNode<S> {
    source: S,
    next: u32,
}

/// A max-heap of monomial keys, with for every key a chain of the sources
/// that produce it. Chain nodes live in an arena and are recycled.
pub(crate) struct MonomialHeap<S> {
    heap: BinaryHeap<PackedExponents>,
    chains: HashMap<PackedExponents, u32>,
    nodes: Vec<HeapNode<S>>,
    free: Vec<u32>,
}

impl<S: Copy> MonomialHeap<S> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        MonomialHeap {
            heap: BinaryHeap::with_capacity(cap),
            chains: HashMap::with_capacity(cap),
            nodes: Vec::with_capacity(cap),
            free: vec![],
        }
    }

    /// Add a source for the monomial with key `key`.
    pub(crate) fn push(&mut self, key: PackedExponents, source: S) {
        let node = match self.free.pop() {
            Some(n) => {
                self.nodes[n as usize] = HeapNode { source, next: NIL };
                n
            }
            None => {
                self.nodes.push(HeapNode { source, next: NIL });
                (self.nodes.len() - 1) as u32
            }
        };

        match self.chains.get_mut(&key) {
            Some(head) => {
                self.nodes[node as usize].next = *head;
                *head = node;
            }
            None => {
                self.chains.insert(key.clone(), node);
                self.heap.push(key);
            }
        }
    }

    /// The largest key.
    #[inline]
    pub(crate) fn peek(&self) -> Option<&PackedExponents> {
        self.heap.peek()
    }

    /// Remove the largest key and move all its sources into `sources`.
    pub(crate) fn pop(&mut self, sources: &mut Vec<S>) -> Option<PackedExponents> {
        let key = self.heap.pop()?;
        let mut n = self.chains.remove(&key).unwrap_or(NIL);
        while n != NIL {
            let node = &self.nodes[n as usize];
            sources.push(node.source);
            let next = node.next;
            self.free.push(n);
            n = next;
        }
        Some(key)
    }
}

#[derive(Clone, Copy, Debug)]
enum MulSource {
    /// `p[i] * s[j]`
    Product(usize, usize),
}

#[derive(Clone, Copy, Debug)]
enum DivSource {
    /// `q[i] * b[j]`, walking row `i` while the quotient is shorter than the divisor.
    QuotientRow(usize, usize),
    /// `q[i] * b[j]`, walking column `j` once the quotient is longer.
    DivisorColumn(usize, usize),
}

#[derive(Clone, Copy, Debug)]
enum RootSource {
    /// `2 * q[i] * q[j]` with `i < j`
    Cross(usize, usize),
    /// `q[j]^2`
    Square(usize),
}

#[derive(Clone, Copy, Debug)]
enum QuadraticSource {
    /// `a[i] * x[j]`
    Product(usize, usize),
    /// `x[j]^2`
    Square(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DivisionMode {
    /// Stop at the first term that is not divisible.
    Exact,
    /// Discard terms that are not divisible.
    Quotient,
    /// Collect the terms that are not divisible.
    Remainder,
}

#[derive(Debug)]
enum DivisionError {
    NotExact,
    Overflow(ExponentOverflow),
}

impl From<ExponentOverflow> for DivisionError {
    fn from(e: ExponentOverflow) -> Self {
        DivisionError::Overflow(e)
    }
}

fn widened<F: Ring>(p: &MultivariatePolynomial<F>, bits: u32) -> Cow<'_, MultivariatePolynomial<F>> {
    if bits <= p.bits() {
        Cow::Borrowed(p)
    } else {
        Cow::Owned(p.with_layout_bits(bits))
    }
}

/// Select the next monomial: the largest of the next term of a polynomial and the top of the heap.
fn next_key<F: Ring, S: Copy>(
    p: &MultivariatePolynomial<F>,
    k: usize,
    heap: &MonomialHeap<S>,
) -> Option<PackedExponents> {
    match (k < p.nterms(), heap.peek()) {
        (true, Some(h)) => {
            let key = p.layout.key(p.packed(k));
            if key >= *h {
                Some(key)
            } else {
                Some(h.clone())
            }
        }
        (true, None) => Some(p.layout.key(p.packed(k))),
        (false, Some(h)) => Some(h.clone()),
        (false, None) => None,
    }
}

impl<F: GaloisField> MultivariatePolynomial<F> {
    /// Multiply two polynomials with a heap over the products of terms.
    ///
    /// The heap contains at most one product for every term of the shorter polynomial.
    /// The exponent fields are widened first, so that the product cannot overflow.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` if an exponent of the product does not fit in 64 bits.
    pub fn heap_mul(&self, rhs: &Self) -> Self {
        debug_assert_eq!(self.context, rhs.context);
        if self.is_zero() || rhs.is_zero() {
            return self.zero();
        }

        let mut degrees: SmallVec<[u64; INLINED_EXPONENTS]> = self.degrees();
        for (d, e) in degrees.iter_mut().zip(rhs.degrees()) {
            *d = match d.checked_add(e) {
                Some(x) => x,
                None => panic!("InvalidOperand: exponent of the product does not fit in 64 bits"),
            };
        }

        let bits = bits_for_degrees(self.layout.order(), &degrees)
            .max(self.bits())
            .max(rhs.bits());
        let a = widened(self, bits);
        let b = widened(rhs, bits);

        if a.nterms() == 1 || b.nterms() == 1 {
            return mul_monomial(&a, &b);
        }

        // p is the longer polynomial, s the shorter
        let (p, s) = if a.nterms() >= b.nterms() {
            (a.as_ref(), b.as_ref())
        } else {
            (b.as_ref(), a.as_ref())
        };

        let layout = &p.layout;
        let field = &p.field;
        let mut res = p.zero_with_capacity(p.nterms() + s.nterms());

        let mut heap = MonomialHeap::with_capacity(s.nterms());
        heap.push(
            layout.key(&layout.add(p.packed(0), s.packed(0))),
            MulSource::Product(0, 0),
        );

        // i = merged[j] signifies that p[i - 1] * s[j] has been merged
        let mut merged = vec![0; s.nterms()];
        // in_heap[j] signifies that a product with s[j] is in the heap
        let mut in_heap = vec![false; s.nterms()];
        in_heap[0] = true;

        let mut sources = vec![];
        let mut acc = field.new_accumulator();
        while let Some(key) = heap.pop(&mut sources) {
            for MulSource::Product(i, j) in sources.drain(..) {
                field.acc_add_mul(&mut acc, &p.coefficients[i], &s.coefficients[j]);

                merged[j] = i + 1;
                if i + 1 < p.nterms() && (j == 0 || merged[j - 1] > i + 1) {
                    heap.push(
                        layout.key(&layout.add(p.packed(i + 1), s.packed(j))),
                        MulSource::Product(i + 1, j),
                    );
                } else {
                    in_heap[j] = false;
                }

                if j + 1 < s.nterms() && !in_heap[j + 1] {
                    heap.push(
                        layout.key(&layout.add(p.packed(i), s.packed(j + 1))),
                        MulSource::Product(i, j + 1),
                    );
                    in_heap[j + 1] = true;
                }
            }

            let c = field.acc_reduce(&mut acc);
            if !field.is_zero(&c) {
                res.push_packed(c, &layout.from_key(&key));
            }
        }

        res
    }

    /// Compute the quotient and remainder of the division by `div`.
    /// The remainder contains no term that is divisible by the leading term of `div`.
    ///
    /// # Panics
    /// Panics with `DivideByZero` when `div` is zero.
    pub fn quot_rem(&self, div: &Self) -> (Self, Self) {
        self.division_with_retry(div, DivisionMode::Remainder)
    }

    /// Compute the quotient of the division by `div`, discarding the remainder.
    ///
    /// # Panics
    /// Panics with `DivideByZero` when `div` is zero.
    pub fn quotient(&self, div: &Self) -> Self {
        self.division_with_retry(div, DivisionMode::Quotient).0
    }

    /// Return the quotient if `div` divides `self` exactly, or `None` otherwise.
    ///
    /// # Panics
    /// Panics with `DivideByZero` when `div` is zero.
    pub fn divides(&self, div: &Self) -> Option<Self> {
        if div.is_zero() {
            panic!("DivideByZero: cannot divide {} by the zero polynomial", self);
        }

        if self.is_zero() {
            return Some(self.zero());
        }

        let da = self.degrees();
        if div.degrees().iter().zip(&da).any(|(b, a)| b > a) {
            return None;
        }

        let (a, b) = Self::unify_bits(self, div);
        match a.heap_division(&b, DivisionMode::Exact) {
            Ok((q, _)) => Some(q),
            Err(_) => None,
        }
    }

    fn division_with_retry(&self, div: &Self, mode: DivisionMode) -> (Self, Self) {
        if div.is_zero() {
            panic!("DivideByZero: cannot divide {} by the zero polynomial", self);
        }

        if self.is_zero() {
            return (self.zero(), self.zero());
        }

        let (a, b) = Self::unify_bits(self, div);
        let mut a = a.into_owned();
        let mut b = b.into_owned();
        loop {
            match a.heap_division(&b, mode) {
                Ok(r) => return r,
                Err(DivisionError::NotExact) => {
                    unreachable!("only exact division stops at a term that is not divisible")
                }
                Err(DivisionError::Overflow(e)) => {
                    let bits = fix_bits(2 * a.bits());
                    debug!("Division: {}, repacking to {} bits", e, bits);
                    a = a.with_layout_bits(bits);
                    b = b.with_layout_bits(bits);
                }
            }
        }
    }

    /// Divide by `div` with a heap over the products of quotient and divisor terms.
    ///
    /// While the quotient has fewer terms than the divisor, every quotient term
    /// walks its row of products. After that, products are walked by divisor
    /// column, so that the heap never holds more than one product per divisor term.
    fn heap_division(&self, div: &Self, mode: DivisionMode) -> Result<(Self, Self), DivisionError> {
        debug_assert_eq!(self.layout, div.layout);

        let layout = &self.layout;
        let field = &self.field;
        let nb = div.nterms();
        let lm = div.packed(0);
        let lc_inv = field.inv(&div.coefficients[0]);

        let mut q = self.zero_with_capacity(self.nterms());
        let mut r = self.zero();

        let mut heap = MonomialHeap::with_capacity(nb);
        // column products start at quotient index nb - 1
        let mut merged = vec![nb.saturating_sub(1); nb];
        let mut in_heap = vec![false; nb];

        let mut sources = vec![];
        let mut acc = field.new_accumulator();
        let mut k = 0;

        macro_rules! push_product {
            ($source: expr, $i: expr, $j: expr) => {{
                let e = layout.add_checked(q.packed($i), div.packed($j))?;
                heap.push(layout.key(&e), $source);
            }};
        }

        while let Some(key) = next_key(self, k, &heap) {
            let m = layout.from_key(&key);
            if k < self.nterms() && self.packed(k) == m.as_slice() {
                field.acc_add(&mut acc, &self.coefficients[k]);
                k += 1;
            }

            if heap.peek() == Some(&key) {
                heap.pop(&mut sources);
                for s in sources.drain(..) {
                    match s {
                        DivSource::QuotientRow(i, j) => {
                            field.acc_sub_mul(&mut acc, &q.coefficients[i], &div.coefficients[j]);
                            if j + 1 < nb {
                                push_product!(DivSource::QuotientRow(i, j + 1), i, j + 1);
                            }
                        }
                        DivSource::DivisorColumn(i, j) => {
                            field.acc_sub_mul(&mut acc, &q.coefficients[i], &div.coefficients[j]);

                            merged[j] = i + 1;
                            if i + 1 < q.nterms() && (j == 1 || merged[j - 1] > i + 1) {
                                push_product!(DivSource::DivisorColumn(i + 1, j), i + 1, j);
                            } else {
                                in_heap[j] = false;
                            }

                            if j + 1 < nb && !in_heap[j + 1] {
                                push_product!(DivSource::DivisorColumn(i, j + 1), i, j + 1);
                                in_heap[j + 1] = true;
                            }
                        }
                    }
                }
            }

            let c = field.acc_reduce(&mut acc);
            if field.is_zero(&c) {
                continue;
            }

            match layout.divides(&m, lm) {
                Some(qe) => {
                    let i = q.nterms();
                    q.push_packed(field.mul(&c, &lc_inv), &qe);

                    if nb > 1 {
                        if i < nb - 1 {
                            push_product!(DivSource::QuotientRow(i, 1), i, 1);
                        } else if !in_heap[1] {
                            push_product!(DivSource::DivisorColumn(i, 1), i, 1);
                            in_heap[1] = true;
                        }
                    }
                }
                None => match mode {
                    DivisionMode::Exact => return Err(DivisionError::NotExact),
                    DivisionMode::Quotient => {}
                    DivisionMode::Remainder => r.push_packed(c, &m),
                },
            }
        }

        Ok((q, r))
    }

    /// Compute the square root, if the polynomial is a perfect square.
    ///
    /// In odd characteristic the root is built term by term: the leading term is
    /// the root of the leading term, and every next term follows from the leading
    /// term of `self - q^2`, which is `2 q_0 q_k`. In characteristic 2 squaring is
    /// additive, so the root is taken termwise.
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }

        if self.field.characteristic() == 2 {
            return self.sqrt_char2();
        }

        let degrees = self.degrees();
        if degrees.iter().any(|d| d % 2 == 1) {
            return None;
        }
        let max_root_degrees: SmallVec<[u64; INLINED_EXPONENTS]> =
            degrees.iter().map(|d| d / 2).collect();

        let bits = bits_for_degrees(self.layout.order(), &degrees).max(self.bits());
        let a = widened(self, bits);
        let layout = &a.layout;
        let field = &a.field;

        let q0e = layout.halves(a.packed(0))?;
        let q0c = field.sqrt(&a.coefficients[0])?;
        let inv = field.inv(&field.add(&q0c, &q0c));

        let mut q = a.zero();
        q.push_packed(q0c, &q0e);

        let mut heap = MonomialHeap::with_capacity(a.nterms());
        let mut sources = vec![];
        let mut acc = field.new_accumulator();
        let mut k = 1;

        while let Some(key) = next_key(&a, k, &heap) {
            let m = layout.from_key(&key);
            if k < a.nterms() && a.packed(k) == m.as_slice() {
                field.acc_add(&mut acc, &a.coefficients[k]);
                k += 1;
            }

            if heap.peek() == Some(&key) {
                heap.pop(&mut sources);
                for s in sources.drain(..) {
                    let (i, j) = match s {
                        RootSource::Cross(i, j) => {
                            field.acc_sub_mul(&mut acc, &q.coefficients[i], &q.coefficients[j]);
                            field.acc_sub_mul(&mut acc, &q.coefficients[i], &q.coefficients[j]);
                            (i, j)
                        }
                        RootSource::Square(j) => {
                            field.acc_sub_mul(&mut acc, &q.coefficients[j], &q.coefficients[j]);
                            (j, j)
                        }
                    };

                    if i + 1 < j {
                        let e = layout.add(q.packed(i + 1), q.packed(j));
                        heap.push(layout.key(&e), RootSource::Cross(i + 1, j));
                    } else if i + 1 == j {
                        let e = layout.add(q.packed(j), q.packed(j));
                        heap.push(layout.key(&e), RootSource::Square(j));
                    }
                }
            }

            let c = field.acc_reduce(&mut acc);
            if field.is_zero(&c) {
                continue;
            }

            let e = layout.divides(&m, &q0e)?;
            if (0..a.nvars()).any(|v| layout.exponent(&e, v) > max_root_degrees[v]) {
                return None;
            }

            let j = q.nterms();
            q.push_packed(field.mul(&c, &inv), &e);

            let (source, e) = if j == 1 {
                (RootSource::Square(1), layout.add(&e, &e))
            } else {
                (RootSource::Cross(1, j), layout.add(q.packed(1), &e))
            };
            heap.push(layout.key(&e), source);
        }

        Some(q)
    }

    fn sqrt_char2(&self) -> Option<Self> {
        let mut q = self.zero_with_capacity(self.nterms());
        for (i, c) in self.coefficients.iter().enumerate() {
            let e = self.layout.halves(self.packed(i))?;
            let c = self.field.sqrt(c)?;
            q.push_packed(c, &e);
        }
        Some(q)
    }

    /// Find a root `X` of `X^2 + self * X = b`, if one exists.
    ///
    /// In odd characteristic the square is completed: `X = (sqrt(self^2 + 4b) - self) / 2`.
    /// In characteristic 2 the root is built term by term with a heap over the
    /// products `self[i] * X[j]` and the squares `X[j]^2`.
    pub fn quadratic_root(&self, b: &Self) -> Option<Self> {
        debug_assert_eq!(self.context, b.context);

        if b.is_zero() {
            return Some(b.zero());
        }

        if self.is_zero() {
            return b.sqrt();
        }

        let field = &self.field;
        if field.characteristic() != 2 {
            let d = &self.heap_mul(self) + &b.clone().mul_coeff(&field.nth(4));
            let s = d.sqrt()?;
            let half = field.inv(&field.nth(2));
            return Some((&s - self).mul_coeff(&half));
        }

        self.quadratic_root_char2(b)
    }

    fn quadratic_root_char2(&self, b: &Self) -> Option<Self> {
        // the terms of X are bounded by deg_v X <= max(deg_v A, deg_v B / 2)
        let da = self.degrees();
        let db = b.degrees();
        let max_root_degrees: SmallVec<[u64; INLINED_EXPONENTS]> =
            da.iter().zip(&db).map(|(a, b)| (*a).max(b / 2)).collect();

        let mut degrees: SmallVec<[u64; INLINED_EXPONENTS]> = SmallVec::new();
        for ((a, b), x) in da.iter().zip(&db).zip(&max_root_degrees) {
            let product = a.checked_add(*x)?.max(x.checked_mul(2)?);
            degrees.push(product.max(*b));
        }

        let bits = bits_for_degrees(self.layout.order(), &degrees)
            .max(self.bits())
            .max(b.bits());
        let a = widened(self, bits);
        let b = widened(b, bits);
        let layout = &a.layout;
        let field = &a.field;

        let alpha = a.packed(0);
        let alpha2 = layout.add(alpha, alpha);
        let a0 = &a.coefficients[0];
        let a0_inv = field.inv(a0);
        let a0_sq_inv = field.mul(&a0_inv, &a0_inv);

        let mut x = a.zero();
        let mut heap = MonomialHeap::with_capacity(a.nterms());
        let mut sources = vec![];
        let mut acc = field.new_accumulator();
        let mut k = 0;

        while let Some(key) = next_key(&b, k, &heap) {
            let m = layout.from_key(&key);
            if k < b.nterms() && b.packed(k) == m.as_slice() {
                field.acc_add(&mut acc, &b.coefficients[k]);
                k += 1;
            }

            if heap.peek() == Some(&key) {
                heap.pop(&mut sources);
                for s in sources.drain(..) {
                    match s {
                        QuadraticSource::Product(i, j) => {
                            field.acc_sub_mul(&mut acc, &a.coefficients[i], &x.coefficients[j]);
                            if i + 1 < a.nterms() {
                                let e = layout.add(a.packed(i + 1), x.packed(j));
                                heap.push(layout.key(&e), QuadraticSource::Product(i + 1, j));
                            }
                        }
                        QuadraticSource::Square(j) => {
                            field.acc_sub_mul(&mut acc, &x.coefficients[j], &x.coefficients[j]);
                        }
                    }
                }
            }

            let c = field.acc_reduce(&mut acc);
            if field.is_zero(&c) {
                continue;
            }

            // the new term t contributes t^2 and a0 t * alpha, the larger of the two must be m
            let (t, z, square_pending, first_product) = match layout.cmp(&m, &alpha2) {
                std::cmp::Ordering::Greater => {
                    let t = layout.halves(&m)?;
                    (t, field.sqrt(&c)?, false, 0)
                }
                std::cmp::Ordering::Equal => {
                    // z^2 + a0 z = c with z = a0 y gives y^2 + y = c / a0^2
                    let y = field.solve_artin_schreier(&field.mul(&c, &a0_sq_inv))?;
                    (alpha.into(), field.mul(a0, &y), false, 1)
                }
                std::cmp::Ordering::Less => {
                    let t = layout.divides(&m, alpha)?;
                    (t, field.mul(&c, &a0_inv), true, 1)
                }
            };

            if (0..a.nvars()).any(|v| layout.exponent(&t, v) > max_root_degrees[v]) {
                return None;
            }

            let j = x.nterms();
            x.push_packed(z, &t);

            if square_pending {
                heap.push(layout.key(&layout.add(&t, &t)), QuadraticSource::Square(j));
            }
            if first_product < a.nterms() {
                let e = layout.add(a.packed(first_product), &t);
                heap.push(layout.key(&e), QuadraticSource::Product(first_product, j));
            }
        }

        Some(x)
    }
}

/// Multiply when one of the polynomials has a single term, which preserves the order.
fn mul_monomial<F: GaloisField>(
    a: &MultivariatePolynomial<F>,
    b: &MultivariatePolynomial<F>,
) -> MultivariatePolynomial<F> {
    let (p, m) = if b.nterms() == 1 { (a, b) } else { (b, a) };
    let layout = &p.layout;
    let mut res = p.zero_with_capacity(p.nterms());
    for (i, c) in p.coefficients.iter().enumerate() {
        let c = p.field.mul(c, &m.coefficients[0]);
        if !p.field.is_zero(&c) {
            res.push_packed(c, &layout.add(p.packed(i), m.packed(0)));
        }
    }
    res
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::MonomialHeap;
    use crate::domains::algebraic_extension::AlgebraicExtension;
    use crate::domains::finite_field::Zp;
    use crate::domains::{GaloisField, Ring};
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::{MonomialOrder, PolynomialContext};

    fn poly(f: &Zp, order: MonomialOrder, terms: &[(u64, [u64; 2])]) -> MultivariatePolynomial<Zp> {
        MultivariatePolynomial::from_terms(
            f,
            Arc::new(PolynomialContext::from_names(&["x", "y"], order)),
            terms.iter().map(|(c, e)| (f.to_element(*c), *e)),
        )
    }

    #[test]
    fn heap_chains() {
        let mut h = MonomialHeap::with_capacity(4);
        h.push([1u64].into_iter().collect(), 'a');
        h.push([3u64].into_iter().collect(), 'b');
        h.push([1u64].into_iter().collect(), 'c');
        assert_eq!(h.peek().map(|k| k.as_slice()), Some(&[3u64][..]));

        let mut s = vec![];
        assert_eq!(h.pop(&mut s).unwrap().as_slice(), &[3]);
        assert_eq!(s, vec!['b']);
        s.clear();
        assert_eq!(h.pop(&mut s).unwrap().as_slice(), &[1]);
        s.sort();
        assert_eq!(s, vec!['a', 'c']);
        assert!(h.pop(&mut s).is_none());
    }

    #[test]
    fn multiplication() {
        let f = Zp::new(7);
        for order in [MonomialOrder::Lex, MonomialOrder::DegRevLex] {
            let a = poly(&f, order, &[(1, [1, 0]), (1, [0, 1]), (1, [0, 0])]);
            let b = poly(&f, order, &[(1, [1, 0]), (6, [0, 1])]);
            // (x + y + 1)(x - y) = x^2 - y^2 + x - y
            let r = &a * &b;
            r.assert_canonical();
            assert_eq!(
                r,
                poly(
                    &f,
                    order,
                    &[(1, [2, 0]), (6, [0, 2]), (1, [1, 0]), (6, [0, 1])]
                )
            );

            let p = a.pow(5);
            p.assert_canonical();
            assert_eq!(p.nterms(), 21);
            assert!(p.evaluate_all(&[f.to_element(2), f.to_element(3)]) == f.pow(&f.to_element(6), 5));
        }

        // the exponent fields are widened when needed
        let a = poly(&f, MonomialOrder::Lex, &[(1, [100, 0]), (1, [0, 1])]);
        let s = &a * &a;
        assert!(s.bits() >= 16);
        assert_eq!(s.exponents(0).as_slice(), &[200, 0]);
        assert_eq!(s.nterms(), 3);
    }

    #[test]
    fn division() {
        let f = Zp::new(5);
        let a = poly(&f, MonomialOrder::Lex, &[(1, [2, 0]), (4, [0, 0])]);
        let b = poly(&f, MonomialOrder::Lex, &[(1, [1, 0]), (4, [0, 0])]);
        assert_eq!(a.divides(&b), Some(poly(&f, MonomialOrder::Lex, &[(1, [1, 0]), (1, [0, 0])])));

        let a = poly(&f, MonomialOrder::Lex, &[(1, [2, 0]), (1, [0, 0])]);
        assert_eq!(a.divides(&b), None);
        let (q, r) = a.quot_rem(&b);
        assert_eq!(q, poly(&f, MonomialOrder::Lex, &[(1, [1, 0]), (1, [0, 0])]));
        assert_eq!(r, poly(&f, MonomialOrder::Lex, &[(2, [0, 0])]));
        assert_eq!(a.quotient(&b), q);

        // a quotient that is longer than the divisor exercises the column phase
        for order in [MonomialOrder::Lex, MonomialOrder::DegLex, MonomialOrder::DegRevLex] {
            let b = poly(&f, order, &[(1, [1, 1]), (2, [1, 0]), (3, [0, 1]), (1, [0, 0])]);
            let q = poly(
                &f,
                order,
                &[(1, [5, 0]), (2, [3, 2]), (4, [2, 2]), (1, [1, 4]), (3, [0, 3]), (2, [0, 0])],
            );
            let a = &b * &q;
            assert_eq!(a.divides(&b), Some(q.clone()));
            assert_eq!(a.divides(&q), Some(b.clone()));

            let extra = poly(&f, order, &[(1, [0, 1])]);
            let a2 = &a + &extra;
            assert_eq!(a2.divides(&b), None);
            let (q2, r2) = a2.quot_rem(&b);
            assert_eq!(&(&q2 * &b) + &r2, a2);
        }
    }

    #[test]
    #[should_panic(expected = "DivideByZero")]
    fn divide_by_zero() {
        let f = Zp::new(5);
        let a = poly(&f, MonomialOrder::Lex, &[(1, [2, 0])]);
        a.quot_rem(&a.zero());
    }

    #[test]
    fn division_overflow_repacks() {
        let f = Zp::new(3);
        // dividing x^120 by x - y^120 in lex produces the quotient terms
        // x^(119 - k) y^(120 k), which do not fit in the initial 8 bits
        let a = poly(&f, MonomialOrder::Lex, &[(1, [120, 0])]);
        let b = poly(&f, MonomialOrder::Lex, &[(1, [1, 0]), (2, [0, 120])]);
        assert_eq!(a.bits(), 8);

        let (q, r) = a.quot_rem(&b);
        assert_eq!(q.nterms(), 120);
        assert_eq!(r.nterms(), 1);
        assert_eq!(r.exponents(0).as_slice(), &[0, 14400]);
        assert_eq!(&(&q * &b) + &r, a);
    }

    #[test]
    fn square_roots() {
        let f = Zp::new(11);
        for order in [MonomialOrder::Lex, MonomialOrder::DegRevLex] {
            let q = poly(&f, order, &[(3, [3, 1]), (2, [1, 2]), (5, [0, 1]), (7, [0, 0])]);
            let a = &q * &q;
            let r = a.sqrt().unwrap();
            assert_eq!(&r * &r, a);

            let not_square = &a + &poly(&f, order, &[(1, [1, 0])]);
            assert!(not_square.sqrt().is_none());
        }

        // x^2 + 1 is not a square modulo 11, it does not factor
        assert!(poly(&f, MonomialOrder::Lex, &[(1, [2, 0]), (1, [0, 0])]).sqrt().is_none());

        let f2 = AlgebraicExtension::galois_field(Zp::new(2), 3);
        let ctx = Arc::new(PolynomialContext::from_names(&["x", "y"], MonomialOrder::Lex));
        let q = MultivariatePolynomial::from_terms(
            &f2,
            ctx,
            [
                (f2.element_from_index(3), [2, 1]),
                (f2.element_from_index(5), [0, 3]),
                (f2.one(), [0, 0]),
            ],
        );
        let a = &q * &q;
        assert_eq!(a.sqrt(), Some(q.clone()));
        assert!((&a + &q).sqrt().is_none());
    }

    #[test]
    fn quadratic_roots() {
        let f = Zp::new(13);
        let a = poly(&f, MonomialOrder::Lex, &[(2, [1, 1]), (1, [0, 0])]);
        let x = poly(&f, MonomialOrder::Lex, &[(3, [2, 0]), (1, [0, 1])]);
        let b = &(&x * &x) + &(&a * &x);
        let r = a.quadratic_root(&b).unwrap();
        assert_eq!(&(&r * &r) + &(&a * &r), b);

        let f2 = AlgebraicExtension::galois_field(Zp::new(2), 4);
        let ctx = Arc::new(PolynomialContext::from_names(&["x", "y"], MonomialOrder::DegRevLex));
        let make = |terms: &[(u64, [u64; 2])]| {
            MultivariatePolynomial::from_terms(
                &f2,
                ctx.clone(),
                terms.iter().map(|(c, e)| (f2.element_from_index(*c), *e)),
            )
        };

        let a = make(&[(3, [1, 0]), (7, [0, 1]), (1, [0, 0])]);
        for x in [
            make(&[(5, [2, 1]), (2, [0, 0])]),
            make(&[(9, [1, 0]), (1, [0, 2])]),
            make(&[(12, [0, 0])]),
        ] {
            let b = &(&x * &x) + &(&a * &x);
            let r = a.quadratic_root(&b).unwrap();
            assert_eq!(&(&r * &r) + &(&a * &r), b);
        }

        // X^2 + X = 1 is solvable exactly when the trace of 1 vanishes
        let one = make(&[(1, [0, 0])]);
        let trace = f2.trace_char2(&f2.one());
        assert_eq!(one.quadratic_root(&one).is_some(), f2.is_zero(&trace));
    }
}
