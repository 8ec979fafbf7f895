//! Defines the coefficient layer: the algebraic traits and the finite fields
//! that implement them.
//!
//! The core trait is [Ring], which has two binary operations, addition and multiplication.
//! Each ring has an associated element type, that should not be confused with the ring type itself.
//! For example:
//! - The prime field [Zp](finite_field::Zp) has elements of type [FiniteFieldElement](finite_field::FiniteFieldElement).
//! - The extension [AlgebraicExtension](algebraic_extension::AlgebraicExtension) has elements of type [AlgebraicNumber](algebraic_extension::AlgebraicNumber).
//!
//! The ring elements do not implement operations such as addition or multiplication,
//! but rather the ring itself does. All polynomial structures are generic over the ring type.
//!
//! An extension of the ring trait is the [`Field`] trait, which adds the ability to divide and invert elements.
//! [`GaloisField`] adds what the polynomial algorithms need from a finite field: enumeration of elements,
//! square roots and a lazily reduced accumulator for dot products.
pub mod algebraic_extension;
pub mod finite_field;

use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::{smallvec, SmallVec};

/// A ring is a set with two binary operations, addition and multiplication.
///
/// Each ring has an element type, that should not be confused with the ring type itself.
pub trait Ring: Clone + PartialEq + Eq + Hash + Debug + Display {
    /// The element of a ring. For example, the elements of [Zp](finite_field::Zp) are
    /// [FiniteFieldElement](finite_field::FiniteFieldElement).
    type Element: Clone + PartialEq + Eq + Hash + Debug;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element);
    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element);
    fn neg(&self, a: &Self::Element) -> Self::Element;
    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;
    /// Return the nth element by computing `n * 1`.
    fn nth(&self, n: u64) -> Self::Element;
    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element;
    fn is_zero(&self, a: &Self::Element) -> bool;
    fn is_one(&self, a: &Self::Element) -> bool;
    fn characteristic(&self) -> u64;
    /// The number of elements in the ring, or `None` if it does not fit in a `u128`.
    fn size(&self) -> Option<u128>;

    /// Sample a uniformly random element.
    fn sample(&self, rng: &mut impl rand::RngCore) -> Self::Element;

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> std::fmt::Result;

    /// Create a new printer for the given ring element that
    /// can be used in a [format!] macro.
    fn printer<'a>(&'a self, element: &'a Self::Element) -> RingPrinter<'a, Self> {
        RingPrinter {
            ring: self,
            element,
        }
    }
}

/// A field is a ring that supports division and inversion.
pub trait Field: Ring {
    fn try_inv(&self, a: &Self::Element) -> Option<Self::Element>;

    /// Invert `a`.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` when `a` is zero.
    fn inv(&self, a: &Self::Element) -> Self::Element {
        match self.try_inv(a) {
            Some(x) => x,
            None => panic!("InvalidOperand: cannot invert zero in {}", self),
        }
    }

    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.mul(a, &self.inv(b))
    }

    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        let inv = self.inv(b);
        self.mul_assign(a, &inv);
    }
}

/// A finite field, as consumed by the polynomial algorithms.
///
/// Besides field arithmetic, it provides a lazily reduced accumulator: sums
/// of products are collected without a modular reduction after every step,
/// and are reduced once with [GaloisField::acc_reduce].
pub trait GaloisField: Field {
    type Accumulator: Clone + Debug;

    /// The degree of the field over its prime subfield.
    fn extension_degree(&self) -> usize;

    /// The number of elements of the field.
    fn order(&self) -> WideExponent;

    /// The `i`-th element of a fixed enumeration of the field. For a prime field
    /// this is `i mod p`.
    fn element_from_index(&self, i: u64) -> Self::Element;

    fn new_accumulator(&self) -> Self::Accumulator;
    /// Compute `acc += a * b` without reducing.
    fn acc_add_mul(&self, acc: &mut Self::Accumulator, a: &Self::Element, b: &Self::Element);
    /// Compute `acc -= a * b` without reducing.
    fn acc_sub_mul(&self, acc: &mut Self::Accumulator, a: &Self::Element, b: &Self::Element);
    fn acc_add(&self, acc: &mut Self::Accumulator, a: &Self::Element);
    /// Reduce the accumulated value to a field element and reset the accumulator.
    fn acc_reduce(&self, acc: &mut Self::Accumulator) -> Self::Element;

    /// Compute `b^e` for an exponent that may exceed a machine word.
    fn pow_wide(&self, b: &Self::Element, e: &WideExponent) -> Self::Element {
        let mut r = self.one();
        for i in (0..e.bits()).rev() {
            r = self.mul(&r, &r);
            if e.bit(i) {
                self.mul_assign(&mut r, b);
            }
        }
        r
    }

    /// Compute a square root of `a`, if it exists.
    fn sqrt(&self, a: &Self::Element) -> Option<Self::Element> {
        if self.is_zero(a) {
            return Some(self.zero());
        }

        if self.characteristic() == 2 {
            // the Frobenius map is an automorphism: a = (a^(q/2))^2
            let mut r = a.clone();
            for _ in 1..self.extension_degree() {
                r = self.mul(&r, &r);
            }
            return Some(r);
        }

        // Tonelli-Shanks
        let mut q1 = self.order();
        q1.sub_one();
        let mut half = q1.clone();
        half.shr(1);

        let minus_one = self.neg(&self.one());
        if !self.is_one(&self.pow_wide(a, &half)) {
            return None;
        }

        let s = q1.trailing_zeros();
        let mut t = q1;
        t.shr(s);

        let mut rng = StdRng::seed_from_u64(2);
        let z = loop {
            let z = self.sample(&mut rng);
            if !self.is_zero(&z) && self.pow_wide(&z, &half) == minus_one {
                break z;
            }
        };

        let mut m = s;
        let mut c = self.pow_wide(&z, &t);
        let mut b = self.pow_wide(a, &t);
        t.add_one();
        t.shr(1);
        let mut x = self.pow_wide(a, &t);

        while !self.is_one(&b) {
            let mut i = 0;
            let mut bb = b.clone();
            while !self.is_one(&bb) {
                bb = self.mul(&bb, &bb);
                i += 1;
            }

            let mut w = c;
            for _ in 0..m - i - 1 {
                w = self.mul(&w, &w);
            }
            self.mul_assign(&mut x, &w);
            c = self.mul(&w, &w);
            self.mul_assign(&mut b, &c);
            m = i;
        }

        Some(x)
    }

    /// The absolute trace `c + c^2 + c^4 + ... + c^(2^(k-1))` in characteristic 2.
    fn trace_char2(&self, c: &Self::Element) -> Self::Element {
        let mut t = c.clone();
        let mut s = c.clone();
        for _ in 1..self.extension_degree() {
            s = self.mul(&s, &s);
            self.add_assign(&mut t, &s);
        }
        t
    }

    /// Solve `z^2 + z = c` in characteristic 2. A solution exists if and only if
    /// the trace of `c` is zero; the other solution is `z + 1`.
    fn solve_artin_schreier(&self, c: &Self::Element) -> Option<Self::Element> {
        debug_assert_eq!(self.characteristic(), 2);
        let k = self.extension_degree();

        let z = if k % 2 == 1 {
            // half-trace
            let mut z = c.clone();
            let mut s = c.clone();
            for _ in 0..(k - 1) / 2 {
                s = self.mul(&s, &s);
                s = self.mul(&s, &s);
                self.add_assign(&mut z, &s);
            }
            z
        } else {
            let mut rng = StdRng::seed_from_u64(3);
            let delta = loop {
                let d = self.sample(&mut rng);
                if self.is_one(&self.trace_char2(&d)) {
                    break d;
                }
            };

            let mut delta_pows = Vec::with_capacity(k);
            let mut d = delta;
            for _ in 0..k {
                delta_pows.push(d.clone());
                d = self.mul(&d, &d);
            }

            // suffix[i] = sum_{j > i} delta^(2^j)
            let mut suffix = vec![self.zero(); k];
            for i in (0..k - 1).rev() {
                suffix[i] = self.add(&suffix[i + 1], &delta_pows[i + 1]);
            }

            let mut z = self.zero();
            let mut cp = c.clone();
            for s in suffix.iter().take(k - 1) {
                self.add_mul_assign(&mut z, s, &cp);
                cp = self.mul(&cp, &cp);
            }
            z
        };

        if &self.add(&self.mul(&z, &z), &z) == c {
            Some(z)
        } else {
            None
        }
    }
}

/// Provides an interface for printing elements of a ring,
/// suitable as an argument to [format!]. Internally, it will call [Ring::format].
pub struct RingPrinter<'a, R: Ring> {
    pub ring: &'a R,
    pub element: &'a R::Element,
}

impl<'a, R: Ring> Display for RingPrinter<'a, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.ring.format(self.element, f)
    }
}

/// A non-negative integer stored as little-endian 64-bit limbs, used for
/// field orders and exponents derived from them. Towers of extensions quickly
/// have more elements than fit in a `u128`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WideExponent {
    limbs: SmallVec<[u64; 4]>,
}

impl From<u64> for WideExponent {
    fn from(n: u64) -> Self {
        let mut r = WideExponent { limbs: smallvec![n] };
        r.normalize();
        r
    }
}

impl WideExponent {
    fn normalize(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Convert to a `u128` if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        match self.limbs.len() {
            0 => Some(0),
            1 => Some(self.limbs[0] as u128),
            2 => Some(self.limbs[0] as u128 | (self.limbs[1] as u128) << 64),
            _ => None,
        }
    }

    pub fn bits(&self) -> u32 {
        match self.limbs.last() {
            Some(l) => 64 * (self.limbs.len() as u32 - 1) + 64 - l.leading_zeros(),
            None => 0,
        }
    }

    pub fn bit(&self, i: u32) -> bool {
        let limb = (i / 64) as usize;
        limb < self.limbs.len() && (self.limbs[limb] >> (i % 64)) & 1 == 1
    }

    pub fn is_even(&self) -> bool {
        !self.bit(0)
    }

    pub fn trailing_zeros(&self) -> u32 {
        let mut tz = 0;
        for l in &self.limbs {
            if *l == 0 {
                tz += 64;
            } else {
                return tz + l.trailing_zeros();
            }
        }
        tz
    }

    pub fn mul_small(&mut self, m: u64) {
        let mut carry = 0u128;
        for l in &mut self.limbs {
            let t = *l as u128 * m as u128 + carry;
            *l = t as u64;
            carry = t >> 64;
        }
        if carry > 0 {
            self.limbs.push(carry as u64);
        }
        self.normalize();
    }

    pub fn add_one(&mut self) {
        for l in &mut self.limbs {
            let (r, overflow) = l.overflowing_add(1);
            *l = r;
            if !overflow {
                return;
            }
        }
        self.limbs.push(1);
    }

    /// Subtract one.
    ///
    /// # Panics
    /// Panics when the value is zero.
    pub fn sub_one(&mut self) {
        if self.is_zero() {
            panic!("InvalidOperand: cannot subtract one from zero");
        }
        for l in &mut self.limbs {
            let (r, borrow) = l.overflowing_sub(1);
            *l = r;
            if !borrow {
                break;
            }
        }
        self.normalize();
    }

    pub fn shr(&mut self, n: u32) {
        let limb_shift = (n / 64) as usize;
        let bit_shift = n % 64;

        if limb_shift >= self.limbs.len() {
            self.limbs.clear();
            return;
        }

        self.limbs.drain(..limb_shift);
        if bit_shift > 0 {
            for i in 0..self.limbs.len() {
                let hi = if i + 1 < self.limbs.len() {
                    self.limbs[i + 1] << (64 - bit_shift)
                } else {
                    0
                };
                self.limbs[i] = (self.limbs[i] >> bit_shift) | hi;
            }
        }
        self.normalize();
    }

    /// Compute `base^e`.
    pub fn pow(base: &WideExponent, e: usize) -> WideExponent {
        let mut r = WideExponent::from(1);
        for _ in 0..e {
            r = r.mul(base);
        }
        r
    }

    pub fn mul(&self, other: &WideExponent) -> WideExponent {
        let mut limbs: SmallVec<[u64; 4]> = smallvec![0; self.limbs.len() + other.limbs.len()];
        for (i, a) in self.limbs.iter().enumerate() {
            let mut carry = 0u128;
            for (j, b) in other.limbs.iter().enumerate() {
                let t = *a as u128 * *b as u128 + limbs[i + j] as u128 + carry;
                limbs[i + j] = t as u64;
                carry = t >> 64;
            }
            limbs[i + other.limbs.len()] = carry as u64;
        }
        let mut r = WideExponent { limbs };
        r.normalize();
        r
    }
}

impl Display for WideExponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_u128() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "~2^{}", self.bits()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::WideExponent;

    #[test]
    fn wide_exponent_arithmetic() {
        let p = WideExponent::from(1 << 62);
        let q = WideExponent::pow(&p, 3);
        assert_eq!(q.bits(), 187);
        assert_eq!(q.trailing_zeros(), 186);

        let mut r = q.clone();
        r.shr(124);
        assert_eq!(r.to_u128(), Some(1 << 62));

        let mut s = WideExponent::from(u64::MAX);
        s.add_one();
        assert_eq!(s.to_u128(), Some(1 << 64));
        s.sub_one();
        assert_eq!(s.to_u128(), Some(u64::MAX as u128));

        let mut t = WideExponent::from(7);
        t.mul_small(9);
        assert_eq!(t.to_u128(), Some(63));
        assert!(!t.is_even());
    }
}
