//! Prime fields `Z/pZ` with word-sized primes.

use std::fmt::{Display, Error, Formatter};

use rand::Rng;

use super::{Field, GaloisField, Ring, WideExponent};
use crate::error::FieldError;

/// An element of a prime field, stored as its canonical residue in `[0, p)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiniteFieldElement(pub(crate) u64);

/// The prime field `Z/pZ` for a prime `p < 2^63`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Zp {
    p: u64,
    /// The number of unreduced products a `u128` can hold.
    lazy: u64,
}

/// A dot-product accumulator for [Zp]: positive and negative contributions
/// are summed separately in `u128`s and only reduced once [Zp::lazy_size]
/// products are pending.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZpAccumulator {
    pos: u128,
    neg: u128,
    pending: u64,
}

impl Zp {
    /// Create the field with `p` elements.
    pub fn try_new(p: u64) -> Result<Zp, FieldError> {
        if p >= 1 << 63 {
            return Err(FieldError::TooLarge(p));
        }
        if !is_prime_u64(p) {
            return Err(FieldError::NotPrime(p));
        }

        let pm1 = (p - 1) as u128;
        let lazy = (u128::MAX / (pm1 * pm1)).min(u64::MAX as u128) as u64;

        Ok(Zp { p, lazy })
    }

    /// Create the field with `p` elements.
    ///
    /// # Panics
    /// Panics if `p` is not a prime below `2^63`.
    pub fn new(p: u64) -> Zp {
        match Zp::try_new(p) {
            Ok(f) => f,
            Err(e) => panic!("Cannot create prime field: {}", e),
        }
    }

    #[inline]
    pub fn get_prime(&self) -> u64 {
        self.p
    }

    /// The number of products that can be accumulated before a reduction is required.
    #[inline]
    pub fn lazy_size(&self) -> u64 {
        self.lazy
    }

    /// Convert a number to its residue class.
    #[inline]
    pub fn to_element(&self, a: u64) -> FiniteFieldElement {
        FiniteFieldElement(a % self.p)
    }

    /// Convert a signed number to its residue class.
    pub fn to_element_signed(&self, a: i64) -> FiniteFieldElement {
        let r = a.rem_euclid(self.p as i64);
        FiniteFieldElement(r as u64)
    }

    #[inline]
    pub fn from_element(&self, a: &FiniteFieldElement) -> u64 {
        a.0
    }

    #[inline(always)]
    fn reduce_wide(&self, a: u128) -> u64 {
        (a % self.p as u128) as u64
    }

    fn fold(&self, acc: &mut ZpAccumulator) {
        acc.pos %= self.p as u128;
        acc.neg %= self.p as u128;
        acc.pending = 1;
    }
}

impl Display for Zp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, " % {}", self.p)
    }
}

impl Display for FiniteFieldElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

impl Ring for Zp {
    type Element = FiniteFieldElement;

    #[inline(always)]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        // p < 2^63, so the sum fits
        let r = a.0 + b.0;
        if r >= self.p {
            FiniteFieldElement(r - self.p)
        } else {
            FiniteFieldElement(r)
        }
    }

    #[inline(always)]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.0 >= b.0 {
            FiniteFieldElement(a.0 - b.0)
        } else {
            FiniteFieldElement(a.0 + (self.p - b.0))
        }
    }

    #[inline(always)]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        FiniteFieldElement(self.reduce_wide(a.0 as u128 * b.0 as u128))
    }

    #[inline]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.add(a, b);
    }

    #[inline]
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.sub(a, b);
    }

    #[inline]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.mul(a, b);
    }

    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a = FiniteFieldElement(self.reduce_wide(a.0 as u128 + b.0 as u128 * c.0 as u128));
    }

    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        self.sub_assign(a, &self.mul(b, c));
    }

    /// Computes -x mod p.
    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        if a.0 == 0 {
            *a
        } else {
            FiniteFieldElement(self.p - a.0)
        }
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        FiniteFieldElement(0)
    }

    #[inline]
    fn one(&self) -> Self::Element {
        FiniteFieldElement(1 % self.p)
    }

    #[inline]
    fn nth(&self, n: u64) -> Self::Element {
        self.to_element(n)
    }

    /// Compute b^e % p.
    fn pow(&self, b: &Self::Element, mut e: u64) -> Self::Element {
        if b.0 != 0 && e >= self.p - 1 {
            e %= self.p - 1;
        }

        if e == 0 {
            return self.one();
        }

        let mut x = *b;
        let mut y = self.one();
        while e != 1 {
            if e % 2 == 1 {
                y = self.mul(&y, &x);
            }

            x = self.mul(&x, &x);
            e /= 2;
        }

        self.mul(&x, &y)
    }

    #[inline]
    fn is_zero(&self, a: &Self::Element) -> bool {
        a.0 == 0
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        a.0 == 1
    }

    fn characteristic(&self) -> u64 {
        self.p
    }

    fn size(&self) -> Option<u128> {
        Some(self.p as u128)
    }

    fn sample(&self, rng: &mut impl rand::RngCore) -> Self::Element {
        FiniteFieldElement(rng.gen_range(0..self.p))
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> std::fmt::Result {
        write!(f, "{}", element.0)
    }
}

impl Field for Zp {
    fn try_inv(&self, a: &Self::Element) -> Option<Self::Element> {
        if a.0 == 0 {
            return None;
        }

        // extended Euclidean algorithm: a x + b p = gcd(x, p) = 1 or a x = 1 (mod p)
        let mut u1: u64 = 1;
        let mut u3 = a.0;
        let mut v1: u64 = 0;
        let mut v3 = self.p;
        let mut even_iter: bool = true;

        while v3 != 0 {
            let q = u3 / v3;
            let t3 = u3 % v3;
            let t1 = u1 + q * v1;
            u1 = v1;
            v1 = t1;
            u3 = v3;
            v3 = t3;
            even_iter = !even_iter;
        }

        debug_assert_eq!(u3, 1);
        if even_iter {
            Some(FiniteFieldElement(u1))
        } else {
            Some(FiniteFieldElement(self.p - u1))
        }
    }
}

impl GaloisField for Zp {
    type Accumulator = ZpAccumulator;

    fn extension_degree(&self) -> usize {
        1
    }

    fn order(&self) -> WideExponent {
        WideExponent::from(self.p)
    }

    fn element_from_index(&self, i: u64) -> Self::Element {
        self.to_element(i)
    }

    #[inline]
    fn new_accumulator(&self) -> ZpAccumulator {
        ZpAccumulator::default()
    }

    #[inline]
    fn acc_add_mul(&self, acc: &mut ZpAccumulator, a: &Self::Element, b: &Self::Element) {
        if acc.pending >= self.lazy {
            self.fold(acc);
        }
        acc.pos += a.0 as u128 * b.0 as u128;
        acc.pending += 1;
    }

    #[inline]
    fn acc_sub_mul(&self, acc: &mut ZpAccumulator, a: &Self::Element, b: &Self::Element) {
        if acc.pending >= self.lazy {
            self.fold(acc);
        }
        acc.neg += a.0 as u128 * b.0 as u128;
        acc.pending += 1;
    }

    #[inline]
    fn acc_add(&self, acc: &mut ZpAccumulator, a: &Self::Element) {
        if acc.pending >= self.lazy {
            self.fold(acc);
        }
        acc.pos += a.0 as u128;
        acc.pending += 1;
    }

    fn acc_reduce(&self, acc: &mut ZpAccumulator) -> Self::Element {
        let pos = FiniteFieldElement(self.reduce_wide(acc.pos));
        let neg = FiniteFieldElement(self.reduce_wide(acc.neg));
        *acc = ZpAccumulator::default();
        self.sub(&pos, &neg)
    }

    fn sqrt(&self, a: &Self::Element) -> Option<Self::Element> {
        if self.p == 2 || a.0 == 0 {
            return Some(*a);
        }

        // Tonelli-Shanks on machine words
        if self.pow(a, (self.p - 1) / 2).0 != 1 {
            return None;
        }

        let mut q = self.p - 1;
        let mut s = 0;
        while q % 2 == 0 {
            q /= 2;
            s += 1;
        }

        let mut z = 2;
        while self.pow(&FiniteFieldElement(z), (self.p - 1) / 2).0 != self.p - 1 {
            z += 1;
        }

        let mut m = s;
        let mut c = self.pow(&FiniteFieldElement(z), q);
        let mut t = self.pow(a, q);
        let mut r = self.pow(a, (q + 1) / 2);

        while t.0 != 1 {
            let mut i = 0;
            let mut tt = t;
            while tt.0 != 1 {
                tt = self.mul(&tt, &tt);
                i += 1;
            }

            let b = self.pow(&c, 1 << (m - i - 1));
            r = self.mul(&r, &b);
            c = self.mul(&b, &b);
            t = self.mul(&t, &c);
            m = i;
        }

        Some(r)
    }
}

#[inline(always)]
fn mul_mod(a: u64, b: u64, n: u64) -> u64 {
    (a as u128 * b as u128 % n as u128) as u64
}

fn pow_mod(mut b: u64, mut e: u64, n: u64) -> u64 {
    let mut r = 1 % n;
    b %= n;
    while e > 0 {
        if e & 1 == 1 {
            r = mul_mod(r, b, n);
        }
        b = mul_mod(b, b, n);
        e >>= 1;
    }
    r
}

/// Deterministic Miller-Rabin test for 64-bit integers.
pub fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }

    for sp in [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        if n % sp == 0 {
            return n == sp;
        }
    }

    let w: &[u64] = if n < 341531 {
        &[9345883071009581737]
    } else if n < 1050535501 {
        &[336781006125, 9639812373923155]
    } else if n < 350269456337 {
        &[
            4230279247111683200,
            14694767155120705706,
            16641139526367750375,
        ]
    } else {
        // shortest SPRP basis from Jim Sinclair for testing primality of u64
        &[2, 325, 9375, 28178, 450775, 9780504, 1795265022]
    };

    let mut s = 0;
    let mut d = n - 1;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'test: for a in w {
        let a = a % n;
        if a == 0 {
            continue;
        }

        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }

        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'test;
            }
            if x == 1 {
                return false;
            }
        }

        return false;
    }

    true
}

#[cfg(test)]
mod test {
    use super::{is_prime_u64, Zp};
    use crate::domains::{Field, GaloisField, Ring};
    use crate::error::FieldError;

    #[test]
    fn primality() {
        let primes: Vec<u64> = (0..60).filter(|n| is_prime_u64(*n)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59]
        );
        assert!(is_prime_u64(2305843009213693951)); // 2^61 - 1
        assert!(!is_prime_u64(2305843009213693953)); // 2^61 + 1
        assert!(!is_prime_u64(3215031751)); // strong pseudoprime to 2, 3, 5, 7
    }

    #[test]
    fn construction() {
        assert_eq!(Zp::try_new(15), Err(FieldError::NotPrime(15)));
        assert_eq!(Zp::try_new(1), Err(FieldError::NotPrime(1)));
        assert!(matches!(
            Zp::try_new(9223372036854775837),
            Err(FieldError::TooLarge(_))
        ));
        assert_eq!(Zp::new(2).get_prime(), 2);
    }

    #[test]
    fn arithmetic() {
        let f = Zp::new(7);
        let a = f.to_element(5);
        let b = f.to_element(4);
        assert_eq!(f.add(&a, &b), f.to_element(2));
        assert_eq!(f.sub(&b, &a), f.to_element(6));
        assert_eq!(f.mul(&a, &b), f.to_element(6));
        assert_eq!(f.mul(&a, &f.inv(&a)), f.one());
        assert_eq!(f.pow(&b, 3), f.one());
        assert_eq!(f.to_element_signed(-1), f.to_element(6));
        assert!(f.try_inv(&f.zero()).is_none());
    }

    #[test]
    #[should_panic(expected = "InvalidOperand")]
    fn invert_zero() {
        let f = Zp::new(5);
        f.inv(&f.zero());
    }

    #[test]
    fn lazy_accumulator() {
        let p = 2305843009213693951;
        let f = Zp::new(p);
        assert_eq!(f.lazy_size(), 64);

        let a = f.to_element(p - 1);
        let mut acc = f.new_accumulator();
        let mut expected = f.zero();
        for i in 0..300 {
            let b = f.to_element(p - 1 - i);
            if i % 3 == 0 {
                f.acc_sub_mul(&mut acc, &a, &b);
                f.sub_mul_assign(&mut expected, &a, &b);
            } else {
                f.acc_add_mul(&mut acc, &a, &b);
                f.add_mul_assign(&mut expected, &a, &b);
            }
        }
        assert_eq!(f.acc_reduce(&mut acc), expected);
        assert_eq!(f.acc_reduce(&mut acc), f.zero());
    }

    #[test]
    fn square_roots() {
        for p in [2, 3, 5, 13, 17, 1009] {
            let f = Zp::new(p);
            for x in 0..p.min(200) {
                let a = f.to_element(x);
                let sq = f.mul(&a, &a);
                let r = f.sqrt(&sq).unwrap();
                assert_eq!(f.mul(&r, &r), sq);
            }
        }

        let f = Zp::new(7);
        assert!(f.sqrt(&f.to_element(3)).is_none());
    }
}
