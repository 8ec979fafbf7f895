use std::ops::{Add, Mul, Neg, Sub};

use crate::domains::{Field, GaloisField, Ring, WideExponent};

/// A dense univariate polynomial. The coefficients are stored from the
/// constant term upwards and the last coefficient is never zero.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct UnivariatePolynomial<F: Ring> {
    pub coefficients: Vec<F::Element>,
    pub field: F,
}

impl<F: Ring> std::fmt::Display for UnivariatePolynomial<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        let mut first = true;
        for (e, c) in self.coefficients.iter().enumerate().rev() {
            if self.field.is_zero(c) {
                continue;
            }

            if first {
                first = false;
            } else {
                write!(f, "+")?;
            }

            match e {
                0 => write!(f, "{}", self.field.printer(c))?,
                1 => write!(f, "{}*x", self.field.printer(c))?,
                _ => write!(f, "{}*x^{}", self.field.printer(c), e)?,
            }
        }
        Ok(())
    }
}

impl<F: Ring> UnivariatePolynomial<F> {
    /// Constructs a zero polynomial.
    #[inline]
    pub fn new(field: &F) -> Self {
        Self {
            coefficients: vec![],
            field: field.clone(),
        }
    }

    /// Constructs a polynomial from its coefficients, starting at the constant term.
    pub fn from_coefficients(field: &F, coefficients: Vec<F::Element>) -> Self {
        let mut r = Self {
            coefficients,
            field: field.clone(),
        };
        r.truncate();
        r
    }

    /// Constructs a zero polynomial, inheriting the field from `self`.
    #[inline]
    pub fn zero(&self) -> Self {
        Self::new(&self.field)
    }

    /// Constructs a constant polynomial, inheriting the field from `self`.
    #[inline]
    pub fn constant(&self, coeff: F::Element) -> Self {
        if self.field.is_zero(&coeff) {
            return self.zero();
        }

        Self {
            coefficients: vec![coeff],
            field: self.field.clone(),
        }
    }

    #[inline]
    pub fn one(&self) -> Self {
        self.constant(self.field.one())
    }

    /// Constructs a polynomial with a single term.
    pub fn monomial(&self, coeff: F::Element, exponent: usize) -> Self {
        if self.field.is_zero(&coeff) {
            return self.zero();
        }

        let mut coefficients = vec![self.field.zero(); exponent + 1];
        coefficients[exponent] = coeff;

        Self {
            coefficients,
            field: self.field.clone(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.coefficients.len() == 1 && self.field.is_one(&self.coefficients[0])
    }

    /// Returns true if the polynomial is constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.coefficients.len() <= 1
    }

    /// Get the constant term of the polynomial.
    #[inline]
    pub fn get_constant(&self) -> F::Element {
        match self.coefficients.first() {
            Some(c) => c.clone(),
            None => self.field.zero(),
        }
    }

    /// Get the leading coefficient.
    pub fn lcoeff(&self) -> F::Element {
        match self.coefficients.last() {
            Some(c) => c.clone(),
            None => self.field.zero(),
        }
    }

    /// The degree of the polynomial. The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Compute `self^pow`.
    pub fn pow(&self, mut pow: usize) -> Self {
        if pow == 0 {
            return self.one();
        }

        let mut x = self.clone();
        let mut y = self.one();
        while pow != 1 {
            if pow % 2 == 1 {
                y = &y * &x;
                pow -= 1;
            }

            x = &x * &x;
            pow /= 2;
        }

        x * &y
    }

    /// Multiply by `x^exp`.
    pub fn mul_exp(&self, exp: usize) -> Self {
        if exp == 0 || self.is_zero() {
            return self.clone();
        }

        let mut coefficients = vec![self.field.zero(); self.coefficients.len() + exp];
        for (cn, c) in coefficients.iter_mut().skip(exp).zip(&self.coefficients) {
            *cn = c.clone();
        }

        Self {
            coefficients,
            field: self.field.clone(),
        }
    }

    pub fn mul_coeff(mut self, coeff: &F::Element) -> Self {
        if self.field.is_zero(coeff) {
            return self.zero();
        }

        for c in &mut self.coefficients {
            if !self.field.is_zero(c) {
                self.field.mul_assign(c, coeff);
            }
        }

        self
    }

    /// Multiply by `x - a`.
    pub fn mul_linear(&self, a: &F::Element) -> Self {
        if self.is_zero() {
            return self.zero();
        }

        let mut coefficients = Vec::with_capacity(self.coefficients.len() + 1);
        coefficients.push(self.field.neg(&self.field.mul(&self.coefficients[0], a)));
        for w in self.coefficients.windows(2) {
            coefficients.push(self.field.sub(&w[0], &self.field.mul(&w[1], a)));
        }
        coefficients.push(self.lcoeff());

        Self::from_coefficients(&self.field, coefficients)
    }

    pub(crate) fn truncate(&mut self) {
        while let Some(c) = self.coefficients.last() {
            if self.field.is_zero(c) {
                self.coefficients.pop();
            } else {
                break;
            }
        }
    }

    /// Evaluate the polynomial at `x` using Horner's scheme.
    pub fn evaluate(&self, x: &F::Element) -> F::Element {
        let mut res = self.field.zero();
        for c in self.coefficients.iter().rev() {
            self.field.mul_assign(&mut res, x);
            self.field.add_assign(&mut res, c);
        }
        res
    }

    /// Evaluate the even and odd part at `x^2`, so that the
    /// value at `x` is `even + x * odd` and the value at `-x` is `even - x * odd`.
    pub fn evaluate_even_odd(&self, x2: &F::Element) -> (F::Element, F::Element) {
        let mut even = self.field.zero();
        let mut odd = self.field.zero();

        for (i, c) in self.coefficients.iter().enumerate().rev() {
            if i % 2 == 0 {
                self.field.mul_assign(&mut even, x2);
                self.field.add_assign(&mut even, c);
            } else {
                self.field.mul_assign(&mut odd, x2);
                self.field.add_assign(&mut odd, c);
            }
        }

        (even, odd)
    }
}

impl<F: Field> UnivariatePolynomial<F> {
    /// Compute the quotient and remainder of the division by `div`.
    ///
    /// # Panics
    /// Panics with `DivideByZero` when `div` is zero.
    pub fn quot_rem(&self, div: &Self) -> (Self, Self) {
        if div.is_zero() {
            panic!("DivideByZero: cannot divide {} by the zero polynomial", self);
        }

        if self.coefficients.len() < div.coefficients.len() {
            return (self.zero(), self.clone());
        }

        let n = self.degree();
        let m = div.degree();
        let u = self.field.inv(&div.lcoeff());

        let mut r = self.coefficients.clone();
        let mut q = vec![self.field.zero(); n - m + 1];

        for k in (0..=n - m).rev() {
            let c = self.field.mul(&r[k + m], &u);
            if self.field.is_zero(&c) {
                continue;
            }

            for (ri, di) in r[k..k + m].iter_mut().zip(&div.coefficients) {
                self.field.sub_mul_assign(ri, &c, di);
            }
            q[k] = c;
        }

        r.truncate(m);

        (
            Self::from_coefficients(&self.field, q),
            Self::from_coefficients(&self.field, r),
        )
    }

    /// Compute the remainder `self % div`.
    pub fn rem(&self, div: &Self) -> Self {
        self.quot_rem(div).1
    }

    /// Return the quotient if `div` divides `self`.
    pub fn divides(&self, div: &Self) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }

        if self.degree() < div.degree() {
            return None;
        }

        let (q, r) = self.quot_rem(div);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    /// Divide by `div`, which is known to divide `self` exactly.
    pub fn divexact(&self, div: &Self) -> Self {
        if div.is_constant() {
            if div.is_one() {
                return self.clone();
            }
            let inv = self.field.inv(&div.get_constant());
            return self.clone().mul_coeff(&inv);
        }

        let (q, r) = self.quot_rem(div);
        debug_assert!(r.is_zero(), "Inexact division of {} by {}", self, div);
        q
    }

    /// Divide every coefficient by the leading coefficient.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` on the zero polynomial.
    pub fn make_monic(self) -> Self {
        if self.is_zero() {
            panic!("InvalidOperand: cannot make the zero polynomial monic");
        }

        if self.field.is_one(&self.lcoeff()) {
            return self;
        }

        let inv = self.field.inv(&self.lcoeff());
        self.mul_coeff(&inv)
    }

    /// Compute the univariate GCD using Euclid's algorithm. The result is monic,
    /// or zero if both inputs are zero.
    pub fn gcd(&self, b: &Self) -> Self {
        if self.is_zero() {
            return if b.is_zero() {
                b.clone()
            } else {
                b.clone().make_monic()
            };
        }
        if b.is_zero() {
            return self.clone().make_monic();
        }

        let mut c = self.clone();
        let mut d = b.clone();
        if self.degree() < b.degree() {
            std::mem::swap(&mut c, &mut d);
        }

        let mut r = c.rem(&d);
        while !r.is_zero() {
            c = d;
            d = r;
            r = c.rem(&d);
        }

        d.make_monic()
    }

    /// Compute `(g, s, t)` with `s * self + t * b = g`, where `g` is the monic gcd.
    pub fn extended_gcd(&self, b: &Self) -> (Self, Self, Self) {
        let mut r0 = self.clone();
        let mut r1 = b.clone();
        let mut s0 = self.one();
        let mut s1 = self.zero();
        let mut t0 = self.zero();
        let mut t1 = self.one();

        while !r1.is_zero() {
            let (q, r) = r0.quot_rem(&r1);
            r0 = std::mem::replace(&mut r1, r);
            let s = &s0 - &(&q * &s1);
            s0 = std::mem::replace(&mut s1, s);
            let t = &t0 - &(&q * &t1);
            t0 = std::mem::replace(&mut t1, t);
        }

        if r0.is_zero() {
            return (r0, s0, t0);
        }

        let inv = self.field.inv(&r0.lcoeff());
        (
            r0.mul_coeff(&inv),
            s0.mul_coeff(&inv),
            t0.mul_coeff(&inv),
        )
    }

    /// Compute `self^e mod m`.
    pub fn pow_mod(&self, mut e: u64, m: &Self) -> Self {
        let mut x = self.rem(m);
        let mut y = self.one().rem(m);
        while e > 0 {
            if e % 2 == 1 {
                y = (&y * &x).rem(m);
            }
            x = (&x * &x).rem(m);
            e /= 2;
        }
        y
    }
}

impl<F: GaloisField> UnivariatePolynomial<F> {
    /// Compute `self^e mod m` for an exponent that may exceed a machine word.
    pub fn pow_mod_wide(&self, e: &WideExponent, m: &Self) -> Self {
        let x = self.rem(m);
        let mut y = self.one().rem(m);
        for i in (0..e.bits()).rev() {
            y = (&y * &y).rem(m);
            if e.bit(i) {
                y = (&y * &x).rem(m);
            }
        }
        y
    }

    /// Test irreducibility with Ben-Or's algorithm: `f` of degree `d` is irreducible
    /// if and only if `gcd(x^(q^i) - x, f) = 1` for all `1 <= i <= d/2`.
    pub fn is_irreducible(&self) -> bool {
        let d = self.degree();
        if self.is_zero() || d == 0 {
            return false;
        }
        if d == 1 {
            return true;
        }

        let q = self.field.order();
        let x = self.monomial(self.field.one(), 1);
        let mut h = x.clone();
        for _ in 1..=d / 2 {
            h = h.pow_mod_wide(&q, self);
            let g = (&h - &x).gcd(self);
            if !g.is_one() {
                return false;
            }
        }

        true
    }
}

impl<F: Ring> Add for UnivariatePolynomial<F> {
    type Output = Self;

    fn add(mut self, mut other: Self) -> Self::Output {
        debug_assert_eq!(self.field, other.field);

        if self.coefficients.len() < other.coefficients.len() {
            std::mem::swap(&mut self, &mut other);
        }

        for (i, c) in other.coefficients.iter().enumerate() {
            self.field.add_assign(&mut self.coefficients[i], c);
        }

        self.truncate();
        self
    }
}

impl<'a, 'b, F: Ring> Add<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn add(self, other: &'a UnivariatePolynomial<F>) -> Self::Output {
        (self.clone()).add(other.clone())
    }
}

impl<F: Ring> Sub for UnivariatePolynomial<F> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        self.add(other.neg())
    }
}

impl<'a, 'b, F: Ring> Sub<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn sub(self, other: &'a UnivariatePolynomial<F>) -> Self::Output {
        (self.clone()).add(other.clone().neg())
    }
}

impl<F: Ring> Neg for UnivariatePolynomial<F> {
    type Output = Self;
    fn neg(mut self) -> Self::Output {
        for c in &mut self.coefficients {
            *c = self.field.neg(c);
        }
        self
    }
}

impl<'a, 'b, F: Ring> Mul<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn mul(self, rhs: &'a UnivariatePolynomial<F>) -> Self::Output {
        if self.is_zero() || rhs.is_zero() {
            return self.zero();
        }

        if self.coefficients.len() == 1 {
            return rhs.clone().mul_coeff(&self.coefficients[0]);
        }

        if rhs.coefficients.len() == 1 {
            return self.clone().mul_coeff(&rhs.coefficients[0]);
        }

        let mut coefficients =
            vec![self.field.zero(); self.coefficients.len() + rhs.coefficients.len() - 1];

        for (e1, c1) in self.coefficients.iter().enumerate() {
            if self.field.is_zero(c1) {
                continue;
            }

            for (e2, c2) in rhs.coefficients.iter().enumerate() {
                if !self.field.is_zero(c2) {
                    self.field.add_mul_assign(&mut coefficients[e1 + e2], c1, c2);
                }
            }
        }

        UnivariatePolynomial::from_coefficients(&self.field, coefficients)
    }
}

impl<'a, F: Ring> Mul<&'a UnivariatePolynomial<F>> for UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    #[inline]
    fn mul(self, rhs: &'a UnivariatePolynomial<F>) -> Self::Output {
        (&self) * rhs
    }
}
