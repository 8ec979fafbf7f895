//! Finite field extensions `F[v]/(m(v))` of another finite field `F`.

use std::fmt::{Display, Error, Formatter};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Field, GaloisField, Ring, WideExponent};
use crate::error::FieldError;
use crate::poly::univariate::UnivariatePolynomial;

/// A finite field extension of `F` with a monic, irreducible defining polynomial.
///
/// Extensions can be stacked: `AlgebraicExtension<AlgebraicExtension<Zp>>` is a tower
/// of fields, which is what the GCD algorithms use when the ground field is too small.
///
/// # Examples
///
/// ```
/// use fqmpoly::domains::{algebraic_extension::AlgebraicExtension, finite_field::Zp, Ring};
///
/// let field = AlgebraicExtension::galois_field(Zp::new(2), 3);
/// assert_eq!(field.size(), Some(8));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AlgebraicExtension<F: GaloisField> {
    poly: Arc<UnivariatePolynomial<F>>,
}

/// An element of an [AlgebraicExtension], stored as the coefficients of a polynomial
/// of degree less than the degree of the extension, starting at the constant term.
/// The coefficient list always has exactly `degree` entries.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AlgebraicNumber<F: Ring> {
    pub(crate) coeffs: Vec<F::Element>,
}

/// An unreduced product accumulator: one base accumulator per coefficient of the
/// polynomial product, before reduction by the minimal polynomial.
#[derive(Clone, Debug)]
pub struct ExtensionAccumulator<F: GaloisField> {
    coeffs: Vec<F::Accumulator>,
}

impl<F: GaloisField> AlgebraicExtension<F> {
    /// Create an extension from a monic irreducible polynomial.
    pub fn try_new(poly: UnivariatePolynomial<F>) -> Result<Self, FieldError> {
        if poly.degree() == 0 {
            return Err(FieldError::InvalidDegree(poly.degree()));
        }

        if !poly.field.is_one(&poly.lcoeff()) {
            return Err(FieldError::NotMonic(poly.to_string()));
        }

        if !poly.is_irreducible() {
            return Err(FieldError::Reducible(poly.to_string()));
        }

        Ok(AlgebraicExtension {
            poly: Arc::new(poly),
        })
    }

    /// Create an extension from a polynomial that is known to be monic and irreducible.
    pub(crate) fn from_irreducible(poly: UnivariatePolynomial<F>) -> Self {
        debug_assert!(poly.field.is_one(&poly.lcoeff()) && poly.degree() > 0);
        AlgebraicExtension {
            poly: Arc::new(poly),
        }
    }

    /// Construct the Galois field with `|F|^degree` elements.
    /// The irreducible polynomial is determined automatically.
    ///
    /// # Panics
    /// Panics with `InvalidOperand` if `degree` is zero.
    pub fn galois_field(base: F, degree: usize) -> Self {
        if degree == 0 {
            panic!("InvalidOperand: an extension must have a degree of at least one");
        }

        let zero = UnivariatePolynomial::new(&base);
        if degree == 1 {
            return Self::from_irreducible(zero.monomial(base.one(), 1));
        }

        // try shape x^n+a*x+b for fast reduction
        let mut coeffs = vec![base.zero(); degree + 1];
        coeffs[degree] = base.one();
        let sample_max = base.size().unwrap_or(u128::MAX).min(64) as u64;
        for k in 1..sample_max {
            for k2 in 0..sample_max {
                coeffs[0] = base.element_from_index(k);
                coeffs[1] = base.element_from_index(k2);

                let poly = UnivariatePolynomial::from_coefficients(&base, coeffs.clone());
                if poly.is_irreducible() {
                    return Self::from_irreducible(poly);
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(degree as u64);
        Self::from_irreducible(Self::random_irreducible(&base, degree, &mut rng))
    }

    /// Sample a random monic irreducible polynomial of the given degree.
    pub fn random_irreducible(
        base: &F,
        degree: usize,
        rng: &mut impl rand::RngCore,
    ) -> UnivariatePolynomial<F> {
        loop {
            let mut coeffs: Vec<_> = (0..degree).map(|_| base.sample(rng)).collect();
            coeffs.push(base.one());

            let poly = UnivariatePolynomial::from_coefficients(base, coeffs);
            if poly.is_irreducible() {
                return poly;
            }
        }
    }

    /// Get the minimal polynomial.
    pub fn poly(&self) -> &UnivariatePolynomial<F> {
        &self.poly
    }

    /// The field that is extended.
    pub fn base(&self) -> &F {
        &self.poly.field
    }

    /// The degree of the extension over its base field.
    pub fn degree(&self) -> usize {
        self.poly.degree()
    }

    /// Embed an element of the base field.
    pub fn constant(&self, c: F::Element) -> AlgebraicNumber<F> {
        let mut coeffs = vec![self.base().zero(); self.degree()];
        coeffs[0] = c;
        AlgebraicNumber { coeffs }
    }

    /// The generator `v` of the extension.
    pub fn generator(&self) -> AlgebraicNumber<F> {
        self.to_element(&self.poly.monomial(self.base().one(), 1))
    }

    /// Map a polynomial over the base field to its residue class.
    pub fn to_element(&self, poly: &UnivariatePolynomial<F>) -> AlgebraicNumber<F> {
        let r = if poly.coefficients.len() > self.degree() {
            poly.rem(&self.poly)
        } else {
            poly.clone()
        };

        let mut coeffs = r.coefficients;
        coeffs.resize(self.degree(), self.base().zero());
        AlgebraicNumber { coeffs }
    }

    /// The representative of `a` of degree less than the degree of the extension.
    pub fn to_polynomial(&self, a: &AlgebraicNumber<F>) -> UnivariatePolynomial<F> {
        UnivariatePolynomial::from_coefficients(self.base(), a.coeffs.clone())
    }

    /// Reduce a product of length `2d - 1` by the minimal polynomial.
    fn reduce_product(&self, mut prod: Vec<F::Element>) -> AlgebraicNumber<F> {
        let d = self.degree();
        let base = self.base();
        for k in (d..prod.len()).rev() {
            let c = std::mem::replace(&mut prod[k], base.zero());
            if base.is_zero(&c) {
                continue;
            }
            for (p, m) in prod[k - d..k].iter_mut().zip(&self.poly.coefficients) {
                base.sub_mul_assign(p, &c, m);
            }
        }
        prod.truncate(d);
        prod.resize(d, base.zero());
        AlgebraicNumber { coeffs: prod }
    }
}

impl<F: GaloisField> Display for AlgebraicExtension<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "[{}]{}", self.poly, self.base())
    }
}

impl<F: GaloisField> Ring for AlgebraicExtension<F> {
    type Element = AlgebraicNumber<F>;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        AlgebraicNumber {
            coeffs: a
                .coeffs
                .iter()
                .zip(&b.coeffs)
                .map(|(x, y)| self.base().add(x, y))
                .collect(),
        }
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        AlgebraicNumber {
            coeffs: a
                .coeffs
                .iter()
                .zip(&b.coeffs)
                .map(|(x, y)| self.base().sub(x, y))
                .collect(),
        }
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let base = self.base();
        let d = self.degree();
        if d == 1 {
            return AlgebraicNumber {
                coeffs: vec![base.mul(&a.coeffs[0], &b.coeffs[0])],
            };
        }

        let mut prod = vec![base.zero(); 2 * d - 1];
        for (i, x) in a.coeffs.iter().enumerate() {
            if base.is_zero(x) {
                continue;
            }
            for (j, y) in b.coeffs.iter().enumerate() {
                base.add_mul_assign(&mut prod[i + j], x, y);
            }
        }
        self.reduce_product(prod)
    }

    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        for (x, y) in a.coeffs.iter_mut().zip(&b.coeffs) {
            self.base().add_assign(x, y);
        }
    }

    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        for (x, y) in a.coeffs.iter_mut().zip(&b.coeffs) {
            self.base().sub_assign(x, y);
        }
    }

    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.mul(a, b);
    }

    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        self.add_assign(a, &self.mul(b, c));
    }

    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        self.sub_assign(a, &self.mul(b, c));
    }

    fn neg(&self, a: &Self::Element) -> Self::Element {
        AlgebraicNumber {
            coeffs: a.coeffs.iter().map(|x| self.base().neg(x)).collect(),
        }
    }

    fn zero(&self) -> Self::Element {
        AlgebraicNumber {
            coeffs: vec![self.base().zero(); self.degree()],
        }
    }

    fn one(&self) -> Self::Element {
        self.constant(self.base().one())
    }

    fn nth(&self, n: u64) -> Self::Element {
        self.constant(self.base().nth(n))
    }

    fn pow(&self, b: &Self::Element, mut e: u64) -> Self::Element {
        let mut x = b.clone();
        let mut y = self.one();
        while e > 0 {
            if e % 2 == 1 {
                y = self.mul(&y, &x);
            }
            x = self.mul(&x, &x);
            e /= 2;
        }
        y
    }

    fn is_zero(&self, a: &Self::Element) -> bool {
        a.coeffs.iter().all(|c| self.base().is_zero(c))
    }

    fn is_one(&self, a: &Self::Element) -> bool {
        self.base().is_one(&a.coeffs[0]) && a.coeffs[1..].iter().all(|c| self.base().is_zero(c))
    }

    fn characteristic(&self) -> u64 {
        self.base().characteristic()
    }

    fn size(&self) -> Option<u128> {
        self.order().to_u128()
    }

    fn sample(&self, rng: &mut impl rand::RngCore) -> Self::Element {
        AlgebraicNumber {
            coeffs: (0..self.degree()).map(|_| self.base().sample(rng)).collect(),
        }
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> std::fmt::Result {
        let nonzero: Vec<_> = element
            .coeffs
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| !self.base().is_zero(c))
            .collect();

        if nonzero.is_empty() {
            return write!(f, "0");
        }

        if nonzero.len() > 1 {
            write!(f, "(")?;
        }
        for (i, (e, c)) in nonzero.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            match e {
                0 => self.base().format(c, f)?,
                1 => {
                    self.base().format(c, f)?;
                    write!(f, "*v")?;
                }
                _ => {
                    self.base().format(c, f)?;
                    write!(f, "*v^{}", e)?;
                }
            }
        }
        if nonzero.len() > 1 {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl<F: GaloisField> Field for AlgebraicExtension<F> {
    fn try_inv(&self, a: &Self::Element) -> Option<Self::Element> {
        if self.is_zero(a) {
            return None;
        }

        // s * a + t * m = 1 as the minimal polynomial is irreducible
        let (g, s, _) = self.to_polynomial(a).extended_gcd(&self.poly);
        debug_assert!(g.is_one());
        Some(self.to_element(&s))
    }
}

impl<F: GaloisField> GaloisField for AlgebraicExtension<F> {
    type Accumulator = ExtensionAccumulator<F>;

    fn extension_degree(&self) -> usize {
        self.degree() * self.base().extension_degree()
    }

    fn order(&self) -> WideExponent {
        WideExponent::pow(&self.base().order(), self.degree())
    }

    fn element_from_index(&self, mut i: u64) -> Self::Element {
        let base = self.base();

        // digits of i in base |F|
        let mut coeffs = Vec::with_capacity(self.degree());
        for _ in 0..self.degree() {
            match base.size() {
                Some(s) if s <= u64::MAX as u128 => {
                    let s = s as u64;
                    coeffs.push(base.element_from_index(i % s));
                    i /= s;
                }
                _ => {
                    coeffs.push(base.element_from_index(i));
                    i = 0;
                }
            }
        }
        AlgebraicNumber { coeffs }
    }

    fn new_accumulator(&self) -> ExtensionAccumulator<F> {
        ExtensionAccumulator {
            coeffs: vec![self.base().new_accumulator(); 2 * self.degree() - 1],
        }
    }

    fn acc_add_mul(&self, acc: &mut ExtensionAccumulator<F>, a: &Self::Element, b: &Self::Element) {
        let base = self.base();
        for (i, x) in a.coeffs.iter().enumerate() {
            if base.is_zero(x) {
                continue;
            }
            for (j, y) in b.coeffs.iter().enumerate() {
                base.acc_add_mul(&mut acc.coeffs[i + j], x, y);
            }
        }
    }

    fn acc_sub_mul(&self, acc: &mut ExtensionAccumulator<F>, a: &Self::Element, b: &Self::Element) {
        let base = self.base();
        for (i, x) in a.coeffs.iter().enumerate() {
            if base.is_zero(x) {
                continue;
            }
            for (j, y) in b.coeffs.iter().enumerate() {
                base.acc_sub_mul(&mut acc.coeffs[i + j], x, y);
            }
        }
    }

    fn acc_add(&self, acc: &mut ExtensionAccumulator<F>, a: &Self::Element) {
        for (c, x) in acc.coeffs.iter_mut().zip(&a.coeffs) {
            self.base().acc_add(c, x);
        }
    }

    fn acc_reduce(&self, acc: &mut ExtensionAccumulator<F>) -> Self::Element {
        let prod = acc
            .coeffs
            .iter_mut()
            .map(|c| self.base().acc_reduce(c))
            .collect();
        self.reduce_product(prod)
    }
}

#[cfg(test)]
mod test {
    use super::AlgebraicExtension;
    use crate::domains::finite_field::Zp;
    use crate::domains::{Field, GaloisField, Ring};
    use crate::error::FieldError;
    use crate::poly::univariate::UnivariatePolynomial;

    fn poly(field: &Zp, c: &[u64]) -> UnivariatePolynomial<Zp> {
        UnivariatePolynomial::from_coefficients(
            field,
            c.iter().map(|x| field.to_element(*x)).collect(),
        )
    }

    #[test]
    fn construction() {
        let f = Zp::new(3);
        assert!(matches!(
            AlgebraicExtension::try_new(poly(&f, &[2, 0, 1])),
            Err(FieldError::Reducible(_))
        ));
        assert!(matches!(
            AlgebraicExtension::try_new(poly(&f, &[1, 0, 2])),
            Err(FieldError::NotMonic(_))
        ));
        assert!(matches!(
            AlgebraicExtension::try_new(poly(&f, &[1])),
            Err(FieldError::InvalidDegree(0))
        ));

        let e = AlgebraicExtension::try_new(poly(&f, &[1, 0, 1])).unwrap();
        assert_eq!(e.size(), Some(9));
        assert_eq!(e.extension_degree(), 2);
    }

    #[test]
    fn arithmetic() {
        let f = Zp::new(3);
        let e = AlgebraicExtension::try_new(poly(&f, &[1, 0, 1])).unwrap();
        let v = e.generator();

        // v^2 = -1
        assert_eq!(e.mul(&v, &v), e.neg(&e.one()));
        assert_eq!(e.pow(&v, 4), e.one());

        for i in 1..9 {
            let a = e.element_from_index(i);
            assert!(!e.is_zero(&a));
            assert_eq!(e.mul(&a, &e.inv(&a)), e.one());
            // Fermat
            assert_eq!(e.pow(&a, 8), e.one());
        }
    }

    #[test]
    fn accumulator() {
        let f = Zp::new(7);
        let e = AlgebraicExtension::galois_field(f, 3);

        let mut acc = e.new_accumulator();
        let mut expected = e.zero();
        for i in 0..40 {
            let a = e.element_from_index(i * 13 + 5);
            let b = e.element_from_index(i * 7 + 100);
            if i % 2 == 0 {
                e.acc_add_mul(&mut acc, &a, &b);
                e.add_mul_assign(&mut expected, &a, &b);
            } else {
                e.acc_sub_mul(&mut acc, &a, &b);
                e.sub_mul_assign(&mut expected, &a, &b);
            }
        }
        e.acc_add(&mut acc, &e.one());
        e.add_assign(&mut expected, &e.one());
        assert_eq!(e.acc_reduce(&mut acc), expected);
    }

    #[test]
    fn square_roots_and_artin_schreier() {
        let e = AlgebraicExtension::galois_field(Zp::new(5), 2);
        for i in 0..25 {
            let a = e.element_from_index(i);
            let sq = e.mul(&a, &a);
            let r = e.sqrt(&sq).unwrap();
            assert_eq!(e.mul(&r, &r), sq);
        }

        for degree in [3, 4] {
            let e = AlgebraicExtension::galois_field(Zp::new(2), degree);
            let mut solvable = 0;
            for i in 0..1 << degree {
                let c = e.element_from_index(i);
                let r = e.sqrt(&c).unwrap();
                assert_eq!(e.mul(&r, &r), c);

                if let Some(z) = e.solve_artin_schreier(&c) {
                    assert_eq!(e.add(&e.mul(&z, &z), &z), c);
                    solvable += 1;
                } else {
                    assert!(!e.is_zero(&e.trace_char2(&c)));
                }
            }
            assert_eq!(solvable, 1 << (degree - 1));
        }
    }

    #[test]
    fn tower() {
        let e = AlgebraicExtension::galois_field(Zp::new(3), 2);
        let t = AlgebraicExtension::galois_field(e, 2);
        assert_eq!(t.size(), Some(81));
        assert_eq!(t.extension_degree(), 4);

        let a = t.element_from_index(50);
        assert_eq!(t.mul(&a, &t.inv(&a)), t.one());
        assert_eq!(t.pow(&a, 81), a);
    }
}
