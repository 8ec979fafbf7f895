//! Greatest common divisors of multivariate polynomials over finite fields.
//!
//! The GCD is computed with Brown's dense modular algorithm: the last variable
//! is evaluated at enough points, the GCDs of the images are computed recursively
//! and the result is interpolated back. When the field is too small to provide
//! enough good evaluation points, the points are replaced by irreducible
//! polynomials, whose images live in extension fields.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ahash::{HashSet, HashSetExt};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, instrument};

use super::polynomial::{gcd_unsigned, MultivariatePolynomial};
use super::recursive::{Prefix, RecursivePolynomial};
use super::univariate::UnivariatePolynomial;
use super::INLINED_EXPONENTS;
use crate::domains::algebraic_extension::AlgebraicExtension;
use crate::domains::{Field, GaloisField};

/// The largest evaluation point index that is tried.
const MAX_POINT_INDEX: u128 = 1 << 62;

/// Settings of the modular GCD algorithm.
///
/// # Examples
///
/// ```
/// use fqmpoly::poly::gcd::GcdConfig;
///
/// let config = GcdConfig::default().seed(7).use_lgprime(false);
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GcdConfig {
    /// The seed of the random number generator of [MultivariatePolynomial::gcd].
    pub seed: u64,
    /// The number of images whose GCD may fail at every level before giving up.
    pub max_failed_images: usize,
    /// The number of irreducible polynomials that are tried in the extension phase.
    pub max_lgprime_attempts: usize,
    /// The smallest degree of the extensions.
    pub lgprime_min_degree: usize,
    /// Fall back to extension fields when the field has too few evaluation points.
    pub use_lgprime: bool,
}

impl Default for GcdConfig {
    fn default() -> Self {
        GcdConfig {
            seed: 0x5eed,
            max_failed_images: 32,
            max_lgprime_attempts: 10000,
            lgprime_min_degree: 2,
            use_lgprime: true,
        }
    }
}

impl GcdConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_failed_images(mut self, n: usize) -> Self {
        self.max_failed_images = n;
        self
    }

    pub fn max_lgprime_attempts(mut self, n: usize) -> Self {
        self.max_lgprime_attempts = n;
        self
    }

    pub fn lgprime_min_degree(mut self, degree: usize) -> Self {
        self.lgprime_min_degree = degree;
        self
    }

    pub fn use_lgprime(mut self, enable: bool) -> Self {
        self.use_lgprime = enable;
        self
    }
}

/// A GCD and the two cofactors.
type GcdTriple<F> = (
    RecursivePolynomial<F>,
    RecursivePolynomial<F>,
    RecursivePolynomial<F>,
);

/// The operands after removing their content in the dense variable.
struct PrimitiveParts<F: Field> {
    a: RecursivePolynomial<F>,
    b: RecursivePolynomial<F>,
    /// `content(A) / gcd(content(A), content(B))`
    ca: UnivariatePolynomial<F>,
    cb: UnivariatePolynomial<F>,
    cg: UnivariatePolynomial<F>,
    gamma: UnivariatePolynomial<F>,
    bound: usize,
}

impl<F: Field> PrimitiveParts<F> {
    fn new(a: &RecursivePolynomial<F>, b: &RecursivePolynomial<F>) -> Option<Self> {
        let ca = a.content_last();
        let cb = b.content_last();
        let a = a.divexact_last(&ca);
        let b = b.divexact_last(&cb);
        let cg = ca.gcd(&cb);

        let gamma = a.lead_coefficient().gcd(b.lead_coefficient());
        let bound = gamma
            .degree()
            .checked_add(a.degree_last().max(b.degree_last()))?
            .checked_add(1)?;

        Some(PrimitiveParts {
            ca: ca.divexact(&cg),
            cb: cb.divexact(&cg),
            a,
            b,
            cg,
            gamma,
            bound,
        })
    }

    /// The result when the primitive parts are coprime.
    fn coprime(&self) -> GcdTriple<F> {
        (
            RecursivePolynomial::constant(&self.a.field, self.a.level, self.cg.clone()),
            self.a.mul_last(&self.ca),
            self.b.mul_last(&self.cb),
        )
    }

    /// The degree identity that certifies that the interpolated polynomials are correct.
    fn is_consistent(&self, state: &Interpolant<F>) -> bool {
        let d = self.gamma.degree();
        let dg = state.g.degree_last();
        d + self.a.degree_last() == dg + state.abar.degree_last()
            && d + self.b.degree_last() == dg + state.bbar.degree_last()
    }

    /// Remove the content of the interpolated GCD, divide the cofactors by its
    /// leading coefficient and multiply the contents back in.
    fn finish(&self, state: Interpolant<F>) -> GcdTriple<F> {
        let cont = state.g.content_last();
        let g = state.g.divexact_last(&cont);
        let lc = g.lead_coefficient().clone();
        let abar = state.abar.divexact_last(&lc);
        let bbar = state.bbar.divexact_last(&lc);

        let g = g.mul_last(&self.cg);
        let abar = abar.mul_last(&self.ca);
        let bbar = bbar.mul_last(&self.cb);

        let field = &self.a.field;
        let lc = g.lead_coefficient().lcoeff();
        let inv = field.inv(&lc);
        (g.mul_scalar(&inv), abar.mul_scalar(&lc), bbar.mul_scalar(&lc))
    }
}

/// The running interpolation of the GCD and its cofactors.
struct Interpolant<F: Field> {
    g: RecursivePolynomial<F>,
    abar: RecursivePolynomial<F>,
    bbar: RecursivePolynomial<F>,
    modulus: UnivariatePolynomial<F>,
    /// The leading monomial of the images so far, `None` before the first image.
    lm: Option<Prefix>,
}

impl<F: Field> Interpolant<F> {
    fn new(field: &F, level: usize) -> Self {
        Interpolant {
            g: RecursivePolynomial::new(field, level),
            abar: RecursivePolynomial::new(field, level),
            bbar: RecursivePolynomial::new(field, level),
            modulus: UnivariatePolynomial::new(field).one(),
            lm: None,
        }
    }

    fn restart(&mut self) {
        self.modulus = self.modulus.one();
        self.lm = None;
    }

    /// Compare the leading monomial of a new image with the previous ones.
    /// Returns false if the image is unlucky and must be skipped.
    fn accept(&mut self, lm: Prefix) -> bool {
        match self.lm.as_ref().map(|prev| lm.cmp(prev)) {
            None | Some(Ordering::Equal) => {}
            Some(Ordering::Less) => {
                debug!("Image has a smaller leading monomial: restarting");
                self.restart();
            }
            Some(Ordering::Greater) => {
                debug!("Unlucky image: leading monomial too large");
                return false;
            }
        }

        if self.lm.is_none() {
            self.lm = Some(lm);
        }
        true
    }
}

/// The GCD of two nonzero polynomials at level 0, where both are univariate.
fn univariate_gcd<F: Field>(
    a: &RecursivePolynomial<F>,
    b: &RecursivePolynomial<F>,
) -> GcdTriple<F> {
    let ua = a.lead_coefficient();
    let ub = b.lead_coefficient();
    let g = ua.gcd(ub);
    let field = &a.field;
    (
        RecursivePolynomial::constant(field, 0, g.clone()),
        RecursivePolynomial::constant(field, 0, ua.divexact(&g)),
        RecursivePolynomial::constant(field, 0, ub.divexact(&g)),
    )
}

/// Brown's algorithm with evaluation points in the field itself.
///
/// Returns the GCD with leading coefficient one and the cofactors, or `None` if
/// the field has too few good evaluation points.
#[instrument(level = "trace", skip_all, fields(level = a.level))]
fn brown_smprime<F: GaloisField>(
    a: &RecursivePolynomial<F>,
    b: &RecursivePolynomial<F>,
    config: &GcdConfig,
) -> Option<GcdTriple<F>> {
    debug_assert_eq!(a.level, b.level);
    if a.level == 0 {
        return Some(univariate_gcd(a, b));
    }

    let field = a.field.clone();
    let pp = PrimitiveParts::new(a, b)?;
    let lca = pp.a.lead_coefficient();
    let lcb = pp.b.lead_coefficient();

    // points are taken as pairs (alpha, -alpha), except in characteristic 2
    let paired = field.characteristic() != 2;
    let size = field.size().unwrap_or(u128::MAX);
    let mut index = if paired { (size - 1) / 2 } else { size - 1 }.min(MAX_POINT_INDEX) as u64;

    let mut used: HashSet<F::Element> = HashSet::new();
    let mut failures = 0;
    let mut state = Interpolant::new(&field, pp.a.level);

    while index > 0 {
        let alpha = field.element_from_index(index);
        index -= 1;
        if !used.insert(alpha.clone()) {
            continue;
        }

        let images: SmallVec<[_; 2]> = if paired {
            let neg = field.neg(&alpha);
            if !used.insert(neg.clone()) {
                continue;
            }
            let (a1, a2) = pp.a.evaluate_last_pair(&alpha);
            let (b1, b2) = pp.b.evaluate_last_pair(&alpha);
            smallvec![(alpha, a1, b1), (neg, a2, b2)]
        } else {
            smallvec![(alpha.clone(), pp.a.evaluate_last(&alpha), pp.b.evaluate_last(&alpha))]
        };

        for (alpha, aa, bb) in images {
            if field.is_zero(&lca.evaluate(&alpha)) || field.is_zero(&lcb.evaluate(&alpha)) {
                debug!("Unlucky point: leading coefficient vanishes");
                continue;
            }

            let Some((g, abar, bbar)) = brown_smprime(&aa, &bb, config) else {
                failures += 1;
                if failures > config.max_failed_images {
                    debug!("Too many failed images at level {}", pp.a.level);
                    return None;
                }
                continue;
            };

            if g.is_constant() {
                return Some(pp.coprime());
            }

            if !state.accept(g.leading_monomial()) {
                continue;
            }

            let g = g.mul_scalar(&pp.gamma.evaluate(&alpha));

            if state.modulus.is_one() {
                state.g = g.lift();
                state.abar = abar.lift();
                state.bbar = bbar.lift();
            } else {
                let m = &state.modulus;
                for (target, image) in [
                    (&mut state.g, &g),
                    (&mut state.abar, &abar),
                    (&mut state.bbar, &bbar),
                ] {
                    if target.interp_mcrt(image, &alpha, m).is_none() {
                        target.interp_crt(image, &alpha, m);
                    }
                }
            }
            state.modulus = state.modulus.mul_linear(&alpha);

            if state.modulus.degree() < pp.bound {
                continue;
            }

            if pp.is_consistent(&state) {
                return Some(pp.finish(state));
            }

            debug!("Degree check failed: restarting");
            state.restart();
        }
    }

    debug!("Out of evaluation points in {}", field);
    None
}

/// Brown's algorithm where the points are irreducible polynomials `m(x_l)` and
/// the images are computed over the extension fields `F[x_l]/m(x_l)`.
#[instrument(level = "debug", skip_all, fields(level = a.level))]
fn brown_lgprime<F: GaloisField>(
    a: &RecursivePolynomial<F>,
    b: &RecursivePolynomial<F>,
    config: &GcdConfig,
    rng: &mut impl RngCore,
) -> Option<GcdTriple<F>> {
    debug_assert_eq!(a.level, b.level);
    if a.level == 0 {
        return Some(univariate_gcd(a, b));
    }

    let field = a.field.clone();
    let pp = PrimitiveParts::new(a, b)?;
    let lca = pp.a.lead_coefficient();
    let lcb = pp.b.lead_coefficient();

    let mut degree = config.lgprime_min_degree.max(2);
    let mut state = Interpolant::new(&field, pp.a.level);

    for _ in 0..config.max_lgprime_attempts {
        let m = AlgebraicExtension::random_irreducible(&field, degree, rng);
        if state.modulus.rem(&m).is_zero() || lca.rem(&m).is_zero() || lcb.rem(&m).is_zero() {
            // a small field may have no other irreducible of this degree
            degree += 1;
            debug!("Unlucky irreducible {}: increasing the extension degree to {}", m, degree);
            continue;
        }

        let ext = AlgebraicExtension::from_irreducible(m.clone());
        let aa = pp.a.reduce_last_mod(&ext);
        let bb = pp.b.reduce_last_mod(&ext);

        let Some((g, abar, bbar)) = brown_smprime(&aa, &bb, config) else {
            degree += 1;
            debug!("Image GCD failed: increasing the extension degree to {}", degree);
            continue;
        };

        if g.is_constant() {
            return Some(pp.coprime());
        }

        if !state.accept(g.leading_monomial()) {
            degree += 1;
            continue;
        }

        let g = g.mul_scalar(&ext.to_element(&pp.gamma));

        if state.modulus.is_one() {
            state.g = g.lift_extension();
            state.abar = abar.lift_extension();
            state.bbar = bbar.lift_extension();
        } else {
            let modulus = &state.modulus;
            for (target, image) in [
                (&mut state.g, &g),
                (&mut state.abar, &abar),
                (&mut state.bbar, &bbar),
            ] {
                if target.interp_mcrt_extension(image, modulus).is_none() {
                    target.interp_crt_extension(image, modulus);
                }
            }
        }
        state.modulus = &state.modulus * &m;
        degree += 1;

        if state.modulus.degree() < pp.bound {
            continue;
        }

        if pp.is_consistent(&state) {
            return Some(pp.finish(state));
        }

        debug!("Degree check failed: restarting");
        state.restart();
    }

    debug!("No suitable irreducible polynomials found");
    None
}

impl<F: GaloisField> MultivariatePolynomial<F> {
    /// Compute the GCD with leading coefficient one, or `None` if the modular
    /// algorithm does not succeed over this field. The GCD of two zero
    /// polynomials is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use fqmpoly::domains::{finite_field::Zp, Ring};
    /// use fqmpoly::poly::{polynomial::MultivariatePolynomial, MonomialOrder, PolynomialContext};
    ///
    /// let f = Zp::new(5);
    /// let ctx = Arc::new(PolynomialContext::from_names(&["x"], MonomialOrder::Lex));
    /// let x = MultivariatePolynomial::new(&f, ctx).variable(0);
    /// let a = &(&x + &x.one()) * &(&x + &x.constant(f.to_element(2)));
    /// let b = &(&x + &x.one()) * &(&x + &x.constant(f.to_element(3)));
    /// assert_eq!(a.gcd(&b), Some(&x + &x.one()));
    /// ```
    pub fn gcd(&self, b: &Self) -> Option<Self> {
        self.gcd_cofactors(b).map(|(g, _, _)| g)
    }

    /// Compute the GCD `G` and the cofactors `A / G` and `B / G`.
    pub fn gcd_cofactors(&self, b: &Self) -> Option<(Self, Self, Self)> {
        let config = GcdConfig::default();
        let mut rng = StdRng::seed_from_u64(config.seed);
        self.gcd_cofactors_with(b, &config, &mut rng)
    }

    /// Compute the GCD with the given settings and random number generator.
    pub fn gcd_with(&self, b: &Self, config: &GcdConfig, rng: &mut impl RngCore) -> Option<Self> {
        self.gcd_cofactors_with(b, config, rng).map(|(g, _, _)| g)
    }

    /// Compute the GCD and the cofactors with the given settings and random number generator.
    #[instrument(level = "debug", skip_all)]
    pub fn gcd_cofactors_with(
        &self,
        b: &Self,
        config: &GcdConfig,
        rng: &mut impl RngCore,
    ) -> Option<(Self, Self, Self)> {
        debug_assert_eq!(self.context, b.context);
        debug!("gcd of {} and {}", self, b);

        if self.is_zero() {
            if b.is_zero() {
                return Some((self.zero(), self.zero(), self.zero()));
            }
            let lc = b.lcoeff();
            return Some((b.clone().make_monic(), self.zero(), b.constant(lc)));
        }
        if b.is_zero() {
            let lc = self.lcoeff();
            return Some((self.clone().make_monic(), self.constant(lc), b.zero()));
        }

        if self.is_constant() || b.is_constant() {
            return Some((self.one(), self.clone(), b.clone()));
        }

        // pull out the monomial content and the common stride of the exponents
        let (shift_a, stride_a) = self.deflation();
        let (shift_b, stride_b) = b.deflation();
        let stride: SmallVec<[u64; INLINED_EXPONENTS]> = stride_a
            .iter()
            .zip(&stride_b)
            .map(|(x, y)| gcd_unsigned(*x, *y))
            .collect();
        let shift_g: SmallVec<[u64; INLINED_EXPONENTS]> =
            shift_a.iter().zip(&shift_b).map(|(x, y)| *x.min(y)).collect();

        let a1 = self.deflate(&shift_a, &stride);
        let b1 = b.deflate(&shift_b, &stride);
        debug!("Deflated with shift {:?} and stride {:?}", shift_g, stride);

        let (g, abar, bbar) = Self::deflated_gcd(&a1, &b1, config, rng)?;

        let rel_a: SmallVec<[u64; INLINED_EXPONENTS]> =
            shift_a.iter().zip(&shift_g).map(|(x, y)| x - y).collect();
        let rel_b: SmallVec<[u64; INLINED_EXPONENTS]> =
            shift_b.iter().zip(&shift_g).map(|(x, y)| x - y).collect();

        let g = g.inflate(&shift_g, &stride);
        let abar = abar.inflate(&rel_a, &stride);
        let bbar = bbar.inflate(&rel_b, &stride);

        // the leading term depends on the monomial order of the ring
        let lc = g.lcoeff();
        if g.field.is_one(&lc) {
            return Some((g, abar, bbar));
        }
        let inv = g.field.inv(&lc);
        Some((g.mul_coeff(&inv), abar.mul_coeff(&lc), bbar.mul_coeff(&lc)))
    }

    /// The GCD of polynomials without monomial content and with a trivial stride.
    fn deflated_gcd(
        a: &Self,
        b: &Self,
        config: &GcdConfig,
        rng: &mut impl RngCore,
    ) -> Option<(Self, Self, Self)> {
        if a.is_constant() || b.is_constant() {
            return Some((a.one(), a.clone(), b.clone()));
        }

        // the variable of largest degree is the dense univariate one,
        // the variable of smallest degree is interpolated first
        let da = a.degrees();
        let db = b.degrees();
        let mut perm: Vec<usize> = (0..a.nvars())
            .filter(|v| da[*v] > 0 || db[*v] > 0)
            .collect();
        perm.sort_by_key(|v| std::cmp::Reverse(da[*v].max(db[*v])));
        debug!("Variable order: {:?}", perm);

        let ra = RecursivePolynomial::from_polynomial(a, &perm)?;
        let rb = RecursivePolynomial::from_polynomial(b, &perm)?;

        let (g, abar, bbar) = match brown_smprime(&ra, &rb, config) {
            Some(r) => r,
            None if config.use_lgprime && ra.level() > 0 => {
                debug!("Evaluation points exhausted: switching to extension fields");
                brown_lgprime(&ra, &rb, config, rng)?
            }
            None => return None,
        };

        Some((
            g.to_polynomial(a, &perm),
            abar.to_polynomial(a, &perm),
            bbar.to_polynomial(a, &perm),
        ))
    }

    /// The content of the polynomial seen as a polynomial in `x_var`: the GCD of
    /// its coefficients, which are polynomials in the other variables.
    /// Returns `None` if a GCD computation does not succeed.
    pub fn content(&self, var: usize) -> Option<Self> {
        let mut coeffs: BTreeMap<u64, Vec<(F::Element, SmallVec<[u64; INLINED_EXPONENTS]>)>> =
            BTreeMap::new();
        for (i, c) in self.coefficients.iter().enumerate() {
            let mut e = self.exponents(i);
            let d = std::mem::replace(&mut e[var], 0);
            coeffs.entry(d).or_default().push((c.clone(), e));
        }

        let mut content = self.zero();
        for terms in coeffs.into_values() {
            let c = Self::from_terms(&self.field, self.context.clone(), terms);
            content = content.gcd(&c)?;
            if content.is_one() {
                break;
            }
        }
        Some(content)
    }

    /// Divide by the content in `x_var`. Returns `None` if the content cannot be computed.
    pub fn primitive_part(&self, var: usize) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }

        let c = self.content(var)?;
        self.divides(&c)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::GcdConfig;
    use crate::domains::algebraic_extension::AlgebraicExtension;
    use crate::domains::finite_field::Zp;
    use crate::domains::{GaloisField, Ring};
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::{MonomialOrder, PolynomialContext};

    fn poly(f: &Zp, order: MonomialOrder, terms: &[(u64, [u64; 3])]) -> MultivariatePolynomial<Zp> {
        MultivariatePolynomial::from_terms(
            f,
            Arc::new(PolynomialContext::from_names(&["x", "y", "z"], order)),
            terms.iter().map(|(c, e)| (f.to_element(*c), *e)),
        )
    }

    fn check<F: GaloisField>(
        a: &MultivariatePolynomial<F>,
        b: &MultivariatePolynomial<F>,
        g: &MultivariatePolynomial<F>,
    ) {
        let (gcd, abar, bbar) = a.gcd_cofactors(b).unwrap();
        assert_eq!(&gcd, g);
        assert!(gcd.field.is_one(&gcd.lcoeff()));
        assert_eq!(&(&gcd * &abar), a);
        assert_eq!(&(&gcd * &bbar), b);
        assert!(abar.gcd(&bbar).unwrap().is_one());
    }

    #[test]
    fn trivial() {
        let f = Zp::new(7);
        let a = poly(&f, MonomialOrder::Lex, &[(3, [1, 0, 0]), (1, [0, 0, 0])]);
        let zero = a.zero();

        assert_eq!(zero.gcd(&zero), Some(zero.clone()));
        let (g, abar, bbar) = zero.gcd_cofactors(&a).unwrap();
        assert_eq!(g, a.clone().make_monic());
        assert!(abar.is_zero());
        assert_eq!(&g * &bbar, a);

        let c = a.constant(f.to_element(4));
        assert_eq!(a.gcd(&c), Some(a.one()));
    }

    #[test]
    fn multivariate() {
        let f = Zp::new(101);
        for order in [MonomialOrder::Lex, MonomialOrder::DegLex, MonomialOrder::DegRevLex] {
            let g = poly(&f, order, &[(1, [2, 1, 0]), (3, [0, 1, 2]), (5, [1, 0, 0]), (7, [0, 0, 0])]);
            let u = poly(&f, order, &[(1, [1, 1, 1]), (2, [0, 3, 0]), (1, [0, 0, 0])]);
            let v = poly(&f, order, &[(4, [0, 0, 3]), (1, [2, 0, 0]), (9, [0, 1, 0])]);
            let g = g.make_monic();
            check(&(&g * &u), &(&g * &v), &g);
        }
    }

    #[test]
    fn content_in_last_variable() {
        let f = Zp::new(31);
        // a common factor that only depends on one variable
        let c = poly(&f, MonomialOrder::Lex, &[(1, [0, 0, 2]), (3, [0, 0, 0])]);
        let u = poly(&f, MonomialOrder::Lex, &[(1, [1, 1, 0]), (1, [0, 0, 1])]);
        let v = poly(&f, MonomialOrder::Lex, &[(1, [2, 0, 0]), (2, [0, 1, 1])]);
        check(&(&c * &u), &(&c * &v), &c);

        let cu = poly(&f, MonomialOrder::Lex, &[(1, [0, 0, 1]), (1, [0, 0, 0])]);
        let a = &(&c * &cu) * &u;
        assert_eq!(a.content(0), Some(&c * &cu));
        assert_eq!(a.primitive_part(0), Some(u.clone()));
    }

    #[test]
    fn deflation() {
        let f = Zp::new(13);
        // x^3 * (x^4 y^2 + 1) and x^5 * (x^4 y^2 + 1) (x^8 + 2)
        let h = poly(&f, MonomialOrder::DegRevLex, &[(1, [4, 2, 0]), (1, [0, 0, 0])]);
        let a = &h * &poly(&f, MonomialOrder::DegRevLex, &[(1, [3, 0, 0])]);
        let b = &h * &poly(&f, MonomialOrder::DegRevLex, &[(1, [13, 0, 0]), (2, [5, 0, 0])]);
        let g = &h * &poly(&f, MonomialOrder::DegRevLex, &[(1, [3, 0, 0])]);
        check(&a, &b, &g);
    }

    #[test]
    fn small_field() {
        // F_2 has a single nonzero evaluation point, so the extension phase is required
        let f = Zp::new(2);
        let g = poly(&f, MonomialOrder::Lex, &[(1, [1, 0, 1]), (1, [0, 2, 0]), (1, [0, 0, 1]), (1, [0, 0, 0])]);
        let u = poly(&f, MonomialOrder::Lex, &[(1, [2, 0, 0]), (1, [0, 1, 2]), (1, [0, 0, 0])]);
        let v = poly(&f, MonomialOrder::Lex, &[(1, [1, 1, 0]), (1, [0, 0, 3]), (1, [0, 1, 0])]);
        check(&(&g * &u), &(&g * &v), &g);

        let config = GcdConfig::default().use_lgprime(false);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!((&g * &u).gcd_with(&(&g * &v), &config, &mut rng), None);
    }

    #[test]
    fn irreducibles_run_out() {
        // x^2 + x + 1 is the only irreducible quadratic over F_2 and divides
        // no leading coefficient here, so after one image the degree must grow
        let f = Zp::new(2);
        let a = poly(&f, MonomialOrder::Lex, &[(1, [3, 4, 2]), (1, [3, 3, 5])]);
        let b = poly(
            &f,
            MonomialOrder::Lex,
            &[(1, [3, 4, 1]), (1, [3, 3, 4]), (1, [3, 2, 3]), (1, [3, 1, 6])],
        );
        let g = poly(&f, MonomialOrder::Lex, &[(1, [3, 2, 1]), (1, [3, 1, 4])]);
        check(&a, &b, &g);

        for seed in 0..8 {
            let config = GcdConfig::default().seed(seed);
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(a.gcd_with(&b, &config, &mut rng), Some(g.clone()));
        }
    }

    #[test]
    fn content_with_interleaved_degrees() {
        let f = Zp::new(17);
        let c = poly(&f, MonomialOrder::DegRevLex, &[(1, [0, 1, 0]), (1, [0, 0, 0])]);
        let u = poly(
            &f,
            MonomialOrder::DegRevLex,
            &[(1, [2, 0, 0]), (3, [1, 0, 1]), (5, [0, 0, 2]), (2, [1, 0, 0]), (1, [0, 0, 0])],
        );
        let a = &c * &u;
        assert_eq!(a.content(0), Some(c.clone()));
        assert_eq!(a.primitive_part(0), Some(u));
        assert_eq!(c.content(0), Some(c.clone()));
    }

    #[test]
    fn extension_field() {
        let f = AlgebraicExtension::galois_field(Zp::new(3), 2);
        let ctx = Arc::new(PolynomialContext::from_names(&["x", "y"], MonomialOrder::DegRevLex));
        let make = |terms: &[(u64, [u64; 2])]| {
            MultivariatePolynomial::from_terms(
                &f,
                ctx.clone(),
                terms.iter().map(|(c, e)| (f.element_from_index(*c), *e)),
            )
        };

        let g = make(&[(1, [1, 1]), (5, [0, 1]), (7, [0, 0])]);
        let u = make(&[(2, [2, 0]), (4, [0, 1])]);
        let v = make(&[(1, [0, 2]), (8, [1, 0]), (3, [0, 0])]);
        let g = g.make_monic();
        check(&(&g * &u), &(&g * &v), &g);
    }
}
