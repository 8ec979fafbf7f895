use std::sync::Arc;

use fqmpoly::{
    domains::{
        algebraic_extension::AlgebraicExtension,
        finite_field::{FiniteFieldElement, Zp},
        Ring,
    },
    error::FieldError,
    poly::{
        gcd::GcdConfig, polynomial::MultivariatePolynomial, univariate::UnivariatePolynomial,
        MonomialOrder, PolynomialContext,
    },
};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ring(p: u64, vars: &[&str]) -> (Zp, MultivariatePolynomial<Zp>) {
    let field = Zp::new(p);
    let ctx = Arc::new(PolynomialContext::from_names(vars, MonomialOrder::Lex));
    let zero = MultivariatePolynomial::new(&field, ctx);
    (field, zero)
}

/// Build `c_n x^n + ... + c_0` from the coefficients, constant term first.
fn dense(zero: &MultivariatePolynomial<Zp>, coeffs: &[i64]) -> MultivariatePolynomial<Zp> {
    let f = zero.field;
    let mut r = zero.clone();
    for (e, c) in coeffs.iter().enumerate() {
        r = &r + &zero.monomial(f.to_element_signed(*c), &[e as u64]);
    }
    r
}

#[test]
fn gcd_of_shared_linear_factor() {
    init_logging();
    let (_, zero) = ring(5, &["x"]);
    let x1 = dense(&zero, &[1, 1]);
    let x2 = dense(&zero, &[2, 1]);
    let x3 = dense(&zero, &[3, 1]);

    let a = &x1 * &x2;
    let b = &x1 * &x3;
    let (g, abar, bbar) = a.gcd_cofactors(&b).unwrap();
    assert_eq!(g, x1);
    assert_eq!(abar, x2);
    assert_eq!(bbar, x3);
}

#[test]
fn gcd_with_zero() {
    init_logging();
    let (_, zero) = ring(7, &["x"]);
    let b = dense(&zero, &[1, 0, 1]);

    let (g, abar, bbar) = zero.gcd_cofactors(&b).unwrap();
    assert_eq!(g, b);
    assert!(abar.is_zero());
    assert!(bbar.is_one());

    let (g, abar, bbar) = zero.gcd_cofactors(&zero).unwrap();
    assert!(g.is_zero() && abar.is_zero() && bbar.is_zero());
}

#[test]
fn exact_division() {
    let (_, zero) = ring(5, &["x"]);
    let a = dense(&zero, &[-1, 0, 1]);
    let b = dense(&zero, &[-1, 1]);
    assert_eq!(a.divides(&b), Some(dense(&zero, &[1, 1])));
}

#[test]
fn inexact_division() {
    let (_, zero) = ring(5, &["x"]);
    let a = dense(&zero, &[1, 0, 1]);
    let b = dense(&zero, &[-1, 1]);
    assert_eq!(a.divides(&b), None);

    // x^2 + 1 = (x + 1)(x - 1) + 2
    let (q, r) = a.quot_rem(&b);
    assert_eq!(q, dense(&zero, &[1, 1]));
    assert_eq!(r, dense(&zero, &[2]));
}

#[test]
fn multivariate_gcd_over_small_field() {
    init_logging();
    let (_, zero) = ring(2, &["x", "y", "z"]);
    let x = zero.variable(0);
    let y = zero.variable(1);
    let z = zero.variable(2);
    let one = zero.one();

    // F_2 has too few points for y and z, so the extension fallback is needed
    let g = &(&(&x * &y) + &z.pow(3)) + &one;
    let a = &g * &(&(&y * &y) + &(&x * &z));
    let b = &g * &(&(&x + &y) + &one);

    let (h, abar, bbar) = a.gcd_cofactors(&b).unwrap();
    assert_eq!(h, g);
    assert_eq!(&h * &abar, a);
    assert_eq!(&h * &bbar, b);

    let config = GcdConfig::default().use_lgprime(false);
    let mut rng = StdRng::seed_from_u64(config.seed);
    // without extensions the points of F_2 may not certify a result, but any result is correct
    let h = a.gcd_with(&b, &config, &mut rng);
    assert!(h.is_none() || h == Some(g.clone()));

    for seed in 0..4 {
        let config = GcdConfig::default().seed(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(a.gcd_with(&b, &config, &mut rng), Some(g.clone()));
    }
}

#[test]
fn gcd_over_galois_field() {
    let base = Zp::new(3);
    let field = AlgebraicExtension::galois_field(base, 2);
    let ctx = Arc::new(PolynomialContext::from_names(
        &["x", "y"],
        MonomialOrder::DegRevLex,
    ));
    let zero = MultivariatePolynomial::new(&field, ctx);
    let x = zero.variable(0);
    let y = zero.variable(1);
    let v = zero.constant(field.generator());

    let g = &(&x * &y) + &v;
    let a = &g * &(&x + &y);
    let b = &g * &(&(&x * &x) - &v);

    let h = a.gcd(&b).unwrap();
    assert_eq!(h, g);
    assert!(field.is_one(&h.lcoeff()));
}

#[test]
fn square_root() {
    let (f, zero) = ring(7, &["x", "y"]);
    let x = zero.variable(0);
    let y = zero.variable(1);
    let p = &(&x * &y) + &zero.constant(f.to_element(3));

    let s = (&p * &p).sqrt().unwrap();
    assert_eq!(&s * &s, &p * &p);
    assert!(s == p || s == -p);

    // x^2 + 3 is not a square: 3 is not a square mod 7 as a constant term
    assert_eq!((&(&x * &x) + &zero.constant(f.to_element(3))).sqrt(), None);
}

#[test]
fn field_construction() {
    assert_eq!(Zp::try_new(9), Err(FieldError::NotPrime(9)));
    assert!(Zp::try_new(1 << 63).is_err());

    let f = Zp::new(5);
    let u = UnivariatePolynomial::new(&f);
    let one = f.one();

    // x^2 - 1 = (x - 1)(x + 1)
    let reducible: UnivariatePolynomial<Zp> =
        UnivariatePolynomial::from_coefficients(&f, vec![f.neg(&one), f.zero(), one]);
    assert!(matches!(
        AlgebraicExtension::try_new(reducible),
        Err(FieldError::Reducible(_))
    ));

    let not_monic = u.monomial(f.to_element(2), 2) + u.constant(f.to_element(2));
    assert!(matches!(
        AlgebraicExtension::try_new(not_monic),
        Err(FieldError::NotMonic(_))
    ));

    // x^2 + 2 is irreducible since -2 = 3 is not a square mod 5
    let irreducible = u.monomial(one, 2) + u.constant(f.to_element(2));
    let ext = AlgebraicExtension::try_new(irreducible).unwrap();
    assert_eq!(ext.degree(), 2);
    assert_eq!(ext.size(), Some(25));

    let elem: FiniteFieldElement = f.to_element(7);
    assert_eq!(elem, f.to_element(2));
}

#[test]
#[should_panic(expected = "DivideByZero")]
fn division_by_zero_polynomial() {
    let (_, zero) = ring(5, &["x"]);
    let a = zero.variable(0);
    let _ = a.quot_rem(&zero);
}
