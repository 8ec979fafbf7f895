//! Packed exponent vectors.
//!
//! The exponents of a monomial are packed into words so that multiplying and
//! dividing monomials is a word-wise addition or subtraction, and comparing them
//! is a comparison of integers. Every field reserves its top bit as a guard bit:
//! a field of `bits` bits holds values below `2^(bits - 1)`, so that an
//! overflow or a borrow is visible as a set or cleared guard bit.
//!
//! Fields of at most 64 bits share words (several fields per word), wider fields
//! span several whole words. Words are stored with the most significant one
//! first, so that lexicographic comparison of the (masked) words is the monomial
//! order.

use std::cmp::Ordering;

use smallvec::{smallvec, SmallVec};

use super::{MonomialOrder, INLINED_EXPONENTS};
use crate::error::ExponentOverflow;

/// A packed exponent vector.
pub type PackedExponents = SmallVec<[u64; INLINED_EXPONENTS]>;

/// Round a number of required bits (including the guard bit) up to a supported width:
/// 8, 16, 32 or 64 bits, or a multiple of 64 bits.
pub fn fix_bits(required: u32) -> u32 {
    match required {
        0..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        33..=64 => 64,
        _ => required.div_ceil(64) * 64,
    }
}

/// The field width needed to store values up to `max_value`.
pub fn bits_for(max_value: u128) -> u32 {
    fix_bits(128 - max_value.leading_zeros() + 1)
}

/// The field width needed to store monomials whose exponents are bounded by `degrees`.
pub fn bits_for_degrees(order: MonomialOrder, degrees: &[u64]) -> u32 {
    let mut max = degrees.iter().copied().max().unwrap_or(0) as u128;
    if order.is_graded() {
        max = max.max(degrees.iter().map(|d| *d as u128).sum());
    }
    bits_for(max)
}

/// Describes how the exponents of `nvars` variables are packed for a given
/// monomial order and field width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExponentLayout {
    nvars: usize,
    order: MonomialOrder,
    bits: u32,
    words: usize,
    /// For every field the index of its last word and the shift of its lowest bit.
    positions: SmallVec<[(usize, u32); INLINED_EXPONENTS]>,
    cmpmask: PackedExponents,
    guard: PackedExponents,
    low: PackedExponents,
}

impl ExponentLayout {
    /// Create a layout for `nvars` variables. The width is rounded up with [fix_bits].
    pub fn new(nvars: usize, order: MonomialOrder, bits: u32) -> ExponentLayout {
        let bits = fix_bits(bits);
        let nfields = nvars + order.is_graded() as usize;

        let (words, positions): (usize, SmallVec<[(usize, u32); INLINED_EXPONENTS]>) =
            if bits <= 64 {
                let per_word = (64 / bits) as usize;
                let words = nfields.div_ceil(per_word).max(1);
                let positions = (0..nfields)
                    .map(|f| (f / per_word, 64 - bits * (f % per_word + 1) as u32))
                    .collect();
                (words, positions)
            } else {
                let k = (bits / 64) as usize;
                let words = (nfields * k).max(1);
                let positions = (0..nfields).map(|f| (f * k + k - 1, 0)).collect();
                (words, positions)
            };

        let mut layout = ExponentLayout {
            nvars,
            order,
            bits,
            words,
            positions,
            cmpmask: smallvec![0; words],
            guard: smallvec![0; words],
            low: smallvec![0; words],
        };

        for f in 0..nfields {
            let (w, shift) = layout.positions[f];
            if bits <= 64 {
                layout.guard[w] |= 1 << (shift + bits - 1);
                layout.low[w] |= 1 << shift;
            } else {
                layout.guard[w + 1 - (bits / 64) as usize] |= 1 << 63;
                layout.low[w] |= 1;
            }
        }

        // reverse lexicographic tie breaking compares inverted variable fields
        if order == MonomialOrder::DegRevLex {
            for f in 1..nfields {
                let (w, shift) = layout.positions[f];
                if bits <= 64 {
                    let field_mask = if bits == 64 {
                        u64::MAX
                    } else {
                        ((1u64 << bits) - 1) << shift
                    };
                    layout.cmpmask[w] |= field_mask & !layout.guard[w];
                } else {
                    let first = w + 1 - (bits / 64) as usize;
                    for i in first..=w {
                        layout.cmpmask[i] = u64::MAX;
                    }
                    layout.cmpmask[first] &= !(1 << 63);
                }
            }
        }

        layout
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    #[inline]
    pub fn order(&self) -> MonomialOrder {
        self.order
    }

    /// The width of a field, including its guard bit.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The number of words of a packed exponent vector.
    #[inline]
    pub fn words(&self) -> usize {
        self.words
    }

    /// Returns true if a field spans more than one word.
    #[inline]
    pub fn is_multi_word(&self) -> bool {
        self.bits > 64
    }

    /// The largest value a field can hold.
    pub fn max_value(&self) -> u128 {
        if self.bits > 128 {
            u128::MAX
        } else {
            (1u128 << (self.bits - 1)) - 1
        }
    }

    #[inline]
    fn var_field(&self, var: usize) -> usize {
        match self.order {
            MonomialOrder::Lex => var,
            MonomialOrder::DegLex => var + 1,
            MonomialOrder::DegRevLex => self.nvars - var,
        }
    }

    fn get_field(&self, words: &[u64], f: usize) -> u128 {
        let (w, shift) = self.positions[f];
        if self.bits < 64 {
            ((words[w] >> shift) & ((1 << self.bits) - 1)) as u128
        } else if self.bits == 64 {
            words[w] as u128
        } else {
            (words[w - 1] as u128) << 64 | words[w] as u128
        }
    }

    fn set_field(&self, words: &mut [u64], f: usize, value: u128) {
        let (w, shift) = self.positions[f];
        if self.bits < 64 {
            let mask = ((1u64 << self.bits) - 1) << shift;
            words[w] = (words[w] & !mask) | ((value as u64) << shift);
        } else if self.bits == 64 {
            words[w] = value as u64;
        } else {
            words[w - 1] = (value >> 64) as u64;
            words[w] = value as u64;
        }
    }

    /// The all-zero exponent vector.
    pub fn zero(&self) -> PackedExponents {
        smallvec![0; self.words]
    }

    /// Pack the exponents of all variables.
    pub fn pack(&self, exponents: &[u64]) -> Result<PackedExponents, ExponentOverflow> {
        debug_assert_eq!(exponents.len(), self.nvars);

        let max = self.max_value();
        let overflow = ExponentOverflow { bits: self.bits };

        if exponents.iter().any(|e| *e as u128 > max) {
            return Err(overflow);
        }
        if self.order.is_graded() && exponents.iter().map(|e| *e as u128).sum::<u128>() > max {
            return Err(overflow);
        }

        Ok(self.pack_unchecked(exponents))
    }

    /// Pack exponents that are known to fit.
    pub(crate) fn pack_unchecked(&self, exponents: &[u64]) -> PackedExponents {
        let mut out = self.zero();
        for (v, e) in exponents.iter().enumerate() {
            self.set_field(&mut out, self.var_field(v), *e as u128);
        }

        if self.order.is_graded() {
            let total: u128 = exponents.iter().map(|e| *e as u128).sum();
            self.set_field(&mut out, 0, total);
        }
        out
    }

    /// Unpack the exponents of all variables.
    pub fn unpack(&self, words: &[u64]) -> SmallVec<[u64; INLINED_EXPONENTS]> {
        (0..self.nvars).map(|v| self.exponent(words, v)).collect()
    }

    /// Get the exponent of variable `var`.
    #[inline]
    pub fn exponent(&self, words: &[u64], var: usize) -> u64 {
        self.get_field(words, self.var_field(var)) as u64
    }

    /// The total degree of the monomial.
    pub fn total_degree(&self, words: &[u64]) -> u128 {
        if self.order.is_graded() {
            self.get_field(words, 0)
        } else {
            (0..self.nvars)
                .map(|v| self.exponent(words, v) as u128)
                .sum()
        }
    }

    /// Compare two monomials in the order of the layout.
    #[inline]
    pub fn cmp(&self, a: &[u64], b: &[u64]) -> Ordering {
        for ((x, y), m) in a.iter().zip(b).zip(&self.cmpmask) {
            match (x ^ m).cmp(&(y ^ m)) {
                Ordering::Equal => {}
                o => return o,
            }
        }
        Ordering::Equal
    }

    /// The masked words of a monomial, whose lexicographic order as a
    /// slice of integers is the monomial order.
    #[inline]
    pub fn key(&self, words: &[u64]) -> PackedExponents {
        words.iter().zip(&self.cmpmask).map(|(w, m)| w ^ m).collect()
    }

    /// Recover the monomial from its key.
    #[inline]
    pub fn from_key(&self, key: &[u64]) -> PackedExponents {
        self.key(key)
    }

    /// Returns true if any field has its guard bit set.
    #[inline]
    pub fn overflows(&self, words: &[u64]) -> bool {
        words.iter().zip(&self.guard).any(|(w, g)| w & g != 0)
    }

    /// Multiply two monomials. The result may have guard bits set, see [Self::overflows].
    pub fn add(&self, a: &[u64], b: &[u64]) -> PackedExponents {
        let mut out = self.zero();
        let mut carry = false;
        for i in (0..self.words).rev() {
            let (s, c1) = a[i].overflowing_add(b[i]);
            let (s, c2) = s.overflowing_add(carry as u64);
            out[i] = s;
            carry = c1 || c2;
        }
        out
    }

    /// Multiply two monomials, failing if the product does not fit.
    #[inline]
    pub fn add_checked(&self, a: &[u64], b: &[u64]) -> Result<PackedExponents, ExponentOverflow> {
        let r = self.add(a, b);
        if self.overflows(&r) {
            Err(ExponentOverflow { bits: self.bits })
        } else {
            Ok(r)
        }
    }

    /// Divide `a` by `b`, where `b` is known to divide `a`.
    pub fn sub(&self, a: &[u64], b: &[u64]) -> PackedExponents {
        let mut out = self.zero();
        let mut borrow = false;
        for i in (0..self.words).rev() {
            let (s, b1) = a[i].overflowing_sub(b[i]);
            let (s, b2) = s.overflowing_sub(borrow as u64);
            out[i] = s;
            borrow = b1 || b2;
        }
        out
    }

    /// Divide `a` by `b` if every exponent of `b` is at most the one of `a`.
    ///
    /// The guard bits of `a` are set before subtracting, so a negative field
    /// borrows from its own guard bit instead of from its neighbour.
    pub fn divides(&self, a: &[u64], b: &[u64]) -> Option<PackedExponents> {
        let mut out = self.zero();
        let mut borrow = false;
        for i in (0..self.words).rev() {
            let (s, b1) = (a[i] | self.guard[i]).overflowing_sub(b[i]);
            let (s, b2) = s.overflowing_sub(borrow as u64);
            out[i] = s;
            borrow = b1 || b2;
        }

        for (w, g) in out.iter_mut().zip(&self.guard) {
            if *w & g != *g {
                return None;
            }
            *w &= !g;
        }
        Some(out)
    }

    /// Halve every exponent, if they are all even.
    pub fn halves(&self, a: &[u64]) -> Option<PackedExponents> {
        if a.iter().zip(&self.low).any(|(w, l)| w & l != 0) {
            return None;
        }

        let mut out = self.zero();
        let mut carry = 0;
        for (o, w) in out.iter_mut().zip(a) {
            *o = (w >> 1) | carry;
            carry = w << 63;
        }
        Some(out)
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use super::{bits_for, bits_for_degrees, fix_bits, ExponentLayout};
    use crate::poly::MonomialOrder;

    #[test]
    fn widths() {
        assert_eq!(fix_bits(1), 8);
        assert_eq!(fix_bits(9), 16);
        assert_eq!(fix_bits(33), 64);
        assert_eq!(fix_bits(65), 128);
        assert_eq!(fix_bits(130), 192);

        assert_eq!(bits_for(127), 8);
        assert_eq!(bits_for(128), 16);
        assert_eq!(bits_for(u64::MAX as u128), 128);
        assert_eq!(bits_for_degrees(MonomialOrder::DegLex, &[100, 100]), 16);
        assert_eq!(bits_for_degrees(MonomialOrder::Lex, &[100, 100]), 8);
    }

    #[test]
    fn pack_unpack() {
        for bits in [8, 16, 32, 64, 128, 192] {
            for order in [
                MonomialOrder::Lex,
                MonomialOrder::DegLex,
                MonomialOrder::DegRevLex,
            ] {
                let l = ExponentLayout::new(5, order, bits);
                let e = [3, 0, 100, 7, 1];
                let p = l.pack(&e).unwrap();
                assert_eq!(l.unpack(&p).as_slice(), &e);
                assert_eq!(l.total_degree(&p), 111);
                assert!(!l.overflows(&p));
            }
        }

        let l = ExponentLayout::new(9, MonomialOrder::Lex, 8);
        assert_eq!(l.words(), 2);
        assert!(l.pack(&[0, 0, 0, 0, 0, 0, 0, 0, 128]).is_err());
        assert!(l.pack(&[0, 0, 0, 0, 0, 0, 0, 0, 127]).is_ok());

        let l = ExponentLayout::new(2, MonomialOrder::DegLex, 8);
        assert!(l.pack(&[100, 100]).is_err());

        let l = ExponentLayout::new(2, MonomialOrder::Lex, 128);
        let p = l.pack(&[u64::MAX, 5]).unwrap();
        assert_eq!(l.unpack(&p).as_slice(), &[u64::MAX, 5]);
    }

    #[test]
    fn orders() {
        // x*z against y^2
        let a = [1, 0, 1];
        let b = [0, 2, 0];
        for (order, expected) in [
            (MonomialOrder::Lex, Ordering::Greater),
            (MonomialOrder::DegLex, Ordering::Greater),
            (MonomialOrder::DegRevLex, Ordering::Less),
        ] {
            for bits in [8, 64, 128] {
                let l = ExponentLayout::new(3, order, bits);
                let (pa, pb) = (l.pack(&a).unwrap(), l.pack(&b).unwrap());
                assert_eq!(l.cmp(&pa, &pb), expected);
                assert_eq!(l.key(&pa).cmp(&l.key(&pb)), expected);
                assert_eq!(l.from_key(&l.key(&pa)), pa);
            }
        }

        // graded orders compare the degree first
        let l = ExponentLayout::new(2, MonomialOrder::DegRevLex, 8);
        let (pa, pb) = (l.pack(&[0, 3]).unwrap(), l.pack(&[2, 0]).unwrap());
        assert_eq!(l.cmp(&pa, &pb), Ordering::Greater);
        let l = ExponentLayout::new(2, MonomialOrder::Lex, 8);
        let (pa, pb) = (l.pack(&[0, 3]).unwrap(), l.pack(&[2, 0]).unwrap());
        assert_eq!(l.cmp(&pa, &pb), Ordering::Less);
    }

    #[test]
    fn arithmetic() {
        for bits in [8, 16, 64, 128] {
            let l = ExponentLayout::new(4, MonomialOrder::DegRevLex, bits);
            let a = l.pack(&[4, 2, 0, 6]).unwrap();
            let b = l.pack(&[1, 2, 0, 3]).unwrap();

            let s = l.add_checked(&a, &b).unwrap();
            assert_eq!(l.unpack(&s).as_slice(), &[5, 4, 0, 9]);
            assert_eq!(l.sub(&s, &b), a);

            let q = l.divides(&a, &b).unwrap();
            assert_eq!(l.unpack(&q).as_slice(), &[3, 0, 0, 3]);
            assert!(l.divides(&b, &a).is_none());
            assert_eq!(l.divides(&a, &a).unwrap(), l.zero());

            let h = l.halves(&a).unwrap();
            assert_eq!(l.unpack(&h).as_slice(), &[2, 1, 0, 3]);
            assert!(l.halves(&b).is_none());
        }

        let l = ExponentLayout::new(2, MonomialOrder::Lex, 8);
        let a = l.pack(&[100, 1]).unwrap();
        assert!(l.add_checked(&a, &a).is_err());
        assert!(l.overflows(&l.add(&a, &a)));
    }
}
