use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use ff::PrimeField;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::utils::bool_to_field;
use crate::{Error, LIMB_BITS, NUM_LIMBS};

/// Native twin of an assigned big integer: a sign bit (true = negative) and
/// `L` little-endian limbs in base `2^LIMB_BITS`.
///
/// Zero has two encodings (either sign); equality and ordering treat them as
/// the same number, and `Display` always renders `0`. Serialization keeps
/// the sign bit (`"-0"`), since public inputs carry it.
#[derive(Clone, Copy, Debug)]
pub struct SignedLimbInt<const L: usize = NUM_LIMBS> {
    sign: bool,
    limbs: [u128; L],
}

fn limb_mask() -> BigUint {
    (BigUint::one() << LIMB_BITS) - BigUint::one()
}

impl<const L: usize> SignedLimbInt<L> {
    pub const ZERO: Self = Self {
        sign: false,
        limbs: [0; L],
    };

    /// Total magnitude width, `LIMB_BITS * L`.
    pub const BITS: usize = LIMB_BITS * L;

    pub fn from_bigint(x: &BigInt) -> Result<Self, Error> {
        let mut magnitude = x.magnitude().clone();
        let mask = limb_mask();
        let mut limbs = [0u128; L];
        for limb in limbs.iter_mut() {
            *limb = (&magnitude & &mask).to_u128().unwrap_or_default();
            magnitude >>= LIMB_BITS;
        }
        if !magnitude.is_zero() {
            return Err(Error::Construction {
                value: x.to_string(),
                bits: Self::BITS,
            });
        }
        Ok(Self {
            sign: x.sign() == Sign::Minus,
            limbs,
        })
    }

    /// Keeps the low `BITS` bits of the magnitude. Only the oracle uses
    /// this, so that a witness which cannot fit still yields an
    /// assignment (and an unsatisfiable relation).
    pub fn from_bigint_truncated(x: &BigInt) -> Self {
        Self::from_bigint(x).unwrap_or_else(|err| {
            log::warn!("truncating witness: {}", err);
            let mask = (BigUint::one() << Self::BITS) - BigUint::one();
            let truncated = BigInt::from_biguint(x.sign(), x.magnitude() & mask);
            Self::from_bigint(&truncated).unwrap_or(Self::ZERO)
        })
    }

    /// Non-negative value below `2^64`, which always fits one limb.
    pub fn from_u64(value: u64) -> Self {
        let mut limbs = [0; L];
        limbs[0] = value as u128;
        Self { sign: false, limbs }
    }

    pub fn from_parts(sign: bool, limbs: [u128; L]) -> Result<Self, Error> {
        match limbs.iter().find(|&&limb| limb >> LIMB_BITS != 0) {
            Some(limb) => Err(Error::Construction {
                value: limb.to_string(),
                bits: LIMB_BITS,
            }),
            None => Ok(Self { sign, limbs }),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        let magnitude = self
            .limbs
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, &limb| (acc << LIMB_BITS) + limb);
        let sign = if self.sign { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, magnitude)
    }

    pub fn sign(&self) -> bool {
        self.sign
    }

    pub fn limbs(&self) -> &[u128; L] {
        &self.limbs
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    /// Sign bit followed by the limbs, the layout used for public inputs.
    pub fn to_fields<F: PrimeField>(&self) -> Vec<F> {
        std::iter::once(bool_to_field(self.sign))
            .chain(self.limbs.iter().map(|&limb| F::from_u128(limb)))
            .collect()
    }
}

impl<const L: usize> Default for SignedLimbInt<L> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const L: usize> Neg for SignedLimbInt<L> {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            sign: !self.sign,
            limbs: self.limbs,
        }
    }
}

impl<const L: usize> PartialEq for SignedLimbInt<L> {
    fn eq(&self, other: &Self) -> bool {
        (self.is_zero() && other.is_zero()) || (self.sign == other.sign && self.limbs == other.limbs)
    }
}

impl<const L: usize> Eq for SignedLimbInt<L> {}

impl<const L: usize> PartialOrd for SignedLimbInt<L> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const L: usize> Ord for SignedLimbInt<L> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bigint().cmp(&other.to_bigint())
    }
}

impl<const L: usize> fmt::Display for SignedLimbInt<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bigint())
    }
}

impl<const L: usize> Serialize for SignedLimbInt<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.sign && self.is_zero() {
            return serializer.serialize_str("-0");
        }
        serializer.collect_str(self)
    }
}

impl<'de, const L: usize> Deserialize<'de> for SignedLimbInt<L> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decimal = String::deserialize(deserializer)?;
        let value: BigInt = decimal.parse().map_err(de::Error::custom)?;
        let x = Self::from_bigint(&value).map_err(de::Error::custom)?;
        Ok(if value.is_zero() && decimal.starts_with('-') {
            -x
        } else {
            x
        })
    }
}

/// State of the Euclidean reduction, threaded through every proof of a chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionPair<const L: usize = NUM_LIMBS> {
    pub g0: SignedLimbInt<L>,
    pub g1: SignedLimbInt<L>,
}

impl<const L: usize> ReductionPair<L> {
    pub fn new(g0: SignedLimbInt<L>, g1: SignedLimbInt<L>) -> Self {
        Self { g0, g1 }
    }

    pub fn from_bigints(g0: &BigInt, g1: &BigInt) -> Result<Self, Error> {
        Ok(Self {
            g0: SignedLimbInt::from_bigint(g0)?,
            g1: SignedLimbInt::from_bigint(g1)?,
        })
    }

    pub fn is_solved(&self) -> bool {
        self.g0 == self.g1 || self.g1.is_zero()
    }

    pub fn to_fields<F: PrimeField>(&self) -> Vec<F> {
        let mut fields = self.g0.to_fields();
        fields.extend(self.g1.to_fields::<F>());
        fields
    }
}

impl<const L: usize> fmt::Display for ReductionPair<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.g0, self.g1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ff::Field;
    use halo2curves::bn256::Fr;
    use rand_core::{OsRng, RngCore};

    /// Uniform sign, magnitude below `2^bits`.
    pub(crate) fn random_bigint(bits: usize) -> BigInt {
        let mut bytes = vec![0u8; (bits + 7) / 8 + 1];
        OsRng.fill_bytes(&mut bytes);
        let negative = bytes[0] & 1 == 1;
        let magnitude = BigUint::from_bytes_le(&bytes[1..]) >> ((bytes.len() - 1) * 8 - bits);
        BigInt::from_biguint(if negative { Sign::Minus } else { Sign::Plus }, magnitude)
    }

    #[test]
    fn test_round_trip() {
        for bits in [0, 1, 115, 116, 117, 1000, 2087, 2088] {
            for _ in 0..8 {
                let x = random_bigint(bits);
                let limbs = SignedLimbInt::<NUM_LIMBS>::from_bigint(&x).unwrap();
                assert_eq!(limbs.to_bigint(), x);
            }
        }

        let max = (BigInt::one() << 2088) - 1;
        assert_eq!(SignedLimbInt::<NUM_LIMBS>::from_bigint(&max).unwrap().to_bigint(), max);
        assert_eq!(SignedLimbInt::<NUM_LIMBS>::from_bigint(&-&max).unwrap().to_bigint(), -max);
    }

    #[test]
    fn test_construction_error() {
        let too_big = BigInt::one() << 2088;
        assert!(matches!(
            SignedLimbInt::<NUM_LIMBS>::from_bigint(&too_big),
            Err(Error::Construction { bits: 2088, .. })
        ));
        assert!(SignedLimbInt::<NUM_LIMBS>::from_bigint(&-too_big).is_err());
        assert!(SignedLimbInt::<2>::from_parts(false, [1u128 << 116, 0]).is_err());
    }

    #[test]
    fn test_zero_representations() {
        let zero = SignedLimbInt::<4>::ZERO;
        let negative_zero = -zero;
        assert!(negative_zero.sign());
        assert_eq!(zero, negative_zero);
        assert_eq!(zero.cmp(&negative_zero), Ordering::Equal);
        assert_eq!(negative_zero.to_string(), "0");
    }

    #[test]
    fn test_json_decimal() {
        let pair = ReductionPair::<4>::from_bigints(&BigInt::from(-48), &BigInt::from(18)).unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"g0":"-48","g1":"18"}"#);
        let back: ReductionPair<4> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);

        let negative_zero: SignedLimbInt<4> = serde_json::from_str(r#""-0""#).unwrap();
        assert!(negative_zero.sign());
        assert_eq!(serde_json::to_string(&negative_zero).unwrap(), r#""-0""#);

        let overflow = format!(r#"{{"g0":"{}","g1":"0"}}"#, BigInt::one() << 464);
        assert!(serde_json::from_str::<ReductionPair<4>>(&overflow).is_err());
    }

    #[test]
    fn test_is_solved() {
        let pair = |a: i64, b: i64| ReductionPair::<2>::from_bigints(&a.into(), &b.into()).unwrap();
        assert!(pair(6, 0).is_solved());
        assert!(pair(6, 6).is_solved());
        assert!(pair(0, 0).is_solved());
        assert!(!pair(6, 4).is_solved());
        assert!(!pair(0, 4).is_solved());
    }

    #[test]
    fn test_fields_layout() {
        let x = SignedLimbInt::<2>::from_bigint(&-((BigInt::one() << 116) + 5)).unwrap();
        assert_eq!(x.to_fields::<Fr>(), vec![Fr::ONE, Fr::from(5), Fr::ONE]);
    }
}
