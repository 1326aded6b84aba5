use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use num_bigint::BigUint;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Arbitrary-precision non-negative value (token amount, fee)
///
/// Immutable: every operation produces a new `Amount`, and getters hand out
/// owned copies, so two holders can never observe each other's changes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigUint);

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Invalid decimal amount"))]
pub struct InvalidAmountError;

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::default()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn checked_sub(&self, rhs: &Amount) -> Option<Amount> {
        if self.0 < rhs.0 {
            return None;
        }
        Some(Self(&self.0 - &rhs.0))
    }

    /// Shortest big-endian representation; zero is the empty string
    pub fn to_be_bytes(&self) -> Vec<u8> {
        if self.is_zero() {
            return vec![];
        }
        self.0.to_bytes_be()
    }

    /// Inverse of [`Self::to_be_bytes`]
    ///
    /// Only the shortest form is accepted, so every amount has exactly one
    /// encoding.
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.first() == Some(&0) {
            return None;
        }
        Some(Self(BigUint::from_bytes_be(bytes)))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| &acc + a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Amount {
    type Err = InvalidAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `BigUint` itself tolerates `+` and `_`, which we don't want in JSON
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAmountError);
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or(InvalidAmountError)
    }
}

impl Encode for Amount {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.to_be_bytes().encode(encoder)
    }
}

impl<Context> Decode<Context> for Amount {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let bytes = <Vec<u8> as Decode<Context>>::decode(decoder)?;
        Self::from_be_bytes(&bytes).ok_or(DecodeError::Other("non-canonical amount"))
    }
}
bincode::impl_borrow_decode!(Amount);

impl Serialize for Amount {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if s.is_human_readable() {
            s.serialize_str(&self.to_string())
        } else {
            s.serialize_bytes(&self.to_be_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(|e| D::Error::custom(format!("{e}: {s:?}")))
        } else {
            let bytes = serde_bytes::ByteBuf::deserialize(d)?;
            Self::from_be_bytes(&bytes).ok_or_else(|| D::Error::custom("non-canonical amount"))
        }
    }
}
