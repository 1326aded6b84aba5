// SPDX-License-Identifier: MIT

//! Macros for fixed-size byte array newtypes
//!
//! Addresses, hashes and signatures all end up being `[u8; N]` wrappers that
//! need the same handful of impls: constants, zero default, `0x`-prefixed hex
//! text form and a serde impl that picks text or raw bytes depending on the
//! format.

pub use {data_encoding, serde, serde_bytes};

#[macro_export]
macro_rules! array_type_define {
    (
        $(#[$outer:meta])*
        $v:vis struct $name:tt[$n:expr];
    ) => {

        $(#[$outer])*
        #[derive(PartialOrd, Ord, PartialEq, Eq)]
        $v struct $name([u8; $n]);

        impl $name {

            pub const LEN: usize = $n;
            pub const ZERO: Self = Self([0u8; $n]);

            pub fn as_slice(&self) -> &[u8] {
                self.0.as_slice()
            }

            pub const fn from_bytes(bytes: [u8; $n]) -> Self {
                Self(bytes)
            }

            pub fn to_bytes(&self) -> [u8; $n] {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $n]
            }
        }
    }
}

#[macro_export]
macro_rules! array_type_impl_bytes_conv {
    ($name:tt) => {
        impl From<[u8; $name::LEN]> for $name {
            fn from(value: [u8; Self::LEN]) -> Self {
                Self(value)
            }
        }
        impl From<$name> for [u8; $name::LEN] {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

#[macro_export]
macro_rules! array_type_impl_zero_default {
    ($name:tt) => {
        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }
    };
}

#[macro_export]
macro_rules! array_type_impl_debug_as_display {
    ($name:tt) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <Self as std::fmt::Display>::fmt(self, f)
            }
        }
    };
}

#[macro_export]
macro_rules! array_type_impl_serde {
    (
        $name:tt
    ) => {
        impl $crate::serde::Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::serde::Serializer,
            {
                if s.is_human_readable() {
                    s.serialize_str(&self.to_string())
                } else {
                    s.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> $crate::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: $crate::serde::Deserializer<'de>,
            {
                if d.is_human_readable() {
                    let str = <String as $crate::serde::Deserialize>::deserialize(d)?;
                    <Self as std::str::FromStr>::from_str(&str).map_err(|e| {
                        $crate::serde::de::Error::custom(format!("Deserialization error: {e:#}"))
                    })
                } else {
                    let bytes: $crate::serde_bytes::ByteArray<{ $name::LEN }> =
                        $crate::serde::Deserialize::deserialize(d)?;
                    Ok(Self(bytes.into_array()))
                }
            }
        }
    };
}

/// Lowercase hex with a `0x` prefix; parsing accepts the prefix as optional
/// and either letter case
#[macro_export]
macro_rules! array_type_impl_hex_str {
    (
        $name:tt
    ) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("0x")?;
                $crate::data_encoding::HEXLOWER.encode_write(self.as_slice(), f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::data_encoding::DecodeError;

            fn from_str(s: &str) -> Result<$name, Self::Err> {
                let s = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                let v = $crate::data_encoding::HEXLOWER_PERMISSIVE.decode(s.as_bytes())?;
                let a = v
                    .try_into()
                    .map_err(|_| $crate::data_encoding::DecodeError {
                        position: 0,
                        kind: $crate::data_encoding::DecodeKind::Length,
                    })?;
                Ok(Self(a))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    array_type_define! {
        #[derive(Clone, Copy)]
        struct Sample[4];
    }
    array_type_impl_hex_str!(Sample);
    array_type_impl_debug_as_display!(Sample);
    array_type_impl_zero_default!(Sample);

    #[test]
    fn hex_str_sanity() {
        let s = Sample::from_bytes([0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(s.to_string(), "0xdeadbeef");
        assert_eq!(Sample::from_str("0xdeadbeef").unwrap(), s);
        assert_eq!(Sample::from_str("DEADBEEF").unwrap(), s);
        assert!(Sample::from_str("0xdeadbe").is_err());
        assert!(Sample::from_str("0xdeadbeefaa").is_err());
        assert!(Sample::from_str("0xzzadbeef").is_err());
        assert!(Sample::default().is_zero());
    }
}
