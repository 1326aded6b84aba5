use std::fmt;
use std::str::FromStr;

use crate::address::Address;

/// Private key authorizing spends of outputs owned by [`Self::address`]
///
/// Not `Copy`, and the key material is wiped on drop. Signing only ever
/// borrows it.
#[derive(Clone)]
pub struct SecretKey(ed25519_dalek::SigningKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::thread_rng()))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.0.verifying_key()
    }

    pub fn address(&self) -> Address {
        Address::from_verifying_key(&self.0.verifying_key())
    }

    pub(crate) fn signing_key(&self) -> &ed25519_dalek::SigningKey {
        &self.0
    }

    /// Hex encoding of the raw key material
    ///
    /// Named to make leaking it a deliberate act.
    pub fn reveal_hex(&self) -> String {
        data_encoding::HEXLOWER.encode(self.0.as_bytes())
    }
}

impl FromStr for SecretKey {
    type Err = data_encoding::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let v = data_encoding::HEXLOWER_PERMISSIVE.decode(s.as_bytes())?;
        let bytes: [u8; 32] = v.try_into().map_err(|_| data_encoding::DecodeError {
            position: 0,
            kind: data_encoding::DecodeKind::Length,
        })?;
        Ok(Self::from_bytes(bytes))
    }
}
