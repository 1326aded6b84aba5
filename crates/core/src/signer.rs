use bincode::{Decode, Encode};
use ed25519_dalek::Signer as _;
use plasma_util_array_type::{
    array_type_define, array_type_impl_debug_as_display, array_type_impl_hex_str,
    array_type_impl_serde, array_type_impl_zero_default,
};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, Snafu};

use crate::address::Address;
use crate::bincode::STD_BINCODE_CONFIG;
use crate::key::SecretKey;
use crate::transaction::TransactionUnsigned;

/// Identifier of the child chain a signature is valid on
#[derive(
    Encode,
    Decode,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::From,
    derive_more::Display,
)]
pub struct ChainId(u64);

impl ChainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn to_number(self) -> u64 {
        self.0
    }
}

array_type_define! {
    /// Chain-bound digest that transaction signatures commit to
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct TxHash[32];
}
array_type_impl_zero_default!(TxHash);
array_type_impl_hex_str!(TxHash);
array_type_impl_serde!(TxHash);
array_type_impl_debug_as_display!(TxHash);

impl From<blake3::Hash> for TxHash {
    fn from(value: blake3::Hash) -> Self {
        Self(*value.as_bytes())
    }
}

array_type_define! {
    /// Signing key's public half (32B) followed by the ed25519 signature (64B)
    ///
    /// Carrying the public key is what makes the signer's [`Address`]
    /// recoverable from the signature alone.
    #[derive(Encode, Decode, Clone, Copy)]
    pub struct TxSignature[96];
}
array_type_impl_hex_str!(TxSignature);
array_type_impl_serde!(TxSignature);
array_type_impl_debug_as_display!(TxSignature);

impl TxSignature {
    const PUBKEY_LEN: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

    fn new(pubkey: &ed25519_dalek::VerifyingKey, sig: &ed25519_dalek::Signature) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes[..Self::PUBKEY_LEN].copy_from_slice(pubkey.as_bytes());
        bytes[Self::PUBKEY_LEN..].copy_from_slice(&sig.to_bytes());
        Self(bytes)
    }

    fn pubkey_bytes(&self) -> [u8; ed25519_dalek::PUBLIC_KEY_LENGTH] {
        let mut bytes = [0u8; ed25519_dalek::PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(&self.0[..Self::PUBKEY_LEN]);
        bytes
    }

    fn signature(&self) -> ed25519_dalek::Signature {
        let mut bytes = [0u8; ed25519_dalek::SIGNATURE_LENGTH];
        bytes.copy_from_slice(&self.0[Self::PUBKEY_LEN..]);
        ed25519_dalek::Signature::from_bytes(&bytes)
    }
}

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum RecoverError {
    #[snafu(display("Signature carries an invalid public key"))]
    Malformed,
    #[snafu(display("Signature does not match the digest"))]
    Invalid,
}

pub type RecoverResult<T> = Result<T, RecoverError>;

pub trait Hashable: bincode::Encode {
    fn hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();

        bincode::encode_into_std_write(self, &mut hasher, STD_BINCODE_CONFIG)
            .expect("Can't fail");

        hasher.finalize()
    }
}

/// A message that can be signed over with a [`Signer`]
pub trait Signable: Hashable {
    /// Unique tag preventing two different type of messages with the same
    /// encoding from conflicting with each other
    const TAG: [u8; 4];
}

/// Signing scheme of a given chain
///
/// Every digest produced here is bound to [`Signer::chain_id`], so a
/// signature made for one chain never verifies on another.
pub trait Signer {
    fn chain_id(&self) -> ChainId;

    /// Digest of the transaction's content (signatures excluded)
    fn tx_hash(&self, tx: &TransactionUnsigned) -> TxHash;

    fn sign(&self, hash: TxHash, seckey: &SecretKey) -> TxSignature;

    /// Identity that produced `sig` over `hash`
    fn recover(&self, hash: TxHash, sig: &TxSignature) -> RecoverResult<Address>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSigner {
    chain_id: ChainId,
}

impl ChainSigner {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }

    fn sign_hash<T: Signable>(&self, msg: &T) -> TxHash {
        let mut hasher = blake3::Hasher::new();

        hasher.update(b"plasma");
        hasher.update(&T::TAG);
        hasher.update(&self.chain_id.to_number().to_be_bytes());
        hasher.update(msg.hash().as_bytes());

        hasher.finalize().into()
    }
}

impl Signer for ChainSigner {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn tx_hash(&self, tx: &TransactionUnsigned) -> TxHash {
        self.sign_hash(tx)
    }

    fn sign(&self, hash: TxHash, seckey: &SecretKey) -> TxSignature {
        let key = seckey.signing_key();
        TxSignature::new(&key.verifying_key(), &key.sign(hash.as_slice()))
    }

    fn recover(&self, hash: TxHash, sig: &TxSignature) -> RecoverResult<Address> {
        let pubkey = ed25519_dalek::VerifyingKey::from_bytes(&sig.pubkey_bytes())
            .ok()
            .context(MalformedSnafu)?;

        pubkey
            .verify_strict(hash.as_slice(), &sig.signature())
            .ok()
            .context(InvalidSnafu)?;

        Ok(Address::from_verifying_key(&pubkey))
    }
}
