//! The fixed-shape UTXO transaction
//!
//! Every [`Transaction`] spends exactly two inputs and creates exactly two
//! outputs. Unused slots are filled with padding ([`Utxo::padding`],
//! [`TxOut::padding`]), which keeps hashing and encoding free of optional
//! structure.
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _, Snafu, ensure};

use crate::address::Address;
use crate::amount::Amount;
use crate::bincode::{STD_BINCODE_CONFIG, decode_whole, encode_to_vec};
use crate::key::SecretKey;
use crate::signer::{Hashable, RecoverError, Signable, Signer, TxHash, TxSignature};
use crate::utxo::{TxOut, Utxo};

pub const NUM_INPUTS: usize = 2;
pub const NUM_OUTPUTS: usize = 2;

/// Everything a [`Transaction`] signature commits to
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionUnsigned {
    inputs: [Utxo; NUM_INPUTS],
    outputs: [TxOut; NUM_OUTPUTS],
    fee: Amount,
}

impl Hashable for TransactionUnsigned {}
impl Signable for TransactionUnsigned {
    const TAG: [u8; 4] = *b"tx2x";
}

impl TransactionUnsigned {
    pub fn inputs(&self) -> &[Utxo; NUM_INPUTS] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOut; NUM_OUTPUTS] {
        &self.outputs
    }

    pub fn fee(&self) -> Amount {
        self.fee.clone()
    }
}

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    unsigned: TransactionUnsigned,
    /// Signature at `i` authorizes spending of `inputs[i]`
    signatures: [Option<TxSignature>; NUM_INPUTS],
}

#[derive(Debug, Snafu)]
pub enum FormatError {
    #[snafu(display("Invalid wire encoding"))]
    Wire { source: bincode::error::DecodeError },
    #[snafu(display("Invalid json encoding"))]
    Json { source: serde_json::Error },
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SignError {
    #[snafu(display("No key given for non-padding input {input_idx}"))]
    MissingKey { input_idx: usize },
}

pub type SignResult<T> = Result<T, SignError>;

/// Why a transaction's signatures do not authorize its inputs
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SignatureError {
    #[snafu(display("Input {input_idx} is not signed"))]
    MissingSignature { input_idx: usize },
    #[snafu(display("Signature of input {input_idx} is malformed"))]
    MalformedSignature { input_idx: usize },
    #[snafu(display("Signature of input {input_idx} is invalid"))]
    InvalidSignature { input_idx: usize },
    #[snafu(display("Input {input_idx} is owned by {expected}, but signed by {recovered}"))]
    WrongSigner {
        input_idx: usize,
        expected: Address,
        recovered: Address,
    },
}

pub type SignatureResult<T> = Result<T, SignatureError>;

impl Transaction {
    /// Build an unsigned transaction
    ///
    /// No value checks happen here; balancing inputs against outputs is up to
    /// the ledger accepting the transaction (see [`Self::is_balanced`]).
    pub fn new(in1: Utxo, in2: Utxo, out1: TxOut, out2: TxOut, fee: Amount) -> Self {
        Self {
            unsigned: TransactionUnsigned {
                inputs: [in1, in2],
                outputs: [out1, out2],
                fee,
            },
            signatures: [None, None],
        }
    }

    pub fn with_signatures(self, signatures: [Option<TxSignature>; NUM_INPUTS]) -> Self {
        Self {
            unsigned: self.unsigned,
            signatures,
        }
    }

    pub fn unsigned(&self) -> &TransactionUnsigned {
        &self.unsigned
    }

    pub fn inputs(&self) -> &[Utxo; NUM_INPUTS] {
        &self.unsigned.inputs
    }

    pub fn outputs(&self) -> &[TxOut; NUM_OUTPUTS] {
        &self.unsigned.outputs
    }

    pub fn signatures(&self) -> &[Option<TxSignature>; NUM_INPUTS] {
        &self.signatures
    }

    /// Copy of the fee
    pub fn fee(&self) -> Amount {
        self.unsigned.fee()
    }

    pub fn hash(&self, signer: &impl Signer) -> TxHash {
        signer.tx_hash(&self.unsigned)
    }

    /// Both inputs are padding: value minted from a root chain deposit
    /// rather than moved from existing outputs
    pub fn is_deposit(&self) -> bool {
        self.inputs().iter().all(|input| *input == Utxo::padding())
    }

    pub fn input_total(&self) -> Amount {
        self.inputs()
            .iter()
            .filter(|input| !input.is_padding())
            .map(Utxo::amount)
            .sum()
    }

    pub fn output_total(&self) -> Amount {
        self.outputs().iter().map(|out| &out.amount).sum()
    }

    /// Inputs cover outputs plus the fee
    pub fn is_balanced(&self) -> bool {
        self.output_total() + self.fee() <= self.input_total()
    }

    /// Sign every non-padding input, returning the signed copy
    ///
    /// `key1` signs input 0, `key2` input 1. When `key2` is not given and
    /// both inputs have the same owner, `key1` signs both.
    pub fn sign(
        &self,
        signer: &impl Signer,
        key1: Option<&SecretKey>,
        key2: Option<&SecretKey>,
    ) -> SignResult<Self> {
        let hash = self.hash(signer);
        let [in1, in2] = self.inputs();
        let key2 = key2.or(if in1.owner() == in2.owner() {
            key1
        } else {
            None
        });

        let mut signatures = [None, None];
        for (input_idx, (input, key)) in self.inputs().iter().zip([key1, key2]).enumerate() {
            if input.is_padding() {
                continue;
            }
            let key = key.context(MissingKeySnafu { input_idx })?;
            signatures[input_idx] = Some(signer.sign(hash, key));
        }

        Ok(Self {
            unsigned: self.unsigned.clone(),
            signatures,
        })
    }

    /// Check that every non-padding input is signed by its owner
    pub fn verify(&self, signer: &impl Signer) -> SignatureResult<()> {
        let hash = self.hash(signer);

        for (input_idx, (input, sig)) in self.inputs().iter().zip(&self.signatures).enumerate() {
            if input.is_padding() {
                continue;
            }
            let sig = sig.as_ref().context(MissingSignatureSnafu { input_idx })?;
            let recovered = signer.recover(hash, sig).map_err(|err| match err {
                RecoverError::Malformed => SignatureError::MalformedSignature { input_idx },
                RecoverError::Invalid => SignatureError::InvalidSignature { input_idx },
            })?;
            ensure!(
                recovered == input.owner(),
                WrongSignerSnafu {
                    input_idx,
                    expected: input.owner(),
                    recovered,
                }
            );
        }
        Ok(())
    }

    pub fn is_valid(&self, signer: &impl Signer) -> bool {
        self.verify(signer).is_ok()
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        encode_to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> FormatResult<Self> {
        decode_whole(bytes, STD_BINCODE_CONFIG).context(WireSnafu)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Can't fail")
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("Can't fail")
    }

    pub fn from_json(s: &str) -> FormatResult<Self> {
        serde_json::from_str(s).context(JsonSnafu)
    }
}
