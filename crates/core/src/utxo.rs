use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;

/// Position of an output in the child chain: block, transaction in block,
/// output in transaction
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
    PartialOrd,
    Ord,
    Hash,
)]
pub struct UtxoId {
    pub block_num: u64,
    pub tx_index: u32,
    pub out_index: u8,
}

impl UtxoId {
    /// Reserved "no input" reference; never points at a real output
    pub const PADDING: Self = Self::new(0, 0, 0);

    pub const fn new(block_num: u64, tx_index: u32, out_index: u8) -> Self {
        Self {
            block_num,
            tx_index,
            out_index,
        }
    }

    pub fn is_padding(&self) -> bool {
        *self == Self::PADDING
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.block_num, self.tx_index, self.out_index)
    }
}

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxOut {
    pub owner: Address,
    pub amount: Amount,
}

impl TxOut {
    pub fn new(owner: Address, amount: Amount) -> Self {
        Self { owner, amount }
    }

    /// Filler for an unused output slot
    pub fn padding() -> Self {
        Self {
            owner: Address::ZERO,
            amount: Amount::zero(),
        }
    }

    pub fn is_padding(&self) -> bool {
        self.owner.is_zero() && self.amount.is_zero()
    }
}

/// An unspent output together with where it lives
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    pub id: UtxoId,
    pub output: TxOut,
}

impl Utxo {
    pub fn new(id: UtxoId, output: TxOut) -> Self {
        Self { id, output }
    }

    /// Filler for an unused input slot
    pub fn padding() -> Self {
        Self {
            id: UtxoId::PADDING,
            output: TxOut::padding(),
        }
    }

    pub fn owner(&self) -> Address {
        self.output.owner
    }

    pub fn amount(&self) -> &Amount {
        &self.output.amount
    }

    /// Inputs without an owner need no signature
    pub fn is_padding(&self) -> bool {
        self.output.owner.is_zero()
    }
}
