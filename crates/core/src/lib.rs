// SPDX-License-Identifier: MIT

//! Core types of the plasma child chain
//!
//! The fixed 2-in/2-out UTXO [`transaction::Transaction`], the values it is
//! made of, the chain-bound [`signer::Signer`] authorizing it, and the
//! canonical wire/JSON encodings of all of them.
pub mod address;
pub mod amount;
pub mod bincode;
pub mod key;
pub mod signer;
pub mod transaction;
pub mod utxo;
