use bincode::{Decode, Encode};
use plasma_util_array_type::{
    array_type_define, array_type_impl_bytes_conv, array_type_impl_debug_as_display,
    array_type_impl_hex_str, array_type_impl_serde, array_type_impl_zero_default,
};

array_type_define! {
    /// Account identity owning outputs
    ///
    /// [`Address::ZERO`] is never a real owner; it marks padding inputs and
    /// outputs.
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct Address[20];
}
array_type_impl_zero_default!(Address);
array_type_impl_hex_str!(Address);
array_type_impl_serde!(Address);
array_type_impl_debug_as_display!(Address);
array_type_impl_bytes_conv!(Address);

impl Address {
    /// Address controlled by the given ed25519 key: leading 20 bytes of
    /// `blake3(pubkey)`
    pub fn from_verifying_key(key: &ed25519_dalek::VerifyingKey) -> Self {
        let hash = blake3::hash(key.as_bytes());
        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..Self::LEN]);
        Self(bytes)
    }
}
