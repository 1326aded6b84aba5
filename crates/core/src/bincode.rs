use bincode::config::{self, Config};
use bincode::{Encode, de, error};

pub const STANDARD_LIMIT_16M: usize = 0x100_0000;

/// Config used for everything that goes over the wire or into a hash
pub const STD_BINCODE_CONFIG: config::Configuration<
    config::BigEndian,
    config::Varint,
    config::Limit<STANDARD_LIMIT_16M>,
> = config::standard()
    .with_limit::<STANDARD_LIMIT_16M>()
    .with_big_endian()
    .with_variable_int_encoding();

pub fn encode_to_vec<E: Encode>(v: &E) -> Vec<u8> {
    bincode::encode_to_vec(v, STD_BINCODE_CONFIG).expect("Can't fail")
}

/// Decode `src`, failing if it is not consumed entirely
pub fn decode_whole<D: de::Decode<()>, C: Config>(
    src: &[u8],
    config: C,
) -> Result<D, error::DecodeError> {
    let (t, consumed) = bincode::decode_from_slice(src, config)?;

    if consumed != src.len() {
        return Err(error::DecodeError::Other("leftover bytes"));
    }

    Ok(t)
}
