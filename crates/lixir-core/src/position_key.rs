//! # Position Keys
//!
//! The pool records liquidity under `keccak256(owner ++ tickLower ++ tickUpper)`
//! with the owner as 20 bytes and each tick as a 3-byte big-endian two's
//! complement integer. Vaults derive the same key to read their own positions, so
//! the layout here must match the pool byte for byte.

use alloy_primitives::{keccak256, Address, B256};

use crate::constants::TICK_BYTES;

const ADDRESS_BYTES: usize = 20;
const PACKED_LEN: usize = ADDRESS_BYTES + 2 * TICK_BYTES;

/// Pool key of the position owned by `owner` over `[tick_lower, tick_upper]`
pub fn position_key(owner: Address, tick_lower: i32, tick_upper: i32) -> B256 {
    let mut packed = [0u8; PACKED_LEN];
    packed[..ADDRESS_BYTES].copy_from_slice(owner.as_slice());
    packed[ADDRESS_BYTES..ADDRESS_BYTES + TICK_BYTES].copy_from_slice(&int24_be_bytes(tick_lower));
    packed[ADDRESS_BYTES + TICK_BYTES..].copy_from_slice(&int24_be_bytes(tick_upper));
    keccak256(packed)
}

/// Low three bytes of the big-endian two's complement encoding
fn int24_be_bytes(tick: i32) -> [u8; TICK_BYTES] {
    let bytes = tick.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}
