//! Decryption coordinator state: pending-request contexts and the content
//! hash binding a request to the aggregate it was issued for.
//!
//! A context is created when a decryption request is issued and is never
//! deleted; its `processed` flag flips false → true exactly once, when the
//! matching oracle callback passes every gate.

use soroban_sdk::{contracttype, symbol_short, xdr::ToXdr, Bytes, BytesN, Env, Symbol};

use crate::batch::AggregatedResults;

const DEC_CTX: Symbol = symbol_short!("DEC_CTX");

/// Callback payload width: three little-endian `u64` statistics.
pub const PAYLOAD_LEN: u32 = 24;

/// Outstanding (or consumed) decryption request.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionContext {
    pub batch_id: u64,
    pub state_hash: BytesN<32>,
    pub processed: bool,
}

pub fn store_context(env: &Env, request_id: u64, ctx: &DecryptionContext) {
    env.storage().persistent().set(&(DEC_CTX, request_id), ctx);
}

pub fn load_context(env: &Env, request_id: u64) -> Option<DecryptionContext> {
    env.storage().persistent().get(&(DEC_CTX, request_id))
}

/// Content hash over the three aggregate ciphertext handles, bound to this
/// contract's own identity so the hash cannot be replayed across
/// deployments: `SHA-256(contract_address_xdr ‖ h_avg ‖ h_pol ‖ h_sat)`.
pub fn state_hash(env: &Env, results: &AggregatedResults) -> BytesN<32> {
    let mut data = env.current_contract_address().to_xdr(env);
    data.append(&Bytes::from_slice(
        env,
        &results.average_opinion.handle.to_le_bytes(),
    ));
    data.append(&Bytes::from_slice(
        env,
        &results.polarization.handle.to_le_bytes(),
    ));
    data.append(&Bytes::from_slice(
        env,
        &results.average_satisfaction.handle.to_le_bytes(),
    ));
    env.crypto().sha256(&data).into()
}

/// Reads the little-endian `u64` at `offset` in a length-checked payload.
pub fn decode_stat(payload: &Bytes, offset: u32) -> u64 {
    let mut buf = [0u8; 8];
    payload.slice(offset..offset + 8).copy_into_slice(&mut buf);
    u64::from_le_bytes(buf)
}
