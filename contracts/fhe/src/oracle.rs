//! Asynchronous decryption oracle, modelled at its interface.
//!
//! A contract submits ciphertext handles with [`request_decryption`] and
//! returns immediately; the oracle later invokes the contract's callback with
//! the cleartext payload and a proof. The mock oracle "signs" with a
//! domain-tagged SHA-256 over `(request_id, payload)`; [`verify_proof`]
//! recomputes that digest, standing in for the engine's real signature
//! verifier with identical accept/reject behaviour.

use soroban_sdk::{symbol_short, Bytes, BytesN, Env, Symbol, Vec};

#[cfg(any(test, feature = "testutils"))]
use crate::FheError;

const REQ_SEQ: Symbol = symbol_short!("ORC_SEQ");
const REQUEST: Symbol = symbol_short!("ORC_REQ");

/// Domain tag for the mock oracle signature.
const PROOF_DOMAIN: &[u8] = b"fhe-oracle-proof-v1:";

/// Submits `handles` for asynchronous decryption; returns the oracle-assigned
/// request id. Fire-and-forget: the cleartexts arrive through the requesting
/// contract's callback in a later invocation.
pub fn request_decryption(env: &Env, handles: Vec<u64>) -> u64 {
    let id: u64 = env.storage().instance().get(&REQ_SEQ).unwrap_or(0u64) + 1;
    env.storage().instance().set(&REQ_SEQ, &id);
    env.storage().persistent().set(&(REQUEST, id), &handles);
    id
}

/// Verifies the oracle's proof over `(request_id, payload)`.
pub fn verify_proof(env: &Env, request_id: u64, payload: &Bytes, proof: &BytesN<32>) -> bool {
    proof_digest(env, request_id, payload) == *proof
}

fn proof_digest(env: &Env, request_id: u64, payload: &Bytes) -> BytesN<32> {
    let mut data = Bytes::from_slice(env, PROOF_DOMAIN);
    data.append(&Bytes::from_slice(env, &request_id.to_le_bytes()));
    data.append(payload);
    env.crypto().sha256(&data).into()
}

/// Produces the callback arguments for a pending request: the cleartext
/// payload (one little-endian `u64` per requested handle, in request order)
/// and the oracle proof. Test-only: it plays the oracle's role so the
/// asynchronous handshake can be driven deterministically.
#[cfg(any(test, feature = "testutils"))]
pub fn fulfill(env: &Env, request_id: u64) -> Result<(Bytes, BytesN<32>), FheError> {
    let handles: Vec<u64> = env
        .storage()
        .persistent()
        .get(&(REQUEST, request_id))
        .ok_or(FheError::UnknownRequest)?;

    let mut payload = Bytes::new(env);
    for handle in handles.iter() {
        let plaintext: u64 = env
            .storage()
            .persistent()
            .get(&(super::ACTIVE, handle))
            .ok_or(FheError::UnknownHandle)?;
        payload.append(&Bytes::from_slice(env, &plaintext.to_le_bytes()));
    }

    let proof = proof_digest(env, request_id, &payload);
    Ok((payload, proof))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::from_plaintext;
    use soroban_sdk::{contract, Env};

    #[contract]
    struct DummyContract;

    fn with_engine<T>(f: impl FnOnce(&Env) -> T) -> T {
        let env = Env::default();
        let contract_id = env.register(DummyContract, ());
        env.as_contract(&contract_id, || f(&env))
    }

    #[test]
    fn request_ids_are_sequential() {
        with_engine(|env| {
            let handles = Vec::from_array(env, [1u64]);
            assert_eq!(request_decryption(env, handles.clone()), 1);
            assert_eq!(request_decryption(env, handles), 2);
        });
    }

    #[test]
    fn fulfill_encodes_plaintexts_in_request_order() {
        with_engine(|env| {
            let a = from_plaintext(env, 20);
            let b = from_plaintext(env, 66);
            let c = from_plaintext(env, 5);
            let id = request_decryption(env, Vec::from_array(env, [a.handle, b.handle, c.handle]));

            let (payload, proof) = fulfill(env, id).unwrap();
            assert_eq!(payload.len(), 24);

            let mut expected = Bytes::from_slice(env, &20u64.to_le_bytes());
            expected.append(&Bytes::from_slice(env, &66u64.to_le_bytes()));
            expected.append(&Bytes::from_slice(env, &5u64.to_le_bytes()));
            assert_eq!(payload, expected);

            assert!(verify_proof(env, id, &payload, &proof));
        });
    }

    #[test]
    fn fulfill_of_unknown_request_fails() {
        with_engine(|env| {
            assert_eq!(fulfill(env, 7), Err(FheError::UnknownRequest));
        });
    }

    #[test]
    fn proof_is_bound_to_request_and_payload() {
        with_engine(|env| {
            let a = from_plaintext(env, 1);
            let id = request_decryption(env, Vec::from_array(env, [a.handle]));
            let (payload, proof) = fulfill(env, id).unwrap();

            // Wrong request id.
            assert!(!verify_proof(env, id + 1, &payload, &proof));

            // Tampered payload.
            let mut tampered = Bytes::from_slice(env, &2u64.to_le_bytes());
            tampered.append(&Bytes::new(env));
            assert!(!verify_proof(env, id, &tampered, &proof));
        });
    }
}
