//! Homomorphic-engine interface model for the CipherSim contracts.
//!
//! The real engine is an external coprocessor: contracts hold opaque
//! ciphertext *handles* and ask the engine to combine them; plaintexts never
//! appear on-chain and nothing here offers a comparison or conditional over
//! encrypted content. This crate models exactly that interface. The mock
//! backing store keeps a `handle → plaintext` table in contract storage so
//! the arithmetic is executable in tests, the way a simplified Paillier
//! engine would be; production deployments swap the table for real
//! coprocessor calls without touching callers.
//!
//! Handles are allocated sequentially starting at 1; handle 0 is the unset
//! sentinel. An *input* handle (client-submitted ciphertext) is staged first
//! and only becomes an active ciphertext when a contract ingests it —
//! ingesting a handle that is already active is the aliasing case callers
//! defend against.

#![no_std]
#![allow(clippy::arithmetic_side_effects)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod oracle;

use soroban_sdk::{contracttype, symbol_short, Env, Symbol};

const SEQ: Symbol = symbol_short!("FHE_SEQ");
const ACTIVE: Symbol = symbol_short!("FHE_CT");
const STAGED: Symbol = symbol_short!("FHE_IN");

/// Errors surfaced at the engine boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FheError {
    /// The handle is the unset sentinel, names no staged input, or names no
    /// active ciphertext (when used as an operand).
    UnknownHandle,
    /// The handle already names an active ciphertext.
    HandleInUse,
    /// No pending decryption request with that id.
    UnknownRequest,
}

/// Opaque handle to an encrypted 64-bit scalar.
///
/// `handle == 0` is the unset sentinel used for "no ciphertext here yet"
/// storage slots.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ciphertext {
    pub handle: u64,
}

impl Ciphertext {
    /// The unset sentinel.
    pub fn unset() -> Self {
        Self { handle: 0 }
    }

    pub fn is_unset(&self) -> bool {
        self.handle == 0
    }
}

fn next_handle(env: &Env) -> u64 {
    let next: u64 = env.storage().instance().get(&SEQ).unwrap_or(0u64) + 1;
    env.storage().instance().set(&SEQ, &next);
    next
}

fn store_active(env: &Env, plaintext: u64) -> Ciphertext {
    let handle = next_handle(env);
    env.storage().persistent().set(&(ACTIVE, handle), &plaintext);
    Ciphertext { handle }
}

/// Plaintext behind an active ciphertext; an inactive operand is
/// `UnknownHandle`.
fn plaintext_of(env: &Env, ct: &Ciphertext) -> Result<u64, FheError> {
    env.storage()
        .persistent()
        .get(&(ACTIVE, ct.handle))
        .ok_or(FheError::UnknownHandle)
}

/// Returns `true` only for a non-sentinel handle naming an active ciphertext.
pub fn is_initialized(env: &Env, ct: &Ciphertext) -> bool {
    !ct.is_unset() && env.storage().persistent().has(&(ACTIVE, ct.handle))
}

/// A fresh encryption of zero (accumulator seed).
pub fn zero(env: &Env) -> Ciphertext {
    store_active(env, 0)
}

/// Trivial encryption of a cleartext the contract already knows (e.g. an
/// entity count), so subsequent arithmetic stays in the encrypted domain.
pub fn from_plaintext(env: &Env, value: u64) -> Ciphertext {
    store_active(env, value)
}

/// Homomorphic addition. Wraps on overflow, as FHE integer arithmetic does.
pub fn add(env: &Env, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, FheError> {
    let sum = plaintext_of(env, a)?.wrapping_add(plaintext_of(env, b)?);
    Ok(store_active(env, sum))
}

/// Homomorphic subtraction, wrapping.
pub fn sub(env: &Env, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, FheError> {
    let diff = plaintext_of(env, a)?.wrapping_sub(plaintext_of(env, b)?);
    Ok(store_active(env, diff))
}

/// Homomorphic multiplication, wrapping.
pub fn mul(env: &Env, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, FheError> {
    let product = plaintext_of(env, a)?.wrapping_mul(plaintext_of(env, b)?);
    Ok(store_active(env, product))
}

/// Homomorphic truncating integer division. Division by an encrypted zero
/// yields an encrypted zero — the operation is total over values, since
/// callers cannot inspect the divisor to guard it.
pub fn div(env: &Env, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, FheError> {
    let divisor = plaintext_of(env, b)?;
    let quotient = if divisor == 0 {
        0
    } else {
        plaintext_of(env, a)? / divisor
    };
    Ok(store_active(env, quotient))
}

/// Activates a staged input handle, consuming the staged entry.
///
/// Rejects the unset sentinel and unknown handles (`UnknownHandle`) and
/// handles that already name an active ciphertext (`HandleInUse`) — the
/// reuse/aliasing defence.
pub fn ingest_input(env: &Env, ct: &Ciphertext) -> Result<Ciphertext, FheError> {
    if ct.is_unset() {
        return Err(FheError::UnknownHandle);
    }
    if env.storage().persistent().has(&(ACTIVE, ct.handle)) {
        return Err(FheError::HandleInUse);
    }
    let staged_key = (STAGED, ct.handle);
    let plaintext: u64 = env
        .storage()
        .persistent()
        .get(&staged_key)
        .ok_or(FheError::UnknownHandle)?;
    env.storage().persistent().remove(&staged_key);
    env.storage().persistent().set(&(ACTIVE, ct.handle), &plaintext);
    Ok(Ciphertext { handle: ct.handle })
}

/// Registers a staged input ciphertext, standing in for the client-side
/// encrypt-and-relay flow. Test-only: real inputs arrive through the
/// coprocessor relayer.
#[cfg(any(test, feature = "testutils"))]
pub fn stage_input(env: &Env, plaintext: u64) -> Ciphertext {
    let handle = next_handle(env);
    env.storage().persistent().set(&(STAGED, handle), &plaintext);
    Ciphertext { handle }
}

/// Reads the plaintext behind an active ciphertext, standing in for
/// client-key decryption when tests assert on aggregate values.
#[cfg(any(test, feature = "testutils"))]
pub fn peek_plaintext(env: &Env, ct: &Ciphertext) -> Option<u64> {
    env.storage().persistent().get(&(ACTIVE, ct.handle))
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{contract, Env};

    #[contract]
    struct DummyContract;

    fn with_engine<T>(f: impl FnOnce(&Env) -> T) -> T {
        let env = Env::default();
        let contract_id = env.register(DummyContract, ());
        env.as_contract(&contract_id, || f(&env))
    }

    #[test]
    fn sentinel_is_not_initialized() {
        with_engine(|env| {
            assert!(!is_initialized(env, &Ciphertext::unset()));
        });
    }

    #[test]
    fn arithmetic_matches_plaintext_arithmetic() {
        with_engine(|env| {
            let a = from_plaintext(env, 20);
            let b = from_plaintext(env, 6);

            assert_eq!(peek_plaintext(env, &add(env, &a, &b).unwrap()), Some(26));
            assert_eq!(peek_plaintext(env, &sub(env, &a, &b).unwrap()), Some(14));
            assert_eq!(peek_plaintext(env, &mul(env, &a, &b).unwrap()), Some(120));
            assert_eq!(peek_plaintext(env, &div(env, &a, &b).unwrap()), Some(3));
        });
    }

    #[test]
    fn division_truncates_and_is_total() {
        with_engine(|env| {
            let a = from_plaintext(env, 7);
            let two = from_plaintext(env, 2);
            let z = zero(env);

            assert_eq!(peek_plaintext(env, &div(env, &a, &two).unwrap()), Some(3));
            assert_eq!(peek_plaintext(env, &div(env, &a, &z).unwrap()), Some(0));
        });
    }

    #[test]
    fn subtraction_wraps() {
        with_engine(|env| {
            let small = from_plaintext(env, 1);
            let big = from_plaintext(env, 2);
            let wrapped = sub(env, &small, &big).unwrap();
            assert_eq!(peek_plaintext(env, &wrapped), Some(u64::MAX));
        });
    }

    #[test]
    fn operations_reject_inactive_operands() {
        with_engine(|env| {
            let active = from_plaintext(env, 1);
            let staged = stage_input(env, 2);

            assert_eq!(add(env, &active, &staged), Err(FheError::UnknownHandle));
            assert_eq!(sub(env, &staged, &active), Err(FheError::UnknownHandle));
            assert_eq!(
                mul(env, &active, &Ciphertext::unset()),
                Err(FheError::UnknownHandle)
            );
            assert_eq!(div(env, &active, &staged), Err(FheError::UnknownHandle));
        });
    }

    #[test]
    fn ingest_activates_a_staged_input_once() {
        with_engine(|env| {
            let staged = stage_input(env, 42);
            assert!(!is_initialized(env, &staged));

            let active = ingest_input(env, &staged).unwrap();
            assert!(is_initialized(env, &active));
            assert_eq!(peek_plaintext(env, &active), Some(42));

            // The staged entry was consumed; the handle is now in use.
            assert_eq!(ingest_input(env, &staged), Err(FheError::HandleInUse));
        });
    }

    #[test]
    fn ingest_rejects_sentinel_and_unknown_handles() {
        with_engine(|env| {
            assert_eq!(
                ingest_input(env, &Ciphertext::unset()),
                Err(FheError::UnknownHandle)
            );
            assert_eq!(
                ingest_input(env, &Ciphertext { handle: 999 }),
                Err(FheError::UnknownHandle)
            );
        });
    }

    #[test]
    fn handles_are_distinct_per_operation() {
        with_engine(|env| {
            let a = from_plaintext(env, 1);
            let b = from_plaintext(env, 1);
            assert_ne!(a.handle, b.handle);

            let s1 = add(env, &a, &b).unwrap();
            let s2 = add(env, &a, &b).unwrap();
            assert_ne!(s1.handle, s2.handle);
            assert_eq!(peek_plaintext(env, &s1), peek_plaintext(env, &s2));
        });
    }
}
