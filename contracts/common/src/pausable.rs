//! Global pause switch.
//!
//! The switch gates batch-submission and decryption-flow entry points while
//! leaving administrative operations reachable, so a paused contract can
//! always be unpaused.

use soroban_sdk::{symbol_short, Env, Symbol};

use crate::CommonError;

const PAUSED: Symbol = symbol_short!("PAUSED");

/// Sets the contract pause state.
///
/// Callers are responsible for enforcing admin authorization before invoking
/// this function — the module itself does **not** perform auth checks, keeping
/// it reusable across contracts with different admin models. Event emission is
/// likewise the caller's concern.
pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&PAUSED, &paused);
}

/// Returns `true` when the contract is paused.
pub fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&PAUSED).unwrap_or(false)
}

/// Guard — returns `CommonError::Paused` when the contract is paused.
///
/// Place this at the top of every state-mutating function that must honour
/// the pause. View-only functions and the administrative escape hatch
/// (role, pause, and cooldown management) should **not** call this.
pub fn require_not_paused(env: &Env) -> Result<(), CommonError> {
    if is_paused(env) {
        return Err(CommonError::Paused);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{contract, Env};

    #[contract]
    struct DummyContract;

    #[test]
    fn default_is_not_paused() {
        let env = Env::default();
        let contract_id = env.register(DummyContract, ());
        env.as_contract(&contract_id, || {
            assert!(!is_paused(&env));
            assert!(require_not_paused(&env).is_ok());
        });
    }

    #[test]
    fn pause_and_unpause() {
        let env = Env::default();
        let contract_id = env.register(DummyContract, ());
        env.as_contract(&contract_id, || {
            set_paused(&env, true);
            assert!(is_paused(&env));
            assert_eq!(require_not_paused(&env), Err(CommonError::Paused));

            set_paused(&env, false);
            assert!(!is_paused(&env));
            assert!(require_not_paused(&env).is_ok());
        });
    }
}
