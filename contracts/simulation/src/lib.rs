#![no_std]

//! # CipherSim — privacy-preserving agent simulation
//!
//! Batched aggregation over agent states that stay encrypted throughout
//! computation:
//!
//! - **Batch lifecycle**: open (owner) → provider submissions → close (owner),
//!   with exactly one current batch and monotonically increasing ids
//! - **Homomorphic aggregation** at close time: average opinion, a
//!   variance-proxy polarization metric, average satisfaction — computed
//!   entirely over encrypted operands
//! - **Decryption oracle handshake**: a one-time asynchronous
//!   request/callback with replay protection, state-hash consistency
//!   verification, and proof verification before results are published
//! - **Access control**: single transferable owner, provider registry,
//!   global pause with an administrative escape hatch
//! - **Rate limiting**: per-sender cooldown, independent ledgers for
//!   submissions and decryption requests

pub mod aggregate;
pub mod batch;
pub mod decryption;
pub mod events;


use soroban_sdk::{
    contract, contractimpl, symbol_short, Address, Bytes, BytesN, Env, Symbol, Vec,
};

use common::{pausable, rate_limit, Action};
use fhe::oracle;

use batch::{AgentState, AggregatedResults, SimulationParameters};
use decryption::{DecryptionContext, PAYLOAD_LEN};

// ── Storage key constants ─────────────────────────────────────────────────────

const OWNER: Symbol = symbol_short!("OWNER");
const ORACLE: Symbol = symbol_short!("ORACLE");
const COOLDOWN: Symbol = symbol_short!("COOLDOWN");
const PROVIDER: Symbol = symbol_short!("PROVIDER");

// ── Error codes ───────────────────────────────────────────────────────────────

/// Contract-specific errors; codes start at 100 per the `common` convention.
#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 100,
    NotInitialized = 101,
    NotOwner = 102,
    NotProvider = 103,
    Paused = 104,
    CooldownActive = 105,
    InvalidBatchState = 106,
    InvalidParameter = 107,
    ReplayAttempt = 108,
    StateMismatch = 109,
    ProofVerificationFailed = 110,
    UnknownRequest = 111,
}

/// Engine rejections outside input ingestion can only come from stored batch
/// state that lost an operand; ingestion maps its own failures to
/// `InvalidParameter` explicitly in [`SimulationContract::ingest`].
impl From<fhe::FheError> for ContractError {
    fn from(_: fhe::FheError) -> Self {
        ContractError::InvalidBatchState
    }
}

// ── Contract ──────────────────────────────────────────────────────────────────

#[contract]
pub struct SimulationContract;

#[contractimpl]
impl SimulationContract {
    // ── Initialisation ────────────────────────────────────────────────────────

    /// Bootstrap the contract.
    ///
    /// * `owner`         — holds all owner-gated capability (batch lifecycle,
    ///                     role and pause administration, decryption requests).
    /// * `oracle`        — the only identity allowed to invoke the decryption
    ///                     callback.
    /// * `cooldown_secs` — shared cooldown for rate-limited actions; must be
    ///                     non-zero.
    pub fn initialize(
        env: Env,
        owner: Address,
        oracle: Address,
        cooldown_secs: u64,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&OWNER) {
            return Err(ContractError::AlreadyInitialized);
        }
        if cooldown_secs == 0 {
            return Err(ContractError::InvalidParameter);
        }
        env.storage().instance().set(&OWNER, &owner);
        env.storage().instance().set(&ORACLE, &oracle);
        env.storage().instance().set(&COOLDOWN, &cooldown_secs);
        Ok(())
    }

    // ── Access control ────────────────────────────────────────────────────────

    /// Atomically replace the owner. The previous owner immediately loses all
    /// owner-gated capability.
    pub fn transfer_ownership(
        env: Env,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        env.storage().instance().set(&OWNER, &new_owner);
        events::publish_ownership_transferred(&env, &caller, &new_owner);
        Ok(())
    }

    /// Grant the provider role. Idempotent: granting an existing provider is
    /// a no-op and emits nothing.
    pub fn add_provider(env: Env, caller: Address, provider: Address) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        let key = (PROVIDER, provider.clone());
        if env.storage().persistent().get(&key).unwrap_or(false) {
            return Ok(());
        }
        env.storage().persistent().set(&key, &true);
        events::publish_provider_added(&env, &provider);
        Ok(())
    }

    /// Revoke the provider role. Idempotent like [`add_provider`].
    pub fn remove_provider(
        env: Env,
        caller: Address,
        provider: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        let key = (PROVIDER, provider.clone());
        if !env.storage().persistent().get(&key).unwrap_or(false) {
            return Ok(());
        }
        env.storage().persistent().remove(&key);
        events::publish_provider_removed(&env, &provider);
        Ok(())
    }

    /// Toggle the global pause switch. Deliberately *not* pause-gated itself,
    /// so the owner can always unpause.
    pub fn set_paused(env: Env, caller: Address, paused: bool) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        pausable::set_paused(&env, paused);
        events::publish_pause_toggled(&env, paused);
        Ok(())
    }

    /// Update the shared cooldown. Only future comparisons are affected;
    /// recorded last-action timestamps are untouched.
    pub fn set_cooldown(env: Env, caller: Address, cooldown_secs: u64) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        if cooldown_secs == 0 {
            return Err(ContractError::InvalidParameter);
        }
        env.storage().instance().set(&COOLDOWN, &cooldown_secs);
        events::publish_cooldown_changed(&env, cooldown_secs);
        Ok(())
    }

    // ── Batch lifecycle ───────────────────────────────────────────────────────

    /// Open a new batch with the supplied encrypted parameters and make it
    /// current.
    ///
    /// Every parameter must be a fresh input handle: a handle that already
    /// names an active ciphertext is rejected with `InvalidParameter`
    /// (reuse/aliasing defence), as is one the engine cannot ingest.
    pub fn open_batch(
        env: Env,
        caller: Address,
        params: SimulationParameters,
    ) -> Result<u64, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        Self::require_not_paused(&env)?;

        for ct in [
            &params.interaction_strength,
            &params.conformity_factor,
            &params.innovation_factor,
            &params.resource_level,
        ] {
            if fhe::is_initialized(&env, ct) {
                return Err(ContractError::InvalidParameter);
            }
        }

        let ingested = SimulationParameters {
            interaction_strength: Self::ingest(&env, &params.interaction_strength)?,
            conformity_factor: Self::ingest(&env, &params.conformity_factor)?,
            innovation_factor: Self::ingest(&env, &params.innovation_factor)?,
            resource_level: Self::ingest(&env, &params.resource_level)?,
        };

        let batch_id = batch::advance_current_id(&env);
        batch::store_parameters(&env, batch_id, &ingested);

        events::publish_batch_opened(&env, batch_id);
        Ok(batch_id)
    }

    /// Submit an encrypted agent state into the current batch; returns the
    /// assigned insertion index.
    pub fn submit_agent_state(
        env: Env,
        caller: Address,
        state: AgentState,
    ) -> Result<u32, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_provider(&env, &caller)?;
        Self::require_not_paused(&env)?;
        Self::check_cooldown(&env, &caller, Action::Submission)?;

        let batch_id = batch::current_id(&env);
        if batch::load_parameters(&env, batch_id).is_none() || batch::is_closed(&env, batch_id) {
            return Err(ContractError::InvalidBatchState);
        }

        let ingested = AgentState {
            opinion: Self::ingest(&env, &state.opinion)?,
            influence: Self::ingest(&env, &state.influence)?,
            satisfaction: Self::ingest(&env, &state.satisfaction)?,
        };

        let index = batch::append_agent(&env, batch_id, &ingested);
        events::publish_agent_state_submitted(&env, batch_id, index, &caller);
        Ok(index)
    }

    /// Close the current batch: run the aggregator once over the full agent
    /// list and store the encrypted results. Returns the final agent count.
    ///
    /// Closing an empty batch is disallowed — aggregation divides by the
    /// count.
    pub fn close_batch(env: Env, caller: Address) -> Result<u32, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        Self::require_not_paused(&env)?;

        let batch_id = batch::current_id(&env);
        if batch::load_parameters(&env, batch_id).is_none() || batch::is_closed(&env, batch_id) {
            return Err(ContractError::InvalidBatchState);
        }

        let count = batch::agent_count(&env, batch_id);
        if count == 0 {
            return Err(ContractError::InvalidBatchState);
        }

        let results = aggregate::aggregate(&env, batch_id, count)?;
        batch::store_results(&env, batch_id, &results);

        events::publish_batch_closed(&env, batch_id, count);
        Ok(count)
    }

    // ── Decryption coordinator ────────────────────────────────────────────────

    /// Request a one-time decryption of a closed batch's aggregate. Returns
    /// the oracle-assigned request id.
    ///
    /// Fire-and-forget: the call records a [`DecryptionContext`] binding the
    /// request to a content hash of the aggregate handles and returns; the
    /// oracle answers through [`Self::on_decrypted`] in a later invocation.
    /// There is no cancellation — an unanswered request leaves its context
    /// unprocessed forever.
    pub fn request_decryption(
        env: Env,
        caller: Address,
        batch_id: u64,
    ) -> Result<u64, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        Self::require_not_paused(&env)?;
        Self::check_cooldown(&env, &caller, Action::DecryptionRequest)?;

        if batch_id == 0 || batch_id > batch::current_id(&env) {
            return Err(ContractError::InvalidBatchState);
        }
        let results = match batch::load_results(&env, batch_id) {
            Some(r) => r,
            None => return Err(ContractError::InvalidBatchState),
        };

        let state_hash = decryption::state_hash(&env, &results);

        let handles = Vec::from_array(
            &env,
            [
                results.average_opinion.handle,
                results.polarization.handle,
                results.average_satisfaction.handle,
            ],
        );
        let request_id = oracle::request_decryption(&env, handles);

        decryption::store_context(
            &env,
            request_id,
            &DecryptionContext {
                batch_id,
                state_hash,
                processed: false,
            },
        );

        events::publish_decryption_requested(&env, request_id, batch_id);
        Ok(request_id)
    }

    /// Oracle callback delivering the cleartext statistics for an outstanding
    /// request. Only the configured oracle identity may invoke it.
    ///
    /// Gates, in order, each terminal: unknown id → replay → payload width →
    /// state-hash consistency → proof verification. A failed gate leaves the
    /// context unprocessed, so the oracle may resubmit a corrected callback
    /// for the same request id.
    pub fn on_decrypted(
        env: Env,
        request_id: u64,
        payload: Bytes,
        proof: BytesN<32>,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        let oracle_addr: Address = env
            .storage()
            .instance()
            .get(&ORACLE)
            .ok_or(ContractError::NotInitialized)?;
        oracle_addr.require_auth();

        let mut ctx =
            decryption::load_context(&env, request_id).ok_or(ContractError::UnknownRequest)?;
        if ctx.processed {
            return Err(ContractError::ReplayAttempt);
        }

        if payload.len() != PAYLOAD_LEN {
            return Err(ContractError::InvalidParameter);
        }

        // The aggregate must be byte-for-byte the one the request was issued
        // for; any recomputation or handle substitution in between diverges
        // the hash.
        let results = batch::load_results(&env, ctx.batch_id)
            .ok_or(ContractError::StateMismatch)?;
        if decryption::state_hash(&env, &results) != ctx.state_hash {
            return Err(ContractError::StateMismatch);
        }

        if !oracle::verify_proof(&env, request_id, &payload, &proof) {
            return Err(ContractError::ProofVerificationFailed);
        }

        let average_opinion = decryption::decode_stat(&payload, 0);
        let polarization = decryption::decode_stat(&payload, 8);
        let average_satisfaction = decryption::decode_stat(&payload, 16);

        ctx.processed = true;
        decryption::store_context(&env, request_id, &ctx);

        events::publish_decryption_completed(
            &env,
            ctx.batch_id,
            average_opinion,
            polarization,
            average_satisfaction,
        );
        Ok(())
    }

    // ── View functions ────────────────────────────────────────────────────────

    pub fn owner(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&OWNER)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn is_provider(env: Env, who: Address) -> bool {
        env.storage()
            .persistent()
            .get(&(PROVIDER, who))
            .unwrap_or(false)
    }

    pub fn paused(env: Env) -> bool {
        pausable::is_paused(&env)
    }

    pub fn cooldown(env: Env) -> Result<u64, ContractError> {
        env.storage()
            .instance()
            .get(&COOLDOWN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn current_batch_id(env: Env) -> u64 {
        batch::current_id(&env)
    }

    pub fn agent_count(env: Env, batch_id: u64) -> u32 {
        batch::agent_count(&env, batch_id)
    }

    pub fn get_parameters(env: Env, batch_id: u64) -> Option<SimulationParameters> {
        batch::load_parameters(&env, batch_id)
    }

    pub fn get_agent(env: Env, batch_id: u64, index: u32) -> Option<AgentState> {
        batch::load_agent(&env, batch_id, index)
    }

    pub fn get_results(env: Env, batch_id: u64) -> Option<AggregatedResults> {
        batch::load_results(&env, batch_id)
    }

    pub fn is_batch_closed(env: Env, batch_id: u64) -> bool {
        batch::is_closed(&env, batch_id)
    }

    pub fn get_decryption_context(env: Env, request_id: u64) -> Option<DecryptionContext> {
        decryption::load_context(&env, request_id)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !env.storage().instance().has(&OWNER) {
            return Err(ContractError::NotInitialized);
        }
        Ok(())
    }

    fn require_owner(env: &Env, caller: &Address) -> Result<(), ContractError> {
        let owner: Address = env
            .storage()
            .instance()
            .get(&OWNER)
            .ok_or(ContractError::NotInitialized)?;
        if *caller != owner {
            return Err(ContractError::NotOwner);
        }
        Ok(())
    }

    fn require_provider(env: &Env, caller: &Address) -> Result<(), ContractError> {
        if !Self::is_provider(env.clone(), caller.clone()) {
            return Err(ContractError::NotProvider);
        }
        Ok(())
    }

    fn require_not_paused(env: &Env) -> Result<(), ContractError> {
        pausable::require_not_paused(env).map_err(|_| ContractError::Paused)
    }

    /// Cooldown check for the rate-limited entry points. Records the new
    /// timestamp before the guarded body runs; the host reverts it with the
    /// rest of the call on failure.
    fn check_cooldown(env: &Env, sender: &Address, action: Action) -> Result<(), ContractError> {
        let cooldown_secs: u64 = env
            .storage()
            .instance()
            .get(&COOLDOWN)
            .ok_or(ContractError::NotInitialized)?;
        rate_limit::check_and_record(env, sender, action, cooldown_secs)
            .map_err(|_| ContractError::CooldownActive)
    }

    /// Activates a fresh input handle; any engine rejection (sentinel,
    /// unknown, or already-active handle) surfaces as `InvalidParameter`.
    fn ingest(env: &Env, ct: &fhe::Ciphertext) -> Result<fhe::Ciphertext, ContractError> {
        fhe::ingest_input(env, ct).map_err(|_| ContractError::InvalidParameter)
    }
}
