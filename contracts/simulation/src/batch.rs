//! Batch store: versioned collection of batches holding encrypted parameters
//! and per-agent encrypted states.
//!
//! Batch ids are monotonically increasing, starting at 1; id 0 means "no
//! batch ever opened". Exactly one batch is current at a time. Agent states
//! are append-only and addressed by insertion index; nothing is ever deleted,
//! so a closed batch's parameters, states, count, and results stay readable.

use soroban_sdk::{contracttype, symbol_short, Env, Symbol};

use fhe::Ciphertext;

const CUR_ID: Symbol = symbol_short!("CUR_ID");
const PARAMS: Symbol = symbol_short!("PARAMS");
const AGENT: Symbol = symbol_short!("AGENT");
const AGT_CNT: Symbol = symbol_short!("AGT_CNT");
const RESULTS: Symbol = symbol_short!("RESULTS");

/// Encrypted simulation parameters, immutable once set at batch-open time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulationParameters {
    pub interaction_strength: Ciphertext,
    pub conformity_factor: Ciphertext,
    pub innovation_factor: Ciphertext,
    pub resource_level: Ciphertext,
}

/// One provider's encrypted agent state, append-only once submitted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgentState {
    pub opinion: Ciphertext,
    pub influence: Ciphertext,
    pub satisfaction: Ciphertext,
}

/// Encrypted summary statistics, computed once per batch at close time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregatedResults {
    pub average_opinion: Ciphertext,
    pub polarization: Ciphertext,
    pub average_satisfaction: Ciphertext,
}

// ── Current-batch pointer ─────────────────────────────────────────────────────

pub fn current_id(env: &Env) -> u64 {
    env.storage().instance().get(&CUR_ID).unwrap_or(0u64)
}

/// Advances the current-batch pointer and returns the fresh id.
pub fn advance_current_id(env: &Env) -> u64 {
    let id = current_id(env).saturating_add(1);
    env.storage().instance().set(&CUR_ID, &id);
    id
}

// ── Parameters ────────────────────────────────────────────────────────────────

pub fn store_parameters(env: &Env, batch_id: u64, params: &SimulationParameters) {
    env.storage().persistent().set(&(PARAMS, batch_id), params);
}

pub fn load_parameters(env: &Env, batch_id: u64) -> Option<SimulationParameters> {
    env.storage().persistent().get(&(PARAMS, batch_id))
}

// ── Agent states ──────────────────────────────────────────────────────────────

/// Appends `state` at the next free index and returns that index.
pub fn append_agent(env: &Env, batch_id: u64, state: &AgentState) -> u32 {
    let index = agent_count(env, batch_id);
    env.storage().persistent().set(&(AGENT, batch_id, index), state);
    env.storage()
        .persistent()
        .set(&(AGT_CNT, batch_id), &index.saturating_add(1));
    index
}

pub fn load_agent(env: &Env, batch_id: u64, index: u32) -> Option<AgentState> {
    env.storage().persistent().get(&(AGENT, batch_id, index))
}

pub fn agent_count(env: &Env, batch_id: u64) -> u32 {
    env.storage()
        .persistent()
        .get(&(AGT_CNT, batch_id))
        .unwrap_or(0u32)
}

// ── Results ───────────────────────────────────────────────────────────────────

pub fn store_results(env: &Env, batch_id: u64, results: &AggregatedResults) {
    env.storage().persistent().set(&(RESULTS, batch_id), results);
}

pub fn load_results(env: &Env, batch_id: u64) -> Option<AggregatedResults> {
    env.storage().persistent().get(&(RESULTS, batch_id))
}

/// A batch is closed once its aggregate has been computed and stored.
pub fn is_closed(env: &Env, batch_id: u64) -> bool {
    env.storage().persistent().has(&(RESULTS, batch_id))
}
