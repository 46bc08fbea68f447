//! Structured event publishing for the Simulation contract.
//!
//! The event stream is the only observation channel for state transitions;
//! every mutating operation publishes exactly one record here, after its
//! state writes succeed.

#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

pub fn publish_ownership_transferred(env: &Env, old_owner: &Address, new_owner: &Address) {
    env.events().publish(
        (symbol_short!("OWN_XFER"),),
        (old_owner.clone(), new_owner.clone()),
    );
}

pub fn publish_provider_added(env: &Env, provider: &Address) {
    env.events()
        .publish((symbol_short!("PROV_ADD"),), provider.clone());
}

pub fn publish_provider_removed(env: &Env, provider: &Address) {
    env.events()
        .publish((symbol_short!("PROV_REM"),), provider.clone());
}

pub fn publish_pause_toggled(env: &Env, paused: bool) {
    env.events().publish((symbol_short!("PAUSE"),), paused);
}

pub fn publish_cooldown_changed(env: &Env, cooldown_secs: u64) {
    env.events()
        .publish((symbol_short!("CD_SET"),), cooldown_secs);
}

pub fn publish_batch_opened(env: &Env, batch_id: u64) {
    env.events().publish((symbol_short!("BAT_OPEN"),), batch_id);
}

pub fn publish_agent_state_submitted(env: &Env, batch_id: u64, index: u32, provider: &Address) {
    env.events().publish(
        (symbol_short!("AGT_SUB"), batch_id),
        (index, provider.clone()),
    );
}

pub fn publish_batch_closed(env: &Env, batch_id: u64, agent_count: u32) {
    env.events()
        .publish((symbol_short!("BAT_CLOSE"), batch_id), agent_count);
}

pub fn publish_decryption_requested(env: &Env, request_id: u64, batch_id: u64) {
    env.events()
        .publish((symbol_short!("DEC_REQ"), batch_id), request_id);
}

pub fn publish_decryption_completed(
    env: &Env,
    batch_id: u64,
    average_opinion: u64,
    polarization: u64,
    average_satisfaction: u64,
) {
    env.events().publish(
        (symbol_short!("DEC_DONE"), batch_id),
        (average_opinion, polarization, average_satisfaction),
    );
}
