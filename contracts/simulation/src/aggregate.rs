//! Homomorphic reduction of a batch's agent states into aggregate statistics.
//!
//! Every operand stays encrypted: the only cleartext entering the computation
//! is the entity count (the list length, known in the clear), and it is
//! trivially encrypted before use so all remaining arithmetic happens inside
//! the engine. No plaintext comparison, branch, or bounds check touches an
//! encrypted value anywhere in this module.

use soroban_sdk::Env;

use crate::batch::{self, AggregatedResults};
use crate::ContractError;

/// Computes a batch's aggregate statistics over its full agent list, in
/// insertion order. Called exactly once per batch, at close time.
///
/// * `average_opinion      = Σ opinion / count`
/// * `average_satisfaction = Σ satisfaction / count`
/// * `polarization         = Σ opinion² / count − average_opinion²`
///
/// Division is the engine's truncating integer division; no rounding
/// adjustment is applied. The polarization metric is the biased-variance
/// proxy `E[X²] − E[X]²`. The fold is sequential because each step feeds the
/// accumulator back in, but encrypted addition is associative and
/// commutative, so the result is independent of submission order.
///
/// Submissions write indices `0..count` contiguously and every stored
/// operand was activated at ingestion, so a missing agent or an engine
/// rejection means the stored batch state is inconsistent:
/// `InvalidBatchState`.
pub fn aggregate(env: &Env, batch_id: u64, count: u32) -> Result<AggregatedResults, ContractError> {
    if count == 0 {
        return Err(ContractError::InvalidBatchState);
    }

    let mut total_opinion = fhe::zero(env);
    let mut total_satisfaction = fhe::zero(env);
    let mut sum_sq_opinion = fhe::zero(env);

    for index in 0..count {
        let agent = batch::load_agent(env, batch_id, index)
            .ok_or(ContractError::InvalidBatchState)?;
        total_opinion = fhe::add(env, &total_opinion, &agent.opinion)?;
        total_satisfaction = fhe::add(env, &total_satisfaction, &agent.satisfaction)?;
        let opinion_sq = fhe::mul(env, &agent.opinion, &agent.opinion)?;
        sum_sq_opinion = fhe::add(env, &sum_sq_opinion, &opinion_sq)?;
    }

    let count_ct = fhe::from_plaintext(env, u64::from(count));

    let average_opinion = fhe::div(env, &total_opinion, &count_ct)?;
    let average_satisfaction = fhe::div(env, &total_satisfaction, &count_ct)?;

    let mean_sq = fhe::div(env, &sum_sq_opinion, &count_ct)?;
    let avg_sq = fhe::mul(env, &average_opinion, &average_opinion)?;
    let polarization = fhe::sub(env, &mean_sq, &avg_sq)?;

    Ok(AggregatedResults {
        average_opinion,
        polarization,
        average_satisfaction,
    })
}
