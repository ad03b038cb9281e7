//! All-to-all collectives between localities.
//!
//! A round is identified by a rendezvous key plus a generation number. Each
//! locality contributes one value; once every participant has contributed,
//! all of them receive the full contribution list ordered by locality id.

use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::errors::DistributedSyncError;
use crate::value::Value;

struct Round {
    contributions: Vec<Option<Value>>,
    waiters: Vec<oneshot::Sender<Vec<Value>>>,
}

impl Round {
    fn new(participants: usize) -> Self {
        Round {
            contributions: vec![None; participants],
            waiters: Vec::with_capacity(participants),
        }
    }

    fn arrived(&self) -> usize {
        self.contributions.iter().filter(|c| c.is_some()).count()
    }
}

/// Rendezvous point shared by every locality of one cluster.
pub struct CollectiveHub {
    participants: usize,
    rounds: Mutex<FxHashMap<(String, u64), Round>>,
}

impl CollectiveHub {
    pub fn new(participants: usize) -> Self {
        CollectiveHub {
            participants,
            rounds: Mutex::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Number of rounds still waiting for contributions.
    pub fn pending_rounds(&self) -> usize {
        self.rounds.lock().len()
    }

    /// Contribute `value` for `locality` and wait for everyone else.
    pub async fn all_to_all(
        &self,
        key: &str,
        generation: u64,
        locality: u32,
        value: Value,
        timeout: Duration,
    ) -> Result<Vec<Value>, DistributedSyncError> {
        let receiver = self.contribute(key, generation, locality, value)?;
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(_)) => Err(DistributedSyncError::ParticipantLost {
                key: key.to_string(),
            }),
            Err(_) => {
                // Tear the round down so the other waiters fail fast instead
                // of waiting out their own timeouts.
                let arrived = self
                    .rounds
                    .lock()
                    .remove(&(key.to_string(), generation))
                    .map_or(0, |round| round.arrived());
                warn!(
                    key,
                    generation,
                    locality,
                    arrived,
                    expected = self.participants,
                    "collective timed out"
                );
                Err(DistributedSyncError::Timeout {
                    key: key.to_string(),
                    timeout,
                    arrived,
                    expected: self.participants,
                })
            }
        }
    }

    fn contribute(
        &self,
        key: &str,
        generation: u64,
        locality: u32,
        value: Value,
    ) -> Result<oneshot::Receiver<Vec<Value>>, DistributedSyncError> {
        let index = usize::try_from(locality)
            .ok()
            .filter(|&i| i < self.participants)
            .ok_or_else(|| DistributedSyncError::ContributionMismatch {
                key: key.to_string(),
                reason: format!(
                    "locality {locality} is outside a cluster of {}",
                    self.participants
                ),
            })?;

        let (sender, receiver) = oneshot::channel();
        let round_key = (key.to_string(), generation);
        let mut rounds = self.rounds.lock();
        let round = rounds
            .entry(round_key.clone())
            .or_insert_with(|| Round::new(self.participants));
        if round.contributions[index].is_some() {
            return Err(DistributedSyncError::ContributionMismatch {
                key: key.to_string(),
                reason: format!("locality {locality} contributed twice to generation {generation}"),
            });
        }
        round.contributions[index] = Some(value);
        round.waiters.push(sender);
        trace!(key, generation, locality, arrived = round.arrived(), "contribution");

        if round.arrived() == self.participants {
            if let Some(round) = rounds.remove(&round_key) {
                let values: Vec<Value> = round.contributions.into_iter().flatten().collect();
                for waiter in round.waiters {
                    // A waiter that already timed out has dropped its receiver.
                    let _ = waiter.send(values.clone());
                }
            }
        }
        Ok(receiver)
    }

    /// Fail every pending round with `ParticipantLost`.
    pub fn abort(&self) {
        let aborted = std::mem::take(&mut *self.rounds.lock());
        if !aborted.is_empty() {
            warn!(rounds = aborted.len(), "aborting pending collectives");
        }
    }
}

#[cfg(test)]
mod tests;
