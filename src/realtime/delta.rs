//! Sources of simulated stat deltas

use super::stats::StatsDelta;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Produces one delta per poller tick
pub trait DeltaSource: Send {
    fn next_delta(&mut self) -> StatsDelta;
}

impl<D: DeltaSource + ?Sized> DeltaSource for Box<D> {
    fn next_delta(&mut self) -> StatsDelta {
        (**self).next_delta()
    }
}

/// Uniform random deltas: total and pending in [-1, 1], providers in [0, 1]
#[derive(Debug, Clone)]
pub struct RandomDeltas {
    rng: StdRng,
}

impl RandomDeltas {
    /// Seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDeltas {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaSource for RandomDeltas {
    fn next_delta(&mut self) -> StatsDelta {
        StatsDelta {
            total_requests: self.rng.gen_range(-1..=1),
            pending_requests: self.rng.gen_range(-1..=1),
            active_providers: self.rng.gen_range(0..=1),
        }
    }
}

/// Replays a fixed list, then yields zero deltas forever
#[derive(Debug, Clone, Default)]
pub struct ScriptedDeltas {
    queue: VecDeque<StatsDelta>,
}

impl ScriptedDeltas {
    pub fn new(deltas: impl IntoIterator<Item = StatsDelta>) -> Self {
        Self {
            queue: deltas.into_iter().collect(),
        }
    }

    /// Deltas not yet handed out
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DeltaSource for ScriptedDeltas {
    fn next_delta(&mut self) -> StatsDelta {
        self.queue.pop_front().unwrap_or(StatsDelta::ZERO)
    }
}
