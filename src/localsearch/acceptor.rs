//! Move acceptance.

use rand::Rng;

use super::config::AcceptorConfig;
use crate::score::BendableScore;

/// Runtime state of an [`AcceptorConfig`].
#[derive(Debug, Clone)]
pub(crate) enum Acceptor {
    HillClimbing,
    LateAcceptance {
        history: Vec<BendableScore>,
        size: usize,
        cursor: usize,
    },
    SimulatedAnnealing {
        initial_temperature: f64,
        cooling_rate: f64,
        temperature: f64,
    },
}

impl Acceptor {
    pub(crate) fn new(config: &AcceptorConfig) -> Self {
        match *config {
            AcceptorConfig::HillClimbing => Acceptor::HillClimbing,
            AcceptorConfig::LateAcceptance { size } => Acceptor::LateAcceptance {
                history: Vec::new(),
                size,
                cursor: 0,
            },
            AcceptorConfig::SimulatedAnnealing {
                initial_temperature,
                cooling_rate,
            } => Acceptor::SimulatedAnnealing {
                initial_temperature,
                cooling_rate,
                temperature: initial_temperature,
            },
        }
    }

    pub(crate) fn phase_started(&mut self, score: &BendableScore) {
        match self {
            Acceptor::HillClimbing => {}
            Acceptor::LateAcceptance {
                history,
                size,
                cursor,
            } => {
                *history = vec![score.clone(); *size];
                *cursor = 0;
            }
            Acceptor::SimulatedAnnealing {
                initial_temperature,
                temperature,
                ..
            } => *temperature = *initial_temperature,
        }
    }

    pub(crate) fn is_accepted<R: Rng>(
        &self,
        candidate: &BendableScore,
        last_step: &BendableScore,
        rng: &mut R,
    ) -> bool {
        if candidate >= last_step {
            return true;
        }
        match self {
            Acceptor::HillClimbing => false,
            Acceptor::LateAcceptance {
                history, cursor, ..
            } => history.get(*cursor).is_some_and(|late| candidate >= late),
            Acceptor::SimulatedAnnealing { temperature, .. } => {
                if candidate.init() != last_step.init() || !candidate.same_hard(last_step) {
                    return false;
                }
                if *temperature <= 0.0 {
                    return false;
                }
                let diff = candidate.first_soft_difference(last_step) as f64;
                let probability = (diff / *temperature).exp();
                rng.random_range(0.0..1.0) < probability
            }
        }
    }

    pub(crate) fn step_ended(&mut self, step_score: &BendableScore) {
        match self {
            Acceptor::HillClimbing => {}
            Acceptor::LateAcceptance {
                history,
                size,
                cursor,
            } => {
                if let Some(slot) = history.get_mut(*cursor) {
                    *slot = step_score.clone();
                }
                *cursor = (*cursor + 1) % *size;
            }
            Acceptor::SimulatedAnnealing {
                cooling_rate,
                temperature,
                ..
            } => *temperature *= *cooling_rate,
        }
    }
}
