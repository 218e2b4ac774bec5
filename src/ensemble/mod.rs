//! Ensemble regressors
//!
//! Provides:
//! - Fixed-weight linear combinations ([`WeightedEnsemble`])
//! - Voting (mean, median, trimmed mean)
//! - Stacking on out-of-fold predictions
//!
//! Every ensemble owns its components outright.

mod stacking;
mod voting;
mod weighted;

pub use stacking::{StackingConfig, StackingRegressor};
pub use voting::{AggregationMethod, VotingRegressor};
pub use weighted::{WeightedComponent, WeightedEnsemble};
