//! Execution venue port trait.

use crate::domain::error::TrendError;
use crate::domain::reconcile::{Holding, OrderIntent};

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Accepted,
    Rejected(String),
}

/// A place orders can be sent to. Implementations hold their own state.
pub trait ExecutionVenue {
    fn portfolio_value(&self) -> Result<f64, TrendError>;

    fn get_holdings(&self) -> Result<Vec<Holding>, TrendError>;

    fn submit(&mut self, intent: &OrderIntent) -> Result<OrderOutcome, TrendError>;
}
