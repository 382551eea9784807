//! Order submission.
//!
//! Intents go to the venue one at a time, in the order the reconciler emitted
//! them. The first rejection stops the run so that an opening order is never
//! sent after a failed close. Nothing is retried.

use crate::domain::error::TrendError;
use crate::domain::reconcile::OrderIntent;
use crate::ports::venue_port::{ExecutionVenue, OrderOutcome};

/// Submit `intents` in order and return the ones the venue accepted.
pub fn submit_intents(
    venue: &mut dyn ExecutionVenue,
    intents: &[OrderIntent],
) -> Result<Vec<OrderIntent>, TrendError> {
    let mut accepted = Vec::with_capacity(intents.len());

    for intent in intents {
        match venue.submit(intent)? {
            OrderOutcome::Accepted => {
                tracing::info!(
                    symbol = intent.symbol.as_str(),
                    side = %intent.side,
                    quantity = intent.quantity,
                    "order accepted"
                );
                accepted.push(intent.clone());
            }
            OrderOutcome::Rejected(reason) => {
                tracing::warn!(
                    symbol = intent.symbol.as_str(),
                    side = %intent.side,
                    quantity = intent.quantity,
                    reason = reason.as_str(),
                    skipped = intents.len() - accepted.len() - 1,
                    "order rejected, stopping"
                );
                return Err(TrendError::OrderRejected {
                    symbol: intent.symbol.clone(),
                    reason,
                });
            }
        }
    }

    Ok(accepted)
}
