//! Execution reconciler: turns a signal into orders against current holdings.
//!
//! Orders are emitted in submission order. Anything that closes the opposing
//! instrument comes before the first order on the target instrument.

use std::fmt;

use crate::domain::error::TrendError;
use crate::domain::signal::{Position, Signal};

/// A broker-side position in one instrument. Negative quantity is a short.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
    pub market_value: f64,
    pub avg_entry_price: f64,
    pub unrealized_pnl: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: i64, avg_entry_price: f64) -> Self {
        let market_value = quantity as f64 * avg_entry_price;
        Holding {
            symbol: symbol.into(),
            quantity,
            market_value,
            avg_entry_price,
            unrealized_pnl: 0.0,
        }
    }

    /// Holding revalued at `price`.
    pub fn marked(&self, price: f64) -> Self {
        Holding {
            market_value: self.quantity as f64 * price,
            unrealized_pnl: self.quantity as f64 * (price - self.avg_entry_price),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub symbol: String,
    /// Always > 0.
    pub quantity: u64,
    pub side: Side,
}

impl OrderIntent {
    pub fn buy(symbol: impl Into<String>, quantity: u64) -> Self {
        OrderIntent {
            symbol: symbol.into(),
            quantity,
            side: Side::Buy,
        }
    }

    pub fn sell(symbol: impl Into<String>, quantity: u64) -> Self {
        OrderIntent {
            symbol: symbol.into(),
            quantity,
            side: Side::Sell,
        }
    }

    /// Signed change in holdings this order causes.
    pub fn signed_quantity(&self) -> i64 {
        let qty = self.quantity as i64;
        match self.side {
            Side::Buy => qty,
            Side::Sell => -qty,
        }
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.side, self.quantity, self.symbol)
    }
}

/// Symbols the strategy reads and trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruments {
    /// Signal source (e.g. an index).
    pub index: String,
    /// Held while LONG.
    pub long: String,
    /// Held while SHORT; an inverse instrument.
    pub short: Option<String>,
}

impl Instruments {
    /// Instrument traded for `position`, if one is configured.
    pub fn target_for(&self, position: Position) -> Option<&str> {
        match position {
            Position::Long => Some(&self.long),
            Position::Short => self.short.as_deref(),
            Position::Cash => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcileConfig {
    /// Resizes smaller than this fraction of portfolio value are skipped.
    pub min_rebalance_fraction: f64,
}

/// Target notional and share count for a signal.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSize {
    pub instrument: Option<String>,
    pub position_value: f64,
    pub shares: u64,
}

fn check_allocation(allocation: f64) -> Result<(), TrendError> {
    if !allocation.is_finite() || !(0.0..=1.0).contains(&allocation) {
        return Err(TrendError::InvalidAllocation {
            reason: format!("allocation {} outside [0, 1]", allocation),
        });
    }
    Ok(())
}

fn usable_price(symbol: &str, price: Option<f64>) -> Result<f64, TrendError> {
    price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| TrendError::PriceUnavailable {
            symbol: symbol.to_string(),
        })
}

fn target_quantity(
    symbol: &str,
    portfolio_value: f64,
    allocation: f64,
    price: f64,
) -> Result<i64, TrendError> {
    let qty = (portfolio_value * allocation / price).floor();
    if !qty.is_finite() || qty < 0.0 {
        return Err(TrendError::InvalidAllocation {
            reason: format!(
                "target quantity {} for {} (portfolio value {})",
                qty, symbol, portfolio_value
            ),
        });
    }
    Ok(qty as i64)
}

fn target_instrument<'a>(
    signal: &Signal,
    instruments: &'a Instruments,
) -> Result<Option<&'a str>, TrendError> {
    match signal.position {
        Position::Cash => Ok(None),
        position => instruments
            .target_for(position)
            .map(Some)
            .ok_or_else(|| TrendError::InstrumentUnavailable {
                position: position.to_string(),
            }),
    }
}

fn held_quantity(holdings: &[Holding], symbol: &str) -> i64 {
    holdings
        .iter()
        .filter(|h| h.symbol == symbol)
        .map(|h| h.quantity)
        .sum()
}

/// Order that brings `symbol` from `current` to `target` shares.
fn order_to(symbol: &str, current: i64, target: i64) -> Option<OrderIntent> {
    let delta = target - current;
    if delta > 0 {
        Some(OrderIntent::buy(symbol, delta.unsigned_abs()))
    } else if delta < 0 {
        Some(OrderIntent::sell(symbol, delta.unsigned_abs()))
    } else {
        None
    }
}

/// Notional and whole shares the signal asks for.
pub fn position_size(
    signal: &Signal,
    instruments: &Instruments,
    portfolio_value: f64,
    price: Option<f64>,
) -> Result<PositionSize, TrendError> {
    check_allocation(signal.allocation)?;

    let Some(symbol) = target_instrument(signal, instruments)? else {
        return Ok(PositionSize {
            instrument: None,
            position_value: 0.0,
            shares: 0,
        });
    };

    let position_value = portfolio_value * signal.allocation;
    let shares = if signal.allocation > 0.0 {
        let price = usable_price(symbol, price)?;
        target_quantity(symbol, portfolio_value, signal.allocation, price)?.unsigned_abs()
    } else {
        0
    };

    Ok(PositionSize {
        instrument: Some(symbol.to_string()),
        position_value,
        shares,
    })
}

/// Orders that move `holdings` to the exposure `signal` asks for.
///
/// `current_price` is the price of the target instrument. Running this again
/// with the holdings that result from executing its output yields no orders.
pub fn reconcile(
    signal: &Signal,
    instruments: &Instruments,
    portfolio_value: f64,
    current_price: Option<f64>,
    holdings: &[Holding],
    config: &ReconcileConfig,
) -> Result<Vec<OrderIntent>, TrendError> {
    check_allocation(signal.allocation)?;

    let mut intents = Vec::new();

    let Some(target) = target_instrument(signal, instruments)? else {
        let mut managed = vec![instruments.long.as_str()];
        managed.extend(instruments.short.as_deref());
        for symbol in managed {
            intents.extend(order_to(symbol, held_quantity(holdings, symbol), 0));
        }
        return Ok(intents);
    };

    let price = if signal.allocation > 0.0 {
        Some(usable_price(target, current_price)?)
    } else {
        None
    };
    let target_qty = match price {
        Some(price) => target_quantity(target, portfolio_value, signal.allocation, price)?,
        None => 0,
    };

    let opposing = match signal.position {
        Position::Short => Some(instruments.long.as_str()),
        _ => instruments.short.as_deref(),
    };
    if let Some(opposing) = opposing.filter(|s| *s != target) {
        intents.extend(order_to(opposing, held_quantity(holdings, opposing), 0));
    }

    let current = held_quantity(holdings, target);
    if let Some(intent) = order_to(target, current, target_qty) {
        let resize = current != 0 && target_qty != 0;
        let notional = intent.quantity as f64 * price.unwrap_or(0.0);
        let threshold = config.min_rebalance_fraction * portfolio_value;

        if resize && config.min_rebalance_fraction > 0.0 && notional < threshold {
            tracing::debug!(
                symbol = target,
                quantity = intent.quantity,
                notional,
                threshold,
                "skipping small rebalance"
            );
        } else {
            intents.push(intent);
        }
    }

    Ok(intents)
}
