//! In-memory paper trading venue.
//!
//! Fills market orders in full at the last price set for the symbol. Cash and
//! holdings can be persisted to a small CSV so consecutive `trade` runs see
//! the previous run's fills.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::domain::error::TrendError;
use crate::domain::reconcile::{Holding, OrderIntent, Side};
use crate::ports::venue_port::{ExecutionVenue, OrderOutcome};

const CASH_ROW: &str = "CASH";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Lot {
    quantity: i64,
    avg_entry_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PaperVenue {
    cash: f64,
    lots: BTreeMap<String, Lot>,
    prices: HashMap<String, f64>,
}

impl PaperVenue {
    pub fn new(cash: f64) -> Self {
        PaperVenue {
            cash,
            ..PaperVenue::default()
        }
    }

    pub fn with_holding(mut self, symbol: &str, quantity: i64, avg_entry_price: f64) -> Self {
        if quantity != 0 {
            self.lots.insert(
                symbol.to_string(),
                Lot {
                    quantity,
                    avg_entry_price,
                },
            );
        }
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub fn set_price(&mut self, symbol: &str, price: f64) {
        self.prices.insert(symbol.to_string(), price);
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn quantity(&self, symbol: &str) -> i64 {
        self.lots.get(symbol).map(|l| l.quantity).unwrap_or(0)
    }

    /// Load state from `path`, or start with `initial_cash` if it does not exist.
    pub fn load(path: &Path, initial_cash: f64) -> Result<Self, TrendError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), initial_cash, "no holdings file, starting fresh");
            return Ok(PaperVenue::new(initial_cash));
        }

        let mut rdr = csv::Reader::from_path(path).map_err(|e| TrendError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut venue = PaperVenue::new(initial_cash);
        for result in rdr.records() {
            let record = result.map_err(|e| TrendError::Data {
                reason: format!("holdings parse error: {}", e),
            })?;
            let field = |i: usize| record.get(i).unwrap_or_default().trim();

            let symbol = field(0);
            let quantity: i64 = field(1).parse().map_err(|e| TrendError::Data {
                reason: format!("invalid quantity for {}: {}", symbol, e),
            })?;
            let price: f64 = field(2).parse().map_err(|e| TrendError::Data {
                reason: format!("invalid price for {}: {}", symbol, e),
            })?;

            if symbol == CASH_ROW {
                venue.cash = price;
            } else {
                venue = venue.with_holding(symbol, quantity, price);
            }
        }
        Ok(venue)
    }

    pub fn save(&self, path: &Path) -> Result<(), TrendError> {
        let data_err = |e: csv::Error| TrendError::Data {
            reason: format!("failed to write {}: {}", path.display(), e),
        };
        let mut wtr = csv::Writer::from_path(path).map_err(data_err)?;

        wtr.write_record(["symbol", "quantity", "avg_entry_price"])
            .map_err(data_err)?;
        wtr.write_record([CASH_ROW, "0", self.cash.to_string().as_str()])
            .map_err(data_err)?;
        for (symbol, lot) in &self.lots {
            wtr.write_record([
                symbol.as_str(),
                lot.quantity.to_string().as_str(),
                lot.avg_entry_price.to_string().as_str(),
            ])
            .map_err(data_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn apply_fill(&mut self, symbol: &str, signed_qty: i64, price: f64) {
        let lot = self.lots.entry(symbol.to_string()).or_insert(Lot {
            quantity: 0,
            avg_entry_price: price,
        });
        let new_qty = lot.quantity + signed_qty;

        if lot.quantity == 0 || lot.quantity.signum() != new_qty.signum() {
            lot.avg_entry_price = price;
        } else if new_qty.abs() > lot.quantity.abs() {
            let cost = lot.quantity as f64 * lot.avg_entry_price + signed_qty as f64 * price;
            lot.avg_entry_price = cost / new_qty as f64;
        }
        lot.quantity = new_qty;

        if new_qty == 0 {
            self.lots.remove(symbol);
        }
        self.cash -= signed_qty as f64 * price;
    }
}

impl ExecutionVenue for PaperVenue {
    fn portfolio_value(&self) -> Result<f64, TrendError> {
        let mut value = self.cash;
        for (symbol, lot) in &self.lots {
            let price = self
                .prices
                .get(symbol)
                .copied()
                .ok_or_else(|| TrendError::PriceUnavailable {
                    symbol: symbol.clone(),
                })?;
            value += lot.quantity as f64 * price;
        }
        Ok(value)
    }

    fn get_holdings(&self) -> Result<Vec<Holding>, TrendError> {
        Ok(self
            .lots
            .iter()
            .map(|(symbol, lot)| {
                let holding = Holding::new(symbol.as_str(), lot.quantity, lot.avg_entry_price);
                match self.prices.get(symbol) {
                    Some(&price) => holding.marked(price),
                    None => holding,
                }
            })
            .collect())
    }

    fn submit(&mut self, intent: &OrderIntent) -> Result<OrderOutcome, TrendError> {
        let Some(&price) = self.prices.get(&intent.symbol) else {
            return Ok(OrderOutcome::Rejected(format!(
                "no price for {}",
                intent.symbol
            )));
        };

        let held = self.quantity(&intent.symbol);
        let qty = intent.quantity as i64;

        match intent.side {
            Side::Buy => {
                let cost = qty as f64 * price;
                if cost > self.cash + 1e-9 {
                    return Ok(OrderOutcome::Rejected(format!(
                        "insufficient cash: need {:.2}, have {:.2}",
                        cost, self.cash
                    )));
                }
            }
            Side::Sell => {
                if qty > held {
                    return Ok(OrderOutcome::Rejected(format!(
                        "insufficient shares: selling {}, holding {}",
                        qty, held
                    )));
                }
            }
        }

        self.apply_fill(&intent.symbol, intent.signed_quantity(), price);
        Ok(OrderOutcome::Accepted)
    }
}
