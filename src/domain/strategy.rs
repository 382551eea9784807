//! Strategy definition: a signal policy bound to a set of instruments.

use crate::domain::reconcile::Instruments;
use crate::domain::signal::{PolicyConfig, SignalPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub policy: PolicyConfig,
    pub instruments: Instruments,
}

impl StrategyConfig {
    /// Same strategy with shorting toggled; used to compare long-only and
    /// long-short variants.
    pub fn with_shorting(&self, allow_shorting: bool) -> Self {
        StrategyConfig {
            policy: PolicyConfig {
                allow_shorting,
                ..self.policy.clone()
            },
            ..self.clone()
        }
    }

    /// One-line description of the rule set.
    pub fn describe(&self) -> String {
        let p = &self.policy;
        match p.policy {
            SignalPolicy::SingleMa => format!(
                "{}: LONG {} when {} > SMA({}), else CASH",
                self.name, self.instruments.long, self.instruments.index, p.ma_period
            ),
            SignalPolicy::DualMaMomentum => {
                let short = match (&self.instruments.short, p.allow_shorting) {
                    (Some(symbol), true) => format!(", SHORT via {}", symbol),
                    _ => String::new(),
                };
                format!(
                    "{}: LONG {} when {} > SMA({}) and SMA({}) with ROC({}) > {:.1}%{}",
                    self.name,
                    self.instruments.long,
                    self.instruments.index,
                    p.ma_period,
                    p.ma_short_period,
                    p.roc_period,
                    p.roc_threshold * 100.0,
                    short
                )
            }
        }
    }
}
