//! Cost model and per-request spend tracking
//!
//! Token counts convert to dollars through a fixed per-token rate. Every
//! request gets its own tracker; nothing accumulates across requests.

use crate::error::CouncilError;
use rust_decimal::Decimal;

/// Converts token counts to monetary cost
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    cost_per_token: Decimal,
}

impl CostModel {
    pub fn new(cost_per_token: Decimal) -> Self {
        Self { cost_per_token }
    }

    /// `cost(tokens) = tokens * cost_per_token`
    pub fn cost(&self, tokens: u64) -> Decimal {
        Decimal::from(tokens) * self.cost_per_token
    }

    /// Pre-flight estimation is the same function as actual cost
    pub fn estimate(&self, expected_tokens: u64) -> Decimal {
        self.cost(expected_tokens)
    }
}

/// Running spend for one orchestration request.
///
/// Created at request start with a zero total; cost is added exactly once
/// per agent response, by `charge`.
#[derive(Debug, Clone)]
pub struct CostTracker {
    model: CostModel,
    ceiling: Decimal,
    spent: Decimal,
}

impl CostTracker {
    pub fn new(model: CostModel, ceiling: Decimal) -> Self {
        Self {
            model,
            ceiling,
            spent: Decimal::ZERO,
        }
    }

    pub fn estimate(&self, expected_tokens: u64) -> Decimal {
        self.model.estimate(expected_tokens)
    }

    /// Whether an estimated additional cost fits under the ceiling
    pub fn can_afford(&self, estimated: Decimal) -> bool {
        self.spent + estimated <= self.ceiling
    }

    /// Pre-flight check; the error itemizes limit, spent, and estimate
    pub fn check(&self, estimated: Decimal) -> Result<(), CouncilError> {
        if self.can_afford(estimated) {
            Ok(())
        } else {
            Err(CouncilError::BudgetExceeded {
                limit: self.ceiling,
                spent: self.spent,
                estimated,
            })
        }
    }

    /// Record actual token consumption and return the incurred cost
    pub fn charge(&mut self, tokens: u64) -> Decimal {
        let cost = self.model.cost(tokens);
        self.spent += cost;
        cost
    }

    pub fn spent(&self) -> Decimal {
        self.spent
    }

    pub fn ceiling(&self) -> Decimal {
        self.ceiling
    }

    pub fn remaining(&self) -> Decimal {
        self.ceiling - self.spent
    }
}
