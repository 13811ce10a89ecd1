use crate::errors::StorageError;
use crate::value_objects::tick::Tick;
use serde::{Deserialize, Serialize};

/// How `max_rows` is spent across the two symbols of a pair query.
///
/// `Combined` applies one LIMIT to the union, so a fast-trading symbol can
/// crowd older history of the other one out of the window. `PerSymbol`
/// gives each symbol half of the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowCapPolicy {
    #[default]
    Combined,
    PerSymbol,
}

impl RowCapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowCapPolicy::Combined => "combined",
            RowCapPolicy::PerSymbol => "per_symbol",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairTickQuery {
    pub symbol_a: String,
    pub symbol_b: String,
    pub max_rows: usize,
    pub policy: RowCapPolicy,
}

impl PairTickQuery {
    /// Row limits for (symbol_a, symbol_b) under `PerSymbol`; symbol_a takes
    /// the odd remainder.
    pub fn per_symbol_limits(&self) -> (usize, usize) {
        let half = self.max_rows / 2;
        (self.max_rows - half, half)
    }
}

/// Append-only tick storage.
///
/// `query_pair` returns ticks ordered by timestamp descending (newest first,
/// ties by insertion order descending). `distinct_symbols` and `count` are
/// fail-soft: adapters log and return empty/zero instead of erroring.
pub trait TickRepository: Send + Sync {
    fn migrate(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn insert(&self, tick: &Tick) -> Result<(), StorageError>;

    fn query_pair(&self, query: &PairTickQuery) -> Result<Vec<Tick>, StorageError>;

    fn distinct_symbols(&self) -> Vec<String>;

    fn count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(max_rows: usize) -> PairTickQuery {
        PairTickQuery {
            symbol_a: "a".to_string(),
            symbol_b: "b".to_string(),
            max_rows,
            policy: RowCapPolicy::PerSymbol,
        }
    }

    #[test]
    fn per_symbol_limits_split_budget_with_remainder_to_a() {
        assert_eq!(query(10).per_symbol_limits(), (5, 5));
        assert_eq!(query(7).per_symbol_limits(), (4, 3));
        assert_eq!(query(1).per_symbol_limits(), (1, 0));
    }

    #[test]
    fn policy_round_trips_through_snake_case() {
        let parsed: RowCapPolicy = serde_json::from_str("\"per_symbol\"").unwrap();
        assert_eq!(parsed, RowCapPolicy::PerSymbol);
        assert_eq!(RowCapPolicy::default().as_str(), "combined");
    }
}
