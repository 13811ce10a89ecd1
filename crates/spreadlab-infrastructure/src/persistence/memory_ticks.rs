use parking_lot::RwLock;
use spreadlab_domain::errors::StorageError;
use spreadlab_domain::repositories::ticks::{PairTickQuery, RowCapPolicy, TickRepository};
use spreadlab_domain::value_objects::tick::Tick;
use std::cmp::Reverse;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct StoredTick {
    id: u64,
    tick: Tick,
}

/// Process-local tick store. Inserts take the write lock, so concurrent
/// writers through one shared handle are serialized.
#[derive(Debug, Default)]
pub struct InMemoryTickRepository {
    rows: RwLock<Vec<StoredTick>>,
}

impl InMemoryTickRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticks(ticks: impl IntoIterator<Item = Tick>) -> Self {
        let repo = Self::new();
        {
            let mut rows = repo.rows.write();
            for tick in ticks {
                let id = rows.len() as u64 + 1;
                rows.push(StoredTick { id, tick });
            }
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

fn newest_first(rows: &[StoredTick], symbol: &str, limit: usize) -> Vec<StoredTick> {
    let mut selected: Vec<StoredTick> = rows
        .iter()
        .filter(|row| row.tick.symbol == symbol)
        .cloned()
        .collect();
    selected.sort_by_key(|row| Reverse((row.tick.timestamp_ms, row.id)));
    selected.truncate(limit);
    selected
}

impl TickRepository for InMemoryTickRepository {
    fn insert(&self, tick: &Tick) -> Result<(), StorageError> {
        let mut rows = self.rows.write();
        let id = rows.len() as u64 + 1;
        rows.push(StoredTick {
            id,
            tick: tick.clone(),
        });
        metrics::counter!("spreadlab.infra.memory.insert.calls_total", "result" => "ok").increment(1);
        Ok(())
    }

    fn query_pair(&self, query: &PairTickQuery) -> Result<Vec<Tick>, StorageError> {
        let rows = self.rows.read();
        let policy = if query.symbol_a == query.symbol_b {
            RowCapPolicy::Combined
        } else {
            query.policy
        };

        let mut selected: Vec<StoredTick> = match policy {
            RowCapPolicy::Combined => rows
                .iter()
                .filter(|row| row.tick.symbol == query.symbol_a || row.tick.symbol == query.symbol_b)
                .cloned()
                .collect(),
            RowCapPolicy::PerSymbol => {
                let (limit_a, limit_b) = query.per_symbol_limits();
                let mut both = newest_first(&rows, &query.symbol_a, limit_a);
                both.extend(newest_first(&rows, &query.symbol_b, limit_b));
                both
            }
        };
        selected.sort_by_key(|row| Reverse((row.tick.timestamp_ms, row.id)));
        if policy == RowCapPolicy::Combined {
            selected.truncate(query.max_rows);
        }

        metrics::counter!("spreadlab.infra.memory.query_pair.calls_total", "result" => "ok")
            .increment(1);
        tracing::debug!(
            rows = selected.len(),
            policy = policy.as_str(),
            "loaded ticks from memory"
        );
        Ok(selected.into_iter().map(|row| row.tick).collect())
    }

    fn distinct_symbols(&self) -> Vec<String> {
        let rows = self.rows.read();
        let symbols: BTreeSet<&str> = rows.iter().map(|row| row.tick.symbol.as_str()).collect();
        symbols.into_iter().map(str::to_string).collect()
    }

    fn count(&self) -> u64 {
        self.rows.read().len() as u64
    }
}
