use chrono::{DateTime, TimeZone, Utc};
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use spreadlab_domain::errors::StorageError;
use spreadlab_domain::repositories::ticks::{PairTickQuery, RowCapPolicy, TickRepository};
use spreadlab_domain::value_objects::tick::Tick;
use std::time::{Duration, Instant};

type PgPool = Pool<PostgresConnectionManager<NoTls>>;
type PgConn = PooledConnection<PostgresConnectionManager<NoTls>>;

#[derive(Debug, Clone)]
pub struct PostgresTickRepository {
    pool: PgPool,
    pub ticks_table: String,
}

impl PostgresTickRepository {
    pub fn new(db_url: String, ticks_table: String, pool_max_size: u32) -> Result<Self, String> {
        Self::with_connection_timeout(db_url, ticks_table, pool_max_size, Duration::from_secs(10))
    }

    pub fn with_connection_timeout(
        db_url: String,
        ticks_table: String,
        pool_max_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, String> {
        if let Err(err) = validate_table_name(&ticks_table) {
            return Err(format!("invalid ticks_table '{}': {}", ticks_table, err));
        }

        let config = db_url
            .parse::<postgres::Config>()
            .map_err(|err| format!("invalid postgres db url: {err}"))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        // Connections open lazily on first checkout.
        let pool = Pool::builder()
            .max_size(pool_max_size)
            .min_idle(Some(0))
            .connection_timeout(connection_timeout)
            .build_unchecked(manager);

        Ok(Self { pool, ticks_table })
    }

    fn checkout(&self, op: &'static str) -> Result<PgConn, StorageError> {
        let start = Instant::now();
        match self.pool.get() {
            Ok(client) => {
                metrics::histogram!("spreadlab.infra.postgres.pool.get_ms")
                    .record(start.elapsed().as_secs_f64() * 1000.0);
                Ok(client)
            }
            Err(err) => {
                record_error(op, "pool_get");
                metrics::counter!("spreadlab.infra.postgres.pool.get.errors_total").increment(1);
                tracing::error!(error = %err, "failed to checkout postgres connection");
                Err(StorageError::Connection(format!(
                    "failed to checkout postgres connection: {err}"
                )))
            }
        }
    }
}

/// DDL for the tick table and its `(symbol, timestamp_utc)` index. Both
/// statements are idempotent.
pub fn schema_sql(table: &str) -> Result<Vec<String>, String> {
    validate_table_name(table)?;
    let base = table.rsplit('.').next().unwrap_or(table);
    Ok(vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             id BIGSERIAL PRIMARY KEY, \
             timestamp_utc TIMESTAMPTZ NOT NULL, \
             symbol TEXT NOT NULL, \
             price DOUBLE PRECISION NOT NULL, \
             size DOUBLE PRECISION NOT NULL)"
        ),
        format!("CREATE INDEX IF NOT EXISTS {base}_symbol_ts_idx ON {table} (symbol, timestamp_utc)"),
    ])
}

pub fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (timestamp_utc, symbol, price, size) VALUES ($1, $2, $3, $4)")
}

/// Pair query for `policy`. Rows come back newest first with ties broken by
/// insertion id.
pub fn pair_query_sql(table: &str, policy: RowCapPolicy) -> String {
    match policy {
        RowCapPolicy::Combined => format!(
            "SELECT id, symbol, timestamp_utc, price, size FROM {table} \
             WHERE symbol = $1 OR symbol = $2 \
             ORDER BY timestamp_utc DESC, id DESC LIMIT $3"
        ),
        RowCapPolicy::PerSymbol => format!(
            "SELECT id, symbol, timestamp_utc, price, size FROM (\
             (SELECT id, symbol, timestamp_utc, price, size FROM {table} \
             WHERE symbol = $1 ORDER BY timestamp_utc DESC, id DESC LIMIT $3) \
             UNION ALL \
             (SELECT id, symbol, timestamp_utc, price, size FROM {table} \
             WHERE symbol = $2 ORDER BY timestamp_utc DESC, id DESC LIMIT $4)\
             ) AS pair ORDER BY timestamp_utc DESC, id DESC"
        ),
    }
}

fn to_utc(timestamp_ms: i64) -> Result<DateTime<Utc>, StorageError> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| StorageError::Write(format!("timestamp out of range: {timestamp_ms}")))
}

fn record_call(op: &'static str, result: &'static str, start: Instant) {
    metrics::counter!(format!("spreadlab.infra.postgres.{op}.calls_total"), "result" => result)
        .increment(1);
    metrics::histogram!(format!("spreadlab.infra.postgres.{op}_ms"))
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

fn record_error(op: &'static str, stage: &'static str) {
    metrics::counter!(format!("spreadlab.infra.postgres.{op}.errors_total"), "stage" => stage)
        .increment(1);
}

impl TickRepository for PostgresTickRepository {
    fn migrate(&self) -> Result<(), StorageError> {
        let start = Instant::now();
        let _span = tracing::info_span!("infra.postgres.migrate", table = %self.ticks_table).entered();
        let statements = schema_sql(&self.ticks_table).map_err(StorageError::Config)?;
        let mut client = self.checkout("migrate")?;
        for statement in &statements {
            if let Err(err) = client.batch_execute(statement) {
                record_error("migrate", "execute");
                record_call("migrate", "err", start);
                tracing::error!(error = %err, "failed to apply tick schema");
                return Err(StorageError::Write(format!("failed to apply tick schema: {err}")));
            }
        }
        record_call("migrate", "ok", start);
        tracing::info!("tick schema ready");
        Ok(())
    }

    fn insert(&self, tick: &Tick) -> Result<(), StorageError> {
        let start = Instant::now();
        let timestamp = to_utc(tick.timestamp_ms)?;
        let mut client = match self.checkout("insert") {
            Ok(client) => client,
            Err(err) => {
                record_call("insert", "err", start);
                return Err(err);
            }
        };
        let sql = insert_sql(&self.ticks_table);
        match client.execute(&sql, &[&timestamp, &tick.symbol, &tick.price, &tick.size]) {
            Ok(_) => {
                record_call("insert", "ok", start);
                Ok(())
            }
            Err(err) => {
                record_error("insert", "execute");
                record_call("insert", "err", start);
                tracing::error!(symbol = %tick.symbol, error = %err, "failed to insert tick");
                Err(StorageError::Write(format!("failed to insert tick: {err}")))
            }
        }
    }

    fn query_pair(&self, query: &PairTickQuery) -> Result<Vec<Tick>, StorageError> {
        let start = Instant::now();
        let span = tracing::info_span!(
            "infra.postgres.query_pair",
            table = %self.ticks_table,
            symbol_a = %query.symbol_a,
            symbol_b = %query.symbol_b,
            max_rows = query.max_rows,
            policy = query.policy.as_str()
        );
        let _enter = span.enter();

        let mut client = match self.checkout("query_pair") {
            Ok(client) => client,
            Err(err) => {
                record_call("query_pair", "err", start);
                return Err(err);
            }
        };

        // A self-pair under the split cap would return every row twice.
        let policy = if query.symbol_a == query.symbol_b {
            RowCapPolicy::Combined
        } else {
            query.policy
        };
        let sql = pair_query_sql(&self.ticks_table, policy);
        let rows = match policy {
            RowCapPolicy::Combined => {
                let limit = query.max_rows as i64;
                client.query(&sql, &[&query.symbol_a, &query.symbol_b, &limit])
            }
            RowCapPolicy::PerSymbol => {
                let (limit_a, limit_b) = query.per_symbol_limits();
                let (limit_a, limit_b) = (limit_a as i64, limit_b as i64);
                client.query(&sql, &[&query.symbol_a, &query.symbol_b, &limit_a, &limit_b])
            }
        };
        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                record_error("query_pair", "query");
                record_call("query_pair", "err", start);
                tracing::error!(error = %err, "failed to query ticks");
                return Err(StorageError::Query(format!("failed to query ticks: {err}")));
            }
        };

        let ticks: Vec<Tick> = rows
            .iter()
            .map(|row| {
                let timestamp: DateTime<Utc> = row.get(2);
                Tick {
                    symbol: row.get(1),
                    timestamp_ms: timestamp.timestamp_millis(),
                    price: row.get(3),
                    size: row.get(4),
                }
            })
            .collect();

        record_call("query_pair", "ok", start);
        metrics::gauge!("spreadlab.infra.postgres.query_pair.rows_returned").set(ticks.len() as f64);
        tracing::debug!(rows = ticks.len(), "loaded ticks");
        Ok(ticks)
    }

    fn distinct_symbols(&self) -> Vec<String> {
        let start = Instant::now();
        let Ok(mut client) = self.checkout("distinct_symbols") else {
            record_call("distinct_symbols", "err", start);
            return Vec::new();
        };
        let sql = format!("SELECT DISTINCT symbol FROM {} ORDER BY symbol", self.ticks_table);
        match client.query(&sql, &[]) {
            Ok(rows) => {
                record_call("distinct_symbols", "ok", start);
                rows.iter().map(|row| row.get::<_, String>(0)).collect()
            }
            Err(err) => {
                record_error("distinct_symbols", "query");
                record_call("distinct_symbols", "err", start);
                tracing::warn!(error = %err, "failed to list symbols; returning none");
                Vec::new()
            }
        }
    }

    fn count(&self) -> u64 {
        let start = Instant::now();
        let Ok(mut client) = self.checkout("count") else {
            record_call("count", "err", start);
            return 0;
        };
        let sql = format!("SELECT COUNT(*) FROM {}", self.ticks_table);
        match client.query_one(&sql, &[]) {
            Ok(row) => {
                record_call("count", "ok", start);
                row.get::<_, i64>(0).max(0) as u64
            }
            Err(err) => {
                record_error("count", "query");
                record_call("count", "err", start);
                tracing::warn!(error = %err, "failed to count ticks; returning 0");
                0
            }
        }
    }
}

pub fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 {
        return Err(format!("invalid table name: {table}"));
    }
    for part in parts {
        let mut chars = part.chars();
        let Some(first) = chars.next() else {
            return Err(format!("invalid table name: {table}"));
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!("invalid table name: {table}"));
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(format!("invalid table name: {table}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_repo() -> PostgresTickRepository {
        PostgresTickRepository::with_connection_timeout(
            "postgres://spreadlab@127.0.0.1:1/spreadlab?connect_timeout=1".to_string(),
            "ticks".to_string(),
            1,
            Duration::from_millis(300),
        )
        .expect("repo should build without connecting")
    }

    #[test]
    fn validate_table_name_accepts_schema() {
        assert!(validate_table_name("ticks").is_ok());
        assert!(validate_table_name("market.ticks").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("ticks;drop").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name(".ticks").is_err());
        assert!(validate_table_name("1ticks").is_err());
    }

    #[test]
    fn new_rejects_invalid_table_before_connect() {
        let err = PostgresTickRepository::new(
            "postgres://localhost/spreadlab".to_string(),
            "ticks;drop".to_string(),
            1,
        )
        .expect_err("invalid table name");
        assert!(err.contains("invalid table name"));
    }

    #[test]
    fn new_errors_on_invalid_db_url() {
        let err = PostgresTickRepository::new("not a url".to_string(), "ticks".to_string(), 1)
            .expect_err("invalid db url should fail fast");
        assert!(err.contains("invalid postgres db url"));
    }

    #[test]
    fn schema_creates_table_and_index_idempotently() {
        let statements = schema_sql("market.ticks").unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS market.ticks"));
        assert!(statements[0].contains("id BIGSERIAL PRIMARY KEY"));
        assert!(statements[0].contains("timestamp_utc TIMESTAMPTZ"));
        assert!(statements[1]
            .contains("CREATE INDEX IF NOT EXISTS ticks_symbol_ts_idx ON market.ticks (symbol, timestamp_utc)"));
        assert!(schema_sql("bad name").is_err());
    }

    #[test]
    fn pair_queries_order_newest_first_with_id_tiebreak() {
        let combined = pair_query_sql("ticks", RowCapPolicy::Combined);
        assert!(combined.contains("ORDER BY timestamp_utc DESC, id DESC LIMIT $3"));
        let split = pair_query_sql("ticks", RowCapPolicy::PerSymbol);
        assert!(split.contains("UNION ALL"));
        assert!(split.contains("LIMIT $4"));
        assert!(split.trim_end().ends_with("ORDER BY timestamp_utc DESC, id DESC"));
    }

    #[test]
    fn unreachable_server_surfaces_errors_and_degrades_metadata() {
        let repo = unreachable_repo();
        let tick = Tick {
            symbol: "btcusdt".to_string(),
            timestamp_ms: 0,
            price: 1.0,
            size: 1.0,
        };
        assert!(matches!(repo.insert(&tick), Err(StorageError::Connection(_))));
        assert!(repo.distinct_symbols().is_empty());
        assert_eq!(repo.count(), 0);
    }
}
