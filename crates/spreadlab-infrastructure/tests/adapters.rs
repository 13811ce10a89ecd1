use spreadlab_domain::repositories::ticks::{PairTickQuery, RowCapPolicy, TickRepository};
use spreadlab_infrastructure::persistence::memory_ticks::InMemoryTickRepository;
use spreadlab_infrastructure::ticks_jsonl::read_ticks;

const FEED: &str = r#"{"symbol": "btcusdt", "ts": "2024-01-01T00:00:00.100", "price": 42000.5, "size": 0.01}
{"symbol": "ethusdt", "ts": "2024-01-01T00:00:00.200", "price": 2300.0, "size": 0.5}
{"symbol": "btcusdt", "ts": "2024-01-01T00:00:01.000", "price": 42001.0, "size": 0.02}
{"symbol": "btcusdt", "ts": "2024-01-01T00:00:01.000", "price": 42002.0, "size": 0.03}
"#;

#[test]
fn feed_lines_round_trip_through_memory_store() {
    let repo = InMemoryTickRepository::new();
    for item in read_ticks(FEED.as_bytes()).expect("read feed") {
        let tick = item.expect("line parses").validate().expect("tick is valid");
        repo.insert(&tick).expect("insert");
    }
    assert_eq!(repo.count(), 4);

    let ticks = repo
        .query_pair(&PairTickQuery {
            symbol_a: "btcusdt".to_string(),
            symbol_b: "ethusdt".to_string(),
            max_rows: 10,
            policy: RowCapPolicy::Combined,
        })
        .expect("query");
    let prices: Vec<f64> = ticks.iter().map(|t| t.price).collect();
    assert_eq!(prices, vec![42_002.0, 42_001.0, 2_300.0, 42_000.5]);
    assert_eq!(ticks[3].timestamp_ms, 1_704_067_200_100);
}
