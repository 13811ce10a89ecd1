use spreadlab_domain::value_objects::tick::RawTick;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parses one `{"symbol", "ts", "price", "size"}` line. `ts` may also be an
/// integer epoch in milliseconds.
pub fn parse_tick_line(line: &str) -> Result<RawTick, String> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|err| format!("invalid tick json: {err}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "tick line must be a JSON object".to_string())?;

    let symbol = object
        .get("symbol")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing string field: symbol".to_string())?;
    let ts = match object.get("ts") {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Number(n)) if n.is_i64() => n.to_string(),
        _ => return Err("missing field: ts (ISO-8601 text or epoch ms)".to_string()),
    };
    let price = object
        .get("price")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| "missing numeric field: price".to_string())?;
    let size = object
        .get("size")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| "missing numeric field: size".to_string())?;

    Ok(RawTick {
        symbol: symbol.to_string(),
        ts,
        price,
        size,
    })
}

/// Reads JSON-lines ticks. Blank lines are skipped; each other line yields
/// its own parse result, prefixed with its line number on error.
pub fn read_ticks<R: BufRead>(reader: R) -> Result<Vec<Result<RawTick, String>>, String> {
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("failed to read tick line {}: {}", idx + 1, err))?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(parse_tick_line(&line).map_err(|err| format!("line {}: {}", idx + 1, err)));
    }
    Ok(out)
}

pub fn read_ticks_file(path: &Path) -> Result<Vec<Result<RawTick, String>>, String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open ticks file {}: {}", path.display(), err))?;
    read_ticks(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collector_payload() {
        let raw = parse_tick_line(
            r#"{"symbol": "BTCUSDT", "ts": "2024-01-01T00:00:00.123", "price": 42000.5, "size": 0.01}"#,
        )
        .unwrap();
        assert_eq!(raw.symbol, "BTCUSDT");
        assert_eq!(raw.ts, "2024-01-01T00:00:00.123");
        assert_eq!(raw.price, 42_000.5);
        assert_eq!(raw.validate().unwrap().timestamp_ms, 1_704_067_200_123);
    }

    #[test]
    fn accepts_epoch_millis_ts() {
        let raw = parse_tick_line(r#"{"symbol":"a","ts":1704067200000,"price":1,"size":0}"#).unwrap();
        assert_eq!(raw.ts, "1704067200000");
        assert_eq!(raw.price, 1.0);
    }

    #[test]
    fn reports_bad_lines_by_number_and_skips_blanks() {
        let input = "{\"symbol\":\"a\",\"ts\":\"2024-01-01 00:00:00\",\"price\":1.0,\"size\":1.0}\n\n{\"symbol\":\"a\"}\nnot json\n";
        let items = read_ticks(input.as_bytes()).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        let err = items[1].as_ref().unwrap_err();
        assert!(err.starts_with("line 3:"), "{err}");
        assert!(items[2].as_ref().unwrap_err().starts_with("line 4:"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_ticks_file(Path::new("/nonexistent/ticks.jsonl")).is_err());
    }
}
