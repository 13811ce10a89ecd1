#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    pub label: String,
    pub step_ms: i64,
}

impl Timeframe {
    /// Parses a duration token such as `1min`, `5s`, `1H` or a pandas alias
    /// (`1S`, `5T`, `500L`). A bare integer is taken as seconds.
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("empty timeframe".to_string());
        }

        let split = trimmed
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (number_part, unit_part) = trimmed.split_at(split);
        let number: i64 = if number_part.is_empty() {
            1
        } else {
            number_part
                .parse()
                .map_err(|_| format!("invalid timeframe: {value}"))?
        };
        if number <= 0 {
            return Err(format!("timeframe must be > 0: {value}"));
        }

        let (unit_ms, unit_label) = unit_to_ms(unit_part)
            .ok_or_else(|| format!("unsupported timeframe unit: {value}"))?;
        let step_ms = number
            .checked_mul(unit_ms)
            .ok_or_else(|| format!("timeframe too large: {value}"))?;

        Ok(Self {
            label: format!("{number}{unit_label}"),
            step_ms,
        })
    }
}

// Upper-case single letters follow pandas offset aliases; `M` (month end) is
// not a fixed width and is rejected.
fn unit_to_ms(unit: &str) -> Option<(i64, &'static str)> {
    let unit = match unit {
        "" | "S" => "s",
        "T" => "min",
        "H" => "h",
        "D" => "d",
        "L" => "ms",
        "W" => "w",
        "M" => return None,
        other => other,
    };
    let unit = unit.to_lowercase();
    let resolved = match unit.as_str() {
        "ms" | "milli" | "millis" => (1, "ms"),
        "s" | "sec" | "secs" | "second" | "seconds" => (1_000, "s"),
        "m" | "min" | "mins" | "minute" | "minutes" => (60_000, "min"),
        "h" | "hr" | "hour" | "hours" => (3_600_000, "h"),
        "d" | "day" | "days" => (86_400_000, "d"),
        "w" | "week" | "weeks" => (604_800_000, "w"),
        _ => return None,
    };
    Some(resolved)
}
