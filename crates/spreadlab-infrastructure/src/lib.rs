pub mod export;
pub mod persistence;
pub mod ticks_jsonl;
