pub mod tick;
pub mod timeframe;
