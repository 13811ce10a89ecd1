pub mod exports;
pub mod ticks;
