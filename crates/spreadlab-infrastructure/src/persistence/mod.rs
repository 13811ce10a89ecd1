pub mod memory_ticks;
pub mod postgres_ticks;
