pub mod adf;
pub mod alerts;
pub mod align;
pub mod analytics;
pub mod regression;
pub mod resample;
pub mod sanitize;
pub mod stats;
