pub mod error;
pub mod players;
pub mod sink;
pub mod timeseries;
