pub mod clock;
pub mod config;
pub mod confirm;
pub mod entries;
pub mod error;
pub mod goals;
pub mod presets;
pub mod state;
pub mod stats;
pub mod storage;
