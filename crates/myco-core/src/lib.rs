pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod id;
pub mod lifecycle;
pub mod lock;
pub mod normalize;
pub mod reminder;
pub mod resolve;
pub mod storage;
pub mod supply;
pub mod types;
