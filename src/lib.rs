#![allow(non_snake_case)]

// Базовые модули
pub mod config;
pub mod consts;
pub mod dir;
pub mod errors;
pub mod record;
pub mod util;

// Движок (папка с mod.rs)
pub mod store; // src/store/{mod,core,open,kv,defrag,check}.rs

// CLI-слой (используется бинарём slotdb)
pub mod cli;

// Удобные реэкспорты
pub use config::StoreConfig;
pub use dir::Directory;
pub use errors::{Result, StoreError};
pub use record::{align, Record};
pub use store::{CheckReport, DefragSummary, Store, StoreStats};
