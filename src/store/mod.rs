//! store — менеджер хранилища поверх одного плоского файла.
//!
//! Разделение по подмодулям:
//! - core.rs   — структура Store, close/Drop, stats()
//! - open.rs   — открытие (open/open_ro + _with_config), загрузка директории
//! - kv.rs     — операции has/get/set/delete: аллокатор и слияние свободных слотов
//! - defrag.rs — офлайн-компактация (tmp + rename) + DefragSummary
//! - check.rs  — независимый проход по файлу с отчётом CheckReport

pub mod check;
pub mod core;
pub mod defrag;
pub mod kv;
pub mod open;

pub use self::core::{Store, StoreStats};
pub use check::CheckReport;
pub use defrag::DefragSummary;
