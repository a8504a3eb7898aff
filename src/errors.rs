//! Типизированные ошибки движка.
//!
//! Библиотека возвращает StoreError; CLI-слой оборачивает его в anyhow
//! с контекстом пути. Доменные исходы (KeyNotFound/KeyAlreadyExists)
//! для CLI — нормальный вывод, а не аварийное завершение.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found")]
    KeyNotFound,

    #[error("key already exists")]
    KeyAlreadyExists,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("store is read-only")]
    ReadOnly,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
