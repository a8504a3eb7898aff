//! store/core — ядро: структура Store, close/Drop, статистика.

use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use crate::config::StoreConfig;
use crate::dir::Directory;
use crate::errors::Result;

/// Открытое хранилище: один файл данных + директория записей в памяти.
///
/// Хэндл — scoped-ресурс: дескриптор и advisory lock живут, пока жив Store,
/// и освобождаются в close()/Drop.
pub struct Store {
    pub path: PathBuf,
    pub(crate) file: File,
    pub dir: Directory,
    pub(crate) readonly: bool,
    pub(crate) cfg: StoreConfig,
    // Опциональный RO-ускоритель has/get (ключ -> индекс директории).
    // У writer-хэндла всегда None.
    pub(crate) mem_index: Option<HashMap<Vec<u8>, usize>>,
}

impl Store {
    #[inline]
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    #[inline]
    pub fn has_mem_index(&self) -> bool {
        self.mem_index.is_some()
    }

    /// Явное закрытие: для writer-а fsync с Result вместо молчаливого Drop.
    /// Дескриптор и lock освобождаются как обычно, когда self выходит из
    /// области видимости.
    pub fn close(self) -> Result<()> {
        if !self.readonly {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Сводка занятости по директории: один проход, без чтения данных.
    pub fn stats(&self) -> StoreStats {
        let mut st = StoreStats {
            file_len: self.file.metadata().map(|m| m.len()).unwrap_or(0),
            logical_len: self.dir.end_addr(),
            ..Default::default()
        };
        for (_, r) in self.dir.scan() {
            st.records += 1;
            if r.used {
                st.live_records += 1;
                st.live_data_bytes += r.data_size();
                st.live_bytes += r.footprint();
                st.padding_bytes += r.size() - r.data_size();
            } else {
                st.free_records += 1;
                st.free_bytes += r.footprint();
            }
        }
        st
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Только для writer-а. Ошибки в Drop игнорируем.
        if self.readonly {
            return;
        }
        let _ = self.file.sync_all();
        // Дескриптор (и lock на нём) закроется после Drop полей.
    }
}

/// Отчёт stats(): длины файла и суммарные размеры по видам записей.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub file_len: u64,
    /// Первый байт за хвостовой записью; после crash-а может быть < file_len.
    pub logical_len: u64,
    pub records: u64,
    pub live_records: u64,
    pub free_records: u64,
    /// Полезные байты живых записей (ключ + значение).
    pub live_data_bytes: u64,
    /// Полная стоимость живых записей на диске (заголовок + extent).
    pub live_bytes: u64,
    pub free_bytes: u64,
    /// Нулевой хвост выравнивания в живых записях.
    pub padding_bytes: u64,
}
