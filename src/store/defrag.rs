//! store/defrag — офлайн-компактация: переписать файл одними живыми
//! записями и атомарно подменить (tmp-сосед + rename + fsync каталога).
//!
//! Дескриптор tmp-файла после rename становится нашим дескриптором данных —
//! он уже указывает на новый inode, а его эксклюзивный lock взят до rename,
//! так что окна без блокировки нет. Сбой до rename оставляет исходный файл
//! нетронутым.

use fs2::FileExt;
use log::{info, warn};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::DEFRAG_SUFFIX;
use crate::dir::Directory;
use crate::errors::{Result, StoreError};
use crate::record::{self, Record};
use crate::util::fsync_dir;

use super::core::Store;

/// Итог defragment().
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefragSummary {
    pub live_records: u64,
    pub dropped_records: u64,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub reclaimed_bytes: u64,
}

impl Store {
    /// Переписать хранилище без свободных слотов. Идемпотентно: повторный
    /// прогон по уже компактному файлу даёт файл той же длины. Пустое
    /// хранилище компактируется в пустой файл.
    pub fn defragment(&mut self) -> Result<DefragSummary> {
        if self.readonly {
            return Err(StoreError::ReadOnly);
        }

        let tmp = defrag_path(&self.path);
        if tmp.exists() {
            // Хвост упавшего прогона; best-effort, open с truncate добьёт.
            warn!("defragment: removing stale tmp {}", tmp.display());
            let _ = std::fs::remove_file(&tmp);
        }
        let bytes_before = self.file.metadata()?.len();

        let mut out = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        if self.cfg.lock {
            out.lock_exclusive()?;
        }

        // Живые записи переезжают плотно, в порядке файла, с перекодировкой
        // заголовков начисто.
        let mut new_dir = Directory::new();
        let mut dropped = 0u64;
        let mut addr = 0u64;
        for (_, old) in self.dir.scan() {
            if !old.used {
                dropped += 1;
                continue;
            }
            let value = record::read_value(&mut self.file, old)?;
            let rec = Record::live(addr, &old.key, old.vsize);
            record::write_record(&mut out, &rec, &value)?;
            addr = rec.end();
            new_dir.push_back(rec);
        }

        out.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        let _ = fsync_dir(&self.path);

        // Старый дескриптор закрывается здесь; наш указывает на новый inode.
        self.file = out;
        self.dir = new_dir;

        let summary = DefragSummary {
            live_records: self.dir.len() as u64,
            dropped_records: dropped,
            bytes_before,
            bytes_after: addr,
            reclaimed_bytes: bytes_before.saturating_sub(addr),
        };
        info!(
            "defragment {}: {} live / {} dropped, {} B -> {} B",
            self.path.display(),
            summary.live_records,
            summary.dropped_records,
            summary.bytes_before,
            summary.bytes_after
        );
        Ok(summary)
    }
}

/// Путь tmp-файла компактации: сосед основного файла в том же каталоге.
fn defrag_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(DEFRAG_SUFFIX);
    path.with_file_name(name)
}
