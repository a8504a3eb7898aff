//! store/check — независимая проверка целостности: проход по файлу тем же
//! кодеком, что и загрузка, но без доверия директории.

use serde::Serialize;
use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

use crate::consts::REC_HDR_SIZE;
use crate::errors::{Result, StoreError};
use crate::record::{self, align};

use super::core::Store;

/// Отчёт check(): счётчики + найденные проблемы.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub file_len: u64,
    pub records: u64,
    pub live_records: u64,
    pub free_records: u64,
    /// Пары смежных свободных слотов: легально, но не слито (кандидаты
    /// на merge при следующем delete рядом или defragment).
    pub adjacent_free_pairs: u64,
    pub errors: Vec<String>,
}

impl CheckReport {
    #[inline]
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Store {
    /// Пройти файл независимо от директории и сверить структуру:
    /// записи покрывают файл без обрывов, живые ключи уникальны,
    /// data-регионы не выходят за конец файла.
    pub fn check(&mut self) -> Result<CheckReport> {
        let mut rep = CheckReport {
            file_len: self.file.metadata()?.len(),
            ..Default::default()
        };

        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut prev_free = false;
        let mut addr = 0u64;
        self.file.seek(SeekFrom::Start(0))?;
        loop {
            let (used, ksize, vsize) = match record::read_next_header(&mut self.file, addr) {
                Ok(None) => break,
                Ok(Some(h)) => h,
                Err(StoreError::Corrupt(msg)) => {
                    rep.errors.push(msg);
                    break;
                }
                Err(e) => return Err(e),
            };
            rep.records += 1;
            let size = align(ksize as u64 + vsize as u64);
            let end = addr + REC_HDR_SIZE as u64 + size;
            if end > rep.file_len {
                rep.errors.push(format!(
                    "record at offset {} runs past end of file ({} > {})",
                    addr, end, rep.file_len
                ));
            }
            if used {
                rep.live_records += 1;
                if ksize == 0 {
                    rep.errors
                        .push(format!("live record with empty key at offset {}", addr));
                }
                let mut key = vec![0u8; ksize as usize];
                match self.file.read_exact(&mut key) {
                    Ok(()) => {
                        if !seen.insert(key) {
                            rep.errors
                                .push(format!("duplicate live key at offset {}", addr));
                        }
                    }
                    Err(_) => {
                        rep.errors
                            .push(format!("truncated record key at offset {}", addr));
                        break;
                    }
                }
                prev_free = false;
            } else {
                rep.free_records += 1;
                if prev_free {
                    rep.adjacent_free_pairs += 1;
                }
                prev_free = true;
            }
            let skip = size - if used { ksize as u64 } else { 0 };
            self.file.seek(SeekFrom::Current(skip as i64))?;
            addr = end;
        }

        if rep.records != self.dir.len() as u64 {
            rep.errors.push(format!(
                "directory tracks {} records, file walk found {}",
                self.dir.len(),
                rep.records
            ));
        }
        Ok(rep)
    }
}
