//! store/open — открытие Store (writer/read-only) и последовательная
//! загрузка директории из файла.
//!
//! Формат без магии и версии: границы записей восстанавливаются только
//! проходом по заголовкам. Обрыв внутри заголовка или ключа живой записи —
//! Corrupt; чтение нулевой длины ровно на границе записи — нормальный конец.

use fs2::FileExt;
use log::debug;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::config::StoreConfig;
use crate::dir::Directory;
use crate::errors::{Result, StoreError};
use crate::record::{self, Record};

use super::core::Store;

impl Store {
    /// Открыть (создав при отсутствии) хранилище в режиме writer:
    /// эксклюзивный lock на самом файле данных.
    pub fn open_with_config(path: &Path, cfg: StoreConfig) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        if cfg.lock {
            file.lock_exclusive()?;
        }
        let dir = load_dir(&mut file)?;
        debug!(
            "opened store {} ({} records, logical end {}), {}",
            path.display(),
            dir.len(),
            dir.end_addr(),
            cfg
        );
        Ok(Self {
            path: path.to_path_buf(),
            file,
            dir,
            readonly: false,
            cfg,
            mem_index: None,
        })
    }

    /// Открыть существующее хранилище read-only: shared lock, мутации
    /// отвергаются с ReadOnly. Несколько RO-хэндлов сосуществуют свободно.
    pub fn open_ro_with_config(path: &Path, cfg: StoreConfig) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).open(path)?;
        if cfg.lock {
            file.lock_shared()?;
        }
        let dir = load_dir(&mut file)?;
        let mem_index = if cfg.mem_index {
            Some(build_mem_index(&dir))
        } else {
            None
        };
        debug!(
            "opened store {} read-only ({} records, mem_index={})",
            path.display(),
            dir.len(),
            mem_index.is_some()
        );
        Ok(Self {
            path: path.to_path_buf(),
            file,
            dir,
            readonly: true,
            cfg,
            mem_index,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let cfg = StoreConfig::from_env();
        Self::open_with_config(path, cfg)
    }

    pub fn open_ro(path: &Path) -> Result<Self> {
        let cfg = StoreConfig::from_env();
        Self::open_ro_with_config(path, cfg)
    }
}

// -------- последовательная загрузка --------

/// Один проход по файлу: заголовки и ключи живых записей читаются,
/// data-регионы перепрыгиваются. Адрес ведём арифметикой (rec.end()),
/// а не через stream_position.
fn load_dir(f: &mut File) -> Result<Directory> {
    let mut dir = Directory::new();
    let mut addr = 0u64;
    f.seek(SeekFrom::Start(0))?;
    while let Some((used, ksize, vsize)) = record::read_next_header(f, addr)? {
        let rec = if used {
            let mut key = vec![0u8; ksize as usize];
            f.read_exact(&mut key).map_err(|e| -> StoreError {
                if e.kind() == ErrorKind::UnexpectedEof {
                    StoreError::Corrupt(format!("truncated record key at offset {}", addr))
                } else {
                    e.into()
                }
            })?;
            Record {
                addr,
                used,
                ksize,
                vsize,
                key,
            }
        } else {
            // У свободного слота ksize с диска может быть ненулевым
            // (ненормализованный сосед); extent всё равно выводится из
            // align(ksize + vsize), ключ не читаем.
            Record {
                addr,
                used,
                ksize,
                vsize,
                key: Vec::new(),
            }
        };
        // Прыжок за data-регион; у живой записи ключ уже прочитан.
        // Seek за конец файла допустим: следующий read вернёт 0.
        let skip = rec.size() - if used { rec.ksize as u64 } else { 0 };
        f.seek(SeekFrom::Current(skip as i64))?;
        addr = rec.end();
        dir.push_back(rec);
    }
    Ok(dir)
}

/// Индекс ключ -> позиция в директории для RO-хэндлов. При дубликатах
/// (формат их запрещает) выигрывает первый — как в линейном поиске.
fn build_mem_index(dir: &Directory) -> HashMap<Vec<u8>, usize> {
    let mut map = HashMap::new();
    for (idx, rec) in dir.scan() {
        if rec.used {
            map.entry(rec.key.clone()).or_insert(idx);
        }
    }
    map
}
