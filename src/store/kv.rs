//! store/kv — операции над парами ключ/значение.
//!
//! set: один проход по директории решает всё сразу — проверку дубликата
//! (просматривается вся директория), первый точный свободный слот и первый
//! пригодный к split. Приоритет: точный слот, затем split, затем append в
//! логический конец файла.
//!
//! delete: пометить слот свободным и слить со свободными соседями; на диск
//! при этом уходит ровно один заголовок — итогового слота.

use log::debug;

use crate::consts::{MAX_KEY_LEN, MAX_VALUE_LEN, REC_HDR_SIZE};
use crate::errors::{Result, StoreError};
use crate::record::{self, align, Record};

use super::core::Store;

const HDR: u64 = REC_HDR_SIZE as u64;

impl Store {
    // ----------------- публичные методы -----------------

    /// Есть ли живая запись с таким ключом.
    pub fn has(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// Значение по ключу; значения читаются лениво, только здесь.
    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let idx = self.lookup(key).ok_or(StoreError::KeyNotFound)?;
        record::read_value(&mut self.file, self.dir.rec(idx))
    }

    /// Живые ключи в порядке файла.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.dir
            .scan()
            .filter(|(_, r)| r.used)
            .map(|(_, r)| r.key.clone())
            .collect()
    }

    /// Вставить новую пару. Живой ключ-дубликат — ошибка KeyAlreadyExists:
    /// двух живых записей с одним ключом формат не допускает.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.readonly {
            return Err(StoreError::ReadOnly);
        }
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidArgument(format!(
                "key length {} out of range 1..={}",
                key.len(),
                MAX_KEY_LEN
            )));
        }
        if value.len() as u64 > MAX_VALUE_LEN {
            return Err(StoreError::InvalidArgument(format!(
                "value length {} exceeds {}",
                value.len(),
                MAX_VALUE_LEN
            )));
        }

        let needed = align(key.len() as u64 + value.len() as u64);

        // Один проход: дубликат + кандидаты на переиспользование.
        let mut perfect: Option<usize> = None;
        let mut fallback: Option<usize> = None;
        for (idx, rec) in self.dir.scan() {
            if rec.used {
                if rec.key.as_slice() == key {
                    return Err(StoreError::KeyAlreadyExists);
                }
                continue;
            }
            let size = rec.size();
            if size == needed && perfect.is_none() {
                perfect = Some(idx);
            } else if size >= needed + 2 * HDR && perfect.is_none() && fallback.is_none() {
                // Слот ровно на один заголовок больше нужного не годится:
                // целиком его extent не совпадёт, а остатку split-а не
                // хватает места даже на пустой слот.
                fallback = Some(idx);
            }
        }

        let (idx, split) = match (perfect, fallback) {
            (Some(i), _) => (i, false),
            (None, Some(i)) => (i, true),
            (None, None) => {
                // Append в логический конец (за хвостовой записью), не в
                // физический: мусор за логическим концом перезаписывается.
                let rec = Record::live(self.dir.end_addr(), key, value.len() as u32);
                debug!("set: append at {} ({} B)", rec.addr, needed);
                record::write_record(&mut self.file, &rec, value)?;
                self.dir.push_back(rec);
                return self.finish_write();
            }
        };

        if split {
            // Остаток — новый свободный слот сразу за будущей записью.
            // Его заголовок пишем раньше данных, чтобы разбиение файла на
            // записи оставалось корректным в каждый момент.
            let old = self.dir.rec(idx);
            let rest_addr = old.addr + HDR + needed;
            let rest_vsize = (old.size() - needed - 2 * HDR) as u32;
            debug!(
                "set: split slot at {} ({} B -> {} B, remainder at {})",
                old.addr,
                old.size(),
                needed,
                rest_addr
            );
            let rest = Record::free(rest_addr, rest_vsize);
            record::write_header(&mut self.file, &rest)?;
            self.dir.insert_after(idx, rest);
        } else {
            debug!(
                "set: exact slot at {} ({} B)",
                self.dir.rec(idx).addr,
                needed
            );
        }

        {
            let rec = self.dir.rec_mut(idx);
            rec.used = true;
            rec.ksize = key.len() as u8;
            rec.vsize = value.len() as u32;
            rec.key = key.to_vec();
        }
        record::write_record(&mut self.file, self.dir.rec(idx), value)?;
        self.finish_write()
    }

    /// Удалить пару: слот освобождается и сливается со свободными соседями.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        if self.readonly {
            return Err(StoreError::ReadOnly);
        }
        let idx = self.dir.find_used(key).ok_or(StoreError::KeyNotFound)?;
        self.dir.rec_mut(idx).mark_free();

        // Свободный сосед справа вливается в текущий слот.
        if let Some(n) = self.dir.next(idx) {
            if !self.dir.rec(n).used {
                let add = self.dir.rec(n).footprint();
                let rec = self.dir.rec_mut(idx);
                rec.vsize = (rec.vsize as u64 + add) as u32;
                self.dir.remove(n);
            }
        }

        // Текущий слот (возможно, уже поглотивший правого) вливается в
        // свободного соседа слева.
        let mut keep = idx;
        if let Some(p) = self.dir.prev(idx) {
            if !self.dir.rec(p).used {
                let add = self.dir.rec(idx).footprint();
                let rec = self.dir.rec_mut(p);
                rec.vsize = (rec.vsize as u64 + add) as u32;
                self.dir.remove(idx);
                keep = p;
            }
        }

        // Заголовки поглощённых записей остаются на диске мусором — их
        // перекрывает data-регион итогового слота.
        let rec = self.dir.rec(keep);
        debug!("delete: free slot at {} ({} B)", rec.addr, rec.size());
        record::write_header(&mut self.file, rec)?;
        self.finish_write()
    }

    // ----------------- внутренние помощники -----------------

    /// Поиск живой записи: mem-index (если построен) или линейный скан.
    fn lookup(&self, key: &[u8]) -> Option<usize> {
        if let Some(ix) = self.mem_index.as_ref() {
            return ix.get(key).copied();
        }
        self.dir.find_used(key)
    }

    #[inline]
    fn finish_write(&mut self) -> Result<()> {
        if self.cfg.data_fsync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
