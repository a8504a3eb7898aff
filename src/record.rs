//! Дескриптор записи и кодек 6-байтового заголовка.
//!
//! Формат записи (LE):
//! [used u8][ksize u8][vsize u32]   -- заголовок, REC_HDR_SIZE = 6
//! [key ++ value ++ zero padding]   -- data-регион длиной align(ksize+vsize)
//!
//! align() округляет строго вверх: даже кратная шести длина получает
//! следующий кратный размер. Это контракт формата, и на нём держится
//! представление свободных слотов: у освобождённой записи vsize = extent − 6,
//! и align(extent − 6) == extent, так что разбиение файла на записи
//! не меняется.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::consts::REC_HDR_SIZE;
use crate::errors::{Result, StoreError};

const ZERO_PAD: [u8; REC_HDR_SIZE] = [0u8; REC_HDR_SIZE];

/// Выравнивание длины data-региона: всегда к следующему кратному шести.
#[inline]
pub fn align(n: u64) -> u64 {
    n + (REC_HDR_SIZE as u64 - n % REC_HDR_SIZE as u64)
}

/// Запись файла: живая пара ключ/значение или свободный слот.
#[derive(Debug, Clone)]
pub struct Record {
    pub addr: u64, // смещение заголовка в файле
    pub used: bool,
    pub ksize: u8,
    pub vsize: u32,
    pub key: Vec<u8>, // пустой для свободных слотов
}

impl Record {
    pub fn live(addr: u64, key: &[u8], vsize: u32) -> Record {
        Record {
            addr,
            used: true,
            ksize: key.len() as u8,
            vsize,
            key: key.to_vec(),
        }
    }

    pub fn free(addr: u64, vsize: u32) -> Record {
        Record {
            addr,
            used: false,
            ksize: 0,
            vsize,
            key: Vec::new(),
        }
    }

    #[inline]
    pub fn data_size(&self) -> u64 {
        self.ksize as u64 + self.vsize as u64
    }

    /// Извлечённый размер data-региона (extent).
    #[inline]
    pub fn size(&self) -> u64 {
        align(self.data_size())
    }

    /// Полная стоимость записи на диске: заголовок + data-регион.
    #[inline]
    pub fn footprint(&self) -> u64 {
        REC_HDR_SIZE as u64 + self.size()
    }

    /// Адрес первого байта за записью (= addr следующей записи).
    #[inline]
    pub fn end(&self) -> u64 {
        self.addr + self.footprint()
    }

    /// Перевести запись в свободный слот, сохранив её extent.
    /// vsize = extent − 6 — derived size слота остаётся прежним.
    pub fn mark_free(&mut self) {
        let extent = self.size();
        self.used = false;
        self.ksize = 0;
        self.vsize = (extent - REC_HDR_SIZE as u64) as u32;
        self.key.clear();
    }
}

// ---- Чтение/запись заголовков и данных ----

/// Прочитать заголовок на текущей позиции файла (последовательная загрузка).
/// Ok(None) — чистый EOF на границе записи; обрыв внутри заголовка — Corrupt.
pub(crate) fn read_next_header(f: &mut File, addr: u64) -> Result<Option<(bool, u8, u32)>> {
    let mut used = [0u8; 1];
    let n = f.read(&mut used)?;
    if n == 0 {
        return Ok(None);
    }
    let trunc = |e: std::io::Error| -> StoreError {
        if e.kind() == ErrorKind::UnexpectedEof {
            StoreError::Corrupt(format!("truncated record header at offset {}", addr))
        } else {
            e.into()
        }
    };
    let ksize = f.read_u8().map_err(trunc)?;
    let vsize = f.read_u32::<LittleEndian>().map_err(trunc)?;
    Ok(Some((used[0] != 0, ksize, vsize)))
}

/// Записать только заголовок (освобождение, слияние, остаток после split).
pub(crate) fn write_header(f: &mut File, rec: &Record) -> Result<()> {
    f.seek(SeekFrom::Start(rec.addr))?;
    f.write_u8(if rec.used { 1 } else { 0 })?;
    f.write_u8(rec.ksize)?;
    f.write_u32::<LittleEndian>(rec.vsize)?;
    Ok(())
}

/// Записать запись целиком: заголовок, ключ, значение и нулевой хвост
/// до align(ksize+vsize). Хвост не длиннее заголовка (1..=6 байт).
pub(crate) fn write_record(f: &mut File, rec: &Record, value: &[u8]) -> Result<()> {
    f.seek(SeekFrom::Start(rec.addr))?;
    f.write_u8(if rec.used { 1 } else { 0 })?;
    f.write_u8(rec.ksize)?;
    f.write_u32::<LittleEndian>(rec.vsize)?;
    f.write_all(&rec.key)?;
    f.write_all(value)?;
    let pad = (rec.size() - rec.data_size()) as usize;
    f.write_all(&ZERO_PAD[..pad])?;
    Ok(())
}

/// Ленивое чтение значения живой записи.
pub(crate) fn read_value(f: &mut File, rec: &Record) -> Result<Vec<u8>> {
    let mut value = vec![0u8; rec.vsize as usize];
    f.seek(SeekFrom::Start(
        rec.addr + REC_HDR_SIZE as u64 + rec.ksize as u64,
    ))?;
    f.read_exact(&mut value).map_err(|e| -> StoreError {
        if e.kind() == ErrorKind::UnexpectedEof {
            StoreError::Corrupt(format!("record data out of bounds at offset {}", rec.addr))
        } else {
            e.into()
        }
    })?;
    Ok(value)
}
