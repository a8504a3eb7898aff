//! Константы формата хранилища (заголовок записи, лимиты, служебные имена).

// -------- Record header --------
// Layout (little-endian):
// [used u8]      -- 1 = живая запись, 0 = свободный слот
// [ksize u8]     -- длина ключа
// [vsize u32]    -- длина значения
//
// Total header size = 1 + 1 + 4 = 6 bytes.
//
// Файл — плоская конкатенация записей без магии и версии; границы
// восстанавливаются только последовательным проходом. Пустой файл —
// валидное пустое хранилище.
pub const REC_HDR_SIZE: usize = 6;

// -------- Limits --------
pub const MAX_KEY_LEN: usize = u8::MAX as usize; // 255
pub const MAX_VALUE_LEN: u64 = u32::MAX as u64;

// -------- Defrag --------
// Временный файл компактации — сосед основного (<name>.defrag в том же
// каталоге), затем атомарный rename поверх основного файла.
pub const DEFRAG_SUFFIX: &str = "defrag";
