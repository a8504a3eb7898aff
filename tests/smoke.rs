use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use SlotDB::errors::StoreError;
use SlotDB::store::Store;

#[test]
fn smoke_set_get_has_del() -> Result<()> {
    let path = unique_path("smoke");

    // 1) writer: set alpha + bin
    {
        let mut store = Store::open(&path)?;
        store.set(b"alpha", b"1")?;
        store.set(b"bin", &[0xAB, 0x00, 0xFF])?;

        assert!(store.has(b"alpha"));
        assert_eq!(store.get(b"alpha")?, b"1");
        assert_eq!(store.get(b"bin")?, vec![0xAB, 0x00, 0xFF]);
        store.close()?;
    }

    // 2) delete alpha и проверка отсутствия
    {
        let mut store = Store::open(&path)?;
        store.delete(b"alpha")?;
        assert!(!store.has(b"alpha"));
        match store.get(b"alpha") {
            Err(StoreError::KeyNotFound) => {}
            other => panic!("expected KeyNotFound, got {:?}", other.map(|v| v.len())),
        }
        // bin не задет
        assert_eq!(store.get(b"bin")?, vec![0xAB, 0x00, 0xFF]);
    }

    Ok(())
}

#[test]
fn values_survive_reopen() -> Result<()> {
    let path = unique_path("reopen");

    // 1) записать несколько пар, включая пустое значение
    {
        let mut store = Store::open(&path)?;
        store.set(b"a", b"first")?;
        store.set(b"empty", b"")?;
        store.set(b"last", &vec![0x5A; 300])?;
        store.close()?;
    }

    // 2) новый хэндл видит всё
    {
        let mut store = Store::open(&path)?;
        assert_eq!(store.get(b"a")?, b"first");
        assert_eq!(store.get(b"empty")?, b"");
        assert_eq!(store.get(b"last")?, vec![0x5A; 300]);
        assert_eq!(store.keys().len(), 3);
    }

    Ok(())
}

#[test]
fn open_creates_empty_store() -> Result<()> {
    let path = unique_path("create");
    assert!(!path.exists());

    {
        let store = Store::open(&path)?;
        assert!(store.dir.is_empty());
        assert!(!store.has(b"anything"));
        let st = store.stats();
        assert_eq!(st.records, 0);
        assert_eq!(st.file_len, 0);
    }

    // пустой файл остался валидным пустым хранилищем
    assert_eq!(fs::metadata(&path)?.len(), 0);
    {
        let store = Store::open_ro(&path)?;
        assert!(store.dir.is_empty());
    }

    Ok(())
}

#[test]
fn invalid_arguments_rejected() -> Result<()> {
    let path = unique_path("invalid");
    let mut store = Store::open(&path)?;

    // пустой ключ
    assert!(matches!(
        store.set(b"", b"v"),
        Err(StoreError::InvalidArgument(_))
    ));
    // ключ длиннее 255 байт
    let long_key = vec![b'k'; 256];
    assert!(matches!(
        store.set(&long_key, b"v"),
        Err(StoreError::InvalidArgument(_))
    ));
    // максимально длинный ключ проходит
    let max_key = vec![b'k'; 255];
    store.set(&max_key, b"v")?;
    assert_eq!(store.get(&max_key)?, b"v");

    // отказ валидации ничего не записал
    assert_eq!(store.keys().len(), 1);
    Ok(())
}

#[test]
fn delete_missing_key_is_error() -> Result<()> {
    let path = unique_path("del-miss");
    let mut store = Store::open(&path)?;
    store.set(b"present", b"x")?;

    assert!(matches!(
        store.delete(b"absent"),
        Err(StoreError::KeyNotFound)
    ));
    // повторное удаление — тоже ошибка
    store.delete(b"present")?;
    assert!(matches!(
        store.delete(b"present"),
        Err(StoreError::KeyNotFound)
    ));
    Ok(())
}

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sdb-{}-{}-{}.kv", prefix, pid, t))
}
