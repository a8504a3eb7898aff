//! Слияние свободных слотов при delete: сосед справа вливается в
//! освобождаемый, затем всё вместе — в свободного соседа слева.
//! Записи с 1-байтовым ключом и 10-байтовым значением занимают по 18 байт.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use SlotDB::store::Store;

#[test]
fn delete_absorbs_free_successor() -> Result<()> {
    let path = unique_path("next");
    let mut store = Store::open(&path)?;
    store.set(b"a", &[0x11; 10])?;
    store.set(b"b", &[0x22; 10])?;
    store.set(b"c", &[0x33; 10])?;

    // 1) b свободен, затем освобождаем a: a поглощает b
    store.delete(b"b")?;
    store.delete(b"a")?;

    let recs: Vec<(u64, bool, u64)> = store
        .dir
        .scan()
        .map(|(_, r)| (r.addr, r.used, r.size()))
        .collect();
    // extent слитого слота: 12 + запись b целиком (18) = 30
    assert_eq!(recs, vec![(0, false, 30), (36, true, 12)]);
    assert_eq!(fs::metadata(&path)?.len(), 54);

    // 2) слитый слот переиспользуется точным совпадением: data 1+24=25 -> 30
    store.set(b"d", &[0x44; 24])?;
    assert_eq!(fs::metadata(&path)?.len(), 54);
    assert_eq!(store.get(b"d")?, vec![0x44; 24]);
    assert_eq!(store.get(b"c")?, vec![0x33; 10]);
    Ok(())
}

#[test]
fn delete_is_absorbed_by_free_predecessor() -> Result<()> {
    let path = unique_path("prev");
    let mut store = Store::open(&path)?;
    store.set(b"a", &[0x11; 10])?;
    store.set(b"b", &[0x22; 10])?;
    store.set(b"c", &[0x33; 10])?;

    // a свободен, затем освобождаем b: b вливается в a
    store.delete(b"a")?;
    store.delete(b"b")?;

    let recs: Vec<(u64, bool, u64)> = store
        .dir
        .scan()
        .map(|(_, r)| (r.addr, r.used, r.size()))
        .collect();
    assert_eq!(recs, vec![(0, false, 30), (36, true, 12)]);

    let rep = store.check()?;
    assert!(rep.ok(), "{:?}", rep.errors);
    assert_eq!(rep.adjacent_free_pairs, 0);
    Ok(())
}

#[test]
fn delete_merges_both_neighbors() -> Result<()> {
    let path = unique_path("both");
    let mut store = Store::open(&path)?;
    store.set(b"a", &[0x11; 10])?;
    store.set(b"b", &[0x22; 10])?;
    store.set(b"c", &[0x33; 10])?;
    store.set(b"d", &[0x44; 10])?;

    // свободные края, затем середина: один слот на три записи
    store.delete(b"a")?;
    store.delete(b"c")?;
    store.delete(b"b")?;

    let recs: Vec<(u64, bool, u64)> = store
        .dir
        .scan()
        .map(|(_, r)| (r.addr, r.used, r.size()))
        .collect();
    // 12 + 18 (b) + 18 (c) = 48
    assert_eq!(recs, vec![(0, false, 48), (54, true, 12)]);
    assert_eq!(fs::metadata(&path)?.len(), 72);
    assert_eq!(store.get(b"d")?, vec![0x44; 10]);

    let st = store.stats();
    assert_eq!(st.records, 2);
    assert_eq!(st.free_records, 1);
    assert_eq!(st.free_bytes, 54);

    // и снова точное переиспользование: data 1+46=47 -> 48
    store.set(b"e", &[0x55; 46])?;
    assert_eq!(fs::metadata(&path)?.len(), 72);
    assert_eq!(
        store.dir.head().map(|i| store.dir.rec(i).key.clone()),
        Some(b"e".to_vec())
    );
    Ok(())
}

#[test]
fn far_apart_free_slots_stay_separate() -> Result<()> {
    let path = unique_path("apart");
    let mut store = Store::open(&path)?;
    store.set(b"a", &[0x11; 10])?;
    store.set(b"b", &[0x22; 10])?;
    store.set(b"c", &[0x33; 10])?;

    // a и c не соседствуют: слияния нет
    store.delete(b"a")?;
    store.delete(b"c")?;

    let st = store.stats();
    assert_eq!(st.records, 3);
    assert_eq!(st.free_records, 2);

    let rep = store.check()?;
    assert!(rep.ok(), "{:?}", rep.errors);
    assert_eq!(rep.adjacent_free_pairs, 0); // между ними живая b
    Ok(())
}

#[test]
fn delete_never_changes_file_length() -> Result<()> {
    let path = unique_path("len");
    let mut store = Store::open(&path)?;
    for (k, vlen) in [(&b"k1"[..], 5usize), (b"k2", 64), (b"k3", 0), (b"k4", 200)] {
        store.set(k, &vec![0x66; vlen])?;
    }
    let len = fs::metadata(&path)?.len();

    for k in [&b"k2"[..], b"k1", b"k4", b"k3"] {
        store.delete(k)?;
        assert_eq!(fs::metadata(&path)?.len(), len);
    }

    // всё слилось в один свободный слот на весь файл
    let recs: Vec<(u64, bool, u64)> = store
        .dir
        .scan()
        .map(|(_, r)| (r.addr, r.used, r.footprint()))
        .collect();
    assert_eq!(recs, vec![(0, false, len)]);
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
