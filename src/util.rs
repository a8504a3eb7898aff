//! Мелкие общие хелперы: текстовый/hex вывод значений, fsync каталога.

use std::path::Path;

/// Hex-представление байтов, 16 байт на строку.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        out.push_str(&line.join(" "));
    }
    out
}

/// Значение как текст, если это печатаемый UTF-8; иначе короткая пометка.
pub fn display_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') => s.to_string(),
        _ => format!("(binary {} B)", bytes.len()),
    }
}

/// fsync родительского каталога после rename (no-op вне unix).
#[cfg(unix)]
pub fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = std::fs::File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_lines() {
        assert_eq!(hex_dump(&[0x01, 0xab]), "01 ab");
        let d = hex_dump(&[0u8; 17]);
        assert_eq!(d.lines().count(), 2);
    }

    #[test]
    fn display_text_fallback() {
        assert_eq!(display_text(b"hello"), "hello");
        assert_eq!(display_text(&[0xff, 0x00]), "(binary 2 B)");
    }
}
