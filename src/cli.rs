use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::store::Store;
use crate::util::{display_text, hex_dump};
use crate::StoreError;

#[derive(Parser, Debug)]
#[command(
    name = "slotdb",
    version,
    about = "Single-file KV store with slot reuse and defragmentation",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Insert key/value (error if the key is already live)
    Set {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
        /// Value as a literal string (UTF-8); "hex:<hex>" decodes hex,
        /// "-" reads stdin. Ignored if --value-file is set.
        #[arg(long)]
        value: Option<String>,
        /// Read value bytes from a file
        #[arg(long)]
        value_file: Option<PathBuf>,
    },
    /// Get value by key
    Get {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
        /// Optional file to write raw value into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Quick existence check
    Has {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// Delete key (frees its slot, merging adjacent free slots)
    Del {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// Per-record table: address, state, key preview, sizes
    List {
        #[arg(long)]
        path: PathBuf,
    },
    /// Rewrite the file with live records only
    Defrag {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print occupancy statistics
    Stats {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Verify file structure without trusting the in-memory directory
    Check {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        // ------- операции над парами -------
        Cmd::Set {
            path,
            key,
            value,
            value_file,
        } => {
            let val = match (value, value_file) {
                (_, Some(p)) => std::fs::read(&p)
                    .with_context(|| format!("read value file {}", p.display()))?,
                (Some(s), None) => decode_value_arg(&s)?,
                (None, None) => {
                    return Err(anyhow!("either --value or --value-file must be provided"))
                }
            };
            let mut store = open_rw(&path)?;
            match store.set(key.as_bytes(), &val) {
                Ok(()) => println!(
                    "OK set: key='{}' ({} B), value={} B",
                    key,
                    key.as_bytes().len(),
                    val.len()
                ),
                Err(StoreError::KeyAlreadyExists) => {
                    println!("EXISTS '{}' (delete it first)", key)
                }
                Err(e) => return Err(e.into()),
            }
            store.close()?;
        }
        Cmd::Get { path, key, out } => {
            let mut store = open_ro(&path)?;
            match store.get(key.as_bytes()) {
                Ok(v) => {
                    if let Some(out_path) = out {
                        if let Some(parent) = out_path.parent() {
                            if !parent.as_os_str().is_empty() {
                                std::fs::create_dir_all(parent)?;
                            }
                        }
                        let mut f = OpenOptions::new()
                            .create(true)
                            .truncate(true)
                            .write(true)
                            .open(&out_path)?;
                        f.write_all(&v)?;
                        f.sync_all()?;
                        println!(
                            "FOUND '{}': {} B -> wrote to {}",
                            key,
                            v.len(),
                            out_path.display()
                        );
                    } else {
                        println!("FOUND '{}': {} B", key, v.len());
                        println!("text: {}", display_text(&v));
                        println!("hex:  {}", hex_dump(&v[..v.len().min(64)]));
                    }
                }
                Err(StoreError::KeyNotFound) => println!("NOT FOUND '{}'", key),
                Err(e) => return Err(e.into()),
            }
        }
        Cmd::Has { path, key } => {
            let store = open_ro(&path)?;
            if store.has(key.as_bytes()) {
                println!("FOUND '{}'", key);
            } else {
                println!("NOT FOUND '{}'", key);
            }
        }
        Cmd::Del { path, key } => {
            let mut store = open_rw(&path)?;
            match store.delete(key.as_bytes()) {
                Ok(()) => println!("DELETED '{}'", key),
                Err(StoreError::KeyNotFound) => println!("NOT FOUND '{}'", key),
                Err(e) => return Err(e.into()),
            }
            store.close()?;
        }

        // ------- обслуживание и отчёты -------
        Cmd::List { path } => {
            let store = open_ro(&path)?;
            let mut live = 0u64;
            for (_, r) in store.dir.scan() {
                if r.used {
                    live += 1;
                    println!(
                        "{:>10}  used  key='{}' ({} B), value={} B",
                        r.addr,
                        display_text(&r.key),
                        r.ksize,
                        r.vsize
                    );
                } else {
                    println!("{:>10}  free  slot of {} B", r.addr, r.size());
                }
            }
            println!("total: {} record(s), {} live", store.dir.len(), live);
        }
        Cmd::Defrag { path, json } => {
            let mut store = open_rw(&path)?;
            let sum = store.defragment()?;
            if json {
                println!("{}", serde_json::to_string(&sum)?);
            } else {
                println!("Defrag summary:");
                println!("  live_records    = {}", sum.live_records);
                println!("  dropped_records = {}", sum.dropped_records);
                println!("  bytes_before    = {}", sum.bytes_before);
                println!("  bytes_after     = {}", sum.bytes_after);
                println!("  reclaimed_bytes = {}", sum.reclaimed_bytes);
            }
            store.close()?;
        }
        Cmd::Stats { path, json } => {
            let store = open_ro(&path)?;
            let st = store.stats();
            if json {
                println!("{}", serde_json::to_string(&st)?);
            } else {
                println!("Store at {}", path.display());
                println!("  file_len        = {} B", st.file_len);
                println!("  logical_len     = {} B", st.logical_len);
                println!("  records         = {}", st.records);
                println!("  live_records    = {}", st.live_records);
                println!("  free_records    = {}", st.free_records);
                println!("  live_data_bytes = {} B", st.live_data_bytes);
                println!("  live_bytes      = {} B", st.live_bytes);
                println!("  free_bytes      = {} B", st.free_bytes);
                println!("  padding_bytes   = {} B", st.padding_bytes);
            }
        }
        Cmd::Check { path, json } => {
            let mut store = open_ro(&path)?;
            let rep = store.check()?;
            if json {
                println!("{}", serde_json::to_string(&rep)?);
            } else {
                println!("Check of {}:", path.display());
                println!("  file_len            = {} B", rep.file_len);
                println!("  records             = {}", rep.records);
                println!("  live_records        = {}", rep.live_records);
                println!("  free_records        = {}", rep.free_records);
                println!("  adjacent_free_pairs = {}", rep.adjacent_free_pairs);
                for e in &rep.errors {
                    println!("  ERROR: {}", e);
                }
            }
            if !rep.ok() {
                return Err(anyhow!("check found {} problem(s)", rep.errors.len()));
            }
        }
    }
    Ok(())
}

// ------- helpers -------

fn open_rw(path: &Path) -> Result<Store> {
    Store::open(path).with_context(|| format!("open store at {}", path.display()))
}

fn open_ro(path: &Path) -> Result<Store> {
    Store::open_ro(path).with_context(|| format!("open store read-only at {}", path.display()))
}

fn decode_value_arg(arg: &str) -> Result<Vec<u8>> {
    if arg == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    if let Some(hx) = arg.strip_prefix("hex:") {
        return decode_hex(hx);
    }
    Ok(arg.as_bytes().to_vec())
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(anyhow!("hex string must have even length"));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for i in (0..bytes.len()).step_by(2) {
        let h = (bytes[i] as char)
            .to_digit(16)
            .ok_or_else(|| anyhow!("invalid hex at pos {}", i))?;
        let l = (bytes[i + 1] as char)
            .to_digit(16)
            .ok_or_else(|| anyhow!("invalid hex at pos {}", i + 1))?;
        out.push(((h << 4) | l) as u8);
    }
    Ok(out)
}
