//! # CLI - CaskKV Interactive Shell
//!
//! A REPL-style command-line interface for the CaskKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! ROTATE             Seal the active log into a numbered segment
//! DUMP               Print the active index as hash -> offset pairs
//! STATS              Print engine debug info
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! CASK_DIR           Database directory            (default: "data")
//! CASK_ROTATE_KB     Auto-rotation threshold, KiB  (default: 0 = manual)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! CaskKV started (dir=data, segments=0, rotate=manual)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > ROTATE
//! OK (1 sealed segments)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use engine::Engine;
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn prompt() {
    print!("> ");
    io::stdout().flush().ok();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let dir = env_or("CASK_DIR", "data");
    let rotate_kb: u64 = env_or("CASK_ROTATE_KB", "0").parse().unwrap_or(0);

    let mut db = Engine::open(&dir)?;
    db.set_rotate_threshold(rotate_kb * 1024);

    println!(
        "CaskKV started (dir={}, segments={}, rotate={})",
        dir,
        db.sealed_count(),
        if rotate_kb == 0 {
            "manual".to_string()
        } else {
            format!("{}KiB", rotate_kb)
        }
    );
    println!("Commands: SET key value | GET key | ROTATE | DUMP | STATS | EXIT");
    prompt();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match db.put_str(k, &v) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match db.get(k.as_bytes()) {
                            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "ROTATE" => match db.rotate() {
                    Ok(()) => println!("OK ({} sealed segments)", db.sealed_count()),
                    Err(e) => println!("ERR rotate failed: {}", e),
                },
                "DUMP" => {
                    let mut n = 0usize;
                    for (hash, offset) in db.dump_index() {
                        println!("{:#010x} -> {}", hash, offset);
                        n += 1;
                    }
                    println!("({} entries)", n);
                }
                "STATS" => println!("{:?}", db),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("ERR unknown command: {}", other),
            }
        }
        prompt();
    }

    db.close();
    Ok(())
}
