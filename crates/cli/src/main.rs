//! # CLI - DBF table shell
//!
//! A REPL over one DBF file, fed from stdin. Pipe a script in or type at the
//! prompt.
//!
//! ## Commands
//!
//! ```text
//! INFO
//! COLUMNS
//! ADDCOL name type [len] [dec]
//! GET index
//! NEXT
//! SCAN
//! APPEND v1|v2|...
//! SET index column value
//! DELETE index
//! EXIT / QUIT
//! ```
//!
//! `ADDCOL` only works while the table is new: the first `APPEND` freezes
//! the column layout. Types are the
//! one-letter DBF tags (`C N F L D I`), and `len`/`dec` may be left out for
//! the fixed-width ones. Records print as `index: NAME=value | ...`, with a
//! leading `*` when marked deleted. `APPEND` values go in column order and
//! an empty slot leaves that field blank. `SET` takes a column name or
//! position. Leaving with `EXIT`, `QUIT` or end of input rewrites the header
//! if its record count changed.
//!
//! ## Configuration
//!
//! Everything comes from environment variables. `DBF_PATH` names the table
//! (default `table.dbf`) and `DBF_ACCESS` is `r` or `rw` (default `rw`; a
//! missing file is created). Codec settings such as `DBF_ENCODING` or
//! `DBF_ALLOW_STRING_TRUNCATE` are read by `DbfConfig::from_env`.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
//!
//! ## Example
//!
//! ```text
//! $ DBF_PATH=people.dbf cargo run -p cli
//! DBF shell (path=people.dbf, access=rw, columns=0, records=0, encoding=windows-1252)
//! > ADDCOL NAME C 20
//! OK
//! > APPEND Ada
//! OK 0
//! > GET 0
//! 0: NAME=Ada
//! > EXIT
//! bye
//! ```

mod shell;

use anyhow::{Context, Result};
use config::DbfConfig;
use session::{AccessMode, DbfFile};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let path = env_or("DBF_PATH", "table.dbf");
    let access: AccessMode = env_or("DBF_ACCESS", "rw").parse()?;
    let config = DbfConfig::from_env();

    let mut file = DbfFile::open(&path, access, &config)
        .with_context(|| format!("failed to open {}", path))?;
    tracing::debug!(path = %path, seekable = file.is_seekable(), "table opened");

    println!(
        "DBF shell (path={}, access={}, columns={}, records={}, encoding={})",
        path,
        if access == AccessMode::Read { "r" } else { "rw" },
        file.header().column_count(),
        file.record_count(),
        file.header().encoding().name()
    );
    println!("Commands: INFO | COLUMNS | ADDCOL name type [len] [dec]");
    println!("          GET index | NEXT | SCAN | APPEND v1|v2|...");
    println!("          SET index column value | DELETE index | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim_start();
        let (cmd, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));

        if !cmd.is_empty() {
            let result = match cmd.to_uppercase().as_str() {
                "INFO" => Ok(shell::info(&file)),
                "COLUMNS" => Ok(shell::columns(&file)),
                "ADDCOL" => shell::add_column(&mut file, rest),
                "GET" => shell::get(&mut file, rest),
                "NEXT" => shell::next(&mut file),
                "SCAN" => shell::scan(&mut file),
                "APPEND" => shell::append(&mut file, rest),
                "SET" => shell::set(&mut file, rest),
                "DELETE" => shell::delete(&mut file, rest),
                "EXIT" | "QUIT" => {
                    file.close()?;
                    println!("bye");
                    return Ok(());
                }
                other => Ok(format!("unknown command: {}", other)),
            };

            match result {
                Ok(output) => println!("{}", output),
                Err(e) => println!("ERR {} failed: {:#}", cmd.to_lowercase(), e),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    file.close()?;
    Ok(())
}
