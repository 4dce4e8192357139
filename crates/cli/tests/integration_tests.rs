/// Integration tests for the DBF shell.
/// Tests cover: schema creation, appends, reads, updates, deletes, reopening, read-only mode, errors
use std::path::Path;
use tempfile::tempdir;

/// Helper to run CLI commands against `table` and capture stdout
fn run_cli_command(table: &Path, access: &str, command: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "cli", "--"])
        .env("DBF_PATH", table.to_str().unwrap())
        .env("DBF_ACCESS", access)
        .env_remove("DBF_ENCODING")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(command.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

const PEOPLE_SCHEMA: &str = "ADDCOL NAME C 20\nADDCOL AGE N 3\nADDCOL SALARY N 10 2\nADDCOL HIRED D\n";

#[test]
fn test_create_append_get() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("people.dbf");

    let commands = format!(
        "{}APPEND Ada Lovelace|36|1200.5|1842-01-01\nGET 0\n",
        PEOPLE_SCHEMA
    );
    let output = run_cli_command(&table, "rw", &commands);

    assert!(output.contains("OK 0"));
    assert!(output.contains("0: NAME=Ada Lovelace | AGE=36 | SALARY=1200.50 | HIRED=18420101"));
    assert!(output.contains("bye"));
}

#[test]
fn test_columns_and_info() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("info.dbf");

    let commands = format!("{}COLUMNS\nINFO\n", PEOPLE_SCHEMA);
    let output = run_cli_command(&table, "rw", &commands);

    assert!(output.contains("0 NAME C 20 0 @1"));
    assert!(output.contains("2 SALARY N 10 2 @24"));
    assert!(output.contains("3 HIRED D 8 0 @34"));
    assert!(output.contains("columns=4 header_length=161 record_length=42"));
    assert!(output.contains("encoding=windows-1252"));
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("reopen.dbf");

    let commands = format!(
        "{}APPEND Ada|36\nAPPEND Alan|41\nAPPEND Grace|85\n",
        PEOPLE_SCHEMA
    );
    run_cli_command(&table, "rw", &commands);

    let output = run_cli_command(&table, "r", "INFO\nSCAN\n");
    assert!(output.contains("records=3"));
    assert!(output.contains("0: NAME=Ada"));
    assert!(output.contains("2: NAME=Grace"));
    assert!(output.contains("(3 records)"));

    let bytes = std::fs::read(&table).unwrap();
    assert_eq!(bytes[0], 0x03);
    assert_eq!(*bytes.last().unwrap(), 0x1A);
    assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 3);
}

#[test]
fn test_next_walks_records() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("next.dbf");
    run_cli_command(&table, "rw", "ADDCOL N C 5\nAPPEND a\nAPPEND b\n");

    let output = run_cli_command(&table, "r", "NEXT\nNEXT\nNEXT\n");
    assert!(output.contains("0: N=a"));
    assert!(output.contains("1: N=b"));
    assert!(output.contains("(nil)"));
}

#[test]
fn test_set_and_delete() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("edit.dbf");

    let commands = format!(
        "{}APPEND Ada|36\nAPPEND Alan|41\nSET 1 AGE 42\nSET 0 NAME Ada King\nDELETE 0\n",
        PEOPLE_SCHEMA
    );
    let output = run_cli_command(&table, "rw", &commands);
    assert!(!output.contains("ERR"), "{}", output);

    let output = run_cli_command(&table, "r", "GET 0\nGET 1\n");
    assert!(output.contains("*0: NAME=Ada King"));
    assert!(output.contains("1: NAME=Alan | AGE=42"));
}

#[test]
fn test_locked_schema_rejects_addcol() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("locked.dbf");

    let output = run_cli_command(&table, "rw", "ADDCOL A C 3\nAPPEND x\nADDCOL B C 3\n");
    assert!(output.contains("ERR addcol failed"));
    assert!(output.contains("locked"));
}

#[test]
fn test_read_only_mode() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("ro.dbf");
    run_cli_command(&table, "rw", "ADDCOL A C 3\nAPPEND x\n");

    let output = run_cli_command(&table, "r", "APPEND y\nDELETE 0\n");
    assert!(output.contains("ERR append failed: table is opened read-only"));
    assert!(output.contains("ERR delete failed"));
}

#[test]
fn test_value_errors_are_reported() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("errors.dbf");

    let commands = format!(
        "{}APPEND Ada|1234\nAPPEND Ada|36|1.234\nAPPEND Ada|36|1|someday\nGET 9\nFROB\n",
        PEOPLE_SCHEMA
    );
    let output = run_cli_command(&table, "rw", &commands);

    assert!(output.contains("would be truncated"));
    assert!(output.contains("invalid value"));
    assert!(output.contains("(nil)"));
    assert!(output.contains("unknown command: FROB"));
}

#[test]
fn test_empty_table() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("empty.dbf");

    let output = run_cli_command(&table, "rw", "COLUMNS\nSCAN\nGET 0\nAPPEND x\n");
    assert!(output.contains("(no columns)"));
    assert!(output.contains("(empty)"));
    assert!(output.contains("(nil)"));
    assert!(output.contains("ERR append failed: table has no columns"));
}
