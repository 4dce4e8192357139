//! Command handlers. Each returns the text to print.

use anyhow::{anyhow, bail, Context, Result};
use dbf::{ColumnType, Record};
use session::{ByteStream, DbfFile};

pub fn info<S: ByteStream>(file: &DbfFile<S>) -> String {
    let header = file.header();
    let driver = header.language_driver();
    let driver_text = match codepage::describe(driver) {
        Some(d) => format!("{:#04x} ({}, code page {})", driver, d.description, d.code_page),
        None => format!("{:#04x}", driver),
    };
    let stamp = header.last_update();
    format!(
        "records={} columns={} header_length={} record_length={} encoding={} \
         language_driver={} last_update={:04}-{:02}-{:02} locked={}",
        header.record_count(),
        header.column_count(),
        header.header_length(),
        header.record_length(),
        header.encoding().name(),
        driver_text,
        stamp.year(),
        stamp.month,
        stamp.day,
        header.is_locked()
    )
}

pub fn columns<S: ByteStream>(file: &DbfFile<S>) -> String {
    let header = file.header();
    if header.column_count() == 0 {
        return "(no columns)".to_string();
    }
    header
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{} {} {} {} {} @{}",
                i,
                c.name(),
                c.column_type(),
                c.length(),
                c.decimal_count(),
                c.data_address()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn add_column<S: ByteStream>(file: &mut DbfFile<S>, args: &str) -> Result<String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (name, ty) = match parts.as_slice() {
        [name, ty, ..] => (*name, parse_column_type(ty)?),
        _ => bail!("usage: ADDCOL name type [len] [dec]"),
    };
    let length = parse_number(parts.get(2), "length")?;
    let decimals = parse_number(parts.get(3), "decimal count")?;

    if ty.fixed_length().is_none() && length == 0 {
        bail!("{} columns need a length", ty);
    }
    file.header_mut().add(name, ty, length, decimals)?;
    Ok("OK".to_string())
}

pub fn get<S: ByteStream>(file: &mut DbfFile<S>, args: &str) -> Result<String> {
    let index = parse_index(args)?;
    if !file.header().is_locked() {
        return Ok("(nil)".to_string());
    }
    let mut record = file.new_record();
    if !file.read(index, &mut record)? {
        return Ok("(nil)".to_string());
    }
    render(&record)
}

pub fn next<S: ByteStream>(file: &mut DbfFile<S>) -> Result<String> {
    if !file.header().is_locked() {
        return Ok("(nil)".to_string());
    }
    let mut record = file.new_record();
    if !file.read_next(&mut record)? {
        return Ok("(nil)".to_string());
    }
    render(&record)
}

pub fn scan<S: ByteStream>(file: &mut DbfFile<S>) -> Result<String> {
    if !file.header().is_locked() {
        return Ok("(empty)".to_string());
    }
    let mut record = file.new_record();
    let mut lines = Vec::new();
    let mut index = 0;
    while file.read(index, &mut record)? {
        lines.push(render(&record)?);
        index += 1;
    }
    if lines.is_empty() {
        return Ok("(empty)".to_string());
    }
    lines.push(format!("({} records)", lines.len()));
    Ok(lines.join("\n"))
}

pub fn append<S: ByteStream>(file: &mut DbfFile<S>, args: &str) -> Result<String> {
    if file.header().column_count() == 0 {
        bail!("table has no columns; use ADDCOL first");
    }
    let values: Vec<&str> = args.split('|').map(str::trim).collect();
    if values.len() > file.header().column_count() {
        bail!(
            "{} values for {} columns",
            values.len(),
            file.header().column_count()
        );
    }

    let mut record = file.new_record();
    for (i, value) in values.iter().enumerate() {
        record
            .set(i, value)
            .with_context(|| format!("column {}", i))?;
    }
    file.write(&mut record)?;
    let index = record
        .record_index()
        .ok_or_else(|| anyhow!("record was not assigned an index"))?;
    Ok(format!("OK {}", index))
}

pub fn set<S: ByteStream>(file: &mut DbfFile<S>, args: &str) -> Result<String> {
    let mut parts = args.trim_start().splitn(3, char::is_whitespace);
    let (index, column, value) = match (parts.next(), parts.next()) {
        (Some(i), Some(c)) if !i.is_empty() => (parse_index(i)?, c, parts.next().unwrap_or("")),
        _ => bail!("usage: SET index column value"),
    };

    let mut record = load(file, index)?;
    let col = resolve_column(&record, column)?;
    record.set(col, value.trim())?;
    file.update(&record)?;
    Ok("OK".to_string())
}

pub fn delete<S: ByteStream>(file: &mut DbfFile<S>, args: &str) -> Result<String> {
    let index = parse_index(args)?;
    let mut record = load(file, index)?;
    record.set_deleted(true);
    file.update(&record)?;
    Ok("OK".to_string())
}

fn load<S: ByteStream>(file: &mut DbfFile<S>, index: u64) -> Result<Record> {
    if !file.header().is_locked() {
        bail!("record {} does not exist", index);
    }
    let mut record = file.new_record();
    if !file.read(index, &mut record)? {
        bail!("record {} does not exist", index);
    }
    Ok(record)
}

/// `index: NAME=value | ...`, with `*` before the index of a deleted record.
fn render(record: &Record) -> Result<String> {
    let mut fields = Vec::with_capacity(record.column_count());
    for (i, column) in record.schema().columns().iter().enumerate() {
        let value = match column.column_type() {
            ColumnType::Memo => "<memo>".to_string(),
            ColumnType::Binary => format!("<{} bytes>", record.get_binary(i)?.len()),
            _ => record.get(i)?,
        };
        fields.push(format!("{}={}", column.name(), value));
    }
    let index = record
        .record_index()
        .map(|i| i.to_string())
        .unwrap_or_else(|| "?".to_string());
    let flag = if record.is_deleted() { "*" } else { "" };
    Ok(format!("{}{}: {}", flag, index, fields.join(" | ")))
}

/// Column by name first, then by position.
fn resolve_column(record: &Record, column: &str) -> Result<usize> {
    if let Some(i) = record.find_column(column) {
        return Ok(i);
    }
    let i: usize = column
        .parse()
        .map_err(|_| anyhow!("no column named '{}'", column))?;
    if i >= record.column_count() {
        bail!("column {} out of range", i);
    }
    Ok(i)
}

fn parse_column_type(s: &str) -> Result<ColumnType> {
    let ty = match s.to_ascii_lowercase().as_str() {
        "character" | "char" | "string" => ColumnType::Character,
        "number" | "numeric" => ColumnType::Number,
        "boolean" | "bool" | "logical" => ColumnType::Boolean,
        "date" => ColumnType::Date,
        "memo" => ColumnType::Memo,
        "binary" => ColumnType::Binary,
        "integer" | "int" => ColumnType::Integer,
        "float" => ColumnType::Float,
        other if other.len() == 1 => ColumnType::from_tag(other.as_bytes()[0])
            .ok_or_else(|| anyhow!("unknown column type '{}'", s))?,
        _ => bail!("unknown column type '{}'", s),
    };
    Ok(ty)
}

fn parse_number(arg: Option<&&str>, what: &str) -> Result<usize> {
    match arg {
        Some(s) => s
            .parse()
            .with_context(|| format!("invalid {} '{}'", what, s)),
        None => Ok(0),
    }
}

fn parse_index(arg: &str) -> Result<u64> {
    let arg = arg.trim();
    if arg.is_empty() {
        bail!("missing record index");
    }
    arg.parse()
        .with_context(|| format!("invalid record index '{}'", arg))
}
