use super::sample_header;
use crate::*;
use chrono::NaiveDate;
use config::{DbfConfig, NullKind, NullValues, Truncation};
use std::io::Cursor;

const NAME: usize = 0;
const COUNT: usize = 1;
const PRICE: usize = 2;
const ACTIVE: usize = 3;
const BORN: usize = 4;
const ID: usize = 5;

fn sample_record() -> Result<Record> {
    let mut header = sample_header()?;
    Ok(Record::new(&mut header))
}

/// Raw bytes of column `index`.
fn field(record: &Record, index: usize) -> &[u8] {
    let col = record.column(index).expect("column");
    &record.raw()[col.data_address()..col.data_address() + col.length()]
}

// -------------------- Construction --------------------

#[test]
fn new_record_is_blank() -> Result<()> {
    let record = sample_record()?;
    assert_eq!(record.raw().len(), record.schema().record_length());
    assert!(record.raw().iter().all(|&b| b == b' '));
    assert!(!record.is_deleted());
    assert_eq!(record.record_index(), None);
    assert_eq!(record.truncation(), Truncation::default());
    Ok(())
}

#[test]
fn config_sets_truncation_and_nulls() -> Result<()> {
    let mut header = sample_header()?;
    let config = DbfConfig::default()
        .with_truncation(Truncation {
            allow_string: false,
            allow_decimal: true,
            allow_integer: true,
        })
        .with_null_values(NullValues::new().with(NullKind::Number, "-999"));
    let record = Record::with_config(&mut header, &config);
    assert!(!record.truncation().allow_string);
    assert!(record.truncation().allow_decimal);
    assert_eq!(record.null_values().get(NullKind::Number), Some("-999"));
    Ok(())
}

// -------------------- Character --------------------

#[test]
fn character_is_left_justified() -> Result<()> {
    let mut record = sample_record()?;
    record.set(NAME, "Ada")?;
    assert_eq!(field(&record, NAME), b"Ada                 ");
    assert_eq!(record.get(NAME)?, "Ada");
    Ok(())
}

#[test]
fn character_truncation_policy() -> Result<()> {
    let mut record = sample_record()?;
    let long = "abcdefghijklmnopqrstuvwxyz";

    record.set(NAME, long)?;
    assert_eq!(record.get(NAME)?, &long[..20]);

    record.set(NAME, "kept")?;
    record.truncation_mut().allow_string = false;
    assert!(matches!(
        record.set(NAME, long),
        Err(DbfError::TruncationRejected { .. })
    ));
    assert_eq!(record.get(NAME)?, "kept");
    Ok(())
}

#[test]
fn character_keeps_leading_spaces() -> Result<()> {
    let mut record = sample_record()?;
    record.set(NAME, "  indented")?;
    assert_eq!(record.get(NAME)?, "  indented");
    Ok(())
}

#[test]
fn character_uses_the_schema_encoding() -> Result<()> {
    let mut header = Header::new(encoding_rs::WINDOWS_1251);
    header.add("NAME", ColumnType::Character, 5, 0)?;
    let mut record = Record::new(&mut header);
    record.set(0, "Привет")?;
    assert_eq!(record.raw()[1], 0xCF);
    assert_eq!(record.get(0)?, "Приве");
    Ok(())
}

#[test]
fn wide_character_field() -> Result<()> {
    let mut header = Header::default();
    header.add("WIDE", ColumnType::Character, 300, 0)?;
    let mut record = Record::new(&mut header);
    let text = "x".repeat(299) + "y";
    record.set(0, &text)?;
    assert_eq!(record.get(0)?, text);
    Ok(())
}

// -------------------- Number --------------------

#[test]
fn whole_number_is_right_justified() -> Result<()> {
    let mut record = sample_record()?;
    record.set(COUNT, "42")?;
    assert_eq!(field(&record, COUNT), b"    42");
    assert_eq!(record.get(COUNT)?, "42");

    record.set(COUNT, "-17")?;
    assert_eq!(record.get(COUNT)?, "-17");
    Ok(())
}

#[test]
fn whole_number_overflow_rejected_by_default() -> Result<()> {
    let mut record = sample_record()?;
    record.set(COUNT, "1")?;
    assert!(matches!(
        record.set(COUNT, "1234567"),
        Err(DbfError::TruncationRejected { .. })
    ));
    assert_eq!(record.get(COUNT)?, "1");
    Ok(())
}

/// Known wart: overflow keeps the least significant digits, so the stored
/// number is silently wrong. Existing producers depend on it.
#[test]
fn whole_number_truncation_drops_leading_digits() -> Result<()> {
    let mut record = sample_record()?;
    record.truncation_mut().allow_integer = true;
    record.set(COUNT, "1234567")?;
    assert_eq!(record.get(COUNT)?, "234567");
    Ok(())
}

#[test]
fn decimal_layout() -> Result<()> {
    let mut record = sample_record()?;
    record.set(PRICE, "12.5")?;
    assert_eq!(field(&record, PRICE), b"     12.50");
    assert_eq!(record.get(PRICE)?, "12.50");

    record.set(PRICE, "7")?;
    assert_eq!(field(&record, PRICE), b"      7.00");
    Ok(())
}

#[test]
fn decimal_truncation_policy() -> Result<()> {
    let mut record = sample_record()?;
    assert!(matches!(
        record.set(PRICE, "123.456"),
        Err(DbfError::TruncationRejected { .. })
    ));

    record.truncation_mut().allow_decimal = true;
    record.set(PRICE, "123.456")?;
    assert_eq!(record.get(PRICE)?, "123.45");
    Ok(())
}

#[test]
fn decimal_integer_part_overflow() -> Result<()> {
    let mut record = sample_record()?;
    assert!(matches!(
        record.set(PRICE, "12345678.1"),
        Err(DbfError::TruncationRejected { .. })
    ));

    record.truncation_mut().allow_integer = true;
    record.set(PRICE, "12345678.1")?;
    assert_eq!(field(&record, PRICE), b"2345678.10");
    Ok(())
}

#[test]
fn numbers_reject_garbage() -> Result<()> {
    let mut record = sample_record()?;
    for bad in ["abc", "1.2.3", "-", "12a", "."] {
        assert!(
            matches!(record.set(COUNT, bad), Err(DbfError::InvalidValue { .. })),
            "{bad}"
        );
        assert!(
            matches!(record.set(PRICE, bad), Err(DbfError::InvalidValue { .. })),
            "{bad}"
        );
    }
    Ok(())
}

#[test]
fn float_is_encoded_like_number() -> Result<()> {
    let mut header = Header::default();
    header.add("F", ColumnType::Float, 8, 3)?;
    let mut record = Record::new(&mut header);
    record.set(0, "-1.5")?;
    assert_eq!(&record.raw()[1..], b"  -1.500");
    assert_eq!(record.get(0)?, "-1.500");
    Ok(())
}

// -------------------- Integer --------------------

#[test]
fn integer_is_little_endian_binary() -> Result<()> {
    let mut record = sample_record()?;
    record.set(ID, "-1")?;
    assert_eq!(field(&record, ID), &[0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(record.get(ID)?, "-1");

    record.set(ID, "258")?;
    assert_eq!(field(&record, ID), &[0x02, 0x01, 0x00, 0x00]);
    assert_eq!(record.get(ID)?, "258");
    Ok(())
}

#[test]
fn integer_rejects_out_of_range() -> Result<()> {
    let mut record = sample_record()?;
    assert!(matches!(
        record.set(ID, "2147483648"),
        Err(DbfError::InvalidValue { .. })
    ));
    assert!(matches!(record.set(ID, "1.5"), Err(DbfError::InvalidValue { .. })));
    Ok(())
}

// -------------------- Boolean --------------------

#[test]
fn boolean_tokens() -> Result<()> {
    let mut record = sample_record()?;
    for yes in ["yes", "Y", "1", "true", "TRUE", "t"] {
        record.set(ACTIVE, yes)?;
        assert_eq!(field(&record, ACTIVE), b"T", "{yes}");
    }
    for unknown in ["?", " "] {
        record.set(ACTIVE, unknown)?;
        assert_eq!(field(&record, ACTIVE), b"?", "{unknown:?}");
    }
    for no in ["no", "false", "0", "maybe", "F"] {
        record.set(ACTIVE, no)?;
        assert_eq!(field(&record, ACTIVE), b"F", "{no}");
    }
    assert_eq!(record.get(ACTIVE)?, "F");
    Ok(())
}

// -------------------- Date --------------------

#[test]
fn date_accepts_common_layouts() -> Result<()> {
    let mut record = sample_record()?;
    for input in ["20240315", "2024-03-15", "2024/03/15", "03/15/2024", "2024-03-15T08:30:00"] {
        record.set(BORN, input)?;
        assert_eq!(field(&record, BORN), b"20240315", "{input}");
    }
    assert_eq!(record.get(BORN)?, "20240315");
    Ok(())
}

#[test]
fn date_rejects_garbage() -> Result<()> {
    let mut record = sample_record()?;
    assert!(matches!(
        record.set(BORN, "not a date"),
        Err(DbfError::InvalidValue { .. })
    ));
    assert!(matches!(
        record.set(BORN, "20241301"),
        Err(DbfError::InvalidValue { .. })
    ));
    Ok(())
}

#[test]
fn typed_date_accessors() -> Result<()> {
    let mut record = sample_record()?;
    assert_eq!(record.get_date(BORN)?, None);

    let date = NaiveDate::from_ymd_opt(1999, 12, 31).expect("date");
    record.set_date(BORN, date)?;
    assert_eq!(record.get_date(BORN)?, Some(date));
    assert!(matches!(record.get_date(NAME), Err(DbfError::Unsupported(_))));
    Ok(())
}

// -------------------- Memo and Binary --------------------

#[test]
fn memo_is_unsupported() -> Result<()> {
    let mut header = Header::default();
    header.add("NOTES", ColumnType::Memo, 0, 0)?;
    let mut record = Record::new(&mut header);
    assert!(matches!(record.set(0, "text"), Err(DbfError::Unsupported(_))));
    assert!(matches!(record.set(0, ""), Err(DbfError::Unsupported(_))));
    assert!(matches!(record.get(0), Err(DbfError::Unsupported(_))));
    Ok(())
}

#[test]
fn binary_only_through_raw_accessors() -> Result<()> {
    let mut header = Header::default();
    header.add_column(Column::shape_field()?)?;
    let mut record = Record::new(&mut header);

    assert!(matches!(record.set(0, "x"), Err(DbfError::Unsupported(_))));
    assert!(matches!(record.get(0), Err(DbfError::Unsupported(_))));

    record.set_binary(0, &[0x7F, 0x01])?;
    assert_eq!(record.get_binary(0)?, &[0x7F]);
    record.set_binary(0, &[])?;
    assert_eq!(record.get_binary(0)?, b" ");
    Ok(())
}

// -------------------- Blank, clear, null --------------------

#[test]
fn empty_string_blanks_the_field() -> Result<()> {
    let mut record = sample_record()?;
    record.set(PRICE, "1.25")?;
    record.set(PRICE, "")?;
    assert_eq!(field(&record, PRICE), b"          ");
    assert_eq!(record.get(PRICE)?, "");
    Ok(())
}

#[test]
fn clear_resets_every_column() -> Result<()> {
    let mut record = sample_record()?;
    record.set(NAME, "Ada")?;
    record.set(COUNT, "3")?;
    record.set(PRICE, "9.99")?;
    record.set(ACTIVE, "y")?;
    record.set(BORN, "2001-01-01")?;
    record.set(ID, "7")?;
    record.set_deleted(true);
    record.set_record_index(Some(4));

    record.clear();
    assert_eq!(record.record_index(), None);
    assert!(!record.is_deleted());
    for i in 0..record.column_count() {
        assert_eq!(record.get(i)?, "", "column {i}");
    }

    record.clear();
    assert!(record.raw().iter().all(|&b| b == b' '));
    Ok(())
}

#[test]
fn null_sentinel_reads_as_empty() -> Result<()> {
    let mut record = sample_record()?;
    record.set_null_values(
        NullValues::new()
            .with(NullKind::Number, "-999")
            .with(NullKind::Character, "N/A")
            .with(NullKind::Integer, "-1"),
    );

    record.set_null(COUNT)?;
    assert_eq!(field(&record, COUNT), b"-999  ");
    assert_eq!(record.get(COUNT)?, "");

    record.set(COUNT, "-999")?;
    assert_eq!(record.get(COUNT)?, "");

    record.set_null(NAME)?;
    assert_eq!(record.get(NAME)?, "");

    record.set_null(ID)?;
    assert_eq!(field(&record, ID), &[0xFF; 4]);
    assert_eq!(record.get(ID)?, "");

    record.set_null(BORN)?;
    assert_eq!(field(&record, BORN), b"        ");
    Ok(())
}

#[test]
fn blank_integer_reads_as_empty() -> Result<()> {
    let record = sample_record()?;
    assert_eq!(record.get(ID)?, "");
    Ok(())
}

// -------------------- Names and bounds --------------------

#[test]
fn access_by_name() -> Result<()> {
    let mut record = sample_record()?;
    record.set_by_name("COUNT", "12")?;
    assert_eq!(record.get(COUNT)?, "12");
    assert_eq!(record.get_by_name("COUNT")?, "12");
    assert!(matches!(
        record.get_by_name("count"),
        Err(DbfError::UnknownColumn(_))
    ));
    Ok(())
}

#[test]
fn column_index_out_of_range() -> Result<()> {
    let mut record = sample_record()?;
    assert!(matches!(
        record.set(6, "x"),
        Err(DbfError::ColumnOutOfRange { index: 6, count: 6 })
    ));
    assert!(matches!(record.get(99), Err(DbfError::ColumnOutOfRange { .. })));
    Ok(())
}

// -------------------- Buffers --------------------

#[test]
fn deletion_flag_is_byte_zero() -> Result<()> {
    let mut record = sample_record()?;
    record.set_deleted(true);
    assert_eq!(record.raw()[0], DELETED_FLAG);
    assert!(record.is_deleted());
    record.set_deleted(false);
    assert_eq!(record.raw()[0], VALID_FLAG);
    Ok(())
}

#[test]
fn record_bytes_round_trip() -> Result<()> {
    let mut record = sample_record()?;
    record.set(NAME, "Grace")?;
    record.set(PRICE, "3.14")?;
    record.set(ID, "-42")?;

    let mut buf = Vec::new();
    record.write_to(&mut buf)?;
    assert_eq!(buf.len(), record.schema().record_length());

    let mut other = Record::from_schema(record.schema().clone());
    assert!(other.read_from(&mut Cursor::new(&buf))?);
    assert_eq!(other.get(NAME)?, "Grace");
    assert_eq!(other.get(PRICE)?, "3.14");
    assert_eq!(other.get(ID)?, "-42");
    Ok(())
}

#[test]
fn short_read_reports_end_of_data() -> Result<()> {
    let mut record = sample_record()?;
    record.set(NAME, "stale")?;
    let short = vec![b' '; record.schema().record_length() - 1];
    assert!(!record.read_from(&mut Cursor::new(short))?);
    assert_eq!(record.get(NAME)?, "");
    Ok(())
}

#[test]
fn compatibility_checks_shape_only() -> Result<()> {
    let record = sample_record()?;
    let mut same_shape = sample_header()?;
    record.ensure_compatible(&same_shape.lock())?;

    let mut other = Header::default();
    other.add("X", ColumnType::Character, 3, 0)?;
    assert!(matches!(
        record.ensure_compatible(&other.lock()),
        Err(DbfError::SchemaMismatch {
            expected_columns: 1,
            actual_columns: 6,
            ..
        })
    ));
    Ok(())
}

#[test]
fn display_shows_the_raw_row() -> Result<()> {
    let mut header = Header::default();
    header.add("A", ColumnType::Character, 3, 0)?;
    header.add("B", ColumnType::Number, 2, 0)?;
    let mut record = Record::new(&mut header);
    record.set(0, "ab")?;
    record.set(1, "5")?;
    assert_eq!(record.to_string(), " ab  5");
    Ok(())
}
