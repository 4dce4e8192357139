use crate::{ByteStream, DbfFile};
use dbf::{ColumnType, Header, Result};

/// Rows written by [`write_people`], as they read back.
pub const PEOPLE: [[&str; 6]; 3] = [
    ["Ada Lovelace", "36", "1200.50", "T", "18151210", "1"],
    ["Alan Turing", "41", "980.00", "F", "19120623", "-2"],
    ["Grace Hopper", "85", "15000.75", "?", "19061209", "2147483647"],
];

pub fn add_people_columns(header: &mut Header) -> Result<()> {
    header.add("NAME", ColumnType::Character, 20, 0)?;
    header.add("AGE", ColumnType::Number, 3, 0)?;
    header.add("SALARY", ColumnType::Number, 10, 2)?;
    header.add("ACTIVE", ColumnType::Boolean, 0, 0)?;
    header.add("HIRED", ColumnType::Date, 0, 0)?;
    header.add("ID", ColumnType::Integer, 0, 0)?;
    Ok(())
}

/// Adds the people columns to a fresh table and appends [`PEOPLE`].
pub fn write_people<S: ByteStream>(file: &mut DbfFile<S>) -> Result<()> {
    add_people_columns(file.header_mut())?;
    let mut record = file.new_record();
    for row in PEOPLE {
        for (i, value) in row.iter().enumerate() {
            record.set(i, value)?;
        }
        file.write_and_clear(&mut record)?;
    }
    Ok(())
}

pub fn people_header_length() -> u64 {
    33 + 32 * 6
}

pub fn people_record_length() -> u64 {
    1 + 20 + 3 + 10 + 1 + 8 + 4
}
