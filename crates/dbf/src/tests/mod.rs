mod record_tests;

use crate::{ColumnType, Header, Result};

/// Header with one column of every text-encoded type plus an Integer.
pub(crate) fn sample_header() -> Result<Header> {
    let mut header = Header::default();
    header.add("NAME", ColumnType::Character, 20, 0)?;
    header.add("COUNT", ColumnType::Number, 6, 0)?;
    header.add("PRICE", ColumnType::Number, 10, 2)?;
    header.add("ACTIVE", ColumnType::Boolean, 0, 0)?;
    header.add("BORN", ColumnType::Date, 0, 0)?;
    header.add("ID", ColumnType::Integer, 0, 0)?;
    Ok(header)
}
