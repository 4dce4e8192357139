//! # Codepage - language drivers and `.cpg` sidecars
//!
//! Two small collaborators the DBF codec consults when it has to decide how
//! text bytes are encoded:
//!
//! - a static table mapping the header's **language driver byte** (offset 29)
//!   to a DOS/Windows code page, plus the WHATWG codec label for the code
//!   pages a modern runtime can actually decode;
//! - discovery and reading of a `<table>.cpg` **sidecar**, a one-line text
//!   file next to the `.dbf` that declares the encoding explicitly.
//!
//! ```rust
//! assert_eq!(codepage::lookup(0x57), Some("1252"));
//! assert_eq!(codepage::label_for_code_page("1252"), Some("windows-1252"));
//! assert_eq!(codepage::language_driver_for("1251"), Some(0xC9));
//! ```

mod sidecar;

pub use sidecar::{find_sidecar, read_declared_encoding, SIDECAR_EXTENSION};

/// One row of the language driver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDriver {
    pub id: u8,
    pub code_page: &'static str,
    pub description: &'static str,
}

const fn driver(id: u8, code_page: &'static str, description: &'static str) -> LanguageDriver {
    LanguageDriver {
        id,
        code_page,
        description,
    }
}

/// Language driver byte → code page, in the order producers usually emit them.
///
/// When several bytes share a code page, the first row wins for reverse lookups.
pub static LANGUAGE_DRIVERS: &[LanguageDriver] = &[
    driver(0x01, "437", "U.S. MS-DOS"),
    driver(0x02, "850", "International MS-DOS"),
    driver(0x03, "1252", "Windows ANSI"),
    driver(0x08, "865", "Danish OEM"),
    driver(0x09, "437", "Dutch OEM"),
    driver(0x0A, "850", "Dutch OEM*"),
    driver(0x0B, "437", "Finnish OEM"),
    driver(0x0D, "437", "French OEM"),
    driver(0x0E, "850", "French OEM*"),
    driver(0x0F, "437", "German OEM"),
    driver(0x10, "850", "German OEM*"),
    driver(0x11, "437", "Italian OEM"),
    driver(0x12, "850", "Italian OEM*"),
    driver(0x13, "932", "Japanese Shift-JIS"),
    driver(0x14, "850", "Spanish OEM*"),
    driver(0x15, "437", "Swedish OEM"),
    driver(0x16, "850", "Swedish OEM*"),
    driver(0x17, "865", "Norwegian OEM"),
    driver(0x18, "437", "Spanish OEM"),
    driver(0x19, "437", "English OEM (Britain)"),
    driver(0x1A, "850", "English OEM (Britain)*"),
    driver(0x1B, "437", "English OEM (U.S.)"),
    driver(0x1C, "863", "French OEM (Canada)"),
    driver(0x1D, "850", "French OEM*"),
    driver(0x1F, "852", "Czech OEM"),
    driver(0x22, "852", "Hungarian OEM"),
    driver(0x23, "852", "Polish OEM"),
    driver(0x24, "860", "Portuguese OEM"),
    driver(0x25, "850", "Portuguese OEM*"),
    driver(0x26, "866", "Russian OEM"),
    driver(0x37, "850", "English OEM (U.S.)*"),
    driver(0x40, "852", "Romanian OEM"),
    driver(0x4D, "936", "Chinese GBK (PRC)"),
    driver(0x4E, "949", "Korean (ANSI/OEM)"),
    driver(0x4F, "950", "Chinese Big 5 (Taiwan)"),
    driver(0x50, "874", "Thai (ANSI/OEM)"),
    driver(0x57, "1252", "ANSI"),
    driver(0x58, "1252", "Western European ANSI"),
    driver(0x59, "1252", "Spanish ANSI"),
    driver(0x64, "852", "Eastern European MS-DOS"),
    driver(0x65, "866", "Russian MS-DOS"),
    driver(0x66, "865", "Nordic MS-DOS"),
    driver(0x67, "861", "Icelandic MS-DOS"),
    driver(0x6A, "737", "Greek MS-DOS (437G)"),
    driver(0x6B, "857", "Turkish MS-DOS"),
    driver(0x6C, "863", "French-Canadian MS-DOS"),
    driver(0x78, "950", "Taiwan Big 5"),
    driver(0x79, "949", "Hangul (Wansung)"),
    driver(0x7A, "936", "PRC GBK"),
    driver(0x7B, "932", "Japanese Shift-JIS"),
    driver(0x7C, "874", "Thai Windows/MS-DOS"),
    driver(0x86, "737", "Greek OEM"),
    driver(0x87, "852", "Slovenian OEM"),
    driver(0x88, "857", "Turkish OEM"),
    driver(0xC8, "1250", "Eastern European Windows"),
    driver(0xC9, "1251", "Russian Windows"),
    driver(0xCA, "1254", "Turkish Windows"),
    driver(0xCB, "1253", "Greek Windows"),
    driver(0xCC, "1257", "Baltic Windows"),
];

/// Returns the code page recorded for a language driver byte, if known.
#[must_use]
pub fn lookup(language_driver: u8) -> Option<&'static str> {
    LANGUAGE_DRIVERS
        .iter()
        .find(|d| d.id == language_driver)
        .map(|d| d.code_page)
}

/// Returns the full table row for a language driver byte.
#[must_use]
pub fn describe(language_driver: u8) -> Option<&'static LanguageDriver> {
    LANGUAGE_DRIVERS.iter().find(|d| d.id == language_driver)
}

/// Reverse lookup: the first language driver byte recorded for `code_page`.
#[must_use]
pub fn language_driver_for(code_page: &str) -> Option<u8> {
    LANGUAGE_DRIVERS
        .iter()
        .find(|d| d.code_page == code_page)
        .map(|d| d.id)
}

/// Maps a numeric code page to the WHATWG label of a decoder for it.
///
/// Returns `None` for the DOS code pages (437, 850, 852, ...) that have no
/// WHATWG encoding; callers treat those as unavailable.
#[must_use]
pub fn label_for_code_page(code_page: &str) -> Option<&'static str> {
    let label = match code_page.trim() {
        "866" => "ibm866",
        "874" => "windows-874",
        "932" => "shift_jis",
        "936" => "gbk",
        "949" => "euc-kr",
        "950" => "big5",
        "1250" => "windows-1250",
        "1251" => "windows-1251",
        "1252" => "windows-1252",
        "1253" => "windows-1253",
        "1254" => "windows-1254",
        "1255" => "windows-1255",
        "1256" => "windows-1256",
        "1257" => "windows-1257",
        "1258" => "windows-1258",
        "65001" => "utf-8",
        _ => return None,
    };
    Some(label)
}

/// Maps a WHATWG label back to its numeric code page, for choosing the
/// language driver byte of a new header.
#[must_use]
pub fn code_page_for_label(label: &str) -> Option<&'static str> {
    let cp = match label.trim().to_ascii_lowercase().as_str() {
        "ibm866" => "866",
        "windows-874" => "874",
        "shift_jis" => "932",
        "gbk" => "936",
        "euc-kr" => "949",
        "big5" => "950",
        "windows-1250" => "1250",
        "windows-1251" => "1251",
        "windows-1252" => "1252",
        "windows-1253" => "1253",
        "windows-1254" => "1254",
        "windows-1257" => "1257",
        _ => return None,
    };
    Some(cp)
}
