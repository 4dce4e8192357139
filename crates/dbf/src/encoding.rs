//! Text encoding resolution.
//!
//! A table's text is decoded with exactly one codec, chosen once when the
//! header is read: a declared codec (caller override or `.cpg` sidecar) wins
//! outright; otherwise the language driver byte is looked up, and if that
//! yields nothing usable the legacy fallback applies.

use encoding_rs::{Encoding, WINDOWS_1252};
use tracing::{debug, warn};

use crate::error::{DbfError, Result};

/// Resolves a codec label as written by users or `.cpg` files.
///
/// Accepts WHATWG labels (`"utf-8"`, `"windows-1251"`, `"cp1252"`), bare
/// code page numbers (`"1251"`) and the ESRI `"ANSI 1251"` form.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    let by_code_page = |cp: &str| {
        codepage::label_for_code_page(cp).and_then(|l| Encoding::for_label(l.as_bytes()))
    };

    Encoding::for_label(trimmed.as_bytes())
        .or_else(|| by_code_page(trimmed))
        .or_else(|| {
            trimmed
                .strip_prefix("ANSI ")
                .or_else(|| trimmed.strip_prefix("ansi "))
                .and_then(by_code_page)
        })
        .ok_or_else(|| DbfError::EncodingUnavailable(trimmed.to_string()))
}

/// Which codec a table uses, decided before any name or value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingPolicy {
    declared: Option<&'static Encoding>,
    fallback: &'static Encoding,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            declared: None,
            fallback: WINDOWS_1252,
        }
    }
}

impl EncodingPolicy {
    pub fn new(declared: Option<&'static Encoding>, fallback: &'static Encoding) -> Self {
        Self { declared, fallback }
    }

    /// Builds the policy from a session config and an optional sidecar
    /// declaration. The config override outranks the sidecar.
    ///
    /// # Errors
    ///
    /// [`DbfError::EncodingUnavailable`] when a declared label or the
    /// configured fallback cannot be resolved.
    pub fn from_config(config: &config::DbfConfig, sidecar: Option<&str>) -> Result<Self> {
        let declared = match config.encoding.as_deref().or(sidecar) {
            Some(label) => Some(encoding_for_label(label)?),
            None => None,
        };
        let fallback = encoding_for_label(&config.default_encoding)?;
        Ok(Self { declared, fallback })
    }

    #[must_use]
    pub fn declared(&self) -> Option<&'static Encoding> {
        self.declared
    }

    #[must_use]
    pub fn fallback(&self) -> &'static Encoding {
        self.fallback
    }

    /// Codec for a header created from scratch.
    #[must_use]
    pub fn for_new_header(&self) -> &'static Encoding {
        self.declared.unwrap_or(self.fallback)
    }

    /// Codec for a header whose language driver byte is `language_driver`.
    pub fn resolve(&self, language_driver: u8) -> &'static Encoding {
        if let Some(declared) = self.declared {
            return declared;
        }
        let Some(code_page) = codepage::lookup(language_driver) else {
            debug!(
                language_driver,
                fallback = self.fallback.name(),
                "no code page for language driver"
            );
            return self.fallback;
        };
        match codepage::label_for_code_page(code_page).and_then(|l| Encoding::for_label(l.as_bytes())) {
            Some(enc) => {
                debug!(language_driver, code_page, encoding = enc.name(), "encoding from language driver");
                enc
            }
            None => {
                warn!(
                    language_driver,
                    code_page,
                    fallback = self.fallback.name(),
                    "code page not available, using fallback encoding"
                );
                self.fallback
            }
        }
    }
}

/// Language driver byte that names `encoding`, or 0 when there is none.
pub(crate) fn language_driver_for(encoding: &'static Encoding) -> u8 {
    codepage::code_page_for_label(encoding.name())
        .and_then(codepage::language_driver_for)
        .unwrap_or(0)
}
