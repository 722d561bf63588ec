//! Derives versioned object keys from base file names.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};
use ulid::{Generator, Ulid};

/// Process-wide id source. Monotonic, so ids drawn within the same
/// millisecond still differ and keep their order.
static GENERATOR: Lazy<Mutex<Generator>> = Lazy::new(|| Mutex::new(Generator::new()));

/// Draw a fresh, time-ordered identifier.
pub fn unique_id() -> Result<Ulid, ConfigError> {
    GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate()
        .map_err(|_| ConfigError::IdExhausted)
}

/// Split a base file name into its stem and extension. A name with a
/// single dot is split there as is, even when either side is empty.
/// With several dots the extension is whatever follows the last one,
/// so `build.tar.gz` yields `build.tar` and `gz`.
pub fn split_name(base: &str) -> Result<(&str, &str), ConfigError> {
    let invalid = |reason| ConfigError::InvalidFileName {
        name: String::from(base),
        reason,
    };
    let (stem, extension) = base
        .rsplit_once('.')
        .ok_or_else(|| invalid("expected an extension"))?;
    if !stem.contains('.') {
        return Ok((stem, extension));
    }
    if extension.is_empty() {
        return Err(invalid("extension is empty"));
    }
    if extension.contains('/') {
        return Err(invalid("expected an extension"));
    }
    if stem.rsplit('/').next().unwrap_or_default().is_empty() {
        return Err(invalid("name before the extension is empty"));
    }
    Ok((stem, extension))
}

fn compose(stem: &str, id: impl Display, extension: &str) -> String {
    format!("{}-{}.{}", stem, id, extension)
}

/// Produce `{stem}-{id}.{extension}` with a fresh unique id.
pub fn versioned_name(base: &str) -> Result<String, ConfigError> {
    let (stem, extension) = split_name(base)?;
    Ok(compose(stem, unique_id()?, extension))
}
