//! Tile spec grammar: `path@WIDTHxHEIGHT+XOFFSET+YOFFSET`.
//!
//! Delimiters are consumed in fixed order (`@`, `x`, `+`, `+`), each at its first occurrence in
//! the remaining text. There is no escaping, so the path cannot contain `@`. Every numeric field
//! must be a plain run of ASCII digits.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::foundation::core::TileRect;
use crate::foundation::error::{CollageError, CollageResult};

/// One parsed tile spec token: a source path and its target rectangle on the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSpec {
    pub source_path: PathBuf,
    pub rect: TileRect,
}

impl TileSpec {
    pub fn parse(token: &str) -> CollageResult<Self> {
        let (path, geometry) = split_field(token, '@', "path")?;
        let (width, rest) = split_field(geometry, 'x', "width")?;
        let (height, rest) = split_field(rest, '+', "height")?;
        let (x, y) = split_field(rest, '+', "x offset")?;

        let width = parse_field(token, "width", width)?;
        let height = parse_field(token, "height", height)?;
        let x = parse_field(token, "x offset", x)?;
        let y = parse_field(token, "y offset", y)?;

        let rect = TileRect::new(x, y, width, height).map_err(|e| match e {
            CollageError::MalformedSpec(msg) => {
                CollageError::malformed_spec(format!("'{token}': {msg}"))
            }
            other => other,
        })?;

        Ok(Self {
            source_path: PathBuf::from(path),
            rect,
        })
    }
}

impl FromStr for TileSpec {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}x{}+{}+{}",
            self.source_path.display(),
            self.rect.width,
            self.rect.height,
            self.rect.x,
            self.rect.y
        )
    }
}

/// Parse every token in order, failing on the first malformed one.
pub fn parse_tile_specs<S: AsRef<str>>(tokens: &[S]) -> CollageResult<Vec<TileSpec>> {
    tokens.iter().map(|t| TileSpec::parse(t.as_ref())).collect()
}

fn split_field<'a>(text: &'a str, delim: char, field: &str) -> CollageResult<(&'a str, &'a str)> {
    match text.split_once(delim) {
        Some((head, tail)) if !head.is_empty() && !tail.is_empty() => Ok((head, tail)),
        Some((head, _)) if head.is_empty() => Err(CollageError::malformed_spec(format!(
            "missing {field} before '{delim}' in '{text}'"
        ))),
        _ => Err(CollageError::malformed_spec(format!(
            "missing field after {field} in '{text}'"
        ))),
    }
}

fn parse_field(token: &str, field: &str, raw: &str) -> CollageResult<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CollageError::malformed_spec(format!(
            "'{token}': {field} '{raw}' is not a non-negative integer"
        )));
    }
    raw.parse::<u32>().map_err(|_| {
        CollageError::malformed_spec(format!("'{token}': {field} '{raw}' is out of range"))
    })
}
