use crate::address;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Marker line ending a trace.
pub const EOF_MARKER: &str = "#eof";

static ADDRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[xX]([0-9a-fA-F]{1,16})$").expect("valid address regex"));

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open trace file {path:?}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read line {line} of trace")]
    Read {
        line: usize,
        source: std::io::Error,
    },

    #[error("bad address {value:?} on line {line} of trace: expected 0x followed by up to 16 hex digits")]
    Address { line: usize, value: String },

    #[error("{value:?} is not a trace record")]
    Record { value: String },
}

/// A single memory access of a trace.
///
/// Trace records have the form `<label> <R|W> 0x<hex address>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Access {
    pub label: String,
    pub is_write: bool,
    pub address: address,
}

impl std::str::FromStr for Access {
    type Err = Error;

    /// Parses a single record. End of trace lines are rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_line(value, 1)?.ok_or_else(|| Error::Record {
            value: value.to_string(),
        })
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_write { 'W' } else { 'R' };
        write!(f, "{} {} 0x{:016x}", self.label, kind, self.address)
    }
}

pub fn parse_address(value: &str) -> Option<address> {
    let captures = ADDRESS_REGEX.captures(value)?;
    u64::from_str_radix(captures.get(1)?.as_str(), 16).ok()
}

/// Parses one line of a trace.
///
/// # Returns
/// `None` if the line ends the trace: the end marker, or any line with
/// fewer than three fields.
///
/// # Errors
/// If the address field is not a hex address.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<Access>, Error> {
    let mut fields = line.split_whitespace();
    let (Some(label), Some(kind), Some(addr)) = (fields.next(), fields.next(), fields.next())
    else {
        return Ok(None);
    };
    // the end marker ends the trace even when followed by other fields
    if label == EOF_MARKER {
        return Ok(None);
    }
    let address = parse_address(addr).ok_or_else(|| Error::Address {
        line: line_number,
        value: addr.to_string(),
    })?;
    Ok(Some(Access {
        label: label.to_string(),
        is_write: kind.starts_with('W'),
        address,
    }))
}

/// Iterator over the accesses of a trace.
///
/// Iteration stops at the end of input or at the first line that ends the
/// trace (see [`parse_line`]). Errors are yielded once, after which the
/// iterator is exhausted.
#[derive(Debug)]
pub struct Reader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
    done: bool,
}

impl<R> Reader<R>
where
    R: BufRead,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R> Iterator for Reader<R>
where
    R: BufRead,
{
    type Item = Result<Access, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(line) = self.lines.next() else {
            log::debug!("end of trace after {} lines", self.line_number);
            self.done = true;
            return None;
        };
        self.line_number += 1;
        let line = match line {
            Ok(line) => line,
            Err(source) => {
                self.done = true;
                return Some(Err(Error::Read {
                    line: self.line_number,
                    source,
                }));
            }
        };
        match parse_line(&line, self.line_number) {
            Ok(Some(access)) => Some(Ok(access)),
            Ok(None) => {
                log::debug!("trace ends at line {}: {:?}", self.line_number, line);
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Opens a trace file for reading.
///
/// # Errors
/// If the file cannot be opened.
pub fn open(path: impl AsRef<Path>) -> Result<Reader<std::io::BufReader<std::fs::File>>, Error> {
    let path = path.as_ref();
    let file = std::fs::OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|source| Error::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Reader::new(std::io::BufReader::new(file)))
}
