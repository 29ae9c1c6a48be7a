use std::fmt;
use std::io::{BufRead, Lines};
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::TraceError;

lazy_static! {
    static ref RECORD_PATTERN: Regex = Regex::new(r"^\s*(?P<address>[0-9]+) (?P<mode>[RW])\s*$").unwrap();
}

/// One access in the tracer format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub address: u64,
    pub is_write: bool,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, if self.is_write { 'W' } else { 'R' })
    }
}

impl TraceRecord {
    /// Parses a single line, without its newline
    ///
    /// # Examples
    ///
    /// ```
    /// use hiercache::trace::TraceRecord;
    /// let record = TraceRecord::parse("4096 W").unwrap();
    /// assert_eq!(record, TraceRecord { address: 4096, is_write: true });
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let captures = RECORD_PATTERN.captures(line)?;
        let address = captures.name("address")?.as_str().parse().ok()?;
        let is_write = captures.name("mode")?.as_str() == "W";
        Some(Self { address, is_write })
    }
}

/// Lazily reads trace records, one per line. Blank lines are skipped
///
/// Reading is forward only: the reader consumes its input and can't be restarted
pub struct TraceReader<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(TraceRecord::parse(&line).ok_or(TraceError::Malformed {
                line: self.line_number,
                content: line,
            }));
        }
    }
}
