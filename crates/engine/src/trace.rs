//! Trace-file parsing for both input dialects.
//!
//! A trace is a whitespace-separated token stream, not a line format:
//! records may span lines. The multi-level dialect is `<op> <hex-addr>`
//! pairs; the split dialect appends a `<type>` token selecting the
//! instruction or data cache. Addresses are 32-bit hex without an `0x`
//! prefix.
//!
//! The multi-level dialect treats any malformed token as fatal. The split
//! dialect skips records with an unknown op or type (with a diagnostic) and
//! only treats unparsable addresses and truncated records as fatal.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::SimError;

/// One memory operation from a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOp {
    /// A load (`r`).
    Read,
    /// A store (`w`).
    Write,
}

impl AccessOp {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "r" => Some(Self::Read),
            "w" => Some(Self::Write),
            _ => None,
        }
    }
}

/// Cache selector carried by the split-dialect trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Instruction fetch (`I`).
    Instruction,
    /// Data access (`D`).
    Data,
}

/// One record of the multi-level dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// The operation.
    pub op: AccessOp,
    /// The byte address.
    pub addr: u32,
}

/// One record of the split dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRecord {
    /// The operation.
    pub op: AccessOp,
    /// The byte address.
    pub addr: u32,
    /// Which cache handles the access.
    pub kind: AccessKind,
}

fn parse_addr(token: &str) -> Result<u32, SimError> {
    u32::from_str_radix(token, 16).map_err(|_| SimError::BadAddress(token.to_string()))
}

/// Parses the multi-level dialect.
///
/// # Errors
///
/// Any unknown op, unparsable address, or trailing partial record is fatal.
pub fn parse_multi(text: &str) -> Result<Vec<TraceRecord>, SimError> {
    let mut tokens = text.split_whitespace();
    let mut records = Vec::new();
    while let Some(op_token) = tokens.next() {
        let op = AccessOp::from_token(op_token)
            .ok_or_else(|| SimError::IllegalOp(op_token.to_string()))?;
        let addr_token = tokens
            .next()
            .ok_or_else(|| SimError::TruncatedTrace(op_token.to_string()))?;
        records.push(TraceRecord {
            op,
            addr: parse_addr(addr_token)?,
        });
    }
    Ok(records)
}

/// Parses the split dialect.
///
/// Records with an op outside `{r, w}` or a type outside `{I, D}` are
/// skipped with a diagnostic.
///
/// # Errors
///
/// Unparsable addresses and trailing partial records are fatal.
pub fn parse_split(text: &str) -> Result<Vec<SplitRecord>, SimError> {
    let mut tokens = text.split_whitespace();
    let mut records = Vec::new();
    while let Some(op_token) = tokens.next() {
        let addr_token = tokens
            .next()
            .ok_or_else(|| SimError::TruncatedTrace(op_token.to_string()))?;
        let kind_token = tokens
            .next()
            .ok_or_else(|| SimError::TruncatedTrace(addr_token.to_string()))?;
        let addr = parse_addr(addr_token)?;

        let Some(op) = AccessOp::from_token(op_token) else {
            warn!("skipping access with illegal op {op_token:?}");
            continue;
        };
        let kind = match kind_token {
            "I" => AccessKind::Instruction,
            "D" => AccessKind::Data,
            other => {
                warn!("skipping access with unknown type {other:?}");
                continue;
            }
        };
        records.push(SplitRecord { op, addr, kind });
    }
    Ok(records)
}

/// Reads and parses a multi-level trace file.
///
/// # Errors
///
/// I/O failures and malformed records are fatal.
pub fn read_multi(path: &Path) -> Result<Vec<TraceRecord>, SimError> {
    parse_multi(&fs::read_to_string(path)?)
}

/// Reads and parses a split trace file.
///
/// # Errors
///
/// I/O failures, unparsable addresses, and truncated records are fatal.
pub fn read_split(path: &Path) -> Result<Vec<SplitRecord>, SimError> {
    parse_split(&fs::read_to_string(path)?)
}
