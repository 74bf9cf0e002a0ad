//! Scan predicates.
//!
//! A [`ScanFilter`] compares a fixed-width field of each record against a
//! constant: `record[offset..offset + length] <op> value`.

use std::cmp::Ordering;

use crate::common::{Error, Result};

/// Type of the compared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// NUL-padded bytes, compared like C strings.
    String,
    /// Little-endian `i32`.
    Integer,
    /// Little-endian `f32`.
    Float,
}

impl Datatype {
    /// Width every field of this type must have, if fixed.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Datatype::String => None,
            Datatype::Integer => Some(std::mem::size_of::<i32>()),
            Datatype::Float => Some(std::mem::size_of::<f32>()),
        }
    }
}

/// Comparison applied between the record field and the filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
    Ne,
}

impl Operator {
    /// Apply to the ordering of field relative to value.
    ///
    /// `None` (a NaN float on either side) satisfies only `Ne`.
    fn accepts(self, ord: Option<Ordering>) -> bool {
        match ord {
            None => self == Operator::Ne,
            Some(ord) => match self {
                Operator::Lt => ord == Ordering::Less,
                Operator::Lte => ord != Ordering::Greater,
                Operator::Eq => ord == Ordering::Equal,
                Operator::Gte => ord != Ordering::Less,
                Operator::Gt => ord == Ordering::Greater,
                Operator::Ne => ord != Ordering::Equal,
            },
        }
    }
}

/// A validated scan predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilter {
    offset: usize,
    length: usize,
    datatype: Datatype,
    value: Vec<u8>,
    op: Operator,
}

impl ScanFilter {
    /// Build a predicate on `length` bytes at `offset`.
    ///
    /// A string `value` shorter than `length` is NUL padded.
    ///
    /// # Errors
    /// `Error::BadScanParam` if `length` is 0, if it is not the fixed width
    /// of an integer or float field, or if `value` does not fit the field.
    pub fn new(
        offset: usize,
        length: usize,
        datatype: Datatype,
        value: &[u8],
        op: Operator,
    ) -> Result<Self> {
        if length < 1 {
            return Err(Error::BadScanParam("length must be at least 1"));
        }
        if let Some(width) = datatype.fixed_len() {
            if length != width {
                return Err(Error::BadScanParam("length does not match the field type"));
            }
            if value.len() != width {
                return Err(Error::BadScanParam("filter value does not match the field type"));
            }
        }
        if value.len() > length {
            return Err(Error::BadScanParam("filter value longer than the field"));
        }

        let mut padded = value.to_vec();
        padded.resize(length, 0);
        Ok(Self {
            offset,
            length,
            datatype,
            value: padded,
            op,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    #[inline]
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Whether `record` satisfies the predicate.
    ///
    /// A record too short to contain the field never matches.
    pub fn matches(&self, record: &[u8]) -> bool {
        let field = self
            .offset
            .checked_add(self.length)
            .and_then(|end| record.get(self.offset..end));
        let Some(field) = field else {
            return false;
        };

        let ord = match self.datatype {
            Datatype::Integer => Some(read_i32(field).cmp(&read_i32(&self.value))),
            Datatype::Float => read_f32(field).partial_cmp(&read_f32(&self.value)),
            Datatype::String => Some(compare_c_str(field, &self.value)),
        };
        self.op.accepts(ord)
    }
}

fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Compare two equal-length fields byte by byte, stopping at a shared NUL.
fn compare_c_str(a: &[u8], b: &[u8]) -> Ordering {
    for (&x, &y) in a.iter().zip(b) {
        match x.cmp(&y) {
            Ordering::Equal if x == 0 => return Ordering::Equal,
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}
