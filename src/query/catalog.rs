//! Attribute descriptors for fixed-layout relations.

use crate::common::{Error, Result};
use crate::heap::{Datatype, Operator};

/// One fixed-width attribute of a relation's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrDesc {
    pub name: String,
    /// Byte offset of the attribute inside a record.
    pub offset: usize,
    pub len: usize,
    pub attr_type: Datatype,
}

/// A relation: the heap file name plus its record layout.
///
/// Attributes are laid out back to back in declaration order.
///
/// # Example
/// ```
/// use minirel::query::Relation;
///
/// let emp = Relation::new("emp").string("name", 20).integer("age").float("salary");
/// assert_eq!(emp.record_len(), 28);
/// assert_eq!(emp.attr("age").unwrap().offset, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    attrs: Vec<AttrDesc>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Append a NUL-padded string attribute `len` bytes wide.
    pub fn string(self, name: impl Into<String>, len: usize) -> Self {
        self.push(name.into(), len, Datatype::String)
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.push(name.into(), std::mem::size_of::<i32>(), Datatype::Integer)
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.push(name.into(), std::mem::size_of::<f32>(), Datatype::Float)
    }

    fn push(mut self, name: String, len: usize, attr_type: Datatype) -> Self {
        let offset = self.record_len();
        self.attrs.push(AttrDesc {
            name,
            offset,
            len,
            attr_type,
        });
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn attrs(&self) -> &[AttrDesc] {
        &self.attrs
    }

    /// # Errors
    /// `Error::AttrNotFound` if the relation has no attribute `name`.
    pub fn attr(&self, name: &str) -> Result<&AttrDesc> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .ok_or_else(|| Error::AttrNotFound(name.to_string()))
    }

    /// Width of one record.
    pub fn record_len(&self) -> usize {
        self.attrs.iter().map(|attr| attr.len).sum()
    }
}

/// A named attribute value, given as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrValue<'v> {
    pub name: &'v str,
    pub attr_type: Datatype,
    pub value: &'v str,
}

impl<'v> AttrValue<'v> {
    pub fn new(name: &'v str, attr_type: Datatype, value: &'v str) -> Self {
        Self {
            name,
            attr_type,
            value,
        }
    }
}

/// `attr <op> value` over one attribute of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate<'v> {
    pub attr: &'v str,
    pub op: Operator,
    pub value: &'v str,
}

impl<'v> Predicate<'v> {
    pub fn new(attr: &'v str, op: Operator, value: &'v str) -> Self {
        Self { attr, op, value }
    }
}

/// Encode `value` in the on-record form of `attr`.
///
/// Integers and floats become 4 little-endian bytes. Strings are cut or
/// NUL padded to the attribute width.
///
/// # Errors
/// `Error::BadAttrValue` if `value` does not parse as the attribute type.
pub fn encode_value(attr: &AttrDesc, value: &str) -> Result<Vec<u8>> {
    let bad_value = || Error::BadAttrValue {
        attr: attr.name.clone(),
        value: value.to_string(),
    };

    let mut bytes = match attr.attr_type {
        Datatype::Integer => value
            .trim()
            .parse::<i32>()
            .map_err(|_| bad_value())?
            .to_le_bytes()
            .to_vec(),
        Datatype::Float => value
            .trim()
            .parse::<f32>()
            .map_err(|_| bad_value())?
            .to_le_bytes()
            .to_vec(),
        Datatype::String => value.as_bytes().to_vec(),
    };
    bytes.resize(attr.len, 0);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emp() -> Relation {
        Relation::new("emp")
            .string("name", 8)
            .integer("age")
            .float("salary")
    }

    #[test]
    fn test_layout_is_packed_in_order() {
        let rel = emp();
        let offsets: Vec<_> = rel.attrs().iter().map(|a| (a.offset, a.len)).collect();
        assert_eq!(offsets, vec![(0, 8), (8, 4), (12, 4)]);
        assert_eq!(rel.record_len(), 16);
        assert_eq!(rel.name(), "emp");
    }

    #[test]
    fn test_unknown_attribute() {
        assert!(matches!(emp().attr("dept"), Err(Error::AttrNotFound(name)) if name == "dept"));
    }

    #[test]
    fn test_encode_numbers() {
        let rel = emp();
        assert_eq!(
            encode_value(rel.attr("age").unwrap(), " 42 ").unwrap(),
            42i32.to_le_bytes()
        );
        assert_eq!(
            encode_value(rel.attr("salary").unwrap(), "1.5").unwrap(),
            1.5f32.to_le_bytes()
        );
        assert!(matches!(
            encode_value(rel.attr("age").unwrap(), "forty"),
            Err(Error::BadAttrValue { .. })
        ));
    }

    #[test]
    fn test_encode_string_pads_and_truncates() {
        let rel = emp();
        let name = rel.attr("name").unwrap();
        assert_eq!(encode_value(name, "bob").unwrap(), b"bob\0\0\0\0\0");
        assert_eq!(encode_value(name, "bartholomew").unwrap(), b"bartholo");
    }
}
