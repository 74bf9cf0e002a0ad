//! Insert, delete and select over heap files.

use log::debug;

use crate::common::{Error, Result, Rid};
use crate::database::Database;
use crate::heap::{Datatype, HeapFileScan, InsertFileScan, Operator};

use super::catalog::{encode_value, AttrDesc, AttrValue, Predicate, Relation};

/// Build a record from `values` and append it to `rel`.
///
/// Values may come in any order but must name every attribute of `rel`
/// exactly once.
///
/// # Errors
/// - `Error::AttrTypeMismatch` if the number of values differs from the
///   number of attributes, or a value's type differs from its attribute's
/// - `Error::AttrNotFound` if an attribute has no value
/// - `Error::BadAttrValue` if a value does not parse
pub fn insert(db: &Database, rel: &Relation, values: &[AttrValue<'_>]) -> Result<Rid> {
    if values.len() != rel.attrs().len() {
        return Err(Error::AttrTypeMismatch(rel.name().to_string()));
    }

    let mut record = vec![0u8; rel.record_len()];
    for attr in rel.attrs() {
        let value = values
            .iter()
            .find(|value| value.name == attr.name)
            .ok_or_else(|| Error::AttrNotFound(attr.name.clone()))?;
        if value.attr_type != attr.attr_type {
            return Err(Error::AttrTypeMismatch(attr.name.clone()));
        }
        let bytes = encode_value(attr, value.value)?;
        record[attr.offset..attr.offset + attr.len].copy_from_slice(&bytes);
    }

    let mut inserter = InsertFileScan::open(db, rel.name())?;
    inserter.insert_record(&record)
}

/// Delete every record of `rel` satisfying `predicate`, or every record
/// when there is none. Returns the number deleted.
pub fn delete(db: &Database, rel: &Relation, predicate: Option<&Predicate<'_>>) -> Result<usize> {
    let mut scan = HeapFileScan::open(db, rel.name())?;
    start_scan(&mut scan, rel, predicate)?;

    let mut deleted = 0;
    while scan.scan_next()?.is_some() {
        scan.delete_record()?;
        deleted += 1;
    }
    scan.end_scan()?;

    debug!("deleted {} records from {}", deleted, rel.name());
    Ok(deleted)
}

/// Append to heap file `result` the `projection` of every record of `rel`
/// satisfying `predicate`. Returns the number of records produced.
///
/// Result records are the projected attributes back to back, in
/// `projection` order.
///
/// # Errors
/// `Error::AttrNotFound` if a projected or filtered attribute is not in
/// `rel`; nothing is written in that case.
pub fn select(
    db: &Database,
    result: &str,
    projection: &[&str],
    rel: &Relation,
    predicate: Option<&Predicate<'_>>,
) -> Result<usize> {
    let projected = projection
        .iter()
        .map(|name| rel.attr(name))
        .collect::<Result<Vec<&AttrDesc>>>()?;
    let out_len: usize = projected.iter().map(|attr| attr.len).sum();

    let mut output = InsertFileScan::open(db, result)?;
    let mut scan = HeapFileScan::open(db, rel.name())?;
    start_scan(&mut scan, rel, predicate)?;

    let mut produced = 0;
    let mut out = Vec::with_capacity(out_len);
    while scan.scan_next()?.is_some() {
        let record = scan.get_record()?;
        out.clear();
        for attr in &projected {
            let field = record
                .get(attr.offset..attr.offset + attr.len)
                .ok_or_else(|| Error::AttrNotFound(attr.name.clone()))?;
            out.extend_from_slice(field);
        }
        output.insert_record(&out)?;
        produced += 1;
    }
    scan.end_scan()?;

    debug!("selected {} records from {} into {}", produced, rel.name(), result);
    Ok(produced)
}

fn start_scan(
    scan: &mut HeapFileScan<'_>,
    rel: &Relation,
    predicate: Option<&Predicate<'_>>,
) -> Result<()> {
    match predicate {
        None => scan.start_scan(0, 0, Datatype::String, None, Operator::Eq),
        Some(predicate) => {
            let attr = rel.attr(predicate.attr)?;
            let value = encode_value(attr, predicate.value)?;
            scan.start_scan(attr.offset, attr.len, attr.attr_type, Some(&value), predicate.op)
        }
    }
}
