//! Default-value equivalence

use crate::descriptor::{DefaultValue, FieldDescriptor};

/// Whether two fields declare semantically equal defaults.
///
/// Floating point defaults must be bit-for-bit identical; enum defaults are
/// compared by tag since several value names can alias one tag.
pub fn equivalent(a: &FieldDescriptor, b: &FieldDescriptor) -> bool {
    match (&a.default, &b.default) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(_), Some(_)) if a.scalar_kind() != b.scalar_kind() => false,
        (Some(da), Some(db)) => values_equal(da, db),
    }
}

fn values_equal(a: &DefaultValue, b: &DefaultValue) -> bool {
    match (a, b) {
        (DefaultValue::Int32(x), DefaultValue::Int32(y)) => x == y,
        (DefaultValue::Int64(x), DefaultValue::Int64(y)) => x == y,
        (DefaultValue::Uint32(x), DefaultValue::Uint32(y)) => x == y,
        (DefaultValue::Uint64(x), DefaultValue::Uint64(y)) => x == y,
        (DefaultValue::Float(x), DefaultValue::Float(y)) => x.to_bits() == y.to_bits(),
        (DefaultValue::Double(x), DefaultValue::Double(y)) => x.to_bits() == y.to_bits(),
        (DefaultValue::Bool(x), DefaultValue::Bool(y)) => x == y,
        (DefaultValue::String(x), DefaultValue::String(y)) => x == y,
        (DefaultValue::Enum { number: x, .. }, DefaultValue::Enum { number: y, .. }) => x == y,
        _ => false,
    }
}
