use std::collections::{BTreeMap, BTreeSet};

use crate::convert::to_wire;
use crate::error::MappingError;
use crate::resolve::resolve_reader;
use crate::schema::Mapped;
use crate::value::Value;
use crate::wire::WireValue;

/// Named, wire-encoded parameters for one statement execution.
pub type Parameters = BTreeMap<String, WireValue>;

/// Reads one value per placeholder out of `object`, via getter or field.
///
/// Every placeholder must resolve. The object is never mutated.
pub fn read_parameters<T: Mapped>(
    object: &T,
    placeholders: &BTreeSet<String>,
) -> Result<Parameters, MappingError> {
    let info = T::type_info();
    let mut params = Parameters::new();
    for name in placeholders {
        let read = resolve_reader(&info, name)?;
        let value = read(object);
        tracing::trace!(placeholder = %name, kind = value.type_name(), "read parameter");
        params.insert(name.clone(), to_wire(&value)?);
    }
    Ok(params)
}

/// Encodes a prebuilt name-to-value map. Keys are used verbatim.
pub fn encode_map(values: &BTreeMap<String, Value>) -> Result<Parameters, MappingError> {
    values
        .iter()
        .map(|(name, value)| Ok((name.clone(), to_wire(value)?)))
        .collect()
}

/// Object-safe view of a [`Mapped`] value used as a parameter set.
pub trait ObjectParameters: Send + Sync {
    fn read_parameters(&self, placeholders: &BTreeSet<String>) -> Result<Parameters, MappingError>;
}

impl<T: Mapped + Send + Sync> ObjectParameters for T {
    fn read_parameters(&self, placeholders: &BTreeSet<String>) -> Result<Parameters, MappingError> {
        read_parameters(self, placeholders)
    }
}
