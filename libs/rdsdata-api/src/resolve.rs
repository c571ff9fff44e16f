//! Name-based accessor resolution over a [`TypeInfo`].
//!
//! Read side: getter `get_<name>`, then field. Write side: setter
//! `set_<name>`, then field (property population), or field only.
//! Constructors are matched by their parameter-name set.

use std::collections::BTreeSet;

use crate::error::MappingError;
use crate::schema::{
    ConstructorInfo, FieldInfo, MethodBody, MethodInfo, Origin, ReadFn, TypeInfo, WriteFn,
};
use crate::wire::WireField;

pub fn getter_name(field: &str) -> String {
    format!("get_{field}")
}

pub fn setter_name(field: &str) -> String {
    format!("set_{field}")
}

/// Finds how to read `field` from an instance.
///
/// A zero-argument instance getter wins over a field; public members win
/// over private ones. Only instance members taking `&self` are readable:
/// associated getters, static fields and getters needing `&mut self` never
/// resolve, so a placeholder naming only those reports `FieldNotFound`.
pub fn resolve_reader<T: 'static>(
    info: &TypeInfo<T>,
    field: &str,
) -> Result<ReadFn<T>, MappingError> {
    let name = getter_name(field);
    let getters: Vec<&MethodInfo<T>> = info
        .methods_named(&name)
        .filter(|m| !m.is_static && m.arity() == 0)
        .filter(|m| matches!(m.body, MethodBody::Getter(_) | MethodBody::Void))
        .collect();
    let getter = getters
        .iter()
        .find(|m| m.visibility.is_public())
        .or_else(|| getters.first());

    if let Some(getter) = getter {
        return match &getter.body {
            MethodBody::Getter(read) => Ok(read.clone()),
            _ => Err(MappingError::VoidReturnTypeNotSupported {
                method: getter.name.clone(),
            }),
        };
    }

    let readable = |f: &&FieldInfo<T>| !f.is_static && f.read_fn().is_some();
    let field_info = info
        .fields_named(field)
        .filter(readable)
        .find(|f| f.visibility.is_public())
        .or_else(|| info.fields_named(field).find(readable));

    field_info
        .and_then(|f| f.read_fn().cloned())
        .ok_or_else(|| MappingError::FieldNotFound {
            field: field.to_string(),
            object: info.name.to_string(),
        })
}

/// How population writes one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Population {
    /// Setter, then field; honors `ignore_missing_setters`.
    #[default]
    Properties,
    /// Field only. A miss is always an error.
    Fields,
}

/// A resolved write target for one column.
pub enum WriteAccessor<T> {
    Setter { method: String, write: WriteFn<T> },
    Field { field: String, write: WriteFn<T> },
}

impl<T> WriteAccessor<T> {
    pub fn write(&self, instance: &mut T, value: &WireField) -> Result<(), MappingError> {
        match self {
            WriteAccessor::Setter { write, .. } | WriteAccessor::Field { write, .. } => {
                write(instance, value)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WriteAccessor::Setter { .. } => "setter",
            WriteAccessor::Field { .. } => "field",
        }
    }

    pub fn member(&self) -> &str {
        match self {
            WriteAccessor::Setter { method, .. } => method,
            WriteAccessor::Field { field, .. } => field,
        }
    }
}

impl<T> Clone for WriteAccessor<T> {
    fn clone(&self) -> Self {
        match self {
            WriteAccessor::Setter { method, write } => WriteAccessor::Setter {
                method: method.clone(),
                write: write.clone(),
            },
            WriteAccessor::Field { field, write } => WriteAccessor::Field {
                field: field.clone(),
                write: write.clone(),
            },
        }
    }
}

/// Finds the setter for `field`: public, instance, exactly one parameter.
///
/// A declared setter overrides an inherited one only when their parameter
/// types are equal; inherited setters with any other signature stay
/// candidates. More than one remaining candidate is an error listing every
/// candidate signature.
pub fn resolve_setter<T: 'static>(
    info: &TypeInfo<T>,
    field: &str,
) -> Result<Option<WriteAccessor<T>>, MappingError> {
    let name = setter_name(field);
    let candidates = |origin: Origin| {
        info.methods_named(&name)
            .filter(|m| m.origin == origin)
            .filter(|m| m.visibility.is_public() && !m.is_static && m.arity() == 1)
            .filter(|m| matches!(m.body, MethodBody::Setter(_) | MethodBody::Opaque))
            .collect::<Vec<_>>()
    };

    let mut found = candidates(Origin::Declared);
    let inherited = candidates(Origin::Inherited)
        .into_iter()
        .filter(|m| !found.iter().any(|declared| declared.params == m.params))
        .collect::<Vec<_>>();
    found.extend(inherited);

    match found.as_slice() {
        [] => Ok(None),
        [method] => match &method.body {
            MethodBody::Setter(write) => Ok(Some(WriteAccessor::Setter {
                method: method.signature(),
                write: write.clone(),
            })),
            _ => Err(MappingError::CannotAccessField {
                type_name: info.name.to_string(),
                field: field.to_string(),
            }),
        },
        many => Err(MappingError::AmbiguousSetter {
            field: field.to_string(),
            candidates: many.iter().map(|m| m.signature()).collect(),
        }),
    }
}

/// First instance field named `field`, declared members before inherited ones.
fn instance_field<'a, T: 'static>(
    info: &'a TypeInfo<T>,
    field: &str,
) -> Option<&'a FieldInfo<T>> {
    let mut matches: Vec<&FieldInfo<T>> =
        info.fields_named(field).filter(|f| !f.is_static).collect();
    matches.sort_by_key(|f| f.origin == Origin::Inherited);
    matches.into_iter().next()
}

fn field_writer<T: 'static>(
    info: &TypeInfo<T>,
    field: &FieldInfo<T>,
) -> Result<WriteAccessor<T>, MappingError> {
    let write = field.write_fn().ok_or_else(|| MappingError::CannotAccessField {
        type_name: info.name.to_string(),
        field: field.name.clone(),
    })?;
    Ok(WriteAccessor::Field {
        field: field.name.clone(),
        write: write.clone(),
    })
}

/// Resolves the write target for one column.
///
/// `Ok(None)` means the column is skipped, which only happens for
/// [`Population::Properties`] with `ignore_missing_setters` set.
pub fn resolve_writer<T: 'static>(
    info: &TypeInfo<T>,
    field: &str,
    population: Population,
    ignore_missing_setters: bool,
) -> Result<Option<WriteAccessor<T>>, MappingError> {
    let no_field_or_setter = || MappingError::NoFieldOrSetter {
        type_name: info.name.to_string(),
        field: field.to_string(),
    };

    match population {
        Population::Properties => {
            if let Some(setter) = resolve_setter(info, field)? {
                return Ok(Some(setter));
            }
            // Static fields are not candidates here: a static-only match counts as missing.
            match instance_field(info, field) {
                Some(f) => field_writer(info, f).map(Some),
                None if ignore_missing_setters => Ok(None),
                None => Err(no_field_or_setter()),
            }
        }
        Population::Fields => match instance_field(info, field) {
            Some(f) => field_writer(info, f).map(Some),
            None if info.fields_named(field).any(|f| f.is_static) => {
                Err(MappingError::StaticField {
                    type_name: info.name.to_string(),
                    field: field.to_string(),
                })
            }
            None => Err(no_field_or_setter()),
        },
    }
}

/// First constructor, in registration order, whose parameter-name set equals
/// the column-name set. Never matches an empty column list.
pub fn find_all_args_constructor<'a, T: 'static>(
    info: &'a TypeInfo<T>,
    columns: &[String],
) -> Option<&'a ConstructorInfo<T>> {
    if columns.is_empty() {
        return None;
    }
    let wanted: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    info.constructors
        .iter()
        .find(|c| c.param_names().collect::<BTreeSet<_>>() == wanted)
}

/// The zero-parameter constructor, whatever its visibility.
pub fn find_no_args_constructor<T: 'static>(info: &TypeInfo<T>) -> Option<&ConstructorInfo<T>> {
    info.constructors.iter().find(|c| c.arity() == 0)
}
