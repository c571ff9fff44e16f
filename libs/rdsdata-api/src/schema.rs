//! Registration tables: the name-keyed members of a mappable type.
//!
//! A [`TypeInfo`] lists what mapping may touch on `T`: its fields, its
//! accessor-shaped methods and its constructors, each with the visibility,
//! static-ness and origin needed by the resolution rules in
//! [`resolve`](crate::resolve). Tables are normally produced by
//! `#[derive(Mapped)]` and `#[mapped_methods]`, but can be built by hand.

use std::fmt;
use std::sync::Arc;

use crate::convert::FromWire;
use crate::error::{BoxError, MappingError};
use crate::value::Value;
use crate::wire::WireField;

pub type ReadFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
pub type WriteFn<T> = Arc<dyn Fn(&mut T, &WireField) -> Result<(), MappingError> + Send + Sync>;
pub type BuildFn<T> = Arc<dyn Fn(&[&WireField]) -> Result<T, MappingError> + Send + Sync>;

/// A type whose members can be looked up by name.
///
/// The table is rebuilt for every mapping operation; implementations should
/// not cache it in global state.
pub trait Mapped: Sized + 'static {
    fn type_info() -> TypeInfo<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Whether a member is declared on the type itself or lifted from an embedded base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Declared,
    Inherited,
}

pub struct FieldInfo<T> {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Set for members that must not be written after construction.
    pub readonly: bool,
    pub origin: Origin,
    pub type_name: &'static str,
    reader: Option<ReadFn<T>>,
    writer: Option<WriteFn<T>>,
}

impl<T: 'static> FieldInfo<T> {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            readonly: false,
            origin: Origin::Declared,
            type_name: "",
            reader: None,
            writer: None,
        }
    }

    /// Type-level member. It has no per-instance storage, so it carries no accessors.
    pub fn static_member(name: impl Into<String>, visibility: Visibility) -> Self {
        let mut field = Self::new(name, visibility);
        field.is_static = true;
        field
    }

    pub fn with_type<V>(mut self) -> Self {
        self.type_name = std::any::type_name::<V>();
        self
    }

    pub fn reader(mut self, read: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.reader = Some(Arc::new(read));
        self
    }

    /// Registers a writer that converts the wire field to `V` before storing it.
    pub fn writer<V: FromWire + 'static>(
        mut self,
        write: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let writer: WriteFn<T> =
            Arc::new(move |this: &mut T, field: &WireField| -> Result<(), MappingError> {
                write(this, V::from_wire(field)?);
                Ok(())
            });
        self.writer = Some(writer);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self.writer = None;
        self
    }

    pub fn read_fn(&self) -> Option<&ReadFn<T>> {
        self.reader.as_ref()
    }

    /// `None` when the field cannot be written: readonly, or registered without a writer.
    pub fn write_fn(&self) -> Option<&WriteFn<T>> {
        if self.readonly {
            return None;
        }
        self.writer.as_ref()
    }
}

impl<T> Clone for FieldInfo<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            visibility: self.visibility,
            is_static: self.is_static,
            readonly: self.readonly,
            origin: self.origin,
            type_name: self.type_name,
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("readonly", &self.readonly)
            .field("origin", &self.origin)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// What invoking a method does, as far as mapping is concerned.
pub enum MethodBody<T> {
    /// Zero-argument method returning a value.
    Getter(ReadFn<T>),
    /// Zero-argument method returning nothing.
    Void,
    /// One-argument method storing its converted argument.
    Setter(WriteFn<T>),
    /// Present on the type but not callable through mapping.
    Opaque,
}

impl<T> Clone for MethodBody<T> {
    fn clone(&self) -> Self {
        match self {
            MethodBody::Getter(f) => MethodBody::Getter(f.clone()),
            MethodBody::Void => MethodBody::Void,
            MethodBody::Setter(f) => MethodBody::Setter(f.clone()),
            MethodBody::Opaque => MethodBody::Opaque,
        }
    }
}

pub struct MethodInfo<T> {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Declared parameter type names; the length is the arity.
    pub params: Vec<&'static str>,
    pub origin: Origin,
    pub body: MethodBody<T>,
}

impl<T: 'static> MethodInfo<T> {
    fn with_body(name: impl Into<String>, visibility: Visibility, body: MethodBody<T>) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            params: Vec::new(),
            origin: Origin::Declared,
            body,
        }
    }

    pub fn getter(
        name: impl Into<String>,
        visibility: Visibility,
        read: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::with_body(name, visibility, MethodBody::Getter(Arc::new(read)))
    }

    pub fn void(name: impl Into<String>, visibility: Visibility) -> Self {
        Self::with_body(name, visibility, MethodBody::Void)
    }

    pub fn setter<V: FromWire + 'static>(
        name: impl Into<String>,
        visibility: Visibility,
        write: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let setter: WriteFn<T> =
            Arc::new(move |this: &mut T, field: &WireField| -> Result<(), MappingError> {
                write(this, V::from_wire(field)?);
                Ok(())
            });
        let body = MethodBody::Setter(setter);
        let mut method = Self::with_body(name, visibility, body);
        method.params = vec![std::any::type_name::<V>()];
        method
    }

    /// Setter whose own `Err` is reported as [`MappingError::CannotSetValue`]
    /// for the property the method is named after.
    pub fn fallible_setter<V, R, E>(
        name: impl Into<String>,
        visibility: Visibility,
        write: impl Fn(&mut T, V) -> Result<R, E> + Send + Sync + 'static,
    ) -> Self
    where
        V: FromWire + 'static,
        E: Into<BoxError>,
    {
        let name = name.into();
        let property = name.strip_prefix("set_").unwrap_or(&name).to_string();
        let setter: WriteFn<T> =
            Arc::new(move |this: &mut T, field: &WireField| -> Result<(), MappingError> {
                write(this, V::from_wire(field)?)
                    .map(|_| ())
                    .map_err(|cause| MappingError::cannot_set_value(property.as_str(), cause))
            });
        let mut method = Self::with_body(name, visibility, MethodBody::Setter(setter));
        method.params = vec![std::any::type_name::<V>()];
        method
    }

    pub fn opaque(
        name: impl Into<String>,
        visibility: Visibility,
        params: Vec<&'static str>,
    ) -> Self {
        let mut method = Self::with_body(name, visibility, MethodBody::Opaque);
        method.params = params;
        method
    }

    /// Marks the method as an associated function without a receiver.
    pub fn associated(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `name(param, ...)`, used to list candidates in error messages.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }
}

impl<T> Clone for MethodInfo<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            visibility: self.visibility,
            is_static: self.is_static,
            params: self.params.clone(),
            origin: self.origin,
            body: self.body.clone(),
        }
    }
}

impl<T> fmt::Debug for MethodInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self.body {
            MethodBody::Getter(_) => "getter",
            MethodBody::Void => "void",
            MethodBody::Setter(_) => "setter",
            MethodBody::Opaque => "opaque",
        };
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("params", &self.params)
            .field("origin", &self.origin)
            .field("body", &body)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub type_name: &'static str,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, type_name: &'static str) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

pub struct ConstructorInfo<T> {
    pub visibility: Visibility,
    pub params: Vec<ParamInfo>,
    build: BuildFn<T>,
}

impl<T: 'static> ConstructorInfo<T> {
    /// `build` receives one wire field per parameter, in parameter order.
    pub fn new(
        visibility: Visibility,
        params: Vec<ParamInfo>,
        build: impl Fn(&[&WireField]) -> Result<T, MappingError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            visibility,
            params,
            build: Arc::new(build),
        }
    }

    pub fn no_args(visibility: Visibility, build: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::new(visibility, Vec::new(), move |_| Ok(build()))
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn build(&self, args: &[&WireField]) -> Result<T, MappingError> {
        (self.build)(args)
    }
}

impl<T> Clone for ConstructorInfo<T> {
    fn clone(&self) -> Self {
        Self {
            visibility: self.visibility,
            params: self.params.clone(),
            build: self.build.clone(),
        }
    }
}

impl<T> fmt::Debug for ConstructorInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("visibility", &self.visibility)
            .field("params", &self.params)
            .finish()
    }
}

/// The registration table of `T`.
pub struct TypeInfo<T> {
    pub name: &'static str,
    pub fields: Vec<FieldInfo<T>>,
    pub methods: Vec<MethodInfo<T>>,
    pub constructors: Vec<ConstructorInfo<T>>,
}

impl<T: 'static> TypeInfo<T> {
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldInfo<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodInfo<T>) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorInfo<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Lifts every field and method of an embedded base into this table.
    ///
    /// `project` and `project_mut` locate the base inside `T`. Lifted members
    /// are marked [`Origin::Inherited`] and keep their visibility and
    /// static-ness. Base constructors are not lifted.
    pub fn inherit<B: 'static>(
        mut self,
        base: TypeInfo<B>,
        project: fn(&T) -> &B,
        project_mut: fn(&mut T) -> &mut B,
    ) -> Self {
        for field in base.fields {
            self.fields.push(FieldInfo {
                name: field.name,
                visibility: field.visibility,
                is_static: field.is_static,
                readonly: field.readonly,
                origin: Origin::Inherited,
                type_name: field.type_name,
                reader: field.reader.map(|read| lift_read(read, project)),
                writer: field.writer.map(|write| lift_write(write, project_mut)),
            });
        }
        for method in base.methods {
            let body = match method.body {
                MethodBody::Getter(read) => MethodBody::Getter(lift_read(read, project)),
                MethodBody::Setter(write) => MethodBody::Setter(lift_write(write, project_mut)),
                MethodBody::Void => MethodBody::Void,
                MethodBody::Opaque => MethodBody::Opaque,
            };
            self.methods.push(MethodInfo {
                name: method.name,
                visibility: method.visibility,
                is_static: method.is_static,
                params: method.params,
                origin: Origin::Inherited,
                body,
            });
        }
        self
    }

    pub fn fields_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a FieldInfo<T>> {
        self.fields.iter().filter(move |f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodInfo<T>> {
        self.methods.iter().filter(move |m| m.name == name)
    }
}

impl<T: 'static> Default for TypeInfo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypeInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .finish()
    }
}

fn lift_read<T: 'static, B: 'static>(read: ReadFn<B>, project: fn(&T) -> &B) -> ReadFn<T> {
    Arc::new(move |this: &T| read(project(this)))
}

fn lift_write<T: 'static, B: 'static>(
    write: WriteFn<B>,
    project_mut: fn(&mut T) -> &mut B,
) -> WriteFn<T> {
    Arc::new(move |this: &mut T, field: &WireField| write(project_mut(this), field))
}
