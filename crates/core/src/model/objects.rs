//! Operand value model.
//!
//! The outer document parser hands this core already-parsed values; this
//! module defines the uniform value type those operands arrive as, plus
//! the narrow interface used to dereference indirect references.

use crate::error::{RenderError, Result};
use std::collections::HashMap;

/// A parsed operand or resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /F1, /Im0)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(HashMap<String, Self>),
    /// Stream (dictionary + binary data)
    Stream(Box<StreamObject>),
    /// Indirect object reference
    Ref(ObjRef),
}

impl Object {
    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(RenderError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Real(n) => Ok(*n as i64),
            _ => Err(RenderError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(RenderError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(RenderError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(RenderError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(RenderError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&StreamObject> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(RenderError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// Indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl ObjRef {
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// Stream object - dictionary attributes + binary data.
///
/// Data is expected to be already decoded; stream filters are the outer
/// parser's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamObject {
    /// Stream dictionary attributes
    pub attrs: HashMap<String, Object>,
    data: Vec<u8>,
}

impl StreamObject {
    pub fn new(attrs: HashMap<String, Object>, data: Vec<u8>) -> Self {
        Self { attrs, data }
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.attrs.get(name)
    }

    /// Get attribute, trying multiple names.
    pub fn get_any(&self, names: &[&str]) -> Option<&Object> {
        names.iter().find_map(|name| self.attrs.get(*name))
    }

    /// Get the decoded stream data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Dereferencing interface for indirect object references.
///
/// Implemented by the document parser collaborator; tests back it with a
/// fixed table.
pub trait Resolver {
    fn resolve_ref(&self, r: &ObjRef) -> Option<Object>;
}

impl Resolver for HashMap<ObjRef, Object> {
    fn resolve_ref(&self, r: &ObjRef) -> Option<Object> {
        self.get(r).cloned()
    }
}

/// Unwrap reference-like values to their underlying object.
///
/// Follows chains of references up to a small bound; unresolvable
/// references collapse to `Null`.
pub fn resolve(obj: Object, resolver: Option<&dyn Resolver>) -> Object {
    let mut current = obj;
    for _ in 0..8 {
        match current {
            Object::Ref(r) => {
                current = match resolver.and_then(|res| res.resolve_ref(&r)) {
                    Some(o) => o,
                    None => return Object::Null,
                };
            }
            other => return other,
        }
    }
    Object::Null
}
