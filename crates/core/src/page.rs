//! Page-level resource scope and Form XObjects.
//!
//! A page carries its own resource dictionary plus, optionally, the one
//! it inherits from an ancestor node shared with sibling pages. Named
//! lookups walk the active Form XObject context first, then the page,
//! then the inherited dictionary.

use crate::geometry::AffineMatrix;
use crate::model::objects::{Object, Resolver, StreamObject, resolve};
use std::collections::HashMap;

/// A resource dictionary as handed over by the document parser.
pub type ResourceDict = HashMap<String, Object>;

/// The resource scope for one page-rendering pass.
#[derive(Default)]
pub struct Page {
    /// The page's own resource dictionary.
    pub resources: ResourceDict,
    /// Resources inherited from an ancestor Pages node, if any.
    pub inherited_resources: Option<ResourceDict>,
}

impl Page {
    pub fn new(resources: ResourceDict) -> Self {
        Self {
            resources,
            inherited_resources: None,
        }
    }

    pub fn with_inherited(resources: ResourceDict, inherited: ResourceDict) -> Self {
        Self {
            resources,
            inherited_resources: Some(inherited),
        }
    }
}

/// Look up a named entry in a resource category dictionary
/// (e.g. category `Font`, name `F1`), dereferencing as needed.
pub fn lookup_resource(
    dict: &ResourceDict,
    category: &str,
    name: &str,
    resolver: Option<&dyn Resolver>,
) -> Option<Object> {
    let category_obj = resolve(dict.get(category)?.clone(), resolver);
    let entries = match category_obj {
        Object::Dict(d) => d,
        _ => return None,
    };
    let entry = entries.get(name)?.clone();
    match resolve(entry, resolver) {
        Object::Null => None,
        value => Some(value),
    }
}

/// A reusable, self-contained content stream with its own resources and
/// an optional placement matrix.
pub struct FormXObject {
    pub resources: Option<ResourceDict>,
    pub matrix: Option<AffineMatrix>,
    pub bbox: Option<[f64; 4]>,
    pub content: Vec<u8>,
}

impl FormXObject {
    /// Build a form from its stream object.
    pub fn from_stream(stream: &StreamObject, resolver: Option<&dyn Resolver>) -> Self {
        let resources = stream
            .get("Resources")
            .map(|o| resolve(o.clone(), resolver))
            .and_then(|o| match o {
                Object::Dict(d) => Some(d),
                _ => None,
            });

        let matrix = stream
            .get("Matrix")
            .map(|o| resolve(o.clone(), resolver))
            .and_then(|o| {
                let arr = o.as_array().ok()?;
                if arr.len() < 6 {
                    return None;
                }
                Some(AffineMatrix::new(
                    arr[0].as_num().ok()?,
                    arr[1].as_num().ok()?,
                    arr[2].as_num().ok()?,
                    arr[3].as_num().ok()?,
                    arr[4].as_num().ok()?,
                    arr[5].as_num().ok()?,
                ))
            });

        let bbox = stream
            .get("BBox")
            .map(|o| resolve(o.clone(), resolver))
            .and_then(|o| {
                let arr = o.as_array().ok()?;
                if arr.len() < 4 {
                    return None;
                }
                Some([
                    arr[0].as_num().ok()?,
                    arr[1].as_num().ok()?,
                    arr[2].as_num().ok()?,
                    arr[3].as_num().ok()?,
                ])
            });

        Self {
            resources,
            matrix,
            bbox,
            content: stream.data().to_vec(),
        }
    }

    /// Whether a stream's Subtype declares a form.
    pub fn is_form(stream: &StreamObject) -> bool {
        stream
            .get("Subtype")
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == "Form")
    }
}
