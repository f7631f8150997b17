//! Tree B: the SDF document model.
//!
//! Mapped 1:1 onto SDF JSON via serde; reading and writing a document is
//! `serde_json::from_str` / `to_string_pretty` on [`SdfDocument`].
//!
//! The single recurring primitive is [`DataQuality`]: one node type that can
//! describe a scalar (const/default/min/max/pattern/enum/multipleOf), an
//! object (named properties + required list + choice variants), or an array
//! (item bounds, uniqueness, one item node). At most one of those facet
//! groups is meaningfully populated; a node may instead carry only an
//! `sdfRef`, in which case its own facets overlay the referenced node's.
//!
//! Maps are `BTreeMap` so emitted JSON is deterministic.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Document-level metadata block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// A complete SDF file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<SdfInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace: BTreeMap<String, String>,
    #[serde(
        rename = "defaultNamespace",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_namespace: Option<String>,
    #[serde(
        rename = "sdfThing",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_thing: BTreeMap<String, SdfThing>,
    #[serde(
        rename = "sdfObject",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_object: BTreeMap<String, SdfObject>,
    #[serde(
        rename = "sdfProperty",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_property: BTreeMap<String, DataQuality>,
    #[serde(
        rename = "sdfAction",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_action: BTreeMap<String, SdfAction>,
    #[serde(
        rename = "sdfEvent",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_event: BTreeMap<String, SdfEvent>,
    #[serde(
        rename = "sdfData",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_data: BTreeMap<String, DataQuality>,
}

/// Nested top-level container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfThing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "sdfThing",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_thing: BTreeMap<String, SdfThing>,
    #[serde(
        rename = "sdfObject",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_object: BTreeMap<String, SdfObject>,
}

/// Flat container of properties, actions, events, and shared data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "sdfProperty",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_property: BTreeMap<String, DataQuality>,
    #[serde(
        rename = "sdfAction",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_action: BTreeMap<String, SdfAction>,
    #[serde(
        rename = "sdfEvent",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_event: BTreeMap<String, SdfEvent>,
    #[serde(
        rename = "sdfData",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_data: BTreeMap<String, DataQuality>,
    #[serde(
        rename = "sdfRequired",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sdf_required: Vec<String>,
}

/// Action construct: at most one input and one output data node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "sdfInputData",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdf_input_data: Option<DataQuality>,
    #[serde(
        rename = "sdfOutputData",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdf_output_data: Option<DataQuality>,
    #[serde(
        rename = "sdfData",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_data: BTreeMap<String, DataQuality>,
}

/// Event construct: one output data node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SdfEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "sdfOutputData",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdf_output_data: Option<DataQuality>,
    #[serde(
        rename = "sdfData",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_data: BTreeMap<String, DataQuality>,
}

/// The universal constraint node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "sdfRef", skip_serializing_if = "Option::is_none")]
    pub sdf_ref: Option<String>,
    #[serde(
        rename = "sdfChoice",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sdf_choice: BTreeMap<String, DataQuality>,

    // -- scalar facets ------------------------------------------------------
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub json_type: Option<String>,
    #[serde(rename = "sdfType", skip_serializing_if = "Option::is_none")]
    pub sdf_type: Option<String>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    // -- object facets ------------------------------------------------------
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, DataQuality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    // -- array facets -------------------------------------------------------
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<DataQuality>>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    // -- property specialization -------------------------------------------
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl DataQuality {
    pub fn of_type(json_type: &str) -> Self {
        Self {
            json_type: Some(json_type.to_string()),
            ..Default::default()
        }
    }

    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            sdf_ref: Some(pointer.into()),
            ..Default::default()
        }
    }

    pub fn is_object(&self) -> bool {
        self.json_type.as_deref() == Some("object") || !self.properties.is_empty()
    }

    pub fn is_array(&self) -> bool {
        self.json_type.as_deref() == Some("array") || self.items.is_some()
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_object() && !self.is_array()
    }
}

// =============================================================================
// POINTER NAVIGATION
// =============================================================================

/// Follow a `#/...` reference string to the quality node it names.
///
/// Understood segments: the top-level and object-level kind keywords
/// (`sdfThing`, `sdfObject`, `sdfProperty`, `sdfAction`, `sdfEvent`,
/// `sdfData`, `sdfInputData`, `sdfOutputData`) and the in-quality steps
/// `properties/<name>`, `items`, `sdfChoice/<name>`.
impl SdfDocument {
    pub fn quality(&self, pointer: &str) -> Option<&DataQuality> {
        let mut segs = pointer.trim_start_matches('#').trim_start_matches('/').split('/');
        match segs.next()? {
            "sdfThing" => {
                let mut thing = self.sdf_thing.get(segs.next()?)?;
                loop {
                    match segs.next()? {
                        "sdfThing" => thing = thing.sdf_thing.get(segs.next()?)?,
                        "sdfObject" => {
                            let obj = thing.sdf_object.get(segs.next()?)?;
                            return object_quality(obj, segs);
                        }
                        _ => return None,
                    }
                }
            }
            "sdfObject" => object_quality(self.sdf_object.get(segs.next()?)?, segs),
            "sdfProperty" => descend(self.sdf_property.get(segs.next()?)?, segs),
            "sdfData" => descend(self.sdf_data.get(segs.next()?)?, segs),
            _ => None,
        }
    }

    pub fn quality_mut(&mut self, pointer: &str) -> Option<&mut DataQuality> {
        let mut segs = pointer.trim_start_matches('#').trim_start_matches('/').split('/');
        match segs.next()? {
            "sdfThing" => {
                let mut thing = self.sdf_thing.get_mut(segs.next()?)?;
                loop {
                    match segs.next()? {
                        "sdfThing" => thing = thing.sdf_thing.get_mut(segs.next()?)?,
                        "sdfObject" => {
                            let obj = thing.sdf_object.get_mut(segs.next()?)?;
                            return object_quality_mut(obj, segs);
                        }
                        _ => return None,
                    }
                }
            }
            "sdfObject" => object_quality_mut(self.sdf_object.get_mut(segs.next()?)?, segs),
            "sdfProperty" => descend_mut(self.sdf_property.get_mut(segs.next()?)?, segs),
            "sdfData" => descend_mut(self.sdf_data.get_mut(segs.next()?)?, segs),
            _ => None,
        }
    }
}

fn object_quality<'a, 'p>(
    obj: &'a SdfObject,
    mut segs: impl Iterator<Item = &'p str>,
) -> Option<&'a DataQuality> {
    match segs.next()? {
        "sdfProperty" => descend(obj.sdf_property.get(segs.next()?)?, segs),
        "sdfData" => descend(obj.sdf_data.get(segs.next()?)?, segs),
        "sdfAction" => {
            let action = obj.sdf_action.get(segs.next()?)?;
            match segs.next()? {
                "sdfInputData" => descend(action.sdf_input_data.as_ref()?, segs),
                "sdfOutputData" => descend(action.sdf_output_data.as_ref()?, segs),
                "sdfData" => descend(action.sdf_data.get(segs.next()?)?, segs),
                _ => None,
            }
        }
        "sdfEvent" => {
            let event = obj.sdf_event.get(segs.next()?)?;
            match segs.next()? {
                "sdfOutputData" => descend(event.sdf_output_data.as_ref()?, segs),
                "sdfData" => descend(event.sdf_data.get(segs.next()?)?, segs),
                _ => None,
            }
        }
        _ => None,
    }
}

fn object_quality_mut<'a, 'p>(
    obj: &'a mut SdfObject,
    mut segs: impl Iterator<Item = &'p str>,
) -> Option<&'a mut DataQuality> {
    match segs.next()? {
        "sdfProperty" => descend_mut(obj.sdf_property.get_mut(segs.next()?)?, segs),
        "sdfData" => descend_mut(obj.sdf_data.get_mut(segs.next()?)?, segs),
        "sdfAction" => {
            let action = obj.sdf_action.get_mut(segs.next()?)?;
            match segs.next()? {
                "sdfInputData" => descend_mut(action.sdf_input_data.as_mut()?, segs),
                "sdfOutputData" => descend_mut(action.sdf_output_data.as_mut()?, segs),
                "sdfData" => descend_mut(action.sdf_data.get_mut(segs.next()?)?, segs),
                _ => None,
            }
        }
        "sdfEvent" => {
            let event = obj.sdf_event.get_mut(segs.next()?)?;
            match segs.next()? {
                "sdfOutputData" => descend_mut(event.sdf_output_data.as_mut()?, segs),
                "sdfData" => descend_mut(event.sdf_data.get_mut(segs.next()?)?, segs),
                _ => None,
            }
        }
        _ => None,
    }
}

fn descend<'a, 'p>(
    mut q: &'a DataQuality,
    mut segs: impl Iterator<Item = &'p str>,
) -> Option<&'a DataQuality> {
    loop {
        match segs.next() {
            None => return Some(q),
            Some("properties") => q = q.properties.get(segs.next()?)?,
            Some("items") => q = q.items.as_deref()?,
            Some("sdfChoice") => q = q.sdf_choice.get(segs.next()?)?,
            Some(_) => return None,
        }
    }
}

fn descend_mut<'a, 'p>(
    mut q: &'a mut DataQuality,
    mut segs: impl Iterator<Item = &'p str>,
) -> Option<&'a mut DataQuality> {
    loop {
        match segs.next() {
            None => return Some(q),
            Some("properties") => q = q.properties.get_mut(segs.next()?)?,
            Some("items") => q = q.items.as_deref_mut()?,
            Some("sdfChoice") => q = q.sdf_choice.get_mut(segs.next()?)?,
            Some(_) => return None,
        }
    }
}
