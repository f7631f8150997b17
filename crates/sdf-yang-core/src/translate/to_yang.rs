//! Structural translation, Tree B -> Tree A.
//!
//! The first `sdfObject` becomes the module itself: its properties turn into
//! top-level data nodes, actions into rpcs, events into notifications, and
//! `sdfData` entries back into typedefs, identities, and groupings. Further
//! objects (and objects nested in things) become top-level containers.
//!
//! Conversion notes are decoded before any shape inference; a note always
//! wins over what the facets alone would suggest.

use crate::diagnostics::Diagnostics;
use crate::notes::{self, Note, Tag};
use crate::path::{child_pointer, local_path, step_pointer};
use crate::resolve::{resolve_module_refs, Holder, ResolutionContext};
use crate::sdf::{DataQuality, SdfDocument, SdfObject};
use crate::translate::types::{is_leaf_quality, quality_to_type};
use crate::yang::{
    ExtensionInstance, Identity, Module, ModuleSet, NodeId, NodeKind, SchemaNode, Status,
    TypeKind,
};

/// Translate an SDF document into one module.
///
/// Leafref holders are resolved against the pointer->path map before the
/// module is returned; anything still dangling is warned about and left as
/// a leafref without a target.
pub fn translate_document(
    doc: &SdfDocument,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> Module {
    let name = doc
        .sdf_object
        .keys()
        .next()
        .cloned()
        .or_else(|| doc.info.as_ref().and_then(|i| i.title.clone()))
        .unwrap_or_else(|| "converted-model".to_string());

    let mut module = Module::new(&name);
    if let Some(ref prefix) = doc.default_namespace {
        module.prefix = prefix.clone();
        if let Some(uri) = doc.namespace.get(prefix) {
            module.namespace = uri.clone();
        }
        ctx.register_namespace(&module.prefix, &module.namespace);
    }
    if let Some(ref info) = doc.info {
        module.revision = info.version.clone();
    }

    let mut first = true;
    for (obj_name, obj) in &doc.sdf_object {
        let obj_ptr = format!("#/sdfObject/{}", obj_name);
        if first {
            absorb_object_header(&mut module, obj);
            convert_object(doc, &mut module, obj, &obj_ptr, None, ctx, diags);
            first = false;
        } else {
            let container = module.add_child(None, SchemaNode::new(NodeKind::Container, obj_name));
            convert_object(doc, &mut module, obj, &obj_ptr, Some(container), ctx, diags);
        }
    }

    for (thing_name, thing) in &doc.sdf_thing {
        for (obj_name, obj) in &thing.sdf_object {
            let obj_ptr = format!("#/sdfThing/{}/sdfObject/{}", thing_name, obj_name);
            let container = module.add_child(None, SchemaNode::new(NodeKind::Container, obj_name));
            convert_object(doc, &mut module, obj, &obj_ptr, Some(container), ctx, diags);
        }
    }

    // Document-level members outside any object.
    for (dname, dq) in &doc.sdf_data {
        let ptr = format!("#/sdfData/{}", dname);
        convert_data_entry(doc, &mut module, dname, dq, &ptr, ctx, diags);
    }
    for (pname, pq) in &doc.sdf_property {
        let ptr = format!("#/sdfProperty/{}", pname);
        quality_to_node(doc, &mut module, None, pname, pq, &ptr, ctx, diags);
    }

    // Leafref holders need the complete pointer->path map.
    let mut set = ModuleSet::new();
    set.push(module);
    resolve_module_refs(&mut set, ctx, diags);
    set.modules.pop().unwrap_or_default()
}

/// Module-level statements travel as notes on the root object's description.
fn absorb_object_header(module: &mut Module, obj: &SdfObject) {
    let (clean, header_notes) = split_description(obj.description.as_deref());
    module.description = clean;
    for note in &header_notes {
        match note.tag {
            Tag::Organization => module.organization = Some(note.argument.clone()),
            Tag::Contact => module.contact = Some(note.argument.clone()),
            Tag::Revision => module.revision = Some(note.argument.clone()),
            Tag::Feature => module.features.push(note.argument.clone()),
            _ => {}
        }
    }
}

fn convert_object(
    doc: &SdfDocument,
    module: &mut Module,
    obj: &SdfObject,
    obj_ptr: &str,
    parent: Option<NodeId>,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    for (name, dq) in &obj.sdf_data {
        let ptr = child_pointer(obj_ptr, "sdfData", name);
        convert_data_entry(doc, module, name, dq, &ptr, ctx, diags);
    }

    for (name, pq) in &obj.sdf_property {
        let ptr = child_pointer(obj_ptr, "sdfProperty", name);
        quality_to_node(doc, module, parent, name, pq, &ptr, ctx, diags);
    }
    for required in &obj.sdf_required {
        if let Some(c) = module.find_child(parent, required) {
            module.node_mut(c).mandatory = true;
        }
    }

    for (name, action) in &obj.sdf_action {
        let ptr = child_pointer(obj_ptr, "sdfAction", name);
        let (clean, _) = split_description(action.description.as_deref());
        let mut node = SchemaNode::new(NodeKind::Rpc, name);
        node.description = clean;
        let rpc = module.add_child(parent, node);

        match action.sdf_input_data {
            Some(ref input) => {
                let input_node = module.add_child(Some(rpc), SchemaNode::new(NodeKind::Input, "input"));
                let in_ptr = step_pointer(&ptr, "sdfInputData");
                let (_, in_notes) = split_description(input.description.as_deref());
                populate_object(doc, module, input_node, input, &in_ptr, &in_notes, ctx, diags);
            }
            None => module.node_mut(rpc).extensions.push(ExtensionInstance {
                tag: Tag::ImplicitEmpty,
                argument: "input".to_string(),
            }),
        }
        match action.sdf_output_data {
            Some(ref output) => {
                let output_node =
                    module.add_child(Some(rpc), SchemaNode::new(NodeKind::Output, "output"));
                let out_ptr = step_pointer(&ptr, "sdfOutputData");
                let (_, out_notes) = split_description(output.description.as_deref());
                populate_object(doc, module, output_node, output, &out_ptr, &out_notes, ctx, diags);
            }
            None => module.node_mut(rpc).extensions.push(ExtensionInstance {
                tag: Tag::ImplicitEmpty,
                argument: "output".to_string(),
            }),
        }
    }

    for (name, event) in &obj.sdf_event {
        let ptr = child_pointer(obj_ptr, "sdfEvent", name);
        let (clean, _) = split_description(event.description.as_deref());
        let mut node = SchemaNode::new(NodeKind::Notification, name);
        node.description = clean;
        let id = module.add_child(parent, node);
        if let Some(ref output) = event.sdf_output_data {
            let out_ptr = step_pointer(&ptr, "sdfOutputData");
            let (_, out_notes) = split_description(output.description.as_deref());
            populate_object(doc, module, id, output, &out_ptr, &out_notes, ctx, diags);
        }
    }
}

/// A shared `sdfData` entry comes back as a typedef, an identity, or a
/// grouping, depending on its shape and notes.
fn convert_data_entry(
    doc: &SdfDocument,
    module: &mut Module,
    name: &str,
    dq: &DataQuality,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    let (clean, dnotes) = split_description(dq.description.as_deref());
    ctx.map_pointer(ptr, format!("/{}", name));

    if is_leaf_quality(dq, &dnotes) {
        let t = quality_to_type(dq, &dnotes, diags);
        if t.kind == TypeKind::IdentityRef && t.source_typedef.is_none() {
            module.identities.insert(
                name.to_string(),
                Identity {
                    name: name.to_string(),
                    bases: t.identity_bases,
                    description: clean,
                    status: status_from_notes(&dnotes),
                },
            );
        } else {
            module.typedefs.insert(name.to_string(), t);
        }
        return;
    }

    // Structural entry: a grouping. A referenced array carries its list
    // inside the grouping, keys synthesized if none were declared.
    let mut g = SchemaNode::new(NodeKind::Grouping, name);
    g.description = clean.clone();
    let grouping = module.add_child(None, g);

    if dq.is_array() {
        quality_to_node(doc, module, Some(grouping), name, dq, ptr, ctx, diags);
    } else {
        populate_object(doc, module, grouping, dq, ptr, &dnotes, ctx, diags);
    }
}

/// Translate one quality into a data node under `parent`.
fn quality_to_node(
    doc: &SdfDocument,
    module: &mut Module,
    parent: Option<NodeId>,
    name: &str,
    q: &DataQuality,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> NodeId {
    let (clean, qnotes) = split_description(q.description.as_deref());

    // A reference to an object- or array-shaped shared definition is a
    // grouping use, not a leaf type.
    if let Some(ref target) = q.sdf_ref {
        // Only sdfData entries are shared definitions; object-shaped refs
        // into sdfProperty are leafrefs and stay on the leaf path below.
        let shaped = target.contains("/sdfData/")
            && doc
                .quality(target)
                .map(|t| t.is_object() || t.is_array())
                .unwrap_or(false);
        if shaped {
            let mut node = SchemaNode::new(NodeKind::Uses, name);
            node.uses_target = Some(ref_name(target));
            let id = module.add_child(parent, node);
            apply_common(module, id, clean, &qnotes, q);
            ctx.map_pointer(ptr, local_path(module, id));
            return id;
        }
    }

    if is_leaf_quality(q, &qnotes) {
        let t = quality_to_type(q, &qnotes, diags);
        let is_leafref = t.kind == TypeKind::Leafref;
        let node = SchemaNode::new(NodeKind::Leaf, name).with_type(t);
        let id = module.add_child(parent, node);
        apply_common(module, id, clean, &qnotes, q);
        ctx.map_pointer(ptr, local_path(module, id));
        if is_leafref {
            if let Some(ref target) = q.sdf_ref {
                ctx.defer_node_ref(
                    target.clone(),
                    None,
                    Holder::LeafType { module: 0, node: id },
                );
            }
        }
        return id;
    }

    if q.is_array() {
        let item = q.items.as_deref().cloned().unwrap_or_default();
        let (_, item_notes) = split_description(item.description.as_deref());
        let item_ptr = step_pointer(ptr, "items");

        if is_leaf_quality(&item, &item_notes) {
            let t = quality_to_type(&item, &item_notes, diags);
            let mut node = SchemaNode::new(NodeKind::LeafList, name).with_type(t);
            node.min_elements = q.min_items.unwrap_or(0);
            node.max_elements = q.max_items;
            let id = module.add_child(parent, node);
            apply_common(module, id, clean, &qnotes, q);
            ctx.map_pointer(ptr, local_path(module, id));
            return id;
        }

        let mut node = SchemaNode::new(NodeKind::List, name);
        node.min_elements = q.min_items.unwrap_or(0);
        node.max_elements = q.max_items;
        if let Some(keys) = notes::find_note(&qnotes, &Tag::Key) {
            node.keys = keys
                .argument
                .split_whitespace()
                .map(str::to_string)
                .collect();
        }
        if notes::find_note(&qnotes, &Tag::OrderedBy).is_some() {
            node.ordered_by_user = true;
        }
        let id = module.add_child(parent, node);
        apply_common(module, id, clean, &qnotes, q);
        ctx.map_pointer(ptr, local_path(module, id));
        populate_object(doc, module, id, &item, &item_ptr, &item_notes, ctx, diags);
        synthesize_key_if_missing(module, id);
        return id;
    }

    // Everything else is a container.
    let mut node = SchemaNode::new(NodeKind::Container, name);
    if notes::find_note(&qnotes, &Tag::Presence).is_some() {
        node.presence = true;
    }
    let id = module.add_child(parent, node);
    apply_common(module, id, clean, &qnotes, q);
    ctx.map_pointer(ptr, local_path(module, id));
    populate_object(doc, module, id, q, ptr, &qnotes, ctx, diags);
    id
}

/// Fill a structural node's children from an object quality: properties,
/// required flags, and choice variants.
fn populate_object(
    doc: &SdfDocument,
    module: &mut Module,
    parent: NodeId,
    q: &DataQuality,
    ptr: &str,
    qnotes: &[Note],
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    for (name, cq) in &q.properties {
        let child_ptr = child_pointer(ptr, "properties", name);
        quality_to_node(doc, module, Some(parent), name, cq, &child_ptr, ctx, diags);
    }
    for required in &q.required {
        if let Some(c) = module.find_child(Some(parent), required) {
            module.node_mut(c).mandatory = true;
        }
    }

    if !q.sdf_choice.is_empty() {
        let choice_name = qnotes
            .iter()
            .find(|n| n.tag == Tag::Other("choice".to_string()))
            .map(|n| n.argument.clone())
            .unwrap_or_else(|| "choice".to_string());
        let choice = module.add_child(Some(parent), SchemaNode::new(NodeKind::Choice, choice_name));
        for (case_name, vq) in &q.sdf_choice {
            let case = module.add_child(Some(choice), SchemaNode::new(NodeKind::Case, case_name));
            let case_ptr = child_pointer(ptr, "sdfChoice", case_name);
            let (_, case_notes) = split_description(vq.description.as_deref());
            populate_object(doc, module, case, vq, &case_ptr, &case_notes, ctx, diags);
        }
    }
}

/// Shared statements decoded from notes and property specializations.
fn apply_common(
    module: &mut Module,
    id: NodeId,
    clean: Option<String>,
    qnotes: &[Note],
    q: &DataQuality,
) {
    let node = module.node_mut(id);
    // Enumeration member lines ("name: text") live in the type; any other
    // prose stays on the node.
    let member_names: Vec<String> = node
        .type_desc
        .as_ref()
        .filter(|t| t.kind == TypeKind::Enumeration)
        .map(|t| t.enums.iter().map(|e| e.name.clone()).collect())
        .unwrap_or_default();
    if member_names.is_empty() {
        node.description = clean;
    } else if let Some(text) = clean {
        let rest: Vec<&str> = text
            .lines()
            .filter(|line| {
                !line
                    .split_once(": ")
                    .map_or(false, |(n, _)| member_names.iter().any(|m| m == n))
            })
            .collect();
        if !rest.is_empty() {
            node.description = Some(rest.join("\n"));
        }
    }
    node.status = status_from_notes(qnotes);
    for note in qnotes {
        match note.tag {
            Tag::When => node.when = Some(note.argument.clone()),
            Tag::Must => node.must.push(note.argument.clone()),
            Tag::IfFeature => node.if_features.push(note.argument.clone()),
            Tag::Reference => node.reference = Some(note.argument.clone()),
            _ => {}
        }
    }
    if q.writable == Some(false) {
        node.config = false;
    }
}

/// A config list must have a key. When none was declared, the first leaf in
/// the subtree is promoted and marked artificial, so a later forward pass
/// knows not to advertise it.
fn synthesize_key_if_missing(module: &mut Module, list: NodeId) {
    if !module.node(list).keys.is_empty() || !module.node(list).config {
        return;
    }
    let first_leaf = module
        .descendants(Some(list))
        .into_iter()
        .find(|&d| module.node(d).kind == NodeKind::Leaf);
    if let Some(leaf) = first_leaf {
        let key_name = module.node(leaf).name.clone();
        let node = module.node_mut(list);
        node.keys = vec![key_name.clone()];
        node.extensions.push(ExtensionInstance {
            tag: Tag::ArtificialKey,
            argument: key_name,
        });
    }
}

fn status_from_notes(qnotes: &[Note]) -> Status {
    notes::find_note(qnotes, &Tag::Status)
        .and_then(|n| Status::parse(&n.argument))
        .unwrap_or_default()
}

fn split_description(description: Option<&str>) -> (Option<String>, Vec<Note>) {
    match description {
        Some(d) => notes::extract_notes(d),
        None => (None, Vec::new()),
    }
}

/// Local name of a referenced definition: last pointer segment, prefix
/// stripped.
fn ref_name(pointer: &str) -> String {
    let seg = pointer.rsplit('/').next().unwrap_or(pointer);
    seg.split_once(':').map(|(_, n)| n).unwrap_or(seg).to_string()
}
