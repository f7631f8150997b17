//! Structural translation, Tree A -> Tree B.
//!
//! A module becomes one `sdfObject`: top-level data nodes map to
//! `sdfProperty` entries, rpcs to `sdfAction`, notifications to `sdfEvent`,
//! and reusable definitions (typedefs, identities, groupings) to shared
//! `sdfData`. Every translated node is registered in the path->pointer map;
//! every cross-link (leafref, uses, identity base, derived type) is deferred
//! to the resolver, never chased during the walk.

use std::collections::BTreeSet;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::notes::{self, Tag};
use crate::path::{child_pointer, local_path, sdf_pointer, step_pointer, yang_path};
use crate::resolve::{Holder, ResolutionContext};
use crate::sdf::{DataQuality, SdfAction, SdfDocument, SdfEvent, SdfInfo, SdfObject};
use crate::translate::types::{identityref_to_quality, type_to_quality, TypeSite};
use crate::yang::{Module, NodeId, NodeKind, Status};

/// Translate one fully-materialized module into an SDF document.
///
/// Augments are assumed to have been spliced already
/// ([`crate::resolve::resolve_augments`]); leftover augment holders are
/// skipped. The caller runs [`crate::resolve::resolve_document_refs`] once
/// per translation unit afterwards.
pub fn translate_module(
    module: &Module,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> SdfDocument {
    let mut doc = SdfDocument::default();

    let info = SdfInfo {
        title: Some(module.name.clone()),
        version: module.revision.clone(),
        ..Default::default()
    };
    doc.info = Some(info);

    if !module.prefix.is_empty() {
        if !module.namespace.is_empty() {
            doc.namespace
                .insert(module.prefix.clone(), module.namespace.clone());
            ctx.register_namespace(&module.prefix, &module.namespace);
        }
        doc.default_namespace = Some(module.prefix.clone());
    }

    let obj_ptr = sdf_pointer(&[("sdfObject", &module.name)]);
    let mut obj = SdfObject::default();
    obj.label = Some(module.name.clone());
    obj.description = module.description.clone();
    if let Some(ref org) = module.organization {
        notes::append_note(&mut obj.description, Tag::Organization, org);
    }
    if let Some(ref contact) = module.contact {
        notes::append_note(&mut obj.description, Tag::Contact, contact);
    }
    if let Some(ref rev) = module.revision {
        notes::append_note(&mut obj.description, Tag::Revision, rev);
    }
    for feature in &module.features {
        notes::append_note(&mut obj.description, Tag::Feature, feature);
    }

    // Reusable definitions first; data nodes may reference them, but order
    // does not actually matter since every link goes through the resolver.
    for (name, td) in &module.typedefs {
        let ptr = child_pointer(&obj_ptr, "sdfData", name);
        let site = TypeSite {
            module,
            node: None,
            pointer: ptr.clone(),
        };
        let mut q = type_to_quality(td, &site, ctx, diags);
        if q.label.is_none() {
            q.label = Some(name.clone());
        }
        register_definition(ctx, module, name, &ptr);
        obj.sdf_data.insert(name.clone(), q);
    }

    for (name, identity) in &module.identities {
        let ptr = child_pointer(&obj_ptr, "sdfData", name);
        let site = TypeSite {
            module,
            node: None,
            pointer: ptr.clone(),
        };
        let mut q = identityref_to_quality(&identity.bases, &site, ctx);
        if let Some(ref d) = identity.description {
            prepend_description(&mut q, d);
        }
        if identity.status != Status::Current {
            notes::append_note(&mut q.description, Tag::Status, identity.status.as_str());
        }
        register_definition(ctx, module, name, &ptr);
        obj.sdf_data.insert(name.clone(), q);
    }

    for &top in &module.top {
        let node = module.node(top);
        let name = node.name.clone();
        match node.kind {
            NodeKind::Grouping => {
                let ptr = child_pointer(&obj_ptr, "sdfData", &name);
                let q = object_from_children(module, top, &ptr, ctx, diags);
                register_definition(ctx, module, &name, &ptr);
                obj.sdf_data.insert(name, q);
            }
            NodeKind::Rpc | NodeKind::Action => {
                let ptr = child_pointer(&obj_ptr, "sdfAction", &name);
                let action = action_from_node(module, top, &ptr, ctx, diags);
                obj.sdf_action.insert(name, action);
            }
            NodeKind::Notification => {
                let ptr = child_pointer(&obj_ptr, "sdfEvent", &name);
                let event = event_from_node(module, top, &ptr, ctx, diags);
                obj.sdf_event.insert(name, event);
            }
            NodeKind::Augment => {
                // Still pending after the augment pass; already warned there.
                tracing::debug!(name = %name, "skipping unresolved augment holder");
            }
            NodeKind::Choice => {
                diags.warn_at(
                    DiagnosticCode::UnsupportedConstruct,
                    &local_path(module, top),
                    "top-level choice has no object to attach to",
                );
            }
            _ => {
                let ptr = child_pointer(&obj_ptr, "sdfProperty", &name);
                if let Some(q) = node_to_quality(module, top, &ptr, ctx, diags) {
                    if node.mandatory {
                        obj.sdf_required.push(name.clone());
                    }
                    obj.sdf_property.insert(name, q);
                }
            }
        }
    }

    doc.sdf_object.insert(module.name.clone(), obj);
    doc
}

/// Map both the bare and the prefixed name of a module-level definition.
fn register_definition(ctx: &mut ResolutionContext, module: &Module, name: &str, ptr: &str) {
    ctx.map_yang_path(format!("/{}", name), ptr);
    if !module.prefix.is_empty() {
        ctx.map_yang_path(format!("/{}:{}", module.prefix, name), ptr);
    }
}

fn register_node(ctx: &mut ResolutionContext, module: &Module, id: NodeId, ptr: &str) {
    ctx.map_yang_path(local_path(module, id), ptr);
    if !module.prefix.is_empty() {
        ctx.map_yang_path(yang_path(module, id, &module.name, true), ptr);
    }
}

/// Translate one data node into a quality. Returns `None` for kinds that do
/// not stand alone as a quality (choice is attached by the enclosing object).
fn node_to_quality(
    module: &Module,
    id: NodeId,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> Option<DataQuality> {
    let node = module.node(id);
    let mut q = match node.kind {
        NodeKind::Leaf => {
            let t = node.type_desc.clone().unwrap_or_default();
            let site = TypeSite {
                module,
                node: Some(id),
                pointer: ptr.to_string(),
            };
            type_to_quality(&t, &site, ctx, diags)
        }

        NodeKind::LeafList => {
            let t = node.type_desc.clone().unwrap_or_default();
            let item_ptr = step_pointer(ptr, "items");
            let site = TypeSite {
                module,
                node: Some(id),
                pointer: item_ptr,
            };
            let item = type_to_quality(&t, &site, ctx, diags);
            let mut q = DataQuality::of_type("array");
            q.items = Some(Box::new(item));
            if node.min_elements > 0 {
                q.min_items = Some(node.min_elements);
            }
            q.max_items = node.max_elements;
            q
        }

        NodeKind::Container => {
            let mut q = object_from_children(module, id, ptr, ctx, diags);
            if node.presence {
                notes::append_note(&mut q.description, Tag::Presence, "");
            }
            q
        }

        NodeKind::List => {
            let item_ptr = step_pointer(ptr, "items");
            let item = object_from_children(module, id, &item_ptr, ctx, diags);
            let mut q = DataQuality::of_type("array");
            q.items = Some(Box::new(item));
            if node.min_elements > 0 {
                q.min_items = Some(node.min_elements);
            }
            q.max_items = node.max_elements;

            // Keys synthesized on an earlier reverse pass are not real keys.
            let artificial: BTreeSet<&str> = node
                .extensions
                .iter()
                .filter(|e| e.tag == Tag::ArtificialKey)
                .map(|e| e.argument.as_str())
                .collect();
            let keys: Vec<&str> = node
                .keys
                .iter()
                .map(String::as_str)
                .filter(|k| !artificial.contains(k))
                .collect();
            if !keys.is_empty() {
                notes::append_note(&mut q.description, Tag::Key, &keys.join(" "));
            }
            if node.ordered_by_user {
                notes::append_note(&mut q.description, Tag::OrderedBy, "user");
            }
            q
        }

        NodeKind::Uses => {
            let target = node.uses_target.clone().unwrap_or_else(|| node.name.clone());
            if node.children.is_empty() {
                let mut q = DataQuality::default();
                ctx.defer_node_ref(
                    format!("/{}", target),
                    None,
                    Holder::Quality(ptr.to_string()),
                );
                q.label = Some(node.name.clone());
                q
            } else {
                // Refined or augmented use site: reference-plus-override has
                // no equivalent, so the grouping is inlined fully.
                inline_grouping(module, id, &target, ptr, ctx, diags)
            }
        }

        NodeKind::Choice => return None,

        other => {
            diags.warn_at(
                DiagnosticCode::UnsupportedConstruct,
                &local_path(module, id),
                format!("{} node cannot appear here", other.keyword()),
            );
            return None;
        }
    };

    if let Some(ref d) = node.description {
        prepend_description(&mut q, d);
    }
    if node.status != Status::Current {
        notes::append_note(&mut q.description, Tag::Status, node.status.as_str());
    }
    if let Some(ref when) = node.when {
        notes::append_note(&mut q.description, Tag::When, when);
    }
    for must in &node.must {
        notes::append_note(&mut q.description, Tag::Must, must);
    }
    for feature in &node.if_features {
        notes::append_note(&mut q.description, Tag::IfFeature, feature);
    }
    for ext in &node.extensions {
        if let Tag::Other(_) = ext.tag {
            notes::append_note(&mut q.description, ext.tag.clone(), &ext.argument);
        }
    }
    if let Some(ref r) = node.reference {
        notes::append_note(&mut q.description, Tag::Reference, r);
    }
    if !node.config {
        q.writable = Some(false);
        q.readable = Some(true);
    }

    // A uses statement is transparent: it is not an addressable schema node,
    // and its path would shadow the grouping definition's map entry.
    if node.kind != NodeKind::Uses {
        register_node(ctx, module, id, ptr);
    }
    Some(q)
}

/// Object-shaped quality built from a node's children. Choice children
/// become choice variants on this object, one per case.
fn object_from_children(
    module: &Module,
    parent: NodeId,
    base_ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> DataQuality {
    let mut q = DataQuality::of_type("object");
    for &child in module.children_of(Some(parent)) {
        let node = module.node(child);
        let name = node.name.clone();
        if node.kind == NodeKind::Choice {
            notes::append_note(&mut q.description, Tag::Other("choice".into()), &name);
            for &case in module.children_of(Some(child)) {
                let case_name = module.node(case).name.clone();
                let case_ptr = child_pointer(base_ptr, "sdfChoice", &case_name);
                let variant = object_from_children(module, case, &case_ptr, ctx, diags);
                q.sdf_choice.insert(case_name, variant);
            }
            continue;
        }
        let child_ptr = child_pointer(base_ptr, "properties", &name);
        if let Some(cq) = node_to_quality(module, child, &child_ptr, ctx, diags) {
            if node.mandatory {
                q.required.push(name.clone());
            }
            q.properties.insert(name, cq);
        }
    }
    q
}

fn inline_grouping(
    module: &Module,
    uses: NodeId,
    target: &str,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> DataQuality {
    let bare = target.split_once(':').map(|(_, n)| n).unwrap_or(target);
    let grouping = module
        .top
        .iter()
        .copied()
        .find(|&t| module.node(t).kind == NodeKind::Grouping && module.node(t).name == bare);

    let mut q = match grouping {
        Some(g) => object_from_children(module, g, ptr, ctx, diags),
        None => {
            diags.warn_at(
                DiagnosticCode::UnresolvedNodeRef,
                &local_path(module, uses),
                format!("grouping '{}' not found for inlining", target),
            );
            DataQuality::of_type("object")
        }
    };

    // Refinement children of the use site override the grouping's.
    let refinements = object_from_children(module, uses, ptr, ctx, diags);
    for (name, rq) in refinements.properties {
        q.properties.insert(name, rq);
    }
    notes::append_note(&mut q.description, Tag::InlinedGrouping, target);
    q
}

fn action_from_node(
    module: &Module,
    rpc: NodeId,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> SdfAction {
    let node = module.node(rpc);
    let mut action = SdfAction::default();
    action.label = Some(node.name.clone());
    action.description = node.description.clone();
    if node.status != Status::Current {
        notes::append_note(&mut action.description, Tag::Status, node.status.as_str());
    }

    for &child in module.children_of(Some(rpc)) {
        match module.node(child).kind {
            NodeKind::Input => {
                let in_ptr = step_pointer(ptr, "sdfInputData");
                action.sdf_input_data =
                    Some(object_from_children(module, child, &in_ptr, ctx, diags));
            }
            NodeKind::Output => {
                let out_ptr = step_pointer(ptr, "sdfOutputData");
                action.sdf_output_data =
                    Some(object_from_children(module, child, &out_ptr, ctx, diags));
            }
            other => diags.warn_at(
                DiagnosticCode::UnsupportedConstruct,
                &local_path(module, child),
                format!("{} under rpc", other.keyword()),
            ),
        }
    }
    action
}

fn event_from_node(
    module: &Module,
    notification: NodeId,
    ptr: &str,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> SdfEvent {
    let node = module.node(notification);
    let mut event = SdfEvent::default();
    event.label = Some(node.name.clone());
    event.description = node.description.clone();
    let out_ptr = step_pointer(ptr, "sdfOutputData");
    event.sdf_output_data = Some(object_from_children(
        module,
        notification,
        &out_ptr,
        ctx,
        diags,
    ));
    event
}

/// Put human-readable text in front of whatever the type translation
/// already wrote (notes, enum member lines).
fn prepend_description(q: &mut DataQuality, text: &str) {
    q.description = Some(match q.description.take() {
        Some(existing) => format!("{}\n{}", text, existing),
        None => text.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yang::{SchemaNode, TypeDescriptor, TypeKind};
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, kind: TypeKind) -> SchemaNode {
        SchemaNode::new(NodeKind::Leaf, name).with_type(TypeDescriptor::new(kind))
    }

    fn run(module: &Module) -> (SdfDocument, ResolutionContext, Diagnostics) {
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();
        let mut doc = translate_module(module, &mut ctx, &mut diags);
        crate::resolve::resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        (doc, ctx, diags)
    }

    #[test]
    fn module_becomes_object_with_properties() {
        let mut m = Module::new("demo");
        m.prefix = "dm".into();
        m.namespace = "urn:example:demo".into();
        m.add_child(None, leaf("hostname", TypeKind::String));

        let (doc, _, diags) = run(&m);
        let obj = &doc.sdf_object["demo"];
        assert_eq!(
            obj.sdf_property["hostname"].json_type.as_deref(),
            Some("string")
        );
        assert_eq!(doc.namespace["dm"], "urn:example:demo");
        assert_eq!(doc.default_namespace.as_deref(), Some("dm"));
        assert!(diags.is_empty());
    }

    #[test]
    fn container_nests_as_object_property() {
        let mut m = Module::new("demo");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "system"));
        m.add_child(Some(c), leaf("location", TypeKind::String));

        let (doc, _, _) = run(&m);
        let sys = &doc.sdf_object["demo"].sdf_property["system"];
        assert_eq!(sys.json_type.as_deref(), Some("object"));
        assert!(sys.properties.contains_key("location"));
    }

    #[test]
    fn presence_container_gets_marker_note() {
        let mut m = Module::new("demo");
        let mut c = SchemaNode::new(NodeKind::Container, "ntp");
        c.presence = true;
        m.add_child(None, c);

        let (doc, _, _) = run(&m);
        let ntp = &doc.sdf_object["demo"].sdf_property["ntp"];
        let (_, notes) = notes::extract_notes(ntp.description.as_deref().unwrap());
        assert!(notes::find_note(&notes, &Tag::Presence).is_some());
    }

    #[test]
    fn list_maps_to_array_of_objects_with_key_note() {
        let mut m = Module::new("demo");
        let mut list = SchemaNode::new(NodeKind::List, "interface");
        list.keys = vec!["name".into()];
        list.min_elements = 2;
        let l = m.add_child(None, list);
        m.add_child(Some(l), leaf("name", TypeKind::String));

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["interface"];
        assert_eq!(q.json_type.as_deref(), Some("array"));
        assert_eq!(q.min_items, Some(2));
        let items = q.items.as_deref().unwrap();
        assert!(items.properties.contains_key("name"));
        let (_, notes) = notes::extract_notes(q.description.as_deref().unwrap());
        assert_eq!(
            notes::find_note(&notes, &Tag::Key).map(|n| n.argument.as_str()),
            Some("name")
        );
    }

    #[test]
    fn zero_min_elements_is_absent() {
        let mut m = Module::new("demo");
        let l = m.add_child(None, SchemaNode::new(NodeKind::List, "servers"));
        m.add_child(Some(l), leaf("address", TypeKind::String));

        let (doc, _, _) = run(&m);
        assert_eq!(
            doc.sdf_object["demo"].sdf_property["servers"].min_items,
            None
        );
    }

    #[test]
    fn leaf_list_is_array_of_scalars() {
        let mut m = Module::new("demo");
        let mut ll = SchemaNode::new(NodeKind::LeafList, "dns");
        ll.type_desc = Some(TypeDescriptor::new(TypeKind::String));
        ll.min_elements = 2;
        m.add_child(None, ll);

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["dns"];
        assert_eq!(q.json_type.as_deref(), Some("array"));
        assert_eq!(q.min_items, Some(2));
        assert_eq!(
            q.items.as_deref().unwrap().json_type.as_deref(),
            Some("string")
        );
    }

    #[test]
    fn uses_resolves_to_sdf_data_reference() {
        let mut m = Module::new("demo");
        let g = m.add_child(None, SchemaNode::new(NodeKind::Grouping, "endpoint"));
        m.add_child(Some(g), leaf("port", TypeKind::Uint16));
        let mut uses = SchemaNode::new(NodeKind::Uses, "endpoint");
        uses.uses_target = Some("endpoint".into());
        m.add_child(None, uses);

        let (doc, ctx, _) = run(&m);
        let obj = &doc.sdf_object["demo"];
        assert!(obj.sdf_data.contains_key("endpoint"));
        assert_eq!(
            obj.sdf_property["endpoint"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfData/endpoint")
        );
        assert_eq!(ctx.pending_count(), 0);
    }

    #[test]
    fn refined_uses_is_inlined_with_note() {
        let mut m = Module::new("demo");
        let g = m.add_child(None, SchemaNode::new(NodeKind::Grouping, "endpoint"));
        m.add_child(Some(g), leaf("port", TypeKind::Uint16));
        let mut uses = SchemaNode::new(NodeKind::Uses, "endpoint");
        uses.uses_target = Some("endpoint".into());
        let u = m.add_child(None, uses);
        m.add_child(Some(u), leaf("vrf", TypeKind::String));

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["endpoint"];
        assert!(q.sdf_ref.is_none());
        assert!(q.properties.contains_key("port"));
        assert!(q.properties.contains_key("vrf"));
        let (_, notes) = notes::extract_notes(q.description.as_deref().unwrap());
        assert!(notes::find_note(&notes, &Tag::InlinedGrouping).is_some());
    }

    #[test]
    fn choice_attaches_cases_to_enclosing_object() {
        let mut m = Module::new("demo");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "transport"));
        let choice = m.add_child(Some(c), SchemaNode::new(NodeKind::Choice, "endpoint"));
        let tcp = m.add_child(Some(choice), SchemaNode::new(NodeKind::Case, "tcp"));
        m.add_child(Some(tcp), leaf("port", TypeKind::Uint16));
        let tls = m.add_child(Some(choice), SchemaNode::new(NodeKind::Case, "tls"));
        m.add_child(Some(tls), leaf("cert", TypeKind::String));

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["transport"];
        assert_eq!(q.sdf_choice.len(), 2);
        assert!(q.sdf_choice["tcp"].properties.contains_key("port"));
        assert!(q.sdf_choice["tls"].properties.contains_key("cert"));
    }

    #[test]
    fn rpc_maps_to_action_with_input_output() {
        let mut m = Module::new("demo");
        let rpc = m.add_child(None, SchemaNode::new(NodeKind::Rpc, "restart"));
        let input = m.add_child(Some(rpc), SchemaNode::new(NodeKind::Input, "input"));
        m.add_child(Some(input), leaf("delay", TypeKind::Uint32));
        let output = m.add_child(Some(rpc), SchemaNode::new(NodeKind::Output, "output"));
        m.add_child(Some(output), leaf("ok", TypeKind::Boolean));

        let (doc, _, _) = run(&m);
        let action = &doc.sdf_object["demo"].sdf_action["restart"];
        assert!(action
            .sdf_input_data
            .as_ref()
            .unwrap()
            .properties
            .contains_key("delay"));
        assert!(action
            .sdf_output_data
            .as_ref()
            .unwrap()
            .properties
            .contains_key("ok"));
    }

    #[test]
    fn rpc_without_input_has_absent_input_data() {
        let mut m = Module::new("demo");
        m.add_child(None, SchemaNode::new(NodeKind::Rpc, "ping"));
        let (doc, _, _) = run(&m);
        let action = &doc.sdf_object["demo"].sdf_action["ping"];
        assert!(action.sdf_input_data.is_none());
        assert!(action.sdf_output_data.is_none());
    }

    #[test]
    fn notification_maps_to_event() {
        let mut m = Module::new("demo");
        let n = m.add_child(None, SchemaNode::new(NodeKind::Notification, "link-down"));
        m.add_child(Some(n), leaf("if-name", TypeKind::String));

        let (doc, _, _) = run(&m);
        let event = &doc.sdf_object["demo"].sdf_event["link-down"];
        assert!(event
            .sdf_output_data
            .as_ref()
            .unwrap()
            .properties
            .contains_key("if-name"));
    }

    #[test]
    fn leafref_resolves_to_pointer_of_target() {
        let mut m = Module::new("demo");
        let ifs = m.add_child(None, SchemaNode::new(NodeKind::Container, "interfaces"));
        m.add_child(Some(ifs), leaf("name", TypeKind::String));
        let mut peer = SchemaNode::new(NodeKind::Leaf, "peer");
        let mut t = TypeDescriptor::new(TypeKind::Leafref);
        t.leafref_path = Some("/interfaces/name".into());
        peer.type_desc = Some(t);
        m.add_child(None, peer);

        let (doc, ctx, diags) = run(&m);
        assert_eq!(
            doc.sdf_object["demo"].sdf_property["peer"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfProperty/interfaces/properties/name")
        );
        assert_eq!(ctx.pending_count(), 0);
        assert!(diags.is_empty());
    }

    #[test]
    fn identity_with_two_bases_gets_base_properties() {
        let mut m = Module::new("demo");
        m.identities.insert(
            "aes".into(),
            crate::yang::Identity {
                name: "aes".into(),
                bases: vec!["crypto-alg".into(), "block-alg".into()],
                description: None,
                status: Status::Current,
            },
        );
        m.identities.insert(
            "crypto-alg".into(),
            crate::yang::Identity {
                name: "crypto-alg".into(),
                ..Default::default()
            },
        );
        m.identities.insert(
            "block-alg".into(),
            crate::yang::Identity {
                name: "block-alg".into(),
                ..Default::default()
            },
        );

        let (doc, ctx, _) = run(&m);
        let aes = &doc.sdf_object["demo"].sdf_data["aes"];
        assert_eq!(
            aes.properties["base_0"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfData/crypto-alg")
        );
        assert_eq!(
            aes.properties["base_1"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfData/block-alg")
        );
        assert_eq!(ctx.pending_count(), 0);
    }

    #[test]
    fn config_false_becomes_read_only_property() {
        let mut m = Module::new("demo");
        let mut counter = leaf("rx-bytes", TypeKind::Uint64);
        counter.config = false;
        m.add_child(None, counter);

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["rx-bytes"];
        assert_eq!(q.writable, Some(false));
        assert_eq!(q.readable, Some(true));
    }

    #[test]
    fn status_and_when_travel_as_notes() {
        let mut m = Module::new("demo");
        let mut l = leaf("legacy", TypeKind::String);
        l.status = Status::Deprecated;
        l.when = Some("../mode = 'compat'".into());
        m.add_child(None, l);

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["legacy"];
        let (_, notes) = notes::extract_notes(q.description.as_deref().unwrap());
        assert_eq!(
            notes::find_note(&notes, &Tag::Status).map(|n| n.argument.as_str()),
            Some("deprecated")
        );
        assert_eq!(
            notes::find_note(&notes, &Tag::When).map(|n| n.argument.as_str()),
            Some("../mode = 'compat'")
        );
    }

    #[test]
    fn artificial_keys_are_dropped_from_key_note() {
        let mut m = Module::new("demo");
        let mut list = SchemaNode::new(NodeKind::List, "entries");
        list.keys = vec!["synth".into(), "real".into()];
        list.extensions.push(crate::yang::ExtensionInstance {
            tag: Tag::ArtificialKey,
            argument: "synth".into(),
        });
        let l = m.add_child(None, list);
        m.add_child(Some(l), leaf("synth", TypeKind::String));
        m.add_child(Some(l), leaf("real", TypeKind::String));

        let (doc, _, _) = run(&m);
        let q = &doc.sdf_object["demo"].sdf_property["entries"];
        let (_, notes) = notes::extract_notes(q.description.as_deref().unwrap());
        assert_eq!(
            notes::find_note(&notes, &Tag::Key).map(|n| n.argument.as_str()),
            Some("real")
        );
    }

    #[test]
    fn typedef_reference_is_deferred_and_resolved() {
        let mut m = Module::new("demo");
        m.typedefs.insert(
            "percent".into(),
            TypeDescriptor {
                kind: TypeKind::Uint8,
                range: Some("0..100".into()),
                ..Default::default()
            },
        );
        let mut l = SchemaNode::new(NodeKind::Leaf, "load");
        let mut t = TypeDescriptor::default();
        t.source_typedef = Some("percent".into());
        l.type_desc = Some(t);
        m.add_child(None, l);

        let (doc, ctx, _) = run(&m);
        assert_eq!(
            doc.sdf_object["demo"].sdf_property["load"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfData/percent")
        );
        assert_eq!(ctx.pending_count(), 0);
    }
}
