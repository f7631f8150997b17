//! Reference resolver: typed registries of pending links plus the
//! resolution pass run once a translation unit is fully materialized.
//!
//! Schema elements reference each other in arbitrary order (forward refs,
//! recursive groupings, cross-module identities, augments into modules not
//! yet loaded), so the structural walk never chases a reference directly.
//! It registers the link here, keyed entirely by the Path Namer's strings,
//! and the pass patches holders once both sides exist. Unresolved leftovers
//! are warned about and left dangling; the run still emits output.
//!
//! One [`ResolutionContext`] exists per run and is threaded explicitly
//! through the translation call graph.

use std::collections::BTreeMap;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::path::strip_leading_prefix;
use crate::sdf::SdfDocument;
use crate::yang::{Module, ModuleSet, NodeId, NodeKind, SchemaNode};

/// Synthetic top-level container name some emitters anchor primitives
/// under; tried as a last-resort path prefix when lookups miss. Not part
/// of the portable contract.
pub const LEGACY_ANCHOR: &str = "/buffer";

/// Where a pending reference lands once resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Holder {
    /// Quality node in the output SDF document, addressed by pointer;
    /// resolution sets its `sdfRef`.
    Quality(String),
    /// Leaf type in an output module; resolution sets its leafref path.
    LeafType { module: usize, node: NodeId },
}

/// A reference awaiting its target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRef {
    /// Literal target path as written in the source
    pub target: String,
    /// Alternative form tried on a miss (e.g. the expanded leafref path)
    pub fallback: Option<String>,
    pub holder: Holder,
}

/// An augment whose target may live in a module not yet translated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAugment {
    /// Module (index into the set) holding the augment node
    pub source_module: usize,
    /// The augment node itself; its children are the subtree to splice
    pub holder: NodeId,
    /// Declared target module name
    pub target_module: String,
    /// Declared target path within that module
    pub target_path: String,
}

/// All mutable resolution state for one run.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    // Pending registries, one per reference kind.
    pub node_refs: Vec<PendingRef>,
    pub typedef_refs: Vec<PendingRef>,
    /// Raw type references nested inside union branches
    pub type_refs: Vec<PendingRef>,
    pub identity_refs: Vec<PendingRef>,
    pub pending_augments: Vec<PendingAugment>,

    /// Tree A path -> Tree B pointer, filled as the SDF side materializes
    yang_to_pointer: BTreeMap<String, String>,
    /// Tree B pointer -> Tree A path, filled on the reverse direction
    pointer_to_yang: BTreeMap<String, String>,
    /// prefix -> namespace URI for every module seen this run
    namespaces: BTreeMap<String, String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    // -- map registration ---------------------------------------------------

    pub fn map_yang_path(&mut self, yang_path: impl Into<String>, pointer: impl Into<String>) {
        self.yang_to_pointer.insert(yang_path.into(), pointer.into());
    }

    pub fn map_pointer(&mut self, pointer: impl Into<String>, yang_path: impl Into<String>) {
        self.pointer_to_yang.insert(pointer.into(), yang_path.into());
    }

    pub fn pointer_for(&self, yang_path: &str) -> Option<&String> {
        self.yang_to_pointer.get(yang_path)
    }

    pub fn yang_path_for(&self, pointer: &str) -> Option<&String> {
        self.pointer_to_yang.get(pointer)
    }

    pub fn register_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), uri.into());
    }

    // -- deferral -----------------------------------------------------------

    pub fn defer_node_ref(&mut self, target: String, fallback: Option<String>, holder: Holder) {
        self.node_refs.push(PendingRef {
            target,
            fallback,
            holder,
        });
    }

    pub fn defer_typedef_ref(&mut self, target: String, holder: Holder) {
        self.typedef_refs.push(PendingRef {
            target,
            fallback: None,
            holder,
        });
    }

    pub fn defer_type_ref(&mut self, target: String, holder: Holder) {
        self.type_refs.push(PendingRef {
            target,
            fallback: None,
            holder,
        });
    }

    pub fn defer_identity_ref(&mut self, target: String, holder: Holder) {
        self.identity_refs.push(PendingRef {
            target,
            fallback: None,
            holder,
        });
    }

    pub fn defer_augment(&mut self, augment: PendingAugment) {
        self.pending_augments.push(augment);
    }

    pub fn pending_count(&self) -> usize {
        self.node_refs.len()
            + self.typedef_refs.len()
            + self.type_refs.len()
            + self.identity_refs.len()
            + self.pending_augments.len()
    }

    // -- lookup strategies --------------------------------------------------

    /// Look a Tree A path up in the path->pointer map: literal form first,
    /// then with the leading prefix stripped, then under the legacy anchor.
    fn lookup_pointer(&self, target: &str) -> Option<String> {
        if let Some(p) = self.yang_to_pointer.get(target) {
            return Some(p.clone());
        }
        let stripped = strip_leading_prefix(target);
        if let Some(p) = self.yang_to_pointer.get(&stripped) {
            return Some(p.clone());
        }
        let anchored = format!("{}{}", LEGACY_ANCHOR, stripped);
        self.yang_to_pointer.get(&anchored).cloned()
    }

    fn resolve_pending(&self, entry: &PendingRef) -> Option<String> {
        self.lookup_pointer(&entry.target).or_else(|| {
            entry
                .fallback
                .as_deref()
                .and_then(|f| self.lookup_pointer(f))
        })
    }
}

// =============================================================================
// RESOLUTION PASSES
// =============================================================================

/// Resolve every pending quality-holder reference into `doc`, removing
/// resolved entries from their registries. Idempotent: with empty
/// registries this touches nothing.
pub fn resolve_document_refs(
    doc: &mut SdfDocument,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    let registries: [(DiagnosticCode, fn(&mut ResolutionContext) -> Vec<PendingRef>); 4] = [
        (DiagnosticCode::UnresolvedNodeRef, |c| {
            std::mem::take(&mut c.node_refs)
        }),
        (DiagnosticCode::UnresolvedTypedefRef, |c| {
            std::mem::take(&mut c.typedef_refs)
        }),
        (DiagnosticCode::UnresolvedTypeRef, |c| {
            std::mem::take(&mut c.type_refs)
        }),
        (DiagnosticCode::UnresolvedIdentityRef, |c| {
            std::mem::take(&mut c.identity_refs)
        }),
    ];

    for (code, take) in registries {
        let pending = take(ctx);
        let mut unresolved = Vec::new();

        for entry in pending {
            let Holder::Quality(ref holder_ptr) = entry.holder else {
                unresolved.push(entry);
                continue;
            };
            match ctx.resolve_pending(&entry) {
                Some(pointer) => {
                    if let Some(q) = doc.quality_mut(holder_ptr) {
                        q.sdf_ref = Some(pointer);
                        propagate_namespace(doc, ctx, &entry.target);
                        tracing::debug!(target = %entry.target, holder = %holder_ptr, "resolved reference");
                    } else {
                        // Holder lives in another document of this run; a
                        // later pass over that document will pick it up.
                        tracing::debug!(holder = %holder_ptr, "holder not in this document");
                        unresolved.push(entry);
                    }
                }
                None => {
                    diags.warn_at(
                        code,
                        holder_ptr,
                        format!("no target for reference '{}'", entry.target),
                    );
                    unresolved.push(entry);
                }
            }
        }

        match code {
            DiagnosticCode::UnresolvedNodeRef => ctx.node_refs.extend(unresolved),
            DiagnosticCode::UnresolvedTypedefRef => ctx.typedef_refs.extend(unresolved),
            DiagnosticCode::UnresolvedTypeRef => ctx.type_refs.extend(unresolved),
            DiagnosticCode::UnresolvedIdentityRef => ctx.identity_refs.extend(unresolved),
            _ => {}
        }
    }
}

/// Resolve pending leafref holders in reverse-direction output modules.
pub fn resolve_module_refs(
    set: &mut ModuleSet,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    let pending = std::mem::take(&mut ctx.node_refs);
    let mut unresolved = Vec::new();

    for entry in pending {
        let Holder::LeafType { module, node } = entry.holder else {
            unresolved.push(entry);
            continue;
        };
        match ctx.yang_path_for(&entry.target).cloned() {
            Some(target_path) => {
                let m = &mut set.modules[module];
                if let Some(t) = m.node_mut(node).type_desc.as_mut() {
                    t.leafref_path = Some(target_path);
                }
            }
            None => {
                diags.warn(
                    DiagnosticCode::UnresolvedNodeRef,
                    format!("no node for reference '{}'", entry.target),
                );
                unresolved.push(entry);
            }
        }
    }

    ctx.node_refs.extend(unresolved);
}

/// Register every top-level augment node of every module. The declared
/// target's leading prefix picks the target module via the import table;
/// no prefix (or the module's own prefix) means a same-module augment.
pub fn register_augments(set: &ModuleSet, ctx: &mut ResolutionContext) {
    for (idx, module) in set.modules.iter().enumerate() {
        for &top in &module.top {
            let node = module.node(top);
            if node.kind != NodeKind::Augment {
                continue;
            }
            let target_path = node
                .augment_target
                .clone()
                .unwrap_or_else(|| node.name.clone());
            let first = target_path
                .trim_start_matches('/')
                .split('/')
                .next()
                .unwrap_or("");
            let target_module = match first.split_once(':') {
                Some((prefix, _)) if prefix != module.prefix => module
                    .imports
                    .get(prefix)
                    .cloned()
                    .unwrap_or_else(|| module.name.clone()),
                _ => module.name.clone(),
            };
            ctx.defer_augment(PendingAugment {
                source_module: idx,
                holder: top,
                target_module,
                target_path,
            });
        }
    }
}

/// Splice pending augments under their declared targets. Cross-module
/// targets deep-copy the subtree into the target module's arena; same-module
/// targets re-attach in place.
pub fn resolve_augments(
    set: &mut ModuleSet,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) {
    let pending = std::mem::take(&mut ctx.pending_augments);
    let mut unresolved = Vec::new();

    for aug in pending {
        let Some(target_module) = set.index_of(&aug.target_module) else {
            diags.warn_at(
                DiagnosticCode::UnresolvedAugment,
                &aug.target_path,
                format!("augment target module '{}' not loaded", aug.target_module),
            );
            unresolved.push(aug);
            continue;
        };

        let Some(target) = find_node_by_path(&set.modules[target_module], &aug.target_path)
        else {
            diags.warn_at(
                DiagnosticCode::UnresolvedAugment,
                &aug.target_path,
                format!(
                    "augment target '{}' not found in module '{}'",
                    aug.target_path, aug.target_module
                ),
            );
            unresolved.push(aug);
            continue;
        };

        let children: Vec<NodeId> = set.modules[aug.source_module]
            .node(aug.holder)
            .children
            .clone();

        if aug.source_module == target_module {
            for child in children {
                let m = &mut set.modules[aug.source_module];
                m.detach(child);
                m.attach(Some(target), child);
            }
        } else {
            for child in children {
                let subtree = clone_subtree(&set.modules[aug.source_module], child);
                let m = &mut set.modules[aug.source_module];
                m.detach(child);
                graft_subtree(&mut set.modules[target_module], Some(target), &subtree);
            }
        }
        tracing::debug!(
            target = %aug.target_path,
            module = %aug.target_module,
            "augment spliced"
        );
    }

    ctx.pending_augments.extend(unresolved);
}

/// After a cross-module reference resolves, make sure the referencing
/// document knows the target's namespace so the emitted output stays valid.
fn propagate_namespace(doc: &mut SdfDocument, ctx: &ResolutionContext, target: &str) {
    let first = target.trim_start_matches('/').split('/').next().unwrap_or("");
    if let Some((prefix, _)) = first.split_once(':') {
        if !doc.namespace.contains_key(prefix) {
            if let Some(uri) = ctx.namespaces.get(prefix) {
                doc.namespace.insert(prefix.to_string(), uri.clone());
            }
        }
    }
}

// =============================================================================
// TREE HELPERS
// =============================================================================

/// Find a node by `/`-separated path of names; per-segment prefixes are
/// ignored so `/sys:interfaces/sys:interface` and `/interfaces/interface`
/// name the same node.
pub fn find_node_by_path(module: &Module, path: &str) -> Option<NodeId> {
    let mut cur: Option<NodeId> = None;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let name = segment.split_once(':').map(|(_, n)| n).unwrap_or(segment);
        cur = Some(module.find_child(cur, name)?);
    }
    cur
}

/// Detached, owned copy of a subtree, used to move nodes across arenas.
#[derive(Clone, Debug)]
pub struct SubtreeCopy {
    pub node: SchemaNode,
    pub children: Vec<SubtreeCopy>,
}

pub fn clone_subtree(module: &Module, id: NodeId) -> SubtreeCopy {
    let mut node = module.node(id).clone();
    let child_ids = std::mem::take(&mut node.children);
    node.parent = None;
    SubtreeCopy {
        node,
        children: child_ids
            .iter()
            .map(|&c| clone_subtree(module, c))
            .collect(),
    }
}

pub fn graft_subtree(module: &mut Module, parent: Option<NodeId>, copy: &SubtreeCopy) -> NodeId {
    let id = module.add_child(parent, copy.node.clone());
    for child in &copy.children {
        graft_subtree(module, Some(id), child);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::{DataQuality, SdfObject};
    use crate::yang::NodeKind;
    use pretty_assertions::assert_eq;

    fn doc_with_holder() -> SdfDocument {
        let mut doc = SdfDocument::default();
        let mut obj = SdfObject::default();
        obj.sdf_property
            .insert("peer".into(), DataQuality::default());
        obj.sdf_data
            .insert("name".into(), DataQuality::of_type("string"));
        doc.sdf_object.insert("demo".into(), obj);
        doc
    }

    #[test]
    fn node_ref_resolves_via_literal_path() {
        let mut doc = doc_with_holder();
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();

        ctx.map_yang_path("/interfaces/name", "#/sdfObject/demo/sdfData/name");
        ctx.defer_node_ref(
            "/interfaces/name".into(),
            None,
            Holder::Quality("#/sdfObject/demo/sdfProperty/peer".into()),
        );

        resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        assert_eq!(
            doc.sdf_object["demo"].sdf_property["peer"].sdf_ref.as_deref(),
            Some("#/sdfObject/demo/sdfData/name")
        );
        assert!(ctx.node_refs.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn prefix_stripped_fallback_is_tried() {
        let mut doc = doc_with_holder();
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();

        ctx.map_yang_path("/interfaces/name", "#/sdfObject/demo/sdfData/name");
        ctx.defer_node_ref(
            "/dm:interfaces/name".into(),
            None,
            Holder::Quality("#/sdfObject/demo/sdfProperty/peer".into()),
        );

        resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        assert!(ctx.node_refs.is_empty());
    }

    #[test]
    fn legacy_anchor_is_tried_last() {
        let mut doc = doc_with_holder();
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();

        ctx.map_yang_path("/buffer/name", "#/sdfObject/demo/sdfData/name");
        ctx.defer_node_ref(
            "/name".into(),
            None,
            Holder::Quality("#/sdfObject/demo/sdfProperty/peer".into()),
        );

        resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        assert!(ctx.node_refs.is_empty());
    }

    #[test]
    fn unresolved_entry_warns_and_stays() {
        let mut doc = doc_with_holder();
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();

        ctx.defer_node_ref(
            "/nowhere".into(),
            None,
            Holder::Quality("#/sdfObject/demo/sdfProperty/peer".into()),
        );

        resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        assert_eq!(ctx.node_refs.len(), 1);
        assert_eq!(diags.count_of(DiagnosticCode::UnresolvedNodeRef), 1);
        // output still emitted: holder simply has no sdfRef
        assert!(doc.sdf_object["demo"].sdf_property["peer"].sdf_ref.is_none());
    }

    #[test]
    fn pass_is_idempotent_when_registries_empty() {
        let mut doc = doc_with_holder();
        let before = doc.clone();
        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();
        resolve_document_refs(&mut doc, &mut ctx, &mut diags);
        assert_eq!(doc, before);
        assert!(diags.is_empty());
    }

    #[test]
    fn augment_splices_across_modules() {
        let mut set = ModuleSet::new();

        let mut base = Module::new("base");
        let ifs = base.add_child(None, SchemaNode::new(NodeKind::Container, "interfaces"));
        base.add_child(Some(ifs), SchemaNode::new(NodeKind::Leaf, "name"));
        let base_idx = set.push(base);

        let mut ext = Module::new("ext");
        let aug = ext.add_child(None, SchemaNode::new(NodeKind::Augment, "/interfaces"));
        ext.add_child(Some(aug), SchemaNode::new(NodeKind::Leaf, "mtu"));
        let ext_idx = set.push(ext);

        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();
        ctx.defer_augment(PendingAugment {
            source_module: ext_idx,
            holder: aug,
            target_module: "base".into(),
            target_path: "/interfaces".into(),
        });

        resolve_augments(&mut set, &mut ctx, &mut diags);
        assert!(ctx.pending_augments.is_empty());

        let base = &set.modules[base_idx];
        let target = find_node_by_path(base, "/interfaces").unwrap();
        let names: Vec<&str> = base
            .children_of(Some(target))
            .iter()
            .map(|&c| base.node(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "mtu"]);
    }

    #[test]
    fn augment_missing_module_stays_pending() {
        let mut set = ModuleSet::new();
        let mut ext = Module::new("ext");
        let aug = ext.add_child(None, SchemaNode::new(NodeKind::Augment, "/x"));
        let ext_idx = set.push(ext);

        let mut ctx = ResolutionContext::new();
        let mut diags = Diagnostics::new();
        ctx.defer_augment(PendingAugment {
            source_module: ext_idx,
            holder: aug,
            target_module: "ghost".into(),
            target_path: "/x".into(),
        });

        resolve_augments(&mut set, &mut ctx, &mut diags);
        assert_eq!(ctx.pending_augments.len(), 1);
        assert_eq!(diags.count_of(DiagnosticCode::UnresolvedAugment), 1);
    }

    #[test]
    fn register_augments_reads_target_from_imports() {
        let mut set = ModuleSet::new();
        let mut ext = Module::new("ext");
        ext.prefix = "ex".into();
        ext.imports.insert("b".into(), "base".into());
        let mut aug = SchemaNode::new(NodeKind::Augment, "/b:interfaces");
        aug.augment_target = Some("/b:interfaces".into());
        ext.add_child(None, aug);
        let mut own = SchemaNode::new(NodeKind::Augment, "/local");
        own.augment_target = Some("/local".into());
        ext.add_child(None, own);
        set.push(ext);

        let mut ctx = ResolutionContext::new();
        register_augments(&set, &mut ctx);
        assert_eq!(ctx.pending_augments.len(), 2);
        assert_eq!(ctx.pending_augments[0].target_module, "base");
        assert_eq!(ctx.pending_augments[1].target_module, "ext");
    }

    #[test]
    fn find_node_ignores_segment_prefixes() {
        let mut m = Module::new("demo");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "sys"));
        let l = m.add_child(Some(c), SchemaNode::new(NodeKind::Leaf, "host"));
        assert_eq!(find_node_by_path(&m, "/dm:sys/dm:host"), Some(l));
        assert_eq!(find_node_by_path(&m, "/sys/host"), Some(l));
        assert_eq!(find_node_by_path(&m, "/sys/missing"), None);
    }
}
