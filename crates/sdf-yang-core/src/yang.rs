//! Tree A: the YANG-like schema model.
//!
//! Arena-backed: a [`Module`] owns a flat pool of [`SchemaNode`]s addressed
//! by [`NodeId`]. Parent/child links are ids and each parent holds an ordered
//! `Vec<NodeId>` of children, so detaching and re-attaching a subtree
//! (augment splicing, grouping extraction) is O(1) and never invalidates a
//! handle held elsewhere. Sibling order is significant and preserved.
//!
//! Identities form a multiple-inheritance graph resolved by *name*, not by
//! embedded pointers, so a partially-built graph is a valid intermediate
//! state while modules are still being read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::notes::Tag;

/// Stable handle into a module's node pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Schema node variants of Tree A
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Grouping,
    Uses,
    Rpc,
    Action,
    Input,
    Output,
    Notification,
    Augment,
}

impl NodeKind {
    /// YANG keyword for this node kind
    pub fn keyword(&self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::List => "list",
            NodeKind::Leaf => "leaf",
            NodeKind::LeafList => "leaf-list",
            NodeKind::Choice => "choice",
            NodeKind::Case => "case",
            NodeKind::Grouping => "grouping",
            NodeKind::Uses => "uses",
            NodeKind::Rpc => "rpc",
            NodeKind::Action => "action",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Notification => "notification",
            NodeKind::Augment => "augment",
        }
    }
}

/// Definition lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Deprecated => "deprecated",
            Status::Obsolete => "obsolete",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "current" => Some(Status::Current),
            "deprecated" => Some(Status::Deprecated),
            "obsolete" => Some(Status::Obsolete),
            _ => None,
        }
    }
}

// =============================================================================
// TYPE DESCRIPTORS
// =============================================================================

/// Base kind of a leaf-level type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    #[default]
    String,
    Enumeration,
    Bits,
    Binary,
    IdentityRef,
    Leafref,
    Union,
    Empty,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::Uint8 => "uint8",
            TypeKind::Uint16 => "uint16",
            TypeKind::Uint32 => "uint32",
            TypeKind::Uint64 => "uint64",
            TypeKind::Decimal64 => "decimal64",
            TypeKind::String => "string",
            TypeKind::Enumeration => "enumeration",
            TypeKind::Bits => "bits",
            TypeKind::Binary => "binary",
            TypeKind::IdentityRef => "identityref",
            TypeKind::Leafref => "leafref",
            TypeKind::Union => "union",
            TypeKind::Empty => "empty",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeKind> {
        Some(match name {
            "boolean" => TypeKind::Boolean,
            "int8" => TypeKind::Int8,
            "int16" => TypeKind::Int16,
            "int32" => TypeKind::Int32,
            "int64" => TypeKind::Int64,
            "uint8" => TypeKind::Uint8,
            "uint16" => TypeKind::Uint16,
            "uint32" => TypeKind::Uint32,
            "uint64" => TypeKind::Uint64,
            "decimal64" => TypeKind::Decimal64,
            "string" => TypeKind::String,
            "enumeration" => TypeKind::Enumeration,
            "bits" => TypeKind::Bits,
            "binary" => TypeKind::Binary,
            "identityref" => TypeKind::IdentityRef,
            "leafref" => TypeKind::Leafref,
            "union" => TypeKind::Union,
            "empty" => TypeKind::Empty,
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeKind::Int8
                | TypeKind::Int16
                | TypeKind::Int32
                | TypeKind::Int64
                | TypeKind::Uint8
                | TypeKind::Uint16
                | TypeKind::Uint32
                | TypeKind::Uint64
        )
    }

    /// Natural (implicit) bounds of a sized integer type. `min`/`max` tokens
    /// in the range grammar resolve to these, and explicit bounds equal to
    /// them are omitted from the output facet.
    pub fn natural_bounds(&self) -> Option<(i128, i128)> {
        Some(match self {
            TypeKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            TypeKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            TypeKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            TypeKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            TypeKind::Uint8 => (0, u8::MAX as i128),
            TypeKind::Uint16 => (0, u16::MAX as i128),
            TypeKind::Uint32 => (0, u32::MAX as i128),
            TypeKind::Uint64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }
}

/// A regex constraint. The textual form carries a one-byte sentinel prefix
/// (0x06 match, 0x15 invert-match); in memory the flag is explicit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub regex: String,
    pub invert: bool,
}

impl Pattern {
    pub fn matching(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            invert: false,
        }
    }

    pub fn inverted(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            invert: true,
        }
    }
}

/// One member of an enumeration type
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<i64>,
    pub description: Option<String>,
}

/// One member of a bits type
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitMember {
    pub name: String,
    pub position: u32,
    pub description: Option<String>,
}

/// Leaf-level type description: base kind plus kind-specific facets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Name of the typedef this type derives from, when not a built-in
    pub source_typedef: Option<String>,
    /// decimal64 only
    pub fraction_digits: Option<u8>,
    /// Range facet in the textual range grammar, e.g. `"1..10|20..max"`
    pub range: Option<String>,
    /// Length facet, same grammar
    pub length: Option<String>,
    pub patterns: Vec<Pattern>,
    pub enums: Vec<EnumMember>,
    pub bits: Vec<BitMember>,
    /// identityref base names, possibly more than one
    pub identity_bases: Vec<String>,
    /// leafref target path, possibly relative (`../` segments)
    pub leafref_path: Option<String>,
    pub union_branches: Vec<TypeDescriptor>,
    pub default_value: Option<String>,
    pub units: Option<String>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

// =============================================================================
// SCHEMA NODES
// =============================================================================

/// Free-form extension instance attached to a node. Recognized tags come
/// from the fixed set in [`crate::notes::Tag`]; anything else is preserved
/// verbatim under [`Tag::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInstance {
    pub tag: Tag,
    pub argument: String,
}

/// An element of the Tree A schema tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub status: Status,
    /// false = read-only state data
    pub config: bool,
    pub mandatory: bool,
    pub when: Option<String>,
    pub must: Vec<String>,
    pub if_features: Vec<String>,
    pub extensions: Vec<ExtensionInstance>,
    /// Leaf / leaf-list only
    pub type_desc: Option<TypeDescriptor>,
    /// List only: declared key leaf names
    pub keys: Vec<String>,
    /// List / leaf-list only; 0 means unconstrained
    pub min_elements: u64,
    pub max_elements: Option<u64>,
    pub ordered_by_user: bool,
    /// Container only: exists-when-empty semantics
    pub presence: bool,
    /// Uses only: target grouping name, possibly prefixed
    pub uses_target: Option<String>,
    /// Augment only: declared target path
    pub augment_target: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SchemaNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            reference: None,
            status: Status::Current,
            config: true,
            mandatory: false,
            when: None,
            must: Vec::new(),
            if_features: Vec::new(),
            extensions: Vec::new(),
            type_desc: None,
            keys: Vec::new(),
            min_elements: 0,
            max_elements: None,
            ordered_by_user: false,
            presence: false,
            uses_target: None,
            augment_target: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_desc: TypeDescriptor) -> Self {
        self.type_desc = Some(type_desc);
        self
    }

    pub fn is_data_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf | NodeKind::LeafList)
    }
}

/// A named symbol usable as a typed value, with zero or more base identities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub bases: Vec<String>,
    pub description: Option<String>,
    pub status: Status,
}

// =============================================================================
// MODULE
// =============================================================================

/// A Tree A module: node pool, top-level children, typedefs, identities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub prefix: String,
    pub namespace: String,
    /// import prefix -> imported module name
    pub imports: BTreeMap<String, String>,
    pub typedefs: BTreeMap<String, TypeDescriptor>,
    pub identities: BTreeMap<String, Identity>,
    pub features: Vec<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub organization: Option<String>,
    pub contact: Option<String>,
    pub revision: Option<String>,
    nodes: Vec<SchemaNode>,
    /// Ordered top-level children
    pub top: Vec<NodeId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Allocate a node in the pool without attaching it anywhere.
    pub fn alloc(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Allocate and attach in one step. `parent = None` attaches at top level.
    pub fn add_child(&mut self, parent: Option<NodeId>, node: SchemaNode) -> NodeId {
        let id = self.alloc(node);
        self.attach(parent, id);
        id
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Attach a detached node under `parent`, at the end of the sibling list.
    pub fn attach(&mut self, parent: Option<NodeId>, id: NodeId) {
        self.nodes[id.0].parent = parent;
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.top.push(id),
        }
    }

    /// Detach a node from its parent's sibling list. The node and its
    /// subtree stay alive in the pool; other handles remain valid.
    pub fn detach(&mut self, id: NodeId) {
        let parent = self.nodes[id.0].parent.take();
        let siblings = match parent {
            Some(p) => &mut self.nodes[p.0].children,
            None => &mut self.top,
        };
        siblings.retain(|&c| c != id);
    }

    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => &self.nodes[p.0].children,
            None => &self.top,
        }
    }

    pub fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].name == name)
    }

    /// Ancestor chain from the top-level ancestor down to and including `id`.
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut cur = id;
        while let Some(p) = self.nodes[cur.0].parent {
            chain.push(p);
            cur = p;
        }
        chain.reverse();
        chain
    }

    /// Depth-first walk over a subtree (preorder), `root = None` for the
    /// whole module.
    pub fn descendants(&self, root: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }
}

/// All modules loaded in one run, keyed by name. Augment resolution and
/// import lookups work across the whole set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModuleSet {
    pub modules: Vec<Module>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, module: Module) -> usize {
        self.modules.push(module);
        self.modules.len() - 1
    }

    pub fn by_name(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, kind: TypeKind) -> SchemaNode {
        SchemaNode::new(NodeKind::Leaf, name).with_type(TypeDescriptor::new(kind))
    }

    #[test]
    fn attach_preserves_sibling_order() {
        let mut m = Module::new("test");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "box"));
        let a = m.add_child(Some(c), leaf("alpha", TypeKind::String));
        let b = m.add_child(Some(c), leaf("beta", TypeKind::String));
        assert_eq!(m.children_of(Some(c)), &[a, b]);
    }

    #[test]
    fn detach_and_reattach_moves_subtree() {
        let mut m = Module::new("test");
        let c1 = m.add_child(None, SchemaNode::new(NodeKind::Container, "one"));
        let c2 = m.add_child(None, SchemaNode::new(NodeKind::Container, "two"));
        let l = m.add_child(Some(c1), leaf("moved", TypeKind::Boolean));

        m.detach(l);
        assert!(m.children_of(Some(c1)).is_empty());
        assert_eq!(m.node(l).parent, None);

        m.attach(Some(c2), l);
        assert_eq!(m.children_of(Some(c2)), &[l]);
        assert_eq!(m.node(l).parent, Some(c2));
        // name survives the move
        assert_eq!(m.node(l).name, "moved");
    }

    #[test]
    fn ancestry_runs_root_to_leaf() {
        let mut m = Module::new("test");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "outer"));
        let l = m.add_child(Some(c), SchemaNode::new(NodeKind::List, "entries"));
        let f = m.add_child(Some(l), leaf("id", TypeKind::Uint32));
        assert_eq!(m.ancestry(f), vec![c, l, f]);
    }

    #[test]
    fn descendants_is_preorder() {
        let mut m = Module::new("test");
        let c = m.add_child(None, SchemaNode::new(NodeKind::Container, "outer"));
        let a = m.add_child(Some(c), leaf("a", TypeKind::String));
        let inner = m.add_child(Some(c), SchemaNode::new(NodeKind::Container, "inner"));
        let b = m.add_child(Some(inner), leaf("b", TypeKind::String));
        assert_eq!(m.descendants(None), vec![c, a, inner, b]);
    }

    #[test]
    fn natural_bounds_for_sized_integers() {
        assert_eq!(TypeKind::Int8.natural_bounds(), Some((-128, 127)));
        assert_eq!(TypeKind::Uint64.natural_bounds(), Some((0, u64::MAX as i128)));
        assert_eq!(TypeKind::String.natural_bounds(), None);
    }

    #[test]
    fn type_kind_name_round_trip() {
        for kind in [
            TypeKind::Boolean,
            TypeKind::Int32,
            TypeKind::Uint64,
            TypeKind::Decimal64,
            TypeKind::Enumeration,
            TypeKind::IdentityRef,
            TypeKind::Leafref,
            TypeKind::Empty,
        ] {
            assert_eq!(TypeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TypeKind::from_name("instance-identifier"), None);
    }
}
