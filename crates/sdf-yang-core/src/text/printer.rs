//! Tree A module -> [`Statement`] tree -> YANG text.
//!
//! The inverse of the reader: the module is lowered into the generic
//! statement shape and rendered with two-space indentation. Extension
//! markers are written as note lines inside the description argument, which
//! is exactly where the reader picks them up again.

use super::Statement;
use crate::notes;
use crate::yang::{Module, NodeId, NodeKind, SchemaNode, Status, TypeDescriptor};

/// Render a module as YANG text.
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    render_into(&statement_of_module(module), 0, &mut out);
    out
}

// ============================================================================
// Lowering
// ============================================================================

fn statement_of_module(module: &Module) -> Statement {
    let mut s = Statement::with_arg("module", &module.name);
    if !module.namespace.is_empty() {
        s = s.child(Statement::with_arg("namespace", &module.namespace));
    }
    if !module.prefix.is_empty() {
        s = s.child(Statement::with_arg("prefix", &module.prefix));
    }
    for (prefix, imported) in &module.imports {
        s = s.child(
            Statement::with_arg("import", imported).child(Statement::with_arg("prefix", prefix)),
        );
    }
    if let Some(ref org) = module.organization {
        s = s.child(Statement::with_arg("organization", org));
    }
    if let Some(ref contact) = module.contact {
        s = s.child(Statement::with_arg("contact", contact));
    }
    if let Some(ref desc) = module.description {
        s = s.child(Statement::with_arg("description", desc));
    }
    if let Some(ref reference) = module.reference {
        s = s.child(Statement::with_arg("reference", reference));
    }
    if let Some(ref revision) = module.revision {
        s = s.child(Statement::with_arg("revision", revision));
    }
    for feature in &module.features {
        s = s.child(Statement::with_arg("feature", feature));
    }
    for (name, t) in &module.typedefs {
        let mut td = Statement::with_arg("typedef", name).child(statement_of_type(t));
        if let Some(ref d) = t.default_value {
            td = td.child(Statement::with_arg("default", d));
        }
        if let Some(ref u) = t.units {
            td = td.child(Statement::with_arg("units", u));
        }
        s = s.child(td);
    }
    for (name, identity) in &module.identities {
        let mut id = Statement::with_arg("identity", name);
        for base in &identity.bases {
            id = id.child(Statement::with_arg("base", base));
        }
        if identity.status != Status::Current {
            id = id.child(Statement::with_arg("status", identity.status.as_str()));
        }
        if let Some(ref d) = identity.description {
            id = id.child(Statement::with_arg("description", d));
        }
        s = s.child(id);
    }
    for &top in &module.top {
        s = s.child(statement_of_node(module, top));
    }
    s
}

fn statement_of_node(module: &Module, id: NodeId) -> Statement {
    let node = module.node(id);
    let mut s = match node.kind {
        NodeKind::Input | NodeKind::Output => Statement::new(node.kind.keyword()),
        NodeKind::Uses => Statement::with_arg(
            "uses",
            node.uses_target.as_deref().unwrap_or(&node.name),
        ),
        NodeKind::Augment => Statement::with_arg(
            "augment",
            node.augment_target.as_deref().unwrap_or(&node.name),
        ),
        kind => Statement::with_arg(kind.keyword(), &node.name),
    };

    if let Some(ref when) = node.when {
        s = s.child(Statement::with_arg("when", when));
    }
    for feature in &node.if_features {
        s = s.child(Statement::with_arg("if-feature", feature));
    }
    if let Some(ref t) = node.type_desc {
        s = s.child(statement_of_type(t));
        if let Some(ref d) = t.default_value {
            s = s.child(Statement::with_arg("default", d));
        }
        if let Some(ref u) = t.units {
            s = s.child(Statement::with_arg("units", u));
        }
    }
    if !node.keys.is_empty() {
        s = s.child(Statement::with_arg("key", node.keys.join(" ")));
    }
    if node.ordered_by_user {
        s = s.child(Statement::with_arg("ordered-by", "user"));
    }
    if node.min_elements > 0 {
        s = s.child(Statement::with_arg(
            "min-elements",
            node.min_elements.to_string(),
        ));
    }
    if let Some(max) = node.max_elements {
        s = s.child(Statement::with_arg("max-elements", max.to_string()));
    }
    if node.presence {
        s = s.child(Statement::with_arg("presence", "true"));
    }
    if !node.config {
        s = s.child(Statement::with_arg("config", "false"));
    }
    if node.mandatory {
        s = s.child(Statement::with_arg("mandatory", "true"));
    }
    if node.status != Status::Current {
        s = s.child(Statement::with_arg("status", node.status.as_str()));
    }
    if let Some(desc) = description_with_extensions(node) {
        s = s.child(Statement::with_arg("description", desc));
    }
    if let Some(ref reference) = node.reference {
        s = s.child(Statement::with_arg("reference", reference));
    }
    for must in &node.must {
        s = s.child(Statement::with_arg("must", must));
    }
    for &child in &node.children {
        s = s.child(statement_of_node(module, child));
    }
    s
}

/// Extension instances have no native syntax; they ride along as note lines
/// in the description argument.
fn description_with_extensions(node: &SchemaNode) -> Option<String> {
    let mut desc = node.description.clone();
    for ext in &node.extensions {
        notes::append_note(&mut desc, ext.tag.clone(), &ext.argument);
    }
    desc
}

fn statement_of_type(t: &TypeDescriptor) -> Statement {
    let name = t
        .source_typedef
        .clone()
        .unwrap_or_else(|| t.kind.name().to_string());
    let mut s = Statement::with_arg("type", name);

    if let Some(digits) = t.fraction_digits {
        s = s.child(Statement::with_arg("fraction-digits", digits.to_string()));
    }
    if let Some(ref range) = t.range {
        s = s.child(Statement::with_arg("range", range));
    }
    if let Some(ref length) = t.length {
        s = s.child(Statement::with_arg("length", length));
    }
    for pattern in &t.patterns {
        let mut p = Statement::with_arg("pattern", &pattern.regex);
        if pattern.invert {
            p = p.child(Statement::with_arg("modifier", "invert-match"));
        }
        s = s.child(p);
    }
    for member in &t.enums {
        let mut e = Statement::with_arg("enum", &member.name);
        if let Some(v) = member.value {
            e = e.child(Statement::with_arg("value", v.to_string()));
        }
        if let Some(ref d) = member.description {
            e = e.child(Statement::with_arg("description", d));
        }
        s = s.child(e);
    }
    for bit in &t.bits {
        let mut b = Statement::with_arg("bit", &bit.name)
            .child(Statement::with_arg("position", bit.position.to_string()));
        if let Some(ref d) = bit.description {
            b = b.child(Statement::with_arg("description", d));
        }
        s = s.child(b);
    }
    for base in &t.identity_bases {
        s = s.child(Statement::with_arg("base", base));
    }
    if let Some(ref path) = t.leafref_path {
        s = s.child(Statement::with_arg("path", path));
    }
    for branch in &t.union_branches {
        s = s.child(statement_of_type(branch));
    }
    s
}

// ============================================================================
// Rendering
// ============================================================================

/// Keywords whose argument is conventionally quoted even when it would
/// survive unquoted.
const QUOTED_ARGS: &[&str] = &[
    "namespace",
    "description",
    "reference",
    "organization",
    "contact",
    "when",
    "must",
    "presence",
    "pattern",
    "range",
    "length",
    "path",
    "key",
    "units",
    "augment",
];

fn render_into(stmt: &Statement, indent: usize, out: &mut String) {
    for _ in 0..indent {
        out.push_str("  ");
    }
    out.push_str(&stmt.keyword);
    if let Some(ref arg) = stmt.argument {
        out.push(' ');
        if QUOTED_ARGS.contains(&stmt.keyword.as_str()) || needs_quotes(arg) {
            out.push('"');
            out.push_str(&escape(arg));
            out.push('"');
        } else {
            out.push_str(arg);
        }
    }
    if stmt.children.is_empty() {
        out.push_str(";\n");
    } else {
        out.push_str(" {\n");
        for child in &stmt.children {
            render_into(child, indent + 1, out);
        }
        for _ in 0..indent {
            out.push_str("  ");
        }
        out.push_str("}\n");
    }
}

fn needs_quotes(arg: &str) -> bool {
    arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '{' | '}' | '"' | '\'' | '/'))
}

fn escape(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
