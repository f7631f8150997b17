//! Path Namer: canonical identifying strings for nodes of both trees.
//!
//! These strings are the sole key space of the reference resolver, so the
//! same node must always yield the same string within one run.

use crate::yang::{Module, NodeId};

// =============================================================================
// TREE A PATHS
// =============================================================================

/// Canonical path of a Tree A node: `/` joined ancestor names, each carrying
/// the owning module's prefix unless the path is generated relative to that
/// same module and `force_prefix` is off.
pub fn yang_path(module: &Module, id: NodeId, relative_to: &str, force_prefix: bool) -> String {
    let prefixed = force_prefix || module.name != relative_to;
    let mut out = String::new();
    for ancestor in module.ancestry(id) {
        out.push('/');
        if prefixed && !module.prefix.is_empty() {
            out.push_str(&module.prefix);
            out.push(':');
        }
        out.push_str(&module.node(ancestor).name);
    }
    out
}

/// Shorthand for a path relative to the node's own module, no prefixes.
pub fn local_path(module: &Module, id: NodeId) -> String {
    yang_path(module, id, &module.name, false)
}

/// Resolve a relative leafref path (`../` chains) into an absolute path by
/// walking the leaf's ancestor chain, one step per `../`, and appending the
/// remaining segments. Works from the string alone; no target node needed.
/// Absolute paths are returned unchanged.
pub fn expand_leafref_path(module: &Module, leaf: NodeId, leafref: &str) -> String {
    if leafref.starts_with('/') {
        return leafref.to_string();
    }

    // The chain includes the leaf itself; the first `../` steps over it.
    let mut chain: Vec<String> = module
        .ancestry(leaf)
        .iter()
        .map(|&a| module.node(a).name.clone())
        .collect();

    let mut rest = leafref;
    while let Some(stripped) = rest.strip_prefix("../") {
        chain.pop();
        rest = stripped;
    }

    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        chain.push(segment.to_string());
    }

    let mut out = String::new();
    for segment in chain {
        out.push('/');
        out.push_str(&segment);
    }
    out
}

/// Remove a `prefix:` from the first segment of a path, if present.
/// Used as a resolver fallback when a literal lookup misses.
pub fn strip_leading_prefix(path: &str) -> String {
    let (head, tail) = match path.strip_prefix('/') {
        Some(rest) => match rest.split_once('/') {
            Some((h, t)) => (h, Some(t)),
            None => (rest, None),
        },
        None => return path.to_string(),
    };
    let head = head.split_once(':').map(|(_, n)| n).unwrap_or(head);
    match tail {
        Some(t) => format!("/{}/{}", head, t),
        None => format!("/{}", head),
    }
}

// =============================================================================
// TREE B POINTERS
// =============================================================================

/// Reference string for a Tree B node: `#/<Kind>/<name>/<Kind>/<name>...`
pub fn sdf_pointer(segments: &[(&str, &str)]) -> String {
    let mut out = String::from("#");
    for (kind, name) in segments {
        out.push('/');
        out.push_str(kind);
        out.push('/');
        out.push_str(name);
    }
    out
}

/// Extend a pointer by one `(kind, name)` step.
pub fn child_pointer(base: &str, kind: &str, name: &str) -> String {
    format!("{}/{}/{}", base, kind, name)
}

/// Extend a pointer by an unnamed step (`items`, `sdfInputData`, ...).
pub fn step_pointer(base: &str, step: &str) -> String {
    format!("{}/{}", base, step)
}
