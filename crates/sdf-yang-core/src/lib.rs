//! Bidirectional translation between YANG data models and SDF (Semantic
//! Definition Format) documents.
//!
//! The crate is organised around two in-memory trees and a resolver that
//! mediates between them:
//!
//! - [`yang`] holds Tree A, an arena-backed schema tree mirroring YANG's
//!   statement structure.
//! - [`sdf`] holds Tree B, the serde model of an SDF JSON document.
//! - [`translate`] walks one tree and produces the other, registering every
//!   cross-reference with a [`ResolutionContext`] instead of chasing it.
//! - [`resolve`] runs the deferred passes that patch registered references
//!   once both sides of each link exist.
//! - [`text`] is the YANG concrete syntax layer (reader and printer); the
//!   SDF side serializes through serde_json directly.
//!
//! Most callers want one of the top-level functions: [`convert`] dispatches
//! on input shape, [`yang_to_sdf`] and [`sdf_to_yang`] fix the direction,
//! and [`convert_yang`] accepts companion modules so augments and leafrefs
//! that cross module boundaries can land.

pub mod diagnostics;
pub mod error;
pub mod notes;
pub mod path;
pub mod ranges;
pub mod resolve;
pub mod sdf;
pub mod text;
pub mod translate;
pub mod yang;

pub use diagnostics::{DiagnosticCode, Diagnostics, Severity};
pub use error::TranslateError;
pub use resolve::ResolutionContext;
pub use sdf::SdfDocument;
pub use translate::{translate_document, translate_module};
pub use yang::{Module, ModuleSet};

/// The two input shapes the converter accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Yang,
    Sdf,
}

/// Decide which way to convert by looking at the first non-blank token.
///
/// SDF documents are JSON objects, so they open with `{`. YANG modules open
/// with the `module` or `submodule` keyword, possibly behind comments.
pub fn detect_format(text: &str) -> Result<InputFormat, TranslateError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(TranslateError::EmptyInput);
    }
    if trimmed.starts_with('{') {
        return Ok(InputFormat::Sdf);
    }
    if trimmed.starts_with("module")
        || trimmed.starts_with("submodule")
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
    {
        return Ok(InputFormat::Yang);
    }
    let head: String = trimmed.chars().take(24).collect();
    Err(TranslateError::UnknownInput(head))
}

/// Convert whichever format the input turns out to be.
pub fn convert(text: &str) -> Result<(String, Diagnostics), TranslateError> {
    match detect_format(text)? {
        InputFormat::Yang => yang_to_sdf(text),
        InputFormat::Sdf => sdf_to_yang(text),
    }
}

/// Translate a single self-contained YANG module to pretty-printed SDF JSON.
pub fn yang_to_sdf(text: &str) -> Result<(String, Diagnostics), TranslateError> {
    convert_yang(text, &[])
}

/// Translate a YANG module to SDF JSON with companion modules in scope.
///
/// Companions are loaded into the same module set before translation, so an
/// augment declared in a companion lands under its target in `primary`, and
/// imports by prefix resolve against the companions' names. Only `primary`
/// is emitted.
pub fn convert_yang(
    primary: &str,
    companions: &[&str],
) -> Result<(String, Diagnostics), TranslateError> {
    let mut diags = Diagnostics::new();
    let mut set = ModuleSet::new();
    let primary_idx = set.push(text::module_from_text(primary, &mut diags)?);
    for extra in companions {
        set.push(text::module_from_text(extra, &mut diags)?);
    }

    let mut ctx = ResolutionContext::new();
    resolve::register_augments(&set, &mut ctx);
    resolve::resolve_augments(&mut set, &mut ctx, &mut diags);

    // Companions go first so their paths are registered by the time the
    // primary document's references resolve.
    for (idx, module) in set.modules.iter().enumerate() {
        if idx != primary_idx {
            let mut side = translate_module(module, &mut ctx, &mut diags);
            resolve::resolve_document_refs(&mut side, &mut ctx, &mut diags);
        }
    }
    let mut doc = translate_module(&set.modules[primary_idx], &mut ctx, &mut diags);
    resolve::resolve_document_refs(&mut doc, &mut ctx, &mut diags);

    let json = serde_json::to_string_pretty(&doc)?;
    Ok((json, diags))
}

/// Translate an SDF JSON document to YANG module text.
pub fn sdf_to_yang(text: &str) -> Result<(String, Diagnostics), TranslateError> {
    let mut diags = Diagnostics::new();
    let doc: SdfDocument = serde_json::from_str(text)?;
    let mut ctx = ResolutionContext::new();
    let module = translate_document(&doc, &mut ctx, &mut diags);
    Ok((text::print_module(&module), diags))
}
