//! Type Translator: leaf-level type descriptions mapped between the trees.
//!
//! The two type systems are not isomorphic. Constructs with no native
//! counterpart (sized integers, disjoint ranges, invert-match patterns,
//! bit sets, multi-base identity references, leafrefs) are encoded with
//! round-trip metadata in the conversion-note channel; the reverse pass
//! reads the notes first and falls back to inference from which facets are
//! populated.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::str::FromStr;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::notes::{self, Note, Tag};
use crate::path::{child_pointer, expand_leafref_path};
use crate::ranges::{self, Bound, SubRange};
use crate::resolve::{Holder, ResolutionContext};
use crate::sdf::DataQuality;
use crate::yang::{
    BitMember, EnumMember, Module, NodeId, Pattern, TypeDescriptor, TypeKind,
};

/// Where a type is being translated: enough context to name the holder and
/// to expand relative leafref paths.
pub struct TypeSite<'a> {
    pub module: &'a Module,
    /// Leaf owning the type, when there is one (typedefs have none)
    pub node: Option<NodeId>,
    /// Pointer of the quality being built; holders for deferred refs
    pub pointer: String,
}

// =============================================================================
// FORWARD: TypeDescriptor -> DataQuality
// =============================================================================

pub fn type_to_quality(
    t: &TypeDescriptor,
    site: &TypeSite<'_>,
    ctx: &mut ResolutionContext,
    diags: &mut Diagnostics,
) -> DataQuality {
    // Derived types become a reference to the shared definition; local
    // facets stay on the referencing node as overlays.
    if let Some(ref typedef) = t.source_typedef {
        let mut q = DataQuality::default();
        let target = name_to_path(typedef);
        ctx.defer_typedef_ref(target, Holder::Quality(site.pointer.clone()));
        apply_numeric_facets(t, &mut q, site, diags);
        apply_string_facets(t, &mut q, site, diags);
        return q;
    }

    match t.kind {
        TypeKind::Boolean => DataQuality::of_type("boolean"),

        TypeKind::Int8
        | TypeKind::Int16
        | TypeKind::Int32
        | TypeKind::Int64
        | TypeKind::Uint8
        | TypeKind::Uint16
        | TypeKind::Uint32
        | TypeKind::Uint64 => {
            let mut q = DataQuality::of_type("integer");
            // Width is not representable; keep the original name around.
            notes::append_note(&mut q.description, Tag::OriginalType, t.kind.name());
            apply_numeric_facets(t, &mut q, site, diags);
            q
        }

        TypeKind::Decimal64 => {
            let mut q = DataQuality::of_type("number");
            // Legal window is 1..=18; anything else loses the multipleOf
            // facet but translation continues.
            let digits = t.fraction_digits.unwrap_or(1);
            if (1..=18).contains(&digits) {
                q.multiple_of = decimal_to_number(
                    Decimal::new(1, digits as u32), // 10^-digits
                );
            } else {
                diags.warn_at(
                    DiagnosticCode::MalformedFractionDigits,
                    &site.pointer,
                    format!("fraction-digits {} outside 1..18, facet dropped", digits),
                );
            }
            apply_numeric_facets(t, &mut q, site, diags);
            q
        }

        TypeKind::String => {
            let mut q = DataQuality::of_type("string");
            apply_string_facets(t, &mut q, site, diags);
            q
        }

        TypeKind::Enumeration => {
            let mut q = DataQuality::of_type("string");
            q.enum_values = t.enums.iter().map(|e| e.name.clone()).collect();
            // Member descriptions survive as "name: text" lines.
            for member in &t.enums {
                if let Some(ref text) = member.description {
                    let line = format!("{}: {}", member.name, text);
                    match q.description {
                        Some(ref mut d) => {
                            d.push('\n');
                            d.push_str(&line);
                        }
                        None => q.description = Some(line),
                    }
                }
            }
            q
        }

        TypeKind::Bits => {
            let mut q = DataQuality::of_type("object");
            for bit in &t.bits {
                let mut flag = DataQuality::of_type("boolean");
                flag.description = bit.description.clone();
                notes::append_note(
                    &mut flag.description,
                    Tag::BitPosition,
                    &bit.position.to_string(),
                );
                q.properties.insert(bit.name.clone(), flag);
            }
            q
        }

        TypeKind::Binary => {
            let mut q = DataQuality::of_type("string");
            q.sdf_type = Some("byte-string".to_string());
            apply_string_facets(t, &mut q, site, diags);
            q
        }

        TypeKind::IdentityRef => {
            identityref_to_quality(&t.identity_bases, site, ctx)
        }

        TypeKind::Leafref => {
            let mut q = DataQuality::default();
            notes::append_note(&mut q.description, Tag::OriginalType, "leafref");
            if let Some(ref target) = t.leafref_path {
                let fallback = site
                    .node
                    .map(|n| expand_leafref_path(site.module, n, target));
                ctx.defer_node_ref(
                    target.clone(),
                    fallback,
                    Holder::Quality(site.pointer.clone()),
                );
            } else {
                diags.warn_at(
                    DiagnosticCode::UnsupportedConstruct,
                    &site.pointer,
                    "leafref without a target path",
                );
            }
            q
        }

        TypeKind::Union => {
            let mut q = DataQuality::default();
            for (i, branch) in t.union_branches.iter().enumerate() {
                let name = format!("option_{}", i);
                let branch_site = TypeSite {
                    module: site.module,
                    node: site.node,
                    pointer: child_pointer(&site.pointer, "sdfChoice", &name),
                };
                let bq = if let Some(ref typedef) = branch.source_typedef {
                    // Raw type reference nested inside a union branch: its
                    // own registry, resolved like any other link.
                    ctx.defer_type_ref(
                        name_to_path(typedef),
                        Holder::Quality(branch_site.pointer.clone()),
                    );
                    DataQuality::default()
                } else {
                    type_to_quality(branch, &branch_site, ctx, diags)
                };
                q.sdf_choice.insert(name, bq);
            }
            q
        }

        TypeKind::Empty => {
            let mut q = DataQuality::default();
            q.nullable = Some(true);
            notes::append_note(&mut q.description, Tag::OriginalType, "empty");
            q
        }
    }
}

/// Single base: a direct reference. Multiple bases (or several permitted
/// identities): an object of individually named reference properties,
/// because the target reference mechanism is single-valued.
pub fn identityref_to_quality(
    bases: &[String],
    site: &TypeSite<'_>,
    ctx: &mut ResolutionContext,
) -> DataQuality {
    match bases {
        [] => DataQuality::of_type("string"),
        [single] => {
            let mut q = DataQuality::default();
            notes::append_note(&mut q.description, Tag::OriginalType, "identityref");
            ctx.defer_identity_ref(
                name_to_path(single),
                Holder::Quality(site.pointer.clone()),
            );
            q
        }
        many => {
            let mut q = DataQuality::of_type("object");
            notes::append_note(&mut q.description, Tag::OriginalType, "identityref");
            for (i, base) in many.iter().enumerate() {
                let prop = format!("base_{}", i);
                ctx.defer_identity_ref(
                    name_to_path(base),
                    Holder::Quality(child_pointer(&site.pointer, "properties", &prop)),
                );
                q.properties.insert(prop, DataQuality::default());
            }
            q
        }
    }
}

/// A possibly-prefixed definition name as a path string.
fn name_to_path(name: &str) -> String {
    format!("/{}", name)
}

// -----------------------------------------------------------------------------
// numeric facets
// -----------------------------------------------------------------------------

fn apply_numeric_facets(
    t: &TypeDescriptor,
    q: &mut DataQuality,
    site: &TypeSite<'_>,
    diags: &mut Diagnostics,
) {
    let Some(ref range) = t.range else { return };
    let subranges = match ranges::parse_ranges(range) {
        Ok(r) => r,
        Err(e) => {
            diags.warn_at(DiagnosticCode::MalformedRange, &site.pointer, e);
            return;
        }
    };

    let natural = t.kind.natural_bounds();
    if subranges.len() == 1 {
        apply_subrange(&subranges[0], natural, q, site, diags);
    } else {
        // Disjoint ranges have no native form: one scalar variant per
        // sub-range, discriminated by choice.
        let base_type = q.json_type.clone();
        for (i, sub) in subranges.iter().enumerate() {
            let mut variant = DataQuality::default();
            variant.json_type = base_type.clone();
            variant.multiple_of = q.multiple_of.clone();
            apply_subrange(sub, natural, &mut variant, site, diags);
            q.sdf_choice.insert(format!("range_{}", i), variant);
        }
        q.json_type = None;
        q.multiple_of = None;
    }
}

fn apply_subrange(
    (lo, hi): &SubRange,
    natural: Option<(i128, i128)>,
    q: &mut DataQuality,
    site: &TypeSite<'_>,
    diags: &mut Diagnostics,
) {
    let lo = resolve_clamped(lo, natural, site, diags);
    let hi = resolve_clamped(hi, natural, site, diags);

    // Bounds written at the type's natural extremes are implicit. Clamped
    // bounds stay explicit: the clamp warning points at a real constraint.
    let lo = lo
        .filter(|(v, clamped)| {
            *clamped || natural.map_or(true, |(n, _)| *v != Decimal::from_i128_with_scale(n, 0))
        })
        .map(|(v, _)| v);
    let hi = hi
        .filter(|(v, clamped)| {
            *clamped || natural.map_or(true, |(_, n)| *v != Decimal::from_i128_with_scale(n, 0))
        })
        .map(|(v, _)| v);

    match (lo, hi) {
        (Some(a), Some(b)) if a == b => q.const_value = decimal_to_number(a).map(Value::Number),
        (lo, hi) => {
            q.minimum = lo.and_then(decimal_to_number);
            q.maximum = hi.and_then(decimal_to_number);
        }
    }
}

/// Resolve a bound against the natural bounds, clamping values outside the
/// representable range to the nearest extreme. The flag records whether the
/// value was clamped.
fn resolve_clamped(
    bound: &Bound,
    natural: Option<(i128, i128)>,
    site: &TypeSite<'_>,
    diags: &mut Diagnostics,
) -> Option<(Decimal, bool)> {
    let value = bound.resolve(natural)?;
    if let Some((lo, hi)) = natural {
        let lo = Decimal::from_i128_with_scale(lo, 0);
        let hi = Decimal::from_i128_with_scale(hi, 0);
        if value < lo {
            diags.warn_at(
                DiagnosticCode::ClampedBound,
                &site.pointer,
                format!("bound {} below representable minimum, clamped", value),
            );
            return Some((lo, true));
        }
        if value > hi {
            diags.warn_at(
                DiagnosticCode::ClampedBound,
                &site.pointer,
                format!("bound {} above representable maximum, clamped", value),
            );
            return Some((hi, true));
        }
    }
    Some((value, false))
}

// -----------------------------------------------------------------------------
// string facets
// -----------------------------------------------------------------------------

fn apply_string_facets(
    t: &TypeDescriptor,
    q: &mut DataQuality,
    site: &TypeSite<'_>,
    diags: &mut Diagnostics,
) {
    if let Some(ref length) = t.length {
        match ranges::parse_ranges(length) {
            Ok(subranges) => {
                // Lengths have no choice encoding; multiple sub-ranges
                // collapse to their hull.
                if subranges.len() > 1 {
                    diags.warn_at(
                        DiagnosticCode::UnsupportedConstruct,
                        &site.pointer,
                        "disjoint length ranges collapsed to their hull",
                    );
                }
                let lo = subranges.first().and_then(|(lo, _)| lo.resolve(None));
                let hi = subranges.last().and_then(|(_, hi)| hi.resolve(None));
                q.min_length = lo.and_then(|v| v.to_u64()).filter(|&v| v != 0);
                q.max_length = hi.and_then(|v| v.to_u64());
            }
            Err(e) => diags.warn_at(DiagnosticCode::MalformedRange, &site.pointer, e),
        }
    }

    if !t.patterns.is_empty() {
        q.pattern = ranges::combine_patterns(&t.patterns);
        // The combined regex is lossy whenever there is an invert flag or
        // more than one pattern; keep the originals in notes.
        if t.patterns.len() > 1 || t.patterns.iter().any(|p| p.invert) {
            for p in &t.patterns {
                let tag = if p.invert {
                    Tag::PatternInvertMatch
                } else {
                    Tag::Pattern
                };
                notes::append_note(&mut q.description, tag, &p.regex);
            }
        }
    }
}

fn decimal_to_number(d: Decimal) -> Option<Number> {
    if d.scale() == 0 {
        if d.is_sign_negative() {
            d.to_i64().map(Number::from)
        } else {
            d.to_u64().map(Number::from)
        }
    } else {
        d.to_f64().and_then(Number::from_f64)
    }
}

fn number_to_decimal(n: &Number) -> Option<Decimal> {
    Decimal::from_str(&n.to_string()).ok()
}

// =============================================================================
// REVERSE: DataQuality -> TypeDescriptor
// =============================================================================

/// Can this quality be rendered as a Tree A leaf type? Objects qualify when
/// they are encoded bit-sets or multi-base identity references.
pub fn is_leaf_quality(q: &DataQuality, notes: &[Note]) -> bool {
    if q.is_array() {
        return false;
    }
    if q.is_object() {
        let original = notes::find_note(notes, &Tag::OriginalType);
        return matches!(original.map(|n| n.argument.as_str()), Some("identityref"))
            || is_bits_object(q);
    }
    true
}

fn is_bits_object(q: &DataQuality) -> bool {
    !q.properties.is_empty()
        && q.properties.values().all(|p| {
            p.json_type.as_deref() == Some("boolean")
                && p.description
                    .as_deref()
                    .map(|d| {
                        let (_, notes) = notes::extract_notes(d);
                        notes::find_note(&notes, &Tag::BitPosition).is_some()
                    })
                    .unwrap_or(false)
        })
}

/// Recover a type descriptor from a quality node. `notes` are the decoded
/// conversion notes of the quality's own description.
pub fn quality_to_type(
    q: &DataQuality,
    notes: &[Note],
    diags: &mut Diagnostics,
) -> TypeDescriptor {
    let original = notes::find_note(notes, &Tag::OriginalType).map(|n| n.argument.as_str());

    // Notes win over inference.
    match original {
        Some("leafref") => {
            let mut t = TypeDescriptor::new(TypeKind::Leafref);
            // Target recovered by the resolver from the sdfRef, if present.
            t.leafref_path = None;
            return t;
        }
        Some("identityref") => {
            let mut t = TypeDescriptor::new(TypeKind::IdentityRef);
            if q.properties.is_empty() {
                if let Some(ref target) = q.sdf_ref {
                    t.identity_bases.push(last_segment(target));
                }
            } else {
                for prop in q.properties.values() {
                    if let Some(ref target) = prop.sdf_ref {
                        t.identity_bases.push(last_segment(target));
                    }
                }
            }
            return t;
        }
        Some("empty") => return TypeDescriptor::new(TypeKind::Empty),
        Some(name) => {
            if let Some(kind) = TypeKind::from_name(name) {
                let mut t = TypeDescriptor::new(kind);
                recover_facets(q, notes, &mut t, diags);
                // Disjoint sub-ranges come back out of the choice variants.
                if t.range.is_none() && !q.sdf_choice.is_empty() {
                    if let Some(merged) = merge_range_choice(q, diags) {
                        t.range = merged.range;
                    }
                }
                return t;
            }
        }
        None => {}
    }

    // Derived-type reference without an original-type note.
    if let Some(ref target) = q.sdf_ref {
        let mut t = TypeDescriptor::default();
        t.source_typedef = Some(last_segment(target));
        recover_facets(q, notes, &mut t, diags);
        return t;
    }

    // Choice of variants: either disjoint numeric ranges re-merging into
    // one numeric type, or a genuine union.
    if !q.sdf_choice.is_empty() {
        if let Some(t) = merge_range_choice(q, diags) {
            return t;
        }
        let mut t = TypeDescriptor::new(TypeKind::Union);
        for branch in q.sdf_choice.values() {
            let (_, branch_notes) = branch
                .description
                .as_deref()
                .map(notes::extract_notes)
                .unwrap_or((None, Vec::new()));
            t.union_branches
                .push(quality_to_type(branch, &branch_notes, diags));
        }
        return t;
    }

    if is_bits_object(q) {
        let mut t = TypeDescriptor::new(TypeKind::Bits);
        for (name, prop) in &q.properties {
            let (clean, prop_notes) = prop
                .description
                .as_deref()
                .map(notes::extract_notes)
                .unwrap_or((None, Vec::new()));
            let position = notes::find_note(&prop_notes, &Tag::BitPosition)
                .and_then(|n| n.argument.parse().ok())
                .unwrap_or(0);
            t.bits.push(BitMember {
                name: name.clone(),
                position,
                description: clean,
            });
        }
        return t;
    }

    // Facet inference.
    let kind = match q.json_type.as_deref() {
        Some("boolean") => TypeKind::Boolean,
        Some("integer") => infer_integer_kind(q),
        Some("number") => TypeKind::Decimal64,
        Some("string") if q.sdf_type.as_deref() == Some("byte-string") => TypeKind::Binary,
        Some("string") if !q.enum_values.is_empty() => TypeKind::Enumeration,
        Some("string") => TypeKind::String,
        _ if q.minimum.is_some() || q.maximum.is_some() => TypeKind::Int64,
        _ if q.pattern.is_some() => TypeKind::String,
        _ if q.nullable == Some(true) => TypeKind::Empty,
        _ => TypeKind::String,
    };

    let mut t = TypeDescriptor::new(kind);
    recover_facets(q, notes, &mut t, diags);
    t
}

fn infer_integer_kind(q: &DataQuality) -> TypeKind {
    let nonneg = q
        .minimum
        .as_ref()
        .and_then(|n| n.as_f64())
        .map(|v| v >= 0.0)
        .unwrap_or(false);
    if nonneg {
        TypeKind::Uint64
    } else {
        TypeKind::Int64
    }
}

fn recover_facets(
    q: &DataQuality,
    quality_notes: &[Note],
    t: &mut TypeDescriptor,
    _diags: &mut Diagnostics,
) {
    // fraction digits from the multipleOf power of ten
    if t.kind == TypeKind::Decimal64 {
        t.fraction_digits = q
            .multiple_of
            .as_ref()
            .and_then(number_to_decimal)
            .map(|d| d.scale() as u8)
            .filter(|&s| s > 0);
    }

    // numeric range
    if t.kind.is_integer() || t.kind == TypeKind::Decimal64 {
        if let Some(Value::Number(ref n)) = q.const_value {
            if let Some(v) = number_to_decimal(n) {
                t.range = Some(ranges::format_range(v, v));
            }
        } else {
            // A missing side sat at the type's natural extreme; emit the
            // literal when the extreme is known, the min/max token otherwise.
            let natural = t.kind.natural_bounds();
            let lo = q.minimum.as_ref().and_then(number_to_decimal);
            let hi = q.maximum.as_ref().and_then(number_to_decimal);
            let low_bound = |a: Option<Decimal>| match (a, natural) {
                (Some(v), _) => Bound::Value(v),
                (None, Some((n, _))) => Bound::Value(Decimal::from_i128_with_scale(n, 0)),
                (None, None) => Bound::Min,
            };
            let high_bound = |b: Option<Decimal>| match (b, natural) {
                (Some(v), _) => Bound::Value(v),
                (None, Some((_, n))) => Bound::Value(Decimal::from_i128_with_scale(n, 0)),
                (None, None) => Bound::Max,
            };
            t.range = match (lo, hi) {
                (None, None) => None,
                (lo, hi) => Some(ranges::format_ranges(&[(low_bound(lo), high_bound(hi))])),
            };
        }
    }

    // length
    if matches!(t.kind, TypeKind::String | TypeKind::Binary) {
        let lo = q.min_length.map(Decimal::from);
        let hi = q.max_length.map(Decimal::from);
        t.length = match (lo, hi) {
            (None, None) => None,
            (Some(a), Some(b)) => Some(ranges::format_range(a, b)),
            (Some(a), None) => Some(ranges::format_ranges(&[(Bound::Value(a), Bound::Max)])),
            (None, Some(b)) => Some(ranges::format_ranges(&[(Bound::Min, Bound::Value(b))])),
        };
    }

    // patterns: per-branch notes preserve text, flags, and order; a bare
    // pattern facet is a single match pattern
    let mut from_notes: Vec<Pattern> = Vec::new();
    for note in quality_notes {
        match note.tag {
            Tag::Pattern => from_notes.push(Pattern::matching(note.argument.clone())),
            Tag::PatternInvertMatch => from_notes.push(Pattern::inverted(note.argument.clone())),
            _ => {}
        }
    }
    if !from_notes.is_empty() {
        t.patterns = from_notes;
    } else if let Some(ref p) = q.pattern {
        if t.kind == TypeKind::String {
            t.patterns = vec![Pattern::matching(p.clone())];
        }
    }

    // enumeration members, with "name: text" description lines pulled back
    if t.kind == TypeKind::Enumeration {
        let member_text: Vec<(String, String)> = q
            .description
            .as_deref()
            .map(|d| {
                let (clean, _) = notes::extract_notes(d);
                clean
                    .unwrap_or_default()
                    .lines()
                    .filter_map(|l| l.split_once(": "))
                    .map(|(n, d)| (n.to_string(), d.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        t.enums = q
            .enum_values
            .iter()
            .map(|name| EnumMember {
                name: name.clone(),
                value: None,
                description: member_text
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, d)| d.clone()),
            })
            .collect();
    }

    if let Some(Value::String(ref s)) = q.default {
        t.default_value = Some(s.clone());
    }
    if let Some(ref unit) = q.unit {
        t.units = Some(unit.clone());
    }
}

/// A choice whose variants are all scalars of one numeric type re-merges
/// into disjoint sub-ranges of that type.
fn merge_range_choice(q: &DataQuality, _diags: &mut Diagnostics) -> Option<TypeDescriptor> {
    let mut json_type: Option<&str> = None;
    let mut subranges: Vec<SubRange> = Vec::new();

    for variant in q.sdf_choice.values() {
        let vt = variant.json_type.as_deref()?;
        if !matches!(vt, "integer" | "number") {
            return None;
        }
        if *json_type.get_or_insert(vt) != vt {
            return None;
        }
        if let Some(Value::Number(ref n)) = variant.const_value {
            let v = number_to_decimal(n)?;
            subranges.push((Bound::Value(v), Bound::Value(v)));
        } else {
            let lo = variant.minimum.as_ref().and_then(number_to_decimal);
            let hi = variant.maximum.as_ref().and_then(number_to_decimal);
            if lo.is_none() && hi.is_none() {
                return None;
            }
            subranges.push((
                lo.map(Bound::Value).unwrap_or(Bound::Min),
                hi.map(Bound::Value).unwrap_or(Bound::Max),
            ));
        }
    }

    if subranges.len() < 2 {
        return None;
    }
    // Choice keys sort lexically; restore numeric order of the sub-ranges.
    subranges.sort_by(|a, b| {
        let key = |s: &SubRange| match s.0 {
            Bound::Min => Decimal::MIN,
            Bound::Max => Decimal::MAX,
            Bound::Value(v) => v,
        };
        key(a).cmp(&key(b))
    });

    let kind = if json_type == Some("number") {
        TypeKind::Decimal64
    } else {
        TypeKind::Int64
    };
    let mut t = TypeDescriptor::new(kind);
    t.range = Some(ranges::format_ranges(&subranges));
    Some(t)
}

fn last_segment(pointer: &str) -> String {
    let seg = pointer.rsplit('/').next().unwrap_or(pointer);
    seg.split_once(':').map(|(_, n)| n).unwrap_or(seg).to_string()
}
