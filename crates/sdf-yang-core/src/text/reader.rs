//! YANG text -> [`Statement`] tree -> Tree A module.
//!
//! The grammar is the uniform statement shape: a keyword, an optional
//! argument (unquoted token, or quoted strings joined with `+`), then
//! either `;` or a `{ ... }` block. Line and block comments are treated
//! as whitespace.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_until, take_while, take_while1},
    character::complete::{char, multispace1, none_of},
    combinator::{all_consuming, map, opt, value},
    error::{ContextError, ParseError as NomParseError, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::Statement;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::TranslateError;
use crate::notes;
use crate::yang::{
    BitMember, EnumMember, Identity, Module, NodeId, NodeKind, Pattern, SchemaNode, Status,
    TypeDescriptor, TypeKind,
};

// ============================================================================
// Public API
// ============================================================================

/// Parse one complete statement (normally the `module` statement) from text.
pub fn parse_statement_tree(input: &str) -> Result<Statement, TranslateError> {
    match all_consuming(delimited(blank, statement::<VerboseError<&str>>, blank))(input) {
        Ok((_, stmt)) => Ok(stmt),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(TranslateError::YangParse(nom::error::convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(TranslateError::YangParse("incomplete input".to_string()))
        }
    }
}

/// Parse module text into a Tree A module.
pub fn module_from_text(input: &str, diags: &mut Diagnostics) -> Result<Module, TranslateError> {
    let stmt = parse_statement_tree(input)?;
    if stmt.keyword != "module" && stmt.keyword != "submodule" {
        return Err(TranslateError::YangParse(format!(
            "expected a module statement, found '{}'",
            stmt.keyword
        )));
    }
    let name = stmt
        .argument
        .clone()
        .ok_or_else(|| TranslateError::YangParse("module statement without a name".to_string()))?;

    let mut module = Module::new(name);
    for child in &stmt.children {
        match child.keyword.as_str() {
            "namespace" => module.namespace = child.argument.clone().unwrap_or_default(),
            "prefix" => module.prefix = child.argument.clone().unwrap_or_default(),
            "yang-version" => {}
            "import" => {
                if let (Some(imported), Some(prefix)) =
                    (child.argument.as_deref(), child.arg_of("prefix"))
                {
                    module
                        .imports
                        .insert(prefix.to_string(), imported.to_string());
                }
            }
            "organization" => module.organization = child.argument.clone(),
            "contact" => module.contact = child.argument.clone(),
            "description" => module.description = child.argument.clone(),
            "reference" => module.reference = child.argument.clone(),
            "revision" => {
                // Newest revision comes first; keep only that one.
                if module.revision.is_none() {
                    module.revision = child.argument.clone();
                }
            }
            "feature" => {
                if let Some(ref f) = child.argument {
                    module.features.push(f.clone());
                }
            }
            "typedef" => build_typedef(&mut module, child, diags),
            "identity" => build_identity(&mut module, child),
            kw if is_data_keyword(kw) => {
                build_data_node(&mut module, None, child, diags);
            }
            other => diags.warn(
                DiagnosticCode::UnsupportedConstruct,
                format!("module-level statement '{}' ignored", other),
            ),
        }
    }
    Ok(module)
}

// ============================================================================
// Grammar
// ============================================================================

/// Whitespace, line comments, and block comments.
fn blank<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(tag("//"), take_while(|c| c != '\n'))),
            value((), tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ))),
    )(input)
}

fn keyword<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))(input)
}

fn double_quoted<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    delimited(
        char('"'),
        alt((
            escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                    value('\\', char('\\')),
                    value('"', char('"')),
                    value('\n', char('n')),
                    value('\t', char('t')),
                )),
            ),
            map(tag(""), |_| String::new()),
        )),
        char('"'),
    )(input)
}

fn single_quoted<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        str::to_string,
    )(input)
}

/// Quoted argument: one or more quoted strings joined with `+`.
fn quoted_argument<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        separated_list1(
            delimited(blank, char('+'), blank),
            alt((double_quoted, single_quoted)),
        ),
        |parts| parts.concat(),
    )(input)
}

fn unquoted_argument<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, ';' | '{' | '}' | '"' | '\'')),
        str::to_string,
    )(input)
}

fn argument<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    alt((quoted_argument, unquoted_argument))(input)
}

fn statement<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, _) = blank(input)?;
    let (input, keyword) = keyword(input)?;
    let (input, argument) = opt(preceded(blank, argument))(input)?;
    let (input, _) = blank(input)?;
    let (input, children) = alt((
        value(Vec::new(), char(';')),
        delimited(char('{'), many0(statement), preceded(blank, char('}'))),
    ))(input)?;
    Ok((
        input,
        Statement {
            keyword: keyword.to_string(),
            argument,
            children,
        },
    ))
}

// ============================================================================
// Tree A construction
// ============================================================================

fn is_data_keyword(kw: &str) -> bool {
    matches!(
        kw,
        "container"
            | "list"
            | "leaf"
            | "leaf-list"
            | "choice"
            | "case"
            | "grouping"
            | "uses"
            | "rpc"
            | "action"
            | "input"
            | "output"
            | "notification"
            | "augment"
    )
}

fn node_kind(kw: &str) -> Option<NodeKind> {
    Some(match kw {
        "container" => NodeKind::Container,
        "list" => NodeKind::List,
        "leaf" => NodeKind::Leaf,
        "leaf-list" => NodeKind::LeafList,
        "choice" => NodeKind::Choice,
        "case" => NodeKind::Case,
        "grouping" => NodeKind::Grouping,
        "uses" => NodeKind::Uses,
        "rpc" => NodeKind::Rpc,
        "action" => NodeKind::Action,
        "input" => NodeKind::Input,
        "output" => NodeKind::Output,
        "notification" => NodeKind::Notification,
        "augment" => NodeKind::Augment,
        _ => return None,
    })
}

fn build_data_node(
    module: &mut Module,
    parent: Option<NodeId>,
    stmt: &Statement,
    diags: &mut Diagnostics,
) -> Option<NodeId> {
    let kind = node_kind(&stmt.keyword)?;
    // input/output carry no argument; their keyword is their name
    let name = stmt.argument.clone().unwrap_or_else(|| stmt.keyword.clone());
    let mut node = SchemaNode::new(kind, name);
    match kind {
        NodeKind::Uses => node.uses_target = stmt.argument.clone(),
        NodeKind::Augment => node.augment_target = stmt.argument.clone(),
        _ => {}
    }

    let mut default_value: Option<String> = None;
    let mut units: Option<String> = None;

    for child in &stmt.children {
        let arg = child.argument.as_deref();
        match child.keyword.as_str() {
            "description" => {
                // Extension markers travel as note lines inside the text.
                let (clean, decoded) = notes::extract_notes(arg.unwrap_or(""));
                node.description = clean;
                for n in decoded {
                    node.extensions.push(crate::yang::ExtensionInstance {
                        tag: n.tag,
                        argument: n.argument,
                    });
                }
            }
            "reference" => node.reference = arg.map(str::to_string),
            "config" => node.config = arg != Some("false"),
            "mandatory" => node.mandatory = arg == Some("true"),
            "status" => node.status = arg.and_then(Status::parse).unwrap_or_default(),
            "when" => node.when = arg.map(str::to_string),
            "must" => {
                if let Some(m) = arg {
                    node.must.push(m.to_string());
                }
            }
            "if-feature" => {
                if let Some(f) = arg {
                    node.if_features.push(f.to_string());
                }
            }
            "presence" => node.presence = true,
            "key" => {
                node.keys = arg
                    .unwrap_or("")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
            }
            "min-elements" => {
                node.min_elements = arg.and_then(|a| a.parse().ok()).unwrap_or(0);
            }
            "max-elements" => {
                node.max_elements = match arg {
                    Some("unbounded") | None => None,
                    Some(a) => a.parse().ok(),
                };
            }
            "ordered-by" => node.ordered_by_user = arg == Some("user"),
            "type" => node.type_desc = Some(build_type(child, diags)),
            "default" => default_value = arg.map(str::to_string),
            "units" => units = arg.map(str::to_string),
            kw if is_data_keyword(kw) => {} // second pass below
            other => diags.warn(
                DiagnosticCode::UnsupportedConstruct,
                format!("substatement '{}' ignored", other),
            ),
        }
    }

    if default_value.is_some() || units.is_some() {
        let t = node.type_desc.get_or_insert_with(TypeDescriptor::default);
        t.default_value = default_value;
        t.units = units;
    }

    let id = module.add_child(parent, node);
    for child in &stmt.children {
        if is_data_keyword(&child.keyword) {
            build_data_node(module, Some(id), child, diags);
        }
    }
    Some(id)
}

fn build_type(stmt: &Statement, diags: &mut Diagnostics) -> TypeDescriptor {
    let name = stmt.argument.as_deref().unwrap_or("string");
    let mut t = match TypeKind::from_name(name) {
        Some(kind) => TypeDescriptor::new(kind),
        None => {
            let mut t = TypeDescriptor::default();
            t.source_typedef = Some(name.to_string());
            t
        }
    };

    for child in &stmt.children {
        let arg = child.argument.as_deref();
        match child.keyword.as_str() {
            "range" => t.range = arg.map(str::to_string),
            "length" => t.length = arg.map(str::to_string),
            "pattern" => {
                let invert = child
                    .find_all("modifier")
                    .any(|m| m.argument.as_deref() == Some("invert-match"));
                let regex = arg.unwrap_or("").to_string();
                t.patterns.push(if invert {
                    Pattern::inverted(regex)
                } else {
                    Pattern::matching(regex)
                });
            }
            "fraction-digits" => t.fraction_digits = arg.and_then(|a| a.parse().ok()),
            "enum" => t.enums.push(EnumMember {
                name: arg.unwrap_or("").to_string(),
                value: child.arg_of("value").and_then(|v| v.parse().ok()),
                description: child.arg_of("description").map(str::to_string),
            }),
            "bit" => t.bits.push(BitMember {
                name: arg.unwrap_or("").to_string(),
                position: child
                    .arg_of("position")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(0),
                description: child.arg_of("description").map(str::to_string),
            }),
            "base" => {
                if let Some(b) = arg {
                    t.identity_bases.push(b.to_string());
                }
            }
            "path" => t.leafref_path = arg.map(str::to_string),
            "type" => t.union_branches.push(build_type(child, diags)),
            "require-instance" => {}
            other => diags.warn(
                DiagnosticCode::UnsupportedConstruct,
                format!("type substatement '{}' ignored", other),
            ),
        }
    }
    t
}

fn build_typedef(module: &mut Module, stmt: &Statement, diags: &mut Diagnostics) {
    let Some(ref name) = stmt.argument else {
        diags.warn(
            DiagnosticCode::UnsupportedConstruct,
            "typedef without a name ignored",
        );
        return;
    };
    let mut t = stmt
        .find("type")
        .map(|ty| build_type(ty, diags))
        .unwrap_or_default();
    if let Some(d) = stmt.arg_of("default") {
        t.default_value = Some(d.to_string());
    }
    if let Some(u) = stmt.arg_of("units") {
        t.units = Some(u.to_string());
    }
    module.typedefs.insert(name.clone(), t);
}

fn build_identity(module: &mut Module, stmt: &Statement) {
    let Some(ref name) = stmt.argument else { return };
    module.identities.insert(
        name.clone(),
        Identity {
            name: name.clone(),
            bases: stmt
                .find_all("base")
                .filter_map(|b| b.argument.clone())
                .collect(),
            description: stmt.arg_of("description").map(str::to_string),
            status: stmt
                .arg_of("status")
                .and_then(Status::parse)
                .unwrap_or_default(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> Module {
        let mut diags = Diagnostics::new();
        module_from_text(text, &mut diags).unwrap()
    }

    #[test]
    fn minimal_module() {
        let m = read(
            r#"
            module demo {
              namespace "urn:example:demo";
              prefix dm;
              container system {
                leaf hostname {
                  type string;
                  description "The device name.";
                }
              }
            }
            "#,
        );
        assert_eq!(m.name, "demo");
        assert_eq!(m.prefix, "dm");
        assert_eq!(m.namespace, "urn:example:demo");
        let sys = m.find_child(None, "system").unwrap();
        let host = m.find_child(Some(sys), "hostname").unwrap();
        assert_eq!(m.node(host).kind, NodeKind::Leaf);
        assert_eq!(
            m.node(host).description.as_deref(),
            Some("The device name.")
        );
        assert_eq!(
            m.node(host).type_desc.as_ref().unwrap().kind,
            TypeKind::String
        );
    }

    #[test]
    fn comments_are_whitespace() {
        let m = read(
            "module demo { // trailing\n /* block\n comment */ leaf x { type boolean; } }",
        );
        assert!(m.find_child(None, "x").is_some());
    }

    #[test]
    fn quoted_string_concatenation() {
        let m = read(
            r#"module demo {
              description "part one, " + "part two";
              leaf x { type string; }
            }"#,
        );
        assert_eq!(m.description.as_deref(), Some("part one, part two"));
    }

    #[test]
    fn escapes_in_double_quotes() {
        let m = read(
            r#"module demo {
              leaf x { type string; description "line one\nline \"two\""; }
            }"#,
        );
        let x = m.find_child(None, "x").unwrap();
        assert_eq!(
            m.node(x).description.as_deref(),
            Some("line one\nline \"two\"")
        );
    }

    #[test]
    fn list_statements() {
        let m = read(
            r#"module demo {
              list interface {
                key "name";
                min-elements 1;
                max-elements unbounded;
                ordered-by user;
                leaf name { type string; }
              }
            }"#,
        );
        let l = m.find_child(None, "interface").unwrap();
        let node = m.node(l);
        assert_eq!(node.keys, vec!["name"]);
        assert_eq!(node.min_elements, 1);
        assert_eq!(node.max_elements, None);
        assert!(node.ordered_by_user);
    }

    #[test]
    fn type_facets() {
        let m = read(
            r#"module demo {
              leaf pct {
                type uint8 { range "0..100"; }
                default 50;
                units percent;
              }
              leaf id {
                type string {
                  length "1..64";
                  pattern "[a-z]+";
                  pattern "xml.*" { modifier invert-match; }
                }
              }
            }"#,
        );
        let pct = m.find_child(None, "pct").unwrap();
        let t = m.node(pct).type_desc.as_ref().unwrap();
        assert_eq!(t.kind, TypeKind::Uint8);
        assert_eq!(t.range.as_deref(), Some("0..100"));
        assert_eq!(t.default_value.as_deref(), Some("50"));
        assert_eq!(t.units.as_deref(), Some("percent"));

        let id = m.find_child(None, "id").unwrap();
        let t = m.node(id).type_desc.as_ref().unwrap();
        assert_eq!(t.length.as_deref(), Some("1..64"));
        assert_eq!(
            t.patterns,
            vec![Pattern::matching("[a-z]+"), Pattern::inverted("xml.*")]
        );
    }

    #[test]
    fn union_and_leafref_types() {
        let m = read(
            r#"module demo {
              leaf u { type union { type uint8; type string; } }
              leaf peer { type leafref { path "../u"; } }
            }"#,
        );
        let u = m.find_child(None, "u").unwrap();
        let t = m.node(u).type_desc.as_ref().unwrap();
        assert_eq!(t.kind, TypeKind::Union);
        assert_eq!(t.union_branches.len(), 2);

        let p = m.find_child(None, "peer").unwrap();
        let t = m.node(p).type_desc.as_ref().unwrap();
        assert_eq!(t.kind, TypeKind::Leafref);
        assert_eq!(t.leafref_path.as_deref(), Some("../u"));
    }

    #[test]
    fn typedef_identity_import() {
        let m = read(
            r#"module demo {
              prefix dm;
              import ietf-inet-types { prefix inet; }
              typedef percent { type uint8 { range "0..100"; } }
              identity aes { base crypto-alg; base block-alg; }
              leaf addr { type inet:ip-address; }
            }"#,
        );
        assert_eq!(m.imports["inet"], "ietf-inet-types");
        assert_eq!(m.typedefs["percent"].kind, TypeKind::Uint8);
        assert_eq!(m.identities["aes"].bases, vec!["crypto-alg", "block-alg"]);
        let addr = m.find_child(None, "addr").unwrap();
        assert_eq!(
            m.node(addr)
                .type_desc
                .as_ref()
                .unwrap()
                .source_typedef
                .as_deref(),
            Some("inet:ip-address")
        );
    }

    #[test]
    fn rpc_and_augment() {
        let m = read(
            r#"module demo {
              rpc restart {
                input { leaf delay { type uint32; } }
                output { leaf ok { type boolean; } }
              }
              augment "/system" {
                leaf mtu { type uint16; }
              }
            }"#,
        );
        let rpc = m.find_child(None, "restart").unwrap();
        assert!(m.find_child(Some(rpc), "input").is_some());
        let aug = m.find_child(None, "/system").unwrap();
        assert_eq!(m.node(aug).kind, NodeKind::Augment);
        assert_eq!(m.node(aug).augment_target.as_deref(), Some("/system"));
        assert!(m.find_child(Some(aug), "mtu").is_some());
    }

    #[test]
    fn note_lines_become_extensions() {
        let m = read(
            r#"module demo {
              list servers {
                key "address";
                description "Configured servers.
!Conversion note: artificial-key address!";
                leaf address { type string; }
              }
            }"#,
        );
        let l = m.find_child(None, "servers").unwrap();
        let node = m.node(l);
        assert_eq!(node.description.as_deref(), Some("Configured servers."));
        assert_eq!(node.extensions.len(), 1);
        assert_eq!(node.extensions[0].tag, notes::Tag::ArtificialKey);
        assert_eq!(node.extensions[0].argument, "address");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let mut diags = Diagnostics::new();
        let err = module_from_text("this is } not yang", &mut diags).unwrap_err();
        assert!(matches!(err, TranslateError::YangParse(_)));
    }

    #[test]
    fn non_module_root_is_rejected() {
        let mut diags = Diagnostics::new();
        let err = module_from_text("container x { }", &mut diags).unwrap_err();
        assert!(err.to_string().contains("expected a module"));
    }

    #[test]
    fn unknown_statement_warns_and_continues() {
        let mut diags = Diagnostics::new();
        let m = module_from_text(
            "module demo { anydata blob; leaf x { type string; } }",
            &mut diags,
        )
        .unwrap();
        assert!(m.find_child(None, "x").is_some());
        assert_eq!(diags.count_of(DiagnosticCode::UnsupportedConstruct), 1);
    }
}
