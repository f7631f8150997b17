//! Full-cycle fidelity: YANG text to SDF JSON and back, checking that leaf
//! kinds, facets, and flags survive the trip.

use sdf_yang_core::{sdf_to_yang, yang_to_sdf};

fn cycle(yang: &str) -> String {
    let (json, diags) = yang_to_sdf(yang).unwrap();
    assert!(diags.is_empty(), "forward: {}", diags.summary());
    let (back, diags) = sdf_to_yang(&json).unwrap();
    assert!(diags.is_empty(), "reverse: {}", diags.summary());
    back
}

#[test]
fn leaf_facets_survive_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          container settings {
            leaf name { type string { length "1..64"; pattern "[a-z]+"; } }
            leaf level {
              type uint8 { range "1..10"; }
              status deprecated;
            }
            leaf ratio { type decimal64 { fraction-digits 2; } }
            leaf debug { type boolean; config false; }
          }
        }
        "#,
    );
    assert!(back.contains("length \"1..64\";"), "{back}");
    assert!(back.contains("pattern \"[a-z]+\";"), "{back}");
    assert!(back.contains("range \"1..10\";"), "{back}");
    assert!(back.contains("status deprecated;"), "{back}");
    assert!(back.contains("fraction-digits 2;"), "{back}");
    assert!(back.contains("type boolean;"), "{back}");
    assert!(back.contains("config false;"), "{back}");
}

#[test]
fn inverted_pattern_keeps_its_modifier() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          leaf token {
            type string {
              pattern "[0-9]+" { modifier invert-match; }
            }
          }
        }
        "#,
    );
    assert!(back.contains("pattern \"[0-9]+\""), "{back}");
    assert!(back.contains("modifier invert-match;"), "{back}");
}

#[test]
fn enumeration_members_survive_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          leaf mode { type enumeration { enum on; enum off; } }
        }
        "#,
    );
    assert!(back.contains("type enumeration {"), "{back}");
    assert!(back.contains("enum on;"), "{back}");
    assert!(back.contains("enum off;"), "{back}");
}

#[test]
fn module_header_and_descriptions_survive_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          organization "Example Corp";
          contact "ops@example.com";
          revision 2024-01-15;
          description "Runtime settings.";
          container settings {
            description "Tunable knobs.";
            leaf name { type string; }
          }
        }
        "#,
    );
    assert!(back.contains("namespace \"urn:example:rt\";"), "{back}");
    assert!(back.contains("prefix rt;"), "{back}");
    assert!(back.contains("organization \"Example Corp\";"), "{back}");
    assert!(back.contains("contact \"ops@example.com\";"), "{back}");
    assert!(back.contains("revision 2024-01-15;"), "{back}");
    assert!(back.contains("description \"Tunable knobs.\";"), "{back}");
}

#[test]
fn rpc_and_notification_shapes_survive_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          rpc reboot {
            input { leaf delay { type uint32; } }
            output { leaf scheduled { type boolean; } }
          }
          rpc ping;
          notification link-down {
            leaf interface { type string; }
          }
        }
        "#,
    );
    assert!(back.contains("rpc reboot {"), "{back}");
    assert!(back.contains("leaf delay {"), "{back}");
    assert!(back.contains("leaf scheduled {"), "{back}");
    assert!(back.contains("rpc ping"), "{back}");
    assert!(!back.contains("rpc ping {\n    input"), "{back}");
    assert!(back.contains("notification link-down {"), "{back}");
    assert!(back.contains("leaf interface {"), "{back}");
}

#[test]
fn list_ordering_and_bounds_survive_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          list server {
            key "name";
            ordered-by user;
            min-elements 1;
            max-elements 8;
            leaf name { type string; }
            leaf port { type uint16; }
          }
        }
        "#,
    );
    assert!(back.contains("key \"name\";"), "{back}");
    assert!(back.contains("ordered-by user;"), "{back}");
    assert!(back.contains("min-elements 1;"), "{back}");
    assert!(back.contains("max-elements 8;"), "{back}");
}

#[test]
fn leafref_target_path_survives_the_cycle() {
    let back = cycle(
        r#"
        module rt {
          namespace "urn:example:rt";
          prefix rt;
          container interfaces {
            list interface {
              key "name";
              leaf name { type string; }
            }
          }
          leaf primary {
            type leafref { path "/interfaces/interface/name"; }
          }
        }
        "#,
    );
    assert!(back.contains("type leafref {"), "{back}");
    assert!(
        back.contains("path \"/interfaces/interface/name\";"),
        "{back}"
    );
}
