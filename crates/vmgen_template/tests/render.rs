//! Rendering tests against serde records, written in the Go template dialect.

use proptest::prelude::*;
use serde::Serialize;
use serde_json::json;
use vmgen_template::{render, ExecError, Template, TemplateError};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Cluster {
    name: String,
    #[serde(rename = "TLSEnabled")]
    tls_enabled: bool,
    addrs: Vec<String>,
    grafana_addr: Option<String>,
}

fn cluster(addrs: &[&str]) -> Cluster {
    Cluster {
        name: "c1".into(),
        tls_enabled: false,
        addrs: addrs.iter().map(|s| s.to_string()).collect(),
        grafana_addr: None,
    }
}

fn render_str<T: Serialize>(source: &str, data: &T) -> String {
    String::from_utf8(render("test", source, data).unwrap()).unwrap()
}

// =============================================================================
// FIELDS AND TEXT
// =============================================================================

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(render_str("no actions here\n", &json!({})), "no actions here\n");
}

#[test]
fn test_field_access() {
    assert_eq!(render_str("cluster: {{.Name}}", &cluster(&[])), "cluster: c1");
}

#[test]
fn test_nested_fields() {
    let data = json!({"Outer": {"Inner": {"Port": 2379}}});
    assert_eq!(render_str("{{.Outer.Inner.Port}}", &data), "2379");
}

#[test]
fn test_unset_option_prints_empty_and_is_false() {
    let out = render_str(
        "[{{.GrafanaAddr}}]{{if .GrafanaAddr}}set{{else}}unset{{end}}",
        &cluster(&[]),
    );
    assert_eq!(out, "[]unset");
}

#[test]
fn test_missing_field_is_exec_error() {
    let err = render("cfg", "line1\n{{.Nope}}", &cluster(&[])).unwrap_err();
    match err {
        TemplateError::Exec(ExecError { name, line, message }) => {
            assert_eq!(name, "cfg");
            assert_eq!(line, 2);
            assert_eq!(message, "can't evaluate field Nope in type record");
        }
        other => panic!("expected exec error, got {:?}", other),
    }
}

#[test]
fn test_field_of_scalar_is_exec_error() {
    let err = render("t", "{{.Name.Inner}}", &cluster(&[])).unwrap_err();
    assert!(matches!(err, TemplateError::Exec(_)));
    assert!(err.to_string().contains("can't evaluate field Inner in type string"));
}

#[test]
fn test_parse_error_display() {
    let err = render("cfg", "{{if .Name}}", &cluster(&[])).unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)));
    assert_eq!(err.to_string(), "template: cfg:1: unexpected EOF in if");
}

// =============================================================================
// CONTROL STRUCTURES
// =============================================================================

#[test]
fn test_if_on_bool() {
    let source = "{{if .TLSEnabled}}https{{else}}http{{end}}";
    let mut data = cluster(&[]);
    assert_eq!(render_str(source, &data), "http");
    data.tls_enabled = true;
    assert_eq!(render_str(source, &data), "https");
}

#[test]
fn test_else_if_chain() {
    let source = "{{if eq .N 1}}one{{else if eq .N 2}}two{{else}}many{{end}}";
    assert_eq!(render_str(source, &json!({"N": 1})), "one");
    assert_eq!(render_str(source, &json!({"N": 2})), "two");
    assert_eq!(render_str(source, &json!({"N": 7})), "many");
}

#[test]
fn test_range_preserves_order() {
    let data = cluster(&["10.0.0.2:2379", "10.0.0.1:2379", "10.0.0.3:2379"]);
    assert_eq!(
        render_str("{{range .Addrs}}{{.}};{{end}}", &data),
        "10.0.0.2:2379;10.0.0.1:2379;10.0.0.3:2379;"
    );
}

#[test]
fn test_range_else_on_empty() {
    assert_eq!(
        render_str("{{range .Addrs}}{{.}}{{else}}none{{end}}", &cluster(&[])),
        "none"
    );
}

#[test]
fn test_range_with_index_and_root_access() {
    let data = cluster(&["a:1", "b:2"]);
    assert_eq!(
        render_str("{{range $i, $addr := .Addrs}}{{$.Name}}/{{$i}}={{$addr}} {{end}}", &data),
        "c1/0=a:1 c1/1=b:2 "
    );
}

#[test]
fn test_range_over_map_is_key_sorted() {
    let data = json!({"M": {"b": 2, "a": 1}});
    assert_eq!(render_str("{{range $k, $v := .M}}{{$k}}{{$v}}{{end}}", &data), "a1b2");
}

#[test]
fn test_range_over_scalar_fails() {
    let err = render("t", "{{range .Name}}{{end}}", &cluster(&[])).unwrap_err();
    assert!(err.to_string().ends_with("range can't iterate over string"));
}

#[test]
fn test_with_rebinds_dot() {
    let data = json!({"Slot": "h:9091"});
    assert_eq!(render_str("{{with .Slot}}<{{.}}>{{end}}", &data), "<h:9091>");
    let empty = json!({"Slot": ""});
    assert_eq!(render_str("{{with .Slot}}<{{.}}>{{else}}-{{end}}", &empty), "-");
}

#[test]
fn test_variables_and_assignment() {
    let data = json!({"A": "x", "B": "y"});
    assert_eq!(render_str("{{$v := .A}}{{$v}}{{$v = .B}}{{$v}}", &data), "xy");
}

// =============================================================================
// PIPELINES AND FUNCTIONS
// =============================================================================

#[test]
fn test_pipeline_feeds_last_argument() {
    let data = cluster(&["a:1", "b:2"]);
    assert_eq!(render_str("{{.Addrs | len}}", &data), "2");
    assert_eq!(render_str("{{if .Addrs | len | eq 2}}two{{end}}", &data), "two");
}

#[test]
fn test_boolean_functions() {
    let data = json!({"T": true, "F": false, "S": "s"});
    assert_eq!(render_str("{{and .T .S}}|{{or .F .S}}|{{not .T}}", &data), "s|s|false");
}

#[test]
fn test_and_or_stop_at_deciding_argument() {
    let empty = json!({"L": []});
    let out = render_str("{{if and .L (index .L 0)}}first{{else}}none{{end}}", &empty);
    assert_eq!(out, "none");
    let out = render_str("{{or \"set\" (index .L 0)}}", &empty);
    assert_eq!(out, "set");

    let full = json!({"L": ["a"]});
    let out = render_str("{{if and .L (index .L 0)}}first{{else}}none{{end}}", &full);
    assert_eq!(out, "first");
}

#[test]
fn test_and_or_take_piped_value_last() {
    let data = json!({"T": true, "F": false});
    assert_eq!(render_str(r#"{{"x" | and .T}}"#, &data), "x");
    assert_eq!(render_str(r#"{{"x" | and .F}}"#, &data), "false");
    assert_eq!(render_str(r#"{{"x" | or .F}}"#, &data), "x");
}

#[test]
fn test_index_function() {
    let data = json!({"L": ["a", "b"], "M": {"k": "v"}});
    assert_eq!(render_str(r#"{{index .L 1}}{{index .M "k"}}"#, &data), "bv");
}

#[test]
fn test_function_error_is_exec_error() {
    let err = render("t", "{{index .L 5}}", &json!({"L": []})).unwrap_err();
    match err {
        TemplateError::Exec(ExecError { message, .. }) => {
            assert_eq!(message, "error calling index: index out of range: 5")
        }
        other => panic!("expected exec error, got {:?}", other),
    }
}

#[test]
fn test_comparison_error_names_the_called_builtin() {
    let err = render("t", r#"{{ne .N "1"}}"#, &json!({"N": 1})).unwrap_err();
    match err {
        TemplateError::Exec(ExecError { message, .. }) => assert_eq!(
            message,
            "error calling ne: incompatible types for comparison: int and string"
        ),
        other => panic!("expected exec error, got {:?}", other),
    }
}

// =============================================================================
// WHITESPACE CONTROL
// =============================================================================

#[test]
fn test_trim_markers_shape_yaml() {
    let source = "targets:\n{{- range .Addrs}}\n  - '{{.}}'\n{{- end}}\n";
    let data = cluster(&["a:1", "b:2"]);
    assert_eq!(render_str(source, &data), "targets:\n  - 'a:1'\n  - 'b:2'\n");
    assert_eq!(render_str(source, &cluster(&[])), "targets:\n");
}

#[test]
fn test_comments_are_dropped() {
    let out = render_str("a\n{{- /* note */}}\nb", &json!({}));
    assert_eq!(out, "a\nb");
}

#[test]
fn test_comment_with_padding_is_rejected() {
    let err = render("t", "{{ /* note */ }}", &json!({})).unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)), "{:?}", err);
}

// =============================================================================
// NON-ASCII SOURCE
// =============================================================================

#[test]
fn test_unicode_field_names() {
    let data = json!({"Größe": "groß"});
    assert_eq!(render_str("{{.Größe}} ✓", &data), "groß ✓");
}

#[test]
fn test_missing_unicode_field_is_exec_error() {
    let err = render("t", "{{.Größe}}", &json!({})).unwrap_err();
    match err {
        TemplateError::Exec(ExecError { message, .. }) => {
            assert_eq!(message, "can't evaluate field Größe in type record")
        }
        other => panic!("expected exec error, got {:?}", other),
    }
}

#[test]
fn test_root_variable_inside_range() {
    let data = json!({"Name": "c1", "Addrs": ["a", "b", "c"]});
    let out = render_str("{{range .Addrs}}{{$.Name}}/{{.}} {{end}}", &data);
    assert_eq!(out, "c1/a c1/b c1/c ");
}

#[test]
fn test_template_reuse_is_deterministic() -> anyhow::Result<()> {
    let template = Template::parse("t", "{{range .Addrs}}{{.}},{{end}}{{.Name}}")?;
    let data = cluster(&["x:1", "y:2"]);
    assert_eq!(template.execute(&data)?, template.execute(&data)?);
    assert_eq!(template.name(), "t");
    Ok(())
}

proptest! {
    #[test]
    fn prop_range_joins_in_order(items in prop::collection::vec("[a-z0-9.]{1,12}:[0-9]{1,5}", 0..20)) {
        let data = json!({"Addrs": &items});
        let out = render_str("{{range .Addrs}}{{.}}\n{{end}}", &data);
        let expected: String = items.iter().map(|i| format!("{}\n", i)).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn prop_text_without_delimiters_is_verbatim(text in "[^{}]{0,64}") {
        prop_assert_eq!(render_str(&text, &json!({})), text);
    }
}
