use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use stylegraft_lib::{merge_css, CssRuleSpec};

fn spec(value: Value) -> CssRuleSpec {
    match value {
        Value::Object(map) => map,
        _ => panic!("spec must be an object"),
    }
}

#[test]
fn merges_layers_utilities_and_keyframes() {
    let rules = spec(json!({
        "@layer base": { "body": { "letter-spacing": "0.01em" } },
        "@utility container": { "margin-inline": "auto", "padding-inline": "2rem" },
        "@keyframes wiggle": {
            "0%, 100%": { "transform": "rotate(-3deg)" },
            "50%": { "transform": "rotate(3deg)" }
        }
    }));

    let output = merge_css("@import \"tailwindcss\";\n", &rules).unwrap();
    assert_eq!(
        output,
        "@import \"tailwindcss\";\n\n@layer base {\n  body {\n    letter-spacing: 0.01em;\n  }\n}\n\n@utility container {\n  margin-inline: auto;\n  padding-inline: 2rem;\n}\n\n@theme inline {\n  @keyframes wiggle {\n    0%, 100% {\n      transform: rotate(-3deg);\n    }\n    50% {\n      transform: rotate(3deg);\n    }\n  }\n}"
    );

    let again = merge_css(&output, &rules).unwrap();
    assert_eq!(again, output);
}

#[test]
fn ampersand_keys_become_sibling_rules() {
    let output = merge_css(
        "",
        &spec(json!({ ".btn": { "color": "red", "&:hover": { "color": "blue" } } })),
    )
    .unwrap();
    assert_eq!(output, ".btn {\n  color: red;\n}\n\n.btn:hover {\n  color: blue;\n}");
}

#[test]
fn media_queries_wrap_nested_rules() {
    let output = merge_css(
        ".btn {\n  color: red;\n}\n",
        &spec(json!({
            "@media (prefers-color-scheme: dark)": { ":root": { "color-scheme": "dark" } }
        })),
    )
    .unwrap();
    assert_eq!(
        output,
        ".btn {\n  color: red;\n}\n\n@media (prefers-color-scheme: dark) {\n  :root {\n    color-scheme: dark;\n  }\n}"
    );
}

#[test]
fn unrelated_content_keeps_its_formatting() {
    let output = merge_css(
        "/* keep */\n.a{color:red}\n",
        &spec(json!({ ".b": { "color": "blue" } })),
    )
    .unwrap();
    assert_eq!(output, "/* keep */\n.a{color:red}\n\n.b {\n  color: blue;\n}");
}

#[test]
fn imports_go_after_existing_imports() {
    let output = merge_css(
        "@import \"tailwindcss\";\n\n.a {\n  color: red;\n}\n",
        &spec(json!({ "@import \"tw-animate-css\"": {} })),
    )
    .unwrap();
    assert_eq!(
        output,
        "@import \"tailwindcss\";\n@import \"tw-animate-css\";\n\n.a {\n  color: red;\n}"
    );
}

#[test]
fn bodyless_at_rules_are_added_once() {
    let rules = spec(json!({ "@tailwind utilities": {} }));
    let output = merge_css("@tailwind base;\n", &rules).unwrap();
    assert_eq!(output, "@tailwind base;\n\n@tailwind utilities;");
    assert_eq!(merge_css(&output, &rules).unwrap(), output);
}
