extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use stylegraft_lib::{merge_css, merge_css_vars, CssRuleSpec, CssVarsOptions, CssVarsSpec, ProjectConfig, TailwindVersion};

fn bench_large_stylesheet(c: &mut Criterion) {
    let mut big_css = String::with_capacity(4_000_000);
    big_css.push_str("@import \"tailwindcss\";\n");
    for i in 0..20_000 {
        big_css.push_str(&format!(".c-{} {{\n  color: red;\n  margin: {}px;\n}}\n", i, i % 16));
    }

    let Value::Object(spec) = json!({
        ".c-19999": { "color": "blue" },
        "@utility scrollbar-none": { "scrollbar-width": "none" }
    }) else {
        unreachable!()
    };
    let spec: CssRuleSpec = spec;

    c.bench_function("merge_large_stylesheet", |b| {
        b.iter(|| merge_css(&big_css, &spec).unwrap())
    });
}

fn bench_css_vars(c: &mut Criterion) {
    let mut vars = CssVarsSpec::default();
    for i in 0..500 {
        vars.light.insert(format!("token-{}", i), "0 0% 100%".to_string());
        vars.dark.insert(format!("token-{}", i), "0 0% 3.9%".to_string());
    }
    let config = ProjectConfig {
        tailwind_version: TailwindVersion::V4,
        ..ProjectConfig::default()
    };
    let options = CssVarsOptions::default();

    c.bench_function("merge_css_vars_v4", |b| {
        b.iter(|| merge_css_vars("@import \"tailwindcss\";\n", &vars, &config, &options).unwrap())
    });
}

criterion_group!(benches, bench_large_stylesheet, bench_css_vars);
criterion_main!(benches);
