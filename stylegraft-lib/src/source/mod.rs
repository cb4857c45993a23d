//! Rewriting the class strings of component source files.

pub mod rewrite;
pub mod transform;

pub use oxc_span::SourceType;
pub use rewrite::{rewrite_source, rewrite_source_with_scope, RewriteScope};
pub use transform::{
    has_class_transforms, transform_class_string, transform_color_mapping, transform_prefix,
    transform_rtl,
};
