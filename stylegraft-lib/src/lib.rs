//! Tailwind class string transformers and a CSS merge engine for installing
//! component styles into an existing project.

pub mod classes;
pub mod config;
pub mod error;
pub mod installer;
pub mod parser;
pub mod source;
pub mod style;

pub use config::{ProjectConfig, TailwindConfig, TailwindVersion};
pub use error::{GraftError, GraftResult};
pub use style::merge::merge_css;
pub use style::spec::{CssRuleSpec, CssVarsSpec, RegistryItem, TailwindConfigSpec};
pub use style::vars::{merge_css_vars, CssVarsOptions};
