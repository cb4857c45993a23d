//! Class string transformers: semantic color to palette mapping, physical to
//! logical direction mapping and utility prefixing.

pub mod color_mapping;
pub mod prefix;
pub mod rtl;
pub mod token;

pub use color_mapping::{apply_color_mapping, ColorMapping};
pub use prefix::{apply_prefix, is_tailwind_class_string};
pub use rtl::apply_rtl_mapping;
pub use token::{split_class, ClassToken};
