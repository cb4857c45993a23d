pub mod merge;
pub mod printer;
pub mod spec;
pub mod stylesheet;
pub mod vars;
