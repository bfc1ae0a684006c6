//! Output parsers and small helpers shared by the core modules.

pub(crate) mod parse;
