//! Container commands: the first token names a subcommand and both the
//! filter and the parser dispatch on it.

pub(crate) mod acl;
pub(crate) mod client;
pub(crate) mod config;
pub(crate) mod function;
pub(crate) mod hotkeys;
pub(crate) mod tfunction;
pub(crate) mod xgroup;
pub(crate) mod xinfo;
