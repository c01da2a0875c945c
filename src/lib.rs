//! Shelf application library
//!
//! Wires the catalog modules into the kernel registry and drives startup.

pub mod bootstrap;
pub mod modules;

pub use modules::register_all;
