//! Canonical vocabulary shared by the loader, the name resolution engine and every target renderer.
//!
//! ## See also
//! - [`special`]: special (primitive) type kinds
//! - [`casts`]: numeric conversion policy table
//! - [`keywords`]: reserved words per target language
//! - [`annotations`]: well-known annotation class names
//! - [`extensions`]: compiler-extension marker, entry point and accessor vocabulary

pub mod annotations;
pub mod casts;
pub mod extensions;
pub mod keywords;
pub mod special;
pub mod targets;
