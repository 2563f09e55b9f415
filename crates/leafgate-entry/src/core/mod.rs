//! Parsing of signing material, done before any content is touched.

mod loader;

pub use self::loader::SigningMaterial;
