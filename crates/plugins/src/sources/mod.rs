//! Source implementations
//!
//! Contains GeneratorSource and FileSource.

mod file;
mod generator;

pub use self::file::FileSource;
pub use self::generator::GeneratorSource;
