//! Convert OpenAPI / JSON-Schema type definitions into compact, deterministic
//! type descriptors for build-time C++ code generation.
//!
//! Pipeline: [`load`] (URL or file → [`ir::SchemaRegistry`]) →
//! [`descriptor::convert`] per schema → [`codegen::Codegen`] (table or chain).
pub mod cli;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod ir;
pub mod load;
pub mod lower;
pub mod path_de;
pub mod pipeline;

pub use config::GeneratorConfig;
pub use descriptor::{convert, Descriptor};
pub use error::{Error, Result};
pub use ir::{SchemaNode, SchemaRegistry};
