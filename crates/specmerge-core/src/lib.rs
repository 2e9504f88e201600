pub mod archive;
pub mod config;
pub mod delta;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod parser;
pub mod paths;
pub mod project;
pub mod serializer;
pub mod syntax;
pub mod types;
pub mod validator;

pub use delta::parse_delta;
pub use error::{Result, SpecError};
pub use merge::apply_delta;
pub use parser::parse;
pub use serializer::serialize;
pub use validator::{validate_spec, validate_spec_set};
