pub mod config;
pub mod error;
pub mod resource;
pub mod value;

pub use config::{EvaluationConfig, PathsConfig, TenetConfig};
pub use error::*;
pub use resource::*;
pub use value::*;
