//! Runtime type system: values, type kinds, typed extraction.

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::{FromValue, Value};
