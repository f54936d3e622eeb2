//! Loading the source API description into an immutable [`SchemaTable`].

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
