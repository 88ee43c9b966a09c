//! Emission backends, one per supported language.

mod c;
mod python;
mod rust;

pub use c::CTarget;
pub use python::PythonTarget;
pub use rust::RustTarget;

use crate::emit::{EmitError, Target};

/// All backends, in canonical emission order.
pub fn all() -> Vec<Box<dyn Target>> {
    vec![
        Box::new(RustTarget),
        Box::new(PythonTarget),
        Box::new(CTarget),
    ]
}

/// Resolve a command-line target name.
pub fn by_name(name: &str) -> Result<Box<dyn Target>, EmitError> {
    match name {
        "rust" => Ok(Box::new(RustTarget)),
        "python" => Ok(Box::new(PythonTarget)),
        "c" => Ok(Box::new(CTarget)),
        other => Err(EmitError::UnknownTarget {
            name: other.to_string(),
        }),
    }
}
