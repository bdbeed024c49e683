//! API parameters derived from query variables.
//!
//! # Architecture
//!
//! ```text
//! variable name ──► naming grammar ──► MatchedName ──► Typing
//!                                          │
//!                     defaults decorator ──┼── enumeration resolver
//!                                          ▼
//!                                 ParameterDescriptor
//! ```

mod classifier;
mod descriptor;
mod naming;

pub use classifier::{default_value, describe, Parameters, VariableClassifier};
pub use descriptor::{ParamType, ParameterDescriptor};
pub use naming::{parse_variable_name, MatchedName, Typing, VariableName};
