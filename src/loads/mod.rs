//! Load types and their time dependence

mod load;
mod time_function;

pub use load::{Load, LoadKind};
pub use time_function::TimeFunction;
