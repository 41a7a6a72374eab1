//! Domain models for the harvest planner

mod catalog;
mod field;
mod harvest;
mod product;

pub use catalog::*;
pub use field::*;
pub use harvest::*;
pub use product::*;
