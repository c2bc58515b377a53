//! Stages 3 and 4b: symbol table construction and body type-checking.

pub mod bodycheck;
pub mod tablebuild;

pub use bodycheck::check_bodies;
pub use tablebuild::build_table;
