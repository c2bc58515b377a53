//! Symbol table and the intermediate representation the later stages
//! (variable allocator, code generator) operate on.

pub mod symbol_table;

pub use symbol_table::{initialize_global_table, Entry, Scope, SymbolTable};
