//! Scoped symbol table with the predefined global environment.

use crate::ident::{intern, Identifier, Stamp};
use crate::types::{ParamType, Type};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A procedure's locally declared parameters and variables, carried
/// inside its [`Entry::Proc`].
pub type LocalTable = SymbolTable;

/// A symbol table entry.
#[derive(Debug, Clone)]
pub enum Entry {
    Type(Rc<Type>),
    Var {
        ty: Rc<Type>,
        is_ref: bool,
        /// `true` for a parameter (offset is `fp + offset`), `false`
        /// for a local variable (offset is `fp - offset`).
        is_param: bool,
        offset: u32,
    },
    Proc {
        param_types: Vec<ParamType>,
        local_table: Box<LocalTable>,
        argument_area: u32,
        localvar_area: u32,
        outgoing_area: u32,
        is_leaf: bool,
    },
}

impl Entry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entry::Type(_) => "type",
            Entry::Var { .. } => "variable",
            Entry::Proc { .. } => "procedure",
        }
    }
}

/// One lexical scope frame. Frames do not own their enclosing scope
/// (the global scope keeps growing while a procedure's local scope is
/// being built, so a local frame cannot take ownership of a snapshot of
/// it); instead, outward lookup is expressed by chaining [`Scope::lookup`]
/// across a stack of borrowed frames, innermost first.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<Stamp, (Identifier, Entry)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` under `name` in this scope only. Returns `false`
    /// without mutating the scope if `name` already has an entry here
    /// (the existing entry is left untouched).
    pub fn enter(&mut self, name: Identifier, entry: Entry) -> bool {
        if self.entries.contains_key(&name.stamp()) {
            return false;
        }
        self.entries.insert(name.stamp(), (name, entry));
        true
    }

    /// Looks up `name` only in this scope (no outward walk).
    pub fn lookup_local(&self, name: Identifier) -> Option<&Entry> {
        self.entries.get(&name.stamp()).map(|(_, e)| e)
    }

    /// Entries in this scope in stamp order, for deterministic dumps.
    pub fn entries(&self) -> impl Iterator<Item = (Identifier, &Entry)> {
        self.entries.values().map(|(id, e)| (*id, e))
    }

    /// Mutable access to an entry in this scope only, for the variable
    /// allocator to write back frame offsets after the fact.
    pub fn entry_mut(&mut self, name: Identifier) -> Option<&mut Entry> {
        self.entries.get_mut(&name.stamp()).map(|(_, e)| e)
    }

    /// Sets `offset` on a [`Entry::Var`] entry; no-op if `name` isn't a
    /// variable entry in this scope.
    pub fn set_var_offset(&mut self, name: Identifier, new_offset: u32) {
        if let Some(Entry::Var { offset, .. }) = self.entry_mut(name) {
            *offset = new_offset;
        }
    }

    /// Renders this scope (and, recursively, each procedure's own local
    /// scope) in stamp order, for the `--tables` dump.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, level: usize, out: &mut String) {
        let pad = "  ".repeat(level);
        for (name, entry) in self.entries() {
            match entry {
                Entry::Type(ty) => {
                    out.push_str(&format!("{pad}{name}: type = {ty}\n"));
                }
                Entry::Var { ty, is_ref, .. } => {
                    let ref_marker = if *is_ref { "ref " } else { "" };
                    out.push_str(&format!("{pad}{name}: {ref_marker}variable of type {ty}\n"));
                }
                Entry::Proc { local_table, .. } => {
                    out.push_str(&format!("{pad}{name}: procedure\n"));
                    local_table.render_into(level + 1, out);
                }
            }
        }
    }
}

/// A stack of borrowed scope frames, innermost last, used to resolve a
/// name the way nested SPL scopes do: current procedure first, then the
/// global scope.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    frames: &'a [&'a SymbolTable],
}

impl<'a> Scope<'a> {
    pub fn new(frames: &'a [&'a SymbolTable]) -> Self {
        Self { frames }
    }

    /// Looks up `name` starting from the innermost frame outward.
    pub fn lookup(&self, name: Identifier) -> Option<&'a Entry> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.lookup_local(name))
    }
}

/// Builds the global scope with SPL's predefined type and procedures.
pub fn initialize_global_table() -> SymbolTable {
    let mut global = SymbolTable::new();
    global.enter(intern("int"), Entry::Type(Type::int()));

    for proc in predefined_procs() {
        global.enter(proc.0, proc.1);
    }
    global
}

fn predefined_proc(
    name: &str,
    params: &[(&'static str, bool)],
) -> (Identifier, Entry) {
    let mut param_types = Vec::new();
    let mut offset = 0u32;
    for (_, is_ref) in params {
        param_types.push(ParamType {
            ty: Type::int(),
            is_ref: *is_ref,
            offset,
        });
        offset += 4;
    }
    let argument_area = offset;
    (
        intern(name),
        Entry::Proc {
            param_types,
            local_table: Box::new(SymbolTable::new()),
            argument_area,
            localvar_area: 0,
            outgoing_area: 0,
            is_leaf: true,
        },
    )
}

/// The ten predefined procedures, grounded on the original skeleton's
/// `enterPredefinedProcs`.
fn predefined_procs() -> Vec<(Identifier, Entry)> {
    vec![
        predefined_proc("printi", &[("i", false)]),
        predefined_proc("printc", &[("c", false)]),
        predefined_proc("readi", &[("i", true)]),
        predefined_proc("readc", &[("c", true)]),
        predefined_proc("exit", &[]),
        predefined_proc("time", &[("t", true)]),
        predefined_proc("clearAll", &[("c", false)]),
        predefined_proc("setPixel", &[("x", false), ("y", false), ("c", false)]),
        predefined_proc(
            "drawLine",
            &[
                ("x1", false),
                ("y1", false),
                ("x2", false),
                ("y2", false),
                ("c", false),
            ],
        ),
        predefined_proc(
            "drawCircle",
            &[("x", false), ("y", false), ("r", false), ("c", false)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_globals_are_present() {
        let global = initialize_global_table();
        assert!(matches!(
            global.lookup_local(intern("int")),
            Some(Entry::Type(_))
        ));
        assert!(matches!(
            global.lookup_local(intern("printi")),
            Some(Entry::Proc { .. })
        ));
        match global.lookup_local(intern("setPixel")) {
            Some(Entry::Proc {
                param_types,
                argument_area,
                ..
            }) => {
                assert_eq!(param_types.len(), 3);
                assert_eq!(*argument_area, 12);
                assert_eq!(param_types[2].offset, 8);
            }
            _ => panic!("expected setPixel"),
        }
    }

    #[test]
    fn enter_collision_does_not_mutate_existing_entry() {
        let mut table = SymbolTable::new();
        let name = intern("collision_test_var");
        assert!(table.enter(
            name,
            Entry::Var { ty: Type::int(), is_ref: false, is_param: false, offset: 0 }
        ));
        let second = Entry::Var {
            ty: Type::int(),
            is_ref: true,
            is_param: false,
            offset: 99,
        };
        assert!(!table.enter(name, second));
        match table.lookup_local(name) {
            Some(Entry::Var { offset, is_ref, .. }) => {
                assert_eq!(*offset, 0);
                assert!(!is_ref);
            }
            _ => panic!("expected the original entry to survive"),
        }
    }

    #[test]
    fn scope_lookup_walks_outward_through_frames() {
        let mut global = SymbolTable::new();
        let outer_name = intern("outer_scope_var");
        global.enter(
            outer_name,
            Entry::Var {
                ty: Type::int(),
                is_ref: false,
                is_param: false,
                offset: 0,
            },
        );
        let local = SymbolTable::new();
        let frames: Vec<&SymbolTable> = vec![&global, &local];
        let scope = Scope::new(&frames);
        assert!(scope.lookup(outer_name).is_some());
        assert!(local.lookup_local(outer_name).is_none());
    }
}
