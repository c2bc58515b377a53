//! Process-wide identifier interning.
//!
//! Every occurrence of the same source identifier resolves to the same
//! [`Identifier`] handle, so symbol table lookups can compare integer
//! stamps instead of strings.

use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// The unique, monotonically increasing identity of an interned identifier.
///
/// Used as the key type for symbol table scope frames.
pub type Stamp = u32;

/// An interned identifier: its source text plus a process-wide unique stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    stamp: Stamp,
}

impl Identifier {
    /// Returns this identifier's stamp.
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Returns the interned source text for this identifier.
    pub fn name(&self) -> SmolStr {
        Interner::with(|interner| interner.name_of(self.stamp))
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

struct Interner {
    by_text: HashMap<SmolStr, Stamp>,
    by_stamp: Vec<SmolStr>,
}

impl Interner {
    fn new() -> Self {
        Self {
            by_text: HashMap::new(),
            by_stamp: Vec::new(),
        }
    }

    fn intern(&mut self, text: &str) -> Stamp {
        if let Some(&stamp) = self.by_text.get(text) {
            return stamp;
        }
        let stamp = self.by_stamp.len() as Stamp;
        let text: SmolStr = SmolStr::new(text);
        self.by_stamp.push(text.clone());
        self.by_text.insert(text, stamp);
        stamp
    }

    fn name_of(&self, stamp: Stamp) -> SmolStr {
        self.by_stamp[stamp as usize].clone()
    }

    fn global() -> &'static Mutex<Interner> {
        static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();
        INTERNER.get_or_init(|| Mutex::new(Interner::new()))
    }

    fn with<R>(f: impl FnOnce(&Interner) -> R) -> R {
        let guard = Self::global().lock().expect("interner lock poisoned");
        f(&guard)
    }
}

/// Interns `text`, returning the [`Identifier`] for it.
///
/// Calling this twice with equal strings always returns identifiers with
/// equal stamps.
pub fn intern(text: &str) -> Identifier {
    let mut guard = Interner::global().lock().expect("interner lock poisoned");
    let stamp = guard.intern(text);
    Identifier { stamp }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_yields_same_stamp() {
        let a = intern("foo");
        let b = intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.stamp(), b.stamp());
    }

    #[test]
    fn interning_different_text_yields_different_stamps() {
        let a = intern("alpha_unique_1");
        let b = intern("beta_unique_1");
        assert_ne!(a.stamp(), b.stamp());
    }

    #[test]
    fn name_round_trips() {
        let id = intern("roundtrip_ident");
        assert_eq!(id.name(), "roundtrip_ident");
        assert_eq!(id.to_string(), "roundtrip_ident");
    }
}
