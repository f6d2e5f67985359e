use std::error::Error;
use std::fmt::{self, Display};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A handle to an entry of an [`Interner`].
///
/// Symbols are only meaningful together with the table that produced them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry(pub String);

impl Display for DuplicateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the symbol table contains `{}` more than once", self.0)
    }
}

impl Error for DuplicateEntry {}

/// An append-only table deduplicating text into [`Symbol`]s.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Interner {
    entries: IndexSet<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the symbol for `text`, creating a new entry if it hasn't been seen yet.
    pub fn add(&mut self, text: &str) -> Symbol {
        if let Some(idx) = self.entries.get_index_of(text) {
            return Symbol(idx as u32);
        }

        let (idx, _) = self.entries.insert_full(text.into());

        Symbol(u32::try_from(idx).expect("the symbol table has overflown"))
    }

    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.entries.get_index_of(text).map(|idx| Symbol(idx as u32))
    }

    /// Returns the text of `sym`.
    ///
    /// Panics if `sym` was produced by a different table.
    pub fn lookup(&self, sym: Symbol) -> &str {
        match self.try_lookup(sym) {
            Some(text) => text,
            None => panic!("the symbol {:?} does not belong to this table", sym),
        }
    }

    pub fn try_lookup(&self, sym: Symbol) -> Option<&str> {
        self.entries.get_index(sym.index()).map(AsRef::as_ref)
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        sym.index() < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, text)| (Symbol(idx as u32), text.as_ref()))
    }
}

impl TryFrom<Vec<String>> for Interner {
    type Error = DuplicateEntry;

    fn try_from(entries: Vec<String>) -> Result<Self, DuplicateEntry> {
        let mut result = Self::new();

        for entry in entries {
            if result.get(&entry).is_some() {
                return Err(DuplicateEntry(entry));
            }

            result.add(&entry);
        }

        Ok(result)
    }
}

impl From<Interner> for Vec<String> {
    fn from(interner: Interner) -> Vec<String> {
        interner.entries.into_iter().map(String::from).collect()
    }
}

macro_rules! well_known {
    ($( $field:ident => $text:literal ),+ $(,)?) => {
        /// Identifiers the analyzer refers to by name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct WellKnown {
            $( pub $field: Symbol, )+
        }

        impl WellKnown {
            fn intern(ids: &mut Interner) -> Self {
                Self {
                    $( $field: ids.add($text), )+
                }
            }
        }
    };
}

well_known! {
    // classes
    object => "Object",
    io => "IO",
    int => "Int",
    bool => "Bool",
    string => "String",
    self_type => "SELF_TYPE",
    main => "Main",

    // sentinels
    no_class => "_no_class",
    prim_slot => "_prim_slot",
    basic_file => "<basic class>",

    // objects
    self_ => "self",
    val => "val",
    str_field => "str_field",
    arg => "arg",
    arg2 => "arg2",

    // methods
    abort => "abort",
    type_name => "type_name",
    copy => "copy",
    out_string => "out_string",
    out_int => "out_int",
    in_string => "in_string",
    in_int => "in_int",
    length => "length",
    concat => "concat",
    substr => "substr",
}

#[derive(Serialize, Deserialize)]
struct RawSymbolTables {
    ids: Interner,
    #[serde(default)]
    strings: Interner,
    #[serde(default)]
    ints: Interner,
}

/// The identifier, string literal, and integer literal tables of a compilation run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(from = "RawSymbolTables", into = "RawSymbolTables")]
pub struct SymbolTables {
    pub ids: Interner,
    pub strings: Interner,
    pub ints: Interner,
    well_known: WellKnown,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::from_parts(Interner::new(), Interner::new(), Interner::new())
    }

    pub fn from_parts(mut ids: Interner, strings: Interner, ints: Interner) -> Self {
        let well_known = WellKnown::intern(&mut ids);

        Self {
            ids,
            strings,
            ints,
            well_known,
        }
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    /// A shorthand for `self.ids.lookup(sym)`.
    pub fn name(&self, sym: Symbol) -> &str {
        self.ids.lookup(sym)
    }
}

impl Default for SymbolTables {
    fn default() -> Self {
        Self::new()
    }
}

impl From<RawSymbolTables> for SymbolTables {
    fn from(RawSymbolTables { ids, strings, ints }: RawSymbolTables) -> Self {
        Self::from_parts(ids, strings, ints)
    }
}

impl From<SymbolTables> for RawSymbolTables {
    fn from(tables: SymbolTables) -> Self {
        Self {
            ids: tables.ids,
            strings: tables.strings,
            ints: tables.ints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_returns_same_symbol() {
        let mut interner = Interner::new();
        let s1 = interner.add("hello");
        let s2 = interner.add("hello");
        let s3 = interner.add("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn lookup_returns_original_text() {
        let mut interner = Interner::new();
        let sym = interner.add("test");

        assert_eq!(interner.lookup(sym), "test");
        assert_eq!(interner.get("test"), Some(sym));
        assert_eq!(interner.get("missing"), None);
    }

    #[test]
    fn foreign_symbol_is_not_found() {
        let mut big = Interner::new();
        big.add("a");
        let b = big.add("b");

        let mut small = Interner::new();
        small.add("a");

        assert!(!small.contains(b));
        assert_eq!(small.try_lookup(b), None);
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let result = Interner::try_from(vec!["x".to_owned(), "y".to_owned(), "x".to_owned()]);

        assert_eq!(result, Err(DuplicateEntry("x".to_owned())));
    }

    #[test]
    fn well_known_symbols_reuse_existing_entries() {
        let mut ids = Interner::new();
        let main = ids.add("Main");
        let foo = ids.add("Foo");

        let tables = SymbolTables::from_parts(ids, Interner::new(), Interner::new());

        assert_eq!(tables.well_known().main, main);
        assert_eq!(tables.ids.lookup(foo), "Foo");
        assert_eq!(tables.name(tables.well_known().object), "Object");
    }

    #[test]
    fn tables_deserialize_from_ron() {
        let tables: SymbolTables =
            ron::from_str(r#"(ids: ["Main", "x"], strings: ["hi"])"#).unwrap();

        assert_eq!(tables.ids.get("x").map(|sym| tables.name(sym)), Some("x"));
        assert_eq!(tables.strings.len(), 1);
        assert!(tables.ints.is_empty());
        assert_eq!(tables.name(tables.well_known().main), "Main");
    }
}
