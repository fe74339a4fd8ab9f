//! The compiled unit an instruction stream belongs to.
//!
//! Bytecode refers to literal strings and arrays by [`Id`]. Decoding never
//! needs them, but disassembly and literal-key folding resolve ids through
//! [`UnitLookup`].

use std::collections::HashMap;
use std::fmt;

use crate::bytecode::Id;

/// What the bytecode layer needs from a compiled unit.
pub trait UnitLookup {
    fn bytecode(&self) -> &[u8];
    fn lookup_litstr(&self, id: Id) -> Option<&str>;
    fn lookup_array(&self, id: Id) -> Option<&StaticArray>;
}

/// A scalar or array constant stored in a unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(StaticArray),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Double(d) => write!(f, "{d:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Array(arr) => write!(f, "{arr}"),
        }
    }
}

/// An ordered key/value array constant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticArray {
    entries: Vec<(Literal, Literal)>,
}

impl StaticArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A list keyed `0..n`.
    #[must_use]
    pub fn packed(values: impl IntoIterator<Item = Literal>) -> Self {
        let entries = (0..)
            .zip(values)
            .map(|(i, value)| (Literal::Int(i), value))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn with(mut self, key: Literal, value: Literal) -> Self {
        self.entries.push((key, value));
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[(Literal, Literal)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for StaticArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("array(")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}=>{value}")?;
        }
        f.write_str(")")
    }
}

/// An in-memory unit: bytecode plus interned literal tables.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    bytecode: Vec<u8>,
    litstrs: Vec<String>,
    litstr_ids: HashMap<String, Id>,
    arrays: Vec<StaticArray>,
}

impl Unit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bytecode(&mut self, bytecode: Vec<u8>) {
        self.bytecode = bytecode;
    }

    /// Intern `s`, returning the id of the existing entry if present.
    ///
    /// # Panics
    /// If the table outgrows the id space.
    pub fn merge_litstr(&mut self, s: &str) -> Id {
        if let Some(&id) = self.litstr_ids.get(s) {
            return id;
        }
        let id = Id::try_from(self.litstrs.len()).expect("literal string table full");
        self.litstrs.push(s.to_owned());
        self.litstr_ids.insert(s.to_owned(), id);
        id
    }

    /// # Panics
    /// If the table outgrows the id space.
    pub fn merge_array(&mut self, array: StaticArray) -> Id {
        if let Some(pos) = self.arrays.iter().position(|a| *a == array) {
            return Id::try_from(pos).expect("array table full");
        }
        let id = Id::try_from(self.arrays.len()).expect("array table full");
        self.arrays.push(array);
        id
    }
}

impl UnitLookup for Unit {
    fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    fn lookup_litstr(&self, id: Id) -> Option<&str> {
        self.litstrs.get(id as usize).map(String::as_str)
    }

    fn lookup_array(&self, id: Id) -> Option<&StaticArray> {
        self.arrays.get(id as usize)
    }
}
