#![allow(
    clippy::cast_possible_truncation, // opcode and sub-operator bytes are packed with `as u8`
    clippy::cast_possible_wrap, // pc arithmetic mixes usize offsets with i32 jump deltas
    clippy::missing_errors_doc, // every fallible function fails only on a malformed stream
    clippy::missing_panics_doc // contract violations are documented where they are not obvious
)]

pub mod bytecode;
pub mod error;
pub mod unit;

pub use bytecode::{Op, instr_len, instr_to_string};
pub use error::{Error, Result};
pub use unit::{Literal, StaticArray, Unit, UnitLookup};
