//! Classifies PDB entries by how their B-factors were refined and writes the
//! corresponding BDB (B-factor databank) entries.

pub mod common;
pub mod domain;
pub mod modules;
pub mod parser;
