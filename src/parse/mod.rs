//! Parser for the save file format.

pub mod pdxfile;
