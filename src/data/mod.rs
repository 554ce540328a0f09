//! The entity types that the save documents are turned into.

pub mod countries;
pub mod provinces;
pub mod rulers;
pub mod titles;
pub mod wars;
