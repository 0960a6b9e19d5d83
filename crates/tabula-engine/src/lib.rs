//! tabula_engine - Formula engine and embedded command language.

pub mod engine;
pub mod script;
