//! Core module - local data and embedding settings

pub mod catalog;
pub mod embedding;
