pub mod document;
pub mod grouping;
