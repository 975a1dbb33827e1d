pub mod catalog;
pub mod stem;
