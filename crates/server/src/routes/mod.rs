pub mod analyze;
pub mod root;
