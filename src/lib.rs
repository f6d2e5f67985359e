pub mod analysis;
pub mod ast;
pub mod errors;
pub mod intern;
pub mod position;
