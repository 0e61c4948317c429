pub mod assembler;
pub mod payload;
