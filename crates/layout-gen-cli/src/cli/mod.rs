pub mod args;
pub mod generate;
