//! Process exit codes.
//! Layout errors map through `LayoutError::exit_code`; these cover the rest.

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 1; // Anything not classified by the compiler
