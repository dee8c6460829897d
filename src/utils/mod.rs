pub mod format;
pub mod process;
