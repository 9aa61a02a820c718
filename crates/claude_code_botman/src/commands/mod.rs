pub mod command;
pub mod flags;
pub mod options;
pub mod print;
