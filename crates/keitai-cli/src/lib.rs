pub mod commands;
pub mod format;
pub mod trace_init;
