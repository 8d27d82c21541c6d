pub mod file_utils;
pub mod float_ext;
pub mod log_setup;
