pub mod add;
pub mod clean;
pub mod config;
pub mod context;
pub mod exclude;
pub mod ls_files;
pub mod push;
pub mod remove;
pub mod setup;
pub mod status;

use crate::output;

pub fn print_success(message: &str) {
    output::success(message);
}

pub fn print_info(message: &str) {
    output::info(message);
}

pub fn print_warning(message: &str) {
    output::warning(message);
}
