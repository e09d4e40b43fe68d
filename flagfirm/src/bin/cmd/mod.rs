pub mod check_cmd;
pub mod completions_cmd;
pub mod default;
pub mod list_cmd;
