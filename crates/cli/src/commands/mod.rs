pub mod check;
pub mod config_cmd;
pub mod generate;
