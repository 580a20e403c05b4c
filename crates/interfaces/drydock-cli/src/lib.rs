pub mod commands;
pub mod profiles;
