pub mod cli;
pub mod commands;
pub mod config;
pub mod config_tool;
pub mod ctl;
pub mod dispatch;
pub mod extensions;
pub mod filter;
pub mod graceful;
pub mod paths;
pub mod pid;
pub mod registry;
pub mod runner;
pub mod services;
pub mod supervisor;
pub mod sys;
pub mod tail;
pub mod teardown;

#[cfg(test)]
mod testing;
