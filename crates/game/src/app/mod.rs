pub(crate) mod bootstrap;
pub(crate) mod config;
pub(crate) mod level;
pub(crate) mod loop_runner;
