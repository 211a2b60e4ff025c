pub mod browser;
pub mod config;
pub mod connection;
pub mod pager;
pub mod result_table;
pub mod session;
pub mod sql_generator;
