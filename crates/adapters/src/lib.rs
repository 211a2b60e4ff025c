pub mod dsn;
pub mod mysql;
