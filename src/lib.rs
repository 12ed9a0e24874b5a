pub mod api;
pub mod config;
pub mod core_types;
pub mod ensemble;
pub mod error;
pub mod optimizer;
pub mod scorer;
// cmd and reports are modules of the binary crate (main).
