pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod graph;
pub mod logging;
pub mod selection;
pub mod server;
pub mod session;
pub mod view;
