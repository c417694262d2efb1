pub mod chart;
pub mod config;
pub mod gateway;
pub mod grid;
pub mod keymap;
pub mod label;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
