//! Regional statistics dashboard backend: CPI, population and agriculture
//! collections stored as flat JSON files, filled by manual entry or
//! spreadsheet import, and served over a small REST API.

pub mod cli;
pub mod config;
pub mod data;
pub mod server;
