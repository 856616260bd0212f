pub mod entry;
pub mod export;
pub mod import;
pub mod record;
pub mod store;
