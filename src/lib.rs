pub mod api;
pub mod importer;
