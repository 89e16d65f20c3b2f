pub mod entries;
pub mod import;

pub use entries::{EntriesCommands, handle_entries_command};
pub use import::{ImportCommands, handle_import_command};
