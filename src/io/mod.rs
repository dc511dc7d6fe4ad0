pub mod csv;

pub use csv::{write_history, write_history_file};
