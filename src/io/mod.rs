pub mod config_io;
pub mod doc_io;
pub mod session_io;
