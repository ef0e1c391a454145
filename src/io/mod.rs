pub mod config_io;
pub mod lock;
pub mod log_io;
pub mod watcher;
