pub mod cockpit;
pub mod config;
pub mod document;
pub mod line;
pub mod record;

pub use cockpit::*;
pub use config::*;
pub use document::*;
pub use line::*;
pub use record::*;
