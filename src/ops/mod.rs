pub mod actions;
pub mod check;
pub mod derive;
pub mod ids;
pub mod mutate;

pub use actions::{Anchor, Applied};
pub use derive::{DeriveOptions, cockpit, derive};
pub use mutate::Refusal;
