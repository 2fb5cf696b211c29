//! Game definitions and the driver that runs them.

pub mod definition;
pub mod driver;

pub use definition::{DefinitionSource, GameDefinition};
pub use driver::{Game, GameReport, GameResult};
