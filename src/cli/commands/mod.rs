//! CLI command implementations

pub mod dev;
pub mod stage;

pub use dev::execute as dev;
pub use stage::execute as stage;
