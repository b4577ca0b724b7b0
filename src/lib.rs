pub mod cli;
pub mod codec;
pub mod format;
pub mod gpkg;
pub mod inventory;
pub mod output;
pub mod projection;
