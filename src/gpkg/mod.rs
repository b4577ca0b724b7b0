pub mod algo;
pub mod processing;
pub mod stats;
pub mod store;
pub mod types;

pub use self::algo::*;
pub use self::processing::*;
pub use self::stats::*;
pub use self::store::*;
pub use self::types::*;
