pub mod chunk;
pub mod frame;
pub mod progress;

pub use chunk::*;
pub use frame::*;
pub use progress::*;
