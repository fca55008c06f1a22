pub mod analyze;
pub mod capabilities;
pub mod inspect;

pub use analyze::*;
pub use capabilities::*;
pub use inspect::*;
