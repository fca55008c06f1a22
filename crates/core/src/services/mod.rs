pub mod analysis;
pub mod backends;
pub mod insight;
pub mod responses;
