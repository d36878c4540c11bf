//! Rate limiting implementation.

pub mod bucket;
pub mod limiter;
pub mod window;

pub use bucket::Bucket;
pub use limiter::RateLimiter;
pub use window::WindowCounter;
