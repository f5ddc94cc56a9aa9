//! Rate limiting logic and state management.

mod backend;
mod factory;
mod limiter;
mod memory;
mod persistent;
mod verdict;

pub use backend::WindowBackend;
pub use factory::RateLimiterFactory;
pub use limiter::RateLimiter;
pub use memory::InMemoryWindowBackend;
pub use persistent::PersistentWindowBackend;
pub use verdict::Verdict;
