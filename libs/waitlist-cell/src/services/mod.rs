pub mod matcher;

pub use matcher::WaitlistMatcher;
