pub mod appointment;
pub mod directory;
pub mod error;
pub mod waitlist;

pub use appointment::*;
pub use directory::*;
pub use error::AppError;
pub use waitlist::*;
