pub mod availability;
pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod policy;
pub mod sweep;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::LifecycleService;
pub use policy::CancellationPolicyService;
pub use sweep::SweepService;
