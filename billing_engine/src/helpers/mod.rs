mod audit;
mod periods;

pub use audit::state_hash;
pub use periods::RoyaltyPeriod;
