mod billing_world;
mod setups;
mod steps;

pub use billing_world::BillingWorld;
