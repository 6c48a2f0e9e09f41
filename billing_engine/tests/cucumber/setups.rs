use chrono::Duration;
use cucumber::given;

use crate::cucumber::{billing_world::BillingSystem, BillingWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut BillingWorld) {
    let system = BillingSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the accept window is {int} hours")]
async fn accept_window(world: &mut BillingWorld, hours: i64) {
    world.system_mut().set_accept_grace(Duration::hours(hours));
}
