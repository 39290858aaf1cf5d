use chrono::{Duration, TimeZone, Utc};
use cucumber::given;
use fine_payment_engine::db_types::NewFine;
use fpg_common::Tiyin;

use crate::cucumber::{fine_world::FinePaymentSystem, FineWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut FineWorld) {
    let system = FinePaymentSystem::new().await;
    world.system = Some(system);
    // Stored times have millisecond resolution, so the clock does too.
    world.now = Utc.timestamp_millis_opt(Utc::now().timestamp_millis()).single();
}

#[given(expr = "fine {word} for {int} tiyin, issued {int} days ago")]
async fn fine_without_discount(world: &mut FineWorld, id: String, amount: i64, days: i64) {
    let issued_at = world.now() - Duration::days(days);
    let fine = NewFine::new(id, Tiyin::from(amount), issued_at);
    world.api().db().insert_fine(fine).await.expect("Error inserting fine");
}

#[given(expr = "fine {word} for {int} tiyin, or {int} tiyin within the discount window, issued {int} days ago")]
async fn fine_with_discount(world: &mut FineWorld, id: String, amount: i64, discounted: i64, days: i64) {
    let issued_at = world.now() - Duration::days(days);
    let fine = NewFine::new(id, Tiyin::from(amount), issued_at).with_discounted_amount(Tiyin::from(discounted));
    world.api().db().insert_fine(fine).await.expect("Error inserting fine");
}
