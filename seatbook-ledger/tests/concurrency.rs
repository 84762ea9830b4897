use std::sync::Arc;

use seatbook_core::billing::LineItem;
use seatbook_core::course::NewCourse;
use seatbook_core::repository::{CourseRepository, UserRepository};
use seatbook_core::user::NewUser;
use seatbook_core::SeatError;
use seatbook_ledger::SeatLedger;
use seatbook_store::MemoryStore;

fn course(total: i32) -> NewCourse {
    NewCourse {
        course_name: "B.Tech".into(),
        branch: "Computer Science".into(),
        institute_name: "JEC Jabalpur".into(),
        city: "Jabalpur".into(),
        total_seats: total,
        price_per_seat_cents: 149_999,
    }
}

fn sponsor(n: usize) -> NewUser {
    NewUser {
        full_name: format!("Sponsor {n}"),
        designation: "CSR Lead".into(),
        email: format!("sponsor{n}@acme.com"),
        phone_number: format!("98765{n:05}"),
        company_name: "Acme Corp".into(),
        password_hash: "argon2id$stub".into(),
    }
}

/// N callers racing for fewer seats than they collectively want: exactly
/// enough succeed to exhaust the course, the rest get InsufficientSeats, and
/// nothing is ever oversold.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reserves_never_oversell() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(SeatLedger::new(store.clone(), store.clone()));
    let c = store.insert_course(&course(10)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let ledger = ledger.clone();
        let course_id = c.id;
        handles.push(tokio::spawn(async move {
            ledger.reserve_seats(course_id, 1).await
        }));
    }

    let mut successes = 0;
    let mut refusals = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(SeatError::InsufficientSeats { .. }) => refusals += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(refusals, 15);

    let row = store.get_course(c.id).await.unwrap().unwrap();
    assert_eq!(row.left_seats, 0);
    assert_eq!(row.locked_seats, 10);
    assert!(row.seats_consistent());
}

/// The worked example: a 10-seat course, U1 takes 4, a concurrent U2 asking
/// for 7 is refused and the count stays at 6.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_batch_selections_settle_cleanly() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(SeatLedger::new(store.clone(), store.clone()));
    let c = store.insert_course(&course(10)).await.unwrap();
    let u1 = store.create_user(&sponsor(1)).await.unwrap();
    let u2 = store.create_user(&sponsor(2)).await.unwrap();

    let l1 = ledger.clone();
    let l2 = ledger.clone();
    let (course_a, course_b) = (c.id, c.id);
    let first = tokio::spawn(async move {
        l1.select_courses(u1.id, &[LineItem { course_id: course_a, seats: 4 }])
            .await
    });
    let second = tokio::spawn(async move {
        l2.select_courses(u2.id, &[LineItem { course_id: course_b, seats: 7 }])
            .await
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let won: Vec<i32> = outcomes.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    let lost = outcomes.iter().filter(|r| r.is_err()).count();

    // 4 + 7 > 10, so exactly one of the two batches can land.
    assert_eq!(won.len() + lost, 2);
    assert_eq!(lost, 1);

    let row = store.get_course(c.id).await.unwrap().unwrap();
    assert_eq!(row.left_seats, 10 - won.iter().sum::<i32>());
    assert!(row.seats_consistent());
}

/// Interleaved reserve/release traffic keeps 0 <= left <= total throughout.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn mixed_traffic_respects_bounds() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(SeatLedger::new(store.clone(), store.clone()));
    let c = store.insert_course(&course(16)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let ledger = ledger.clone();
        let course_id = c.id;
        handles.push(tokio::spawn(async move {
            if i % 3 == 0 {
                let _ = ledger.release_seats(course_id, 2).await;
            } else {
                let _ = ledger.reserve_seats(course_id, 3).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let row = store.get_course(c.id).await.unwrap().unwrap();
    assert!(row.left_seats >= 0);
    assert!(row.left_seats <= row.total_seats);
    assert!(row.seats_consistent());
}
