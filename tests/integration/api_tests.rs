//! API integration tests
//!
//! These run against a live server with the seed migrations applied:
//! member 1 = admin, 2 = librarian, 3 = free-tier member, 4 = premium member.

use reqwest::Client;
use serde_json::{json, Value};

use bookflix_server::models::member::{MemberClaims, Role};

const BASE_URL: &str = "http://localhost:8080/api/v1";

const ADMIN_ID: i32 = 1;
const LIBRARIAN_ID: i32 = 2;
const FREE_MEMBER_ID: i32 = 3;
const PREMIUM_MEMBER_ID: i32 = 4;

fn token_for(member_id: i32, role: Role) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64;

    let claims = MemberClaims {
        sub: format!("member-{}", member_id),
        member_id,
        role,
        exp: now + 3600,
        iat: now,
    };

    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    claims.create_token(&secret).expect("failed to sign token")
}

/// Create a book with the given stock and return its id
async fn create_book(client: &Client, title: &str, copies: i64) -> i32 {
    let token = token_for(LIBRARIAN_ID, Role::Librarian);
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "initial_copies": copies
        }))
        .send()
        .await
        .expect("Failed to create book");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID") as i32
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = token_for(FREE_MEMBER_ID, Role::Member);

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let book_id = create_book(&client, "Borrow Flow Book", 2).await;
    let token = token_for(PREMIUM_MEMBER_ID, Role::Member);

    // Borrow
    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to borrow");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = body["id"].as_i64().expect("No borrowing ID");
    assert_eq!(body["status"], "active");
    assert_eq!(body["renewal_count"], 0);

    // A second borrow of the same title is a duplicate loan
    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Renew twice, then hit the cap
    for expected in 1..=2 {
        let response = client
            .post(format!("{}/borrowings/{}/renew", BASE_URL, borrowing_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to renew");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["renewal_count"], expected);
    }

    let response = client
        .post(format!("{}/borrowings/{}/renew", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Return
    let response = client
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to return");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");

    // Returning again conflicts
    let response = client
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_free_tier_borrow_limit() {
    let client = Client::new();
    let book_a = create_book(&client, "Free Tier Book A", 1).await;
    let book_b = create_book(&client, "Free Tier Book B", 1).await;
    let token = token_for(FREE_MEMBER_ID, Role::Member);

    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_a }))
        .send()
        .await
        .expect("Failed to borrow");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse response");

    // Second concurrent loan exceeds the free-tier cap
    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_b }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("1"));

    // Cleanup
    let response = client
        .post(format!(
            "{}/borrowings/{}/return",
            BASE_URL,
            borrowing["id"].as_i64().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to return");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_reservation_queue_flow() {
    let client = Client::new();
    let librarian = token_for(LIBRARIAN_ID, Role::Librarian);
    let premium = token_for(PREMIUM_MEMBER_ID, Role::Member);
    let free = token_for(FREE_MEMBER_ID, Role::Member);

    let book_id = create_book(&client, "Queue Flow Book", 1).await;

    // Reserving while a copy is available is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", premium))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // The free member takes the only copy
    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", free))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to borrow");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse response");

    // Now the premium member queues up at position 1
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", premium))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to reserve");
    assert_eq!(response.status(), 201);
    let reservation: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(reservation["status"], "pending");
    assert_eq!(reservation["queue_position"], 1);
    let reservation_id = reservation["id"].as_i64().unwrap();

    // Reserving again is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", premium))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Marking ready before any copy frees up fails
    let response = client
        .post(format!("{}/reservations/{}/ready", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return the copy, promote the hold, complete it
    let response = client
        .post(format!(
            "{}/borrowings/{}/return",
            BASE_URL,
            borrowing["id"].as_i64().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", free))
        .send()
        .await
        .expect("Failed to return");
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/reservations/{}/ready", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to mark ready");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
    assert!(body["pickup_expiry_date"].is_string());

    let response = client
        .post(format!("{}/reservations/{}/complete", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to complete");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "active");

    // Completed reservations cannot be cancelled
    let response = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", premium))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup
    let body: Value = client
        .get(format!("{}/members/{}/borrowings", BASE_URL, PREMIUM_MEMBER_ID))
        .header("Authorization", format!("Bearer {}", premium))
        .send()
        .await
        .expect("Failed to list borrowings")
        .json()
        .await
        .expect("Failed to parse response");
    for loan in body.as_array().unwrap() {
        if loan["book_id"].as_i64() == Some(book_id as i64) {
            let _ = client
                .post(format!("{}/borrowings/{}/return", BASE_URL, loan["id"].as_i64().unwrap()))
                .header("Authorization", format!("Bearer {}", premium))
                .send()
                .await;
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_stock_level_guard() {
    let client = Client::new();
    let librarian = token_for(LIBRARIAN_ID, Role::Librarian);
    let free = token_for(FREE_MEMBER_ID, Role::Member);

    let book_id = create_book(&client, "Stock Guard Book", 1).await;

    // Borrow the only copy
    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", free))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to borrow");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse response");

    // Shrinking below the lent stock fails
    let response = client
        .put(format!("{}/books/{}/stock", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .json(&json!({ "target": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Growing works
    let response = client
        .put(format!("{}/books/{}/stock", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .json(&json!({ "target": 3 }))
        .send()
        .await
        .expect("Failed to grow stock");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_copies"], 3);
    assert_eq!(body["available_copies"], 2);

    // Cleanup
    let _ = client
        .post(format!(
            "{}/borrowings/{}/return",
            BASE_URL,
            borrowing["id"].as_i64().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", free))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_sweeps_require_staff() {
    let client = Client::new();
    let free = token_for(FREE_MEMBER_ID, Role::Member);

    let response = client
        .post(format!("{}/sweeps/fines", BASE_URL))
        .header("Authorization", format!("Bearer {}", free))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_sweeps_report_counts() {
    let client = Client::new();
    let librarian = token_for(LIBRARIAN_ID, Role::Librarian);

    let response = client
        .post(format!("{}/sweeps/fines", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to run fine sweep");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["swept"].is_number());
    assert!(body["errors"].is_number());

    let response = client
        .post(format!("{}/sweeps/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to run expiry sweep");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["swept"].is_number());
    assert!(body["expired"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_read_others_records() {
    let client = Client::new();
    let free = token_for(FREE_MEMBER_ID, Role::Member);

    let response = client
        .get(format!("{}/members/{}/fines", BASE_URL, PREMIUM_MEMBER_ID))
        .header("Authorization", format!("Bearer {}", free))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}
