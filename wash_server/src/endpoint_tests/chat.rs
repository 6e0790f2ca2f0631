use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use wash_engine::{
    db_types::Role,
    events::EventProducers,
    reservation_objects::NotificationFeed,
    MessagingApi,
    MessagingError,
};

use super::{
    helpers::{get_request, issue_token, post_request, put_request},
    mocks::{sample_message, sample_notification, MockMessagingDb},
};
use crate::chat_routes::{
    MarkAllNotificationsReadRoute,
    MarkNotificationReadRoute,
    NotificationsRoute,
    SendMessageRoute,
};

#[actix_web::test]
async fn sending_a_message_persists_it() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockMessagingDb::new();
        db.expect_insert_message()
            .withf(|m| m.sender_id == 42 && m.receiver_id == 7 && m.content == "On my way")
            .returning(|m| Ok(sample_message(1, m.sender_id, m.receiver_id, &m.content)));
        let api = MessagingApi::new(db, EventProducers::default());
        cfg.service(SendMessageRoute::<MockMessagingDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let (status, body) =
        post_request(&token, "/chat/7", json!({"content": "On my way"}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let message: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(message["sender_id"], 42);
    assert_eq!(message["receiver_id"], 7);
    assert_eq!(message["read"], false);
}

#[actix_web::test]
async fn messages_to_unknown_users_are_not_found() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockMessagingDb::new();
        db.expect_insert_message().returning(|m| Err(MessagingError::UserNotFound(m.receiver_id)));
        let api = MessagingApi::new(db, EventProducers::default());
        cfg.service(SendMessageRoute::<MockMessagingDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let err = post_request(&token, "/chat/404", json!({"content": "hello?"}), configure).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. The requested user 404 does not exist");
}

#[actix_web::test]
async fn notification_feed_carries_the_unread_count() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockMessagingDb::new();
        db.expect_fetch_notifications().withf(|user| *user == 42).returning(|user| {
            Ok(NotificationFeed { unread: 1, notifications: vec![sample_notification(1, user)] })
        });
        let api = MessagingApi::new(db, EventProducers::default());
        cfg.service(NotificationsRoute::<MockMessagingDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let (status, body) = get_request(&token, "/notifications", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let feed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(feed["unread"], 1);
    assert_eq!(feed["notifications"][0]["kind"], "job_completed");
}

#[actix_web::test]
async fn read_state_flips_are_owner_guarded() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockMessagingDb::new();
        // The guard lives in the UPDATE: a foreign notification comes back as not-found.
        db.expect_mark_notification_read()
            .withf(|id, user| *id == 9 && *user == 42)
            .returning(|id, _| Err(MessagingError::NotificationNotFound(id)));
        let api = MessagingApi::new(db, EventProducers::default());
        cfg.service(MarkNotificationReadRoute::<MockMessagingDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let err = put_request(&token, "/notifications/9/read", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. The requested notification 9 does not exist for this user");
}

#[actix_web::test]
async fn read_all_reports_the_flip_count() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockMessagingDb::new();
        db.expect_mark_all_notifications_read().withf(|user| *user == 42).returning(|_| Ok(3));
        let api = MessagingApi::new(db, EventProducers::default());
        cfg.service(MarkAllNotificationsReadRoute::<MockMessagingDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let (status, body) = put_request(&token, "/notifications/read-all", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["message"], "3 notifications marked as read");
}
