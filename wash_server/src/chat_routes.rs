//! Chat and notification routes. Any authenticated user may use these; ownership is enforced by
//! the receiver/owner guards in the messaging layer.
use actix_web::{web, HttpResponse};
use wash_engine::{MessagingApi, MessagingDatabase};

use crate::{
    auth::JwtClaims,
    data_objects::{JsonResponse, SendMessageRequest},
    errors::ServerError,
    route,
};

route!(conversations => Get "/chat/conversations" impl MessagingDatabase);
pub async fn conversations<B: MessagingDatabase>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversations = api.conversations(claims.sub).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

route!(conversation => Get "/chat/{user_id}" impl MessagingDatabase);
/// The full conversation with one partner. Fetching it marks the partner's unread messages to
/// the caller as read (the batch flip).
pub async fn conversation<B: MessagingDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let partner_id = path.into_inner();
    let messages = api.conversation(claims.sub, partner_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

route!(send_message => Post "/chat/{user_id}" impl MessagingDatabase);
/// Persist a direct message, then push it to the recipient's room and echo it to the sender.
pub async fn send_message<B: MessagingDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<SendMessageRequest>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let receiver_id = path.into_inner();
    let message = api.send_message(claims.sub, claims.role, receiver_id, body.into_inner().content).await?;
    Ok(HttpResponse::Ok().json(message))
}

route!(mark_message_read => Put "/chat/{message_id}/read" impl MessagingDatabase);
pub async fn mark_message_read<B: MessagingDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let message_id = path.into_inner();
    let message = api.mark_message_read(message_id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(message))
}

route!(notifications => Get "/notifications" impl MessagingDatabase);
pub async fn notifications<B: MessagingDatabase>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let feed = api.notifications(claims.sub).await?;
    Ok(HttpResponse::Ok().json(feed))
}

route!(mark_notification_read => Put "/notifications/{id}/read" impl MessagingDatabase);
pub async fn mark_notification_read<B: MessagingDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let notification = api.mark_notification_read(id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(notification))
}

route!(mark_all_notifications_read => Put "/notifications/read-all" impl MessagingDatabase);
pub async fn mark_all_notifications_read<B: MessagingDatabase>(
    claims: JwtClaims,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let flipped = api.mark_all_notifications_read(claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{flipped} notifications marked as read"))))
}

route!(delete_notification => Delete "/notifications/{id}" impl MessagingDatabase);
pub async fn delete_notification<B: MessagingDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_notification(id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Notification deleted")))
}
