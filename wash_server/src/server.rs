use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use cardgate::{CardProcessor, GatewayClient, MockGateway, SIGNATURE_HEADER};
use log::*;
use wash_engine::{
    events::{EventHandlers, EventHooks, LocationEvent, MessageEvent, NotificationEvent},
    MessagingApi,
    PaymentsApi,
    ReservationFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenVerifier,
    chat_routes::{
        ConversationRoute,
        ConversationsRoute,
        DeleteNotificationRoute,
        MarkAllNotificationsReadRoute,
        MarkMessageReadRoute,
        MarkNotificationReadRoute,
        NotificationsRoute,
        SendMessageRoute,
    },
    config::ServerConfig,
    errors::ServerError,
    gateway::{job_room, user_room, ws_handshake, MulticastRegistry, ServerFrame},
    job_routes::{
        AcceptJobRoute,
        AvailableJobsRoute,
        CompleteJobRoute,
        MyJobsRoute,
        SetAvailabilityRoute,
        StartJobRoute,
        UpdateEtaRoute,
    },
    middleware::{HmacMiddlewareFactory, JwtAuthMiddlewareFactory},
    payment_routes::{ConfirmPaymentRoute, CreateIntentRoute, NewCashPaymentRoute, PaymentWebhookRoute, RefundPaymentRoute},
    routes::{
        health,
        AssignReservationRoute,
        CancelReservationRoute,
        MyReservationsRoute,
        NewReservationRoute,
        RateReservationRoute,
        ReservationByIdRoute,
        UpdateReservationRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // The multicast registry and the event pipeline feeding it live for the whole server, not
    // per worker. Everything the workers construct clones into them.
    let registry = Arc::new(MulticastRegistry::new());
    let handlers = EventHandlers::new(128, forward_events_to(Arc::clone(&registry)));
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());

    let processor: Arc<dyn CardProcessor> = if config.gateway.is_configured() {
        let client =
            GatewayClient::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Arc::new(client)
    } else {
        warn!("💳️ No card gateway credentials configured. Payments run against the deterministic mock.");
        Arc::new(MockGateway::new())
    };

    let verifier = TokenVerifier::new(&config.auth);
    let webhook_secret = config.gateway.webhook_secret.clone();
    // With no webhook secret configured there is no signature to verify; callbacks are still
    // acknowledged benignly instead of being rejected, so a retrying gateway backs off.
    let webhook_checks = config.webhook_checks && !webhook_secret.is_empty();
    if config.webhook_checks && webhook_secret.is_empty() {
        warn!("🚨️ No webhook secret is configured. Callback signatures will NOT be verified.");
    }

    let srv = HttpServer::new(move || {
        let reservations_api = ReservationFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentsApi::new(db.clone(), Arc::clone(&processor));
        let messaging_api = MessagingApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("wash::access_log"))
            .app_data(web::Data::new(reservations_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(messaging_api))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::from(Arc::clone(&registry)));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtAuthMiddlewareFactory::new(verifier.clone()))
            .service(NewReservationRoute::<SqliteDatabase>::new())
            .service(MyReservationsRoute::<SqliteDatabase>::new())
            .service(ReservationByIdRoute::<SqliteDatabase>::new())
            .service(UpdateReservationRoute::<SqliteDatabase>::new())
            .service(CancelReservationRoute::<SqliteDatabase>::new())
            .service(AssignReservationRoute::<SqliteDatabase>::new())
            .service(RateReservationRoute::<SqliteDatabase>::new())
            .service(AvailableJobsRoute::<SqliteDatabase>::new())
            .service(MyJobsRoute::<SqliteDatabase>::new())
            .service(AcceptJobRoute::<SqliteDatabase>::new())
            .service(StartJobRoute::<SqliteDatabase>::new())
            .service(CompleteJobRoute::<SqliteDatabase>::new())
            .service(UpdateEtaRoute::<SqliteDatabase>::new())
            .service(SetAvailabilityRoute::<SqliteDatabase>::new())
            .service(NewCashPaymentRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(CreateIntentRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(RefundPaymentRoute::<SqliteDatabase>::new())
            .service(ConversationsRoute::<SqliteDatabase>::new())
            .service(ConversationRoute::<SqliteDatabase>::new())
            .service(SendMessageRoute::<SqliteDatabase>::new())
            .service(MarkMessageReadRoute::<SqliteDatabase>::new())
            .service(NotificationsRoute::<SqliteDatabase>::new())
            .service(MarkAllNotificationsReadRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(DeleteNotificationRoute::<SqliteDatabase>::new());
        // The gateway callback endpoint sees the raw body and its signature before any parsing.
        let webhook_scope = web::scope("/payments")
            .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, webhook_secret.clone(), webhook_checks))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(webhook_scope)
            .route("/ws", web::get().to(ws_handshake::<SqliteDatabase>))
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Wire the engine's event hooks into the multicast registry: notifications go to the user's
/// private room, chat messages to the recipient's room with an echo to the sender, location
/// pings to the job room. Every database write has already committed by the time these run.
fn forward_events_to(registry: Arc<MulticastRegistry>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let reg = Arc::clone(&registry);
    hooks.on_notification(move |ev: NotificationEvent| {
        let reg = Arc::clone(&reg);
        Box::pin(async move {
            let room = user_room(ev.notification.user_id);
            let delivered = reg.broadcast(&room, &ServerFrame::Notification { notification: ev.notification }).await;
            trace!("📡️ Notification delivered to {delivered} live connections in {room}");
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let reg = Arc::clone(&registry);
    hooks.on_message(move |ev: MessageEvent| {
        let reg = Arc::clone(&reg);
        Box::pin(async move {
            let frame = ServerFrame::NewMessage { message: ev.message.clone() };
            reg.broadcast(&user_room(ev.message.receiver_id), &frame).await;
            // Echo to the sender so their UI can confirm the send.
            reg.broadcast(&user_room(ev.message.sender_id), &frame).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let reg = registry;
    hooks.on_location(move |ev: LocationEvent| {
        let reg = Arc::clone(&reg);
        Box::pin(async move {
            let frame = ServerFrame::Location {
                reservation_id: ev.reservation_id,
                washer_id: ev.washer_id,
                eta: ev.eta,
                latitude: ev.latitude,
                longitude: ev.longitude,
            };
            reg.broadcast(&job_room(ev.reservation_id), &frame).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}
