//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current
//! thread will stop that worker from serving other requests. Database work is always awaited, so
//! handlers here never block.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use wash_engine::{
    db_types::{NewReservation, Role},
    reservation_objects::EditReservationRequest,
    ReservationDatabase,
    ReservationFlowApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{AssignRequest, NewReservationRequest, RatingRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// -------------------------------------------   Reservations  -------------------------------------------------

route!(new_reservation => Post "/reservations" impl ReservationDatabase where requires [Role::Customer]);
/// Book a new wash. The reservation starts `Pending` and unassigned, with the service price
/// snapshotted into its total.
pub async fn new_reservation<B: ReservationDatabase>(
    claims: JwtClaims,
    body: web::Json<NewReservationRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let mut booking = NewReservation::new(claims.sub, req.vehicle_id, req.service_id, req.scheduled_at);
    booking.notes = req.notes;
    booking.address = req.address;
    booking.latitude = req.latitude;
    booking.longitude = req.longitude;
    debug!("🗓️ POST /reservations for customer #{}", claims.sub);
    let reservation = api.create_reservation(booking).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(my_reservations => Get "/reservations" impl ReservationDatabase where requires [Role::Customer]);
pub async fn my_reservations<B: ReservationDatabase>(
    claims: JwtClaims,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reservations = api.reservations_for_customer(claims.sub).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

route!(reservation_by_id => Get "/reservations/{id}" impl ReservationDatabase);
/// Fetch one reservation. Customers see their own, washers the jobs assigned to them, admins
/// everything.
pub async fn reservation_by_id<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reservation =
        api.fetch_reservation(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Reservation {id}")))?;
    let allowed = match claims.role {
        Role::Admin => true,
        Role::Customer => reservation.customer_id == claims.sub,
        Role::Washer => reservation.washer_id == Some(claims.sub),
    };
    if !allowed {
        return Err(ServerError::InsufficientPermissions(format!("Reservation {id} is not yours to view")));
    }
    Ok(HttpResponse::Ok().json(reservation))
}

route!(update_reservation => Put "/reservations/{id}" impl ReservationDatabase where requires [Role::Customer]);
/// Full-field edit. Only legal while the reservation is still `Pending`; a service change
/// re-snapshots the price.
pub async fn update_reservation<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<EditReservationRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("📝️ PUT /reservations/{id} by customer #{}", claims.sub);
    let reservation = api.edit_reservation(id, claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(cancel_reservation => Post "/reservations/{id}/cancel" impl ReservationDatabase where requires [Role::Customer, Role::Admin]);
/// Cancel a booking that has not started yet. Customers may only cancel their own; admins may
/// cancel any cancellable reservation.
pub async fn cancel_reservation<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let acting_customer = match claims.role {
        Role::Admin => None,
        _ => Some(claims.sub),
    };
    let reservation = api.cancel_reservation(id, acting_customer).await?;
    info!("🗓️ Reservation #{id} cancelled by {} #{}", claims.role, claims.sub);
    Ok(HttpResponse::Ok().json(reservation))
}

route!(assign_reservation => Post "/reservations/{id}/assign" impl ReservationDatabase where requires [Role::Admin]);
/// Admin override for the claim protocol: attach a washer to a pending, unassigned job. The
/// database guard is identical to a washer-initiated claim.
pub async fn assign_reservation<B: ReservationDatabase>(
    path: web::Path<i64>,
    body: web::Json<AssignRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reservation = api.assign_job(id, body.washer_id).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(rate_reservation => Post "/reservations/{id}/rating" impl ReservationDatabase where requires [Role::Customer]);
/// One rating per completed reservation, by its customer. Updates the washer's running average.
pub async fn rate_reservation<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RatingRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let req = body.into_inner();
    let rating = api.rate_reservation(id, claims.sub, req.stars, req.comment).await?;
    Ok(HttpResponse::Ok().json(rating))
}
