//! Bearer-token middleware.
//!
//! Verifies the `Authorization: Bearer` token on every request entering the scope it wraps, and
//! stores the decoded [`JwtClaims`] in the request extensions for handlers and the ACL middleware
//! downstream. Requests without a valid, unexpired token never reach a handler.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{
    auth::{bearer_token, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct JwtAuthMiddlewareFactory {
    verifier: TokenVerifier,
}

impl JwtAuthMiddlewareFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        JwtAuthMiddlewareFactory { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthMiddlewareService { verifier: self.verifier.clone(), service: Rc::new(service) })
    }
}

pub struct JwtAuthMiddlewareService<S> {
    verifier: TokenVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(bearer_token)
                .ok_or_else(|| {
                    log::debug!("🔐️ Request without a bearer token was rejected");
                    ServerError::AuthenticationError(AuthError::MissingToken)
                })?;
            let claims = verifier.verify(token).map_err(ServerError::AuthenticationError)?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
