use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;

use crate::{
    auth::{session::extract_session_token, Claims, JwtService},
    backend::Access,
    errors::AppError,
    middleware::get_request_id,
};

/// Rejects requests without a valid session and stores the session claims in
/// request extensions for [`AuthenticatedUser`].
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let (claims, token) = match authenticate(req.request()) {
                Ok(session) => session,
                Err(err) => {
                    log::debug!(
                        "[{}] Rejected unauthenticated request to {}: {}",
                        get_request_id(req.request()).unwrap_or_default(),
                        req.path(),
                        err
                    );
                    let (request, _) = req.into_parts();
                    let response = actix_web::ResponseError::error_response(&err);
                    return Ok(ServiceResponse::new(request, response).map_into_right_body());
                }
            };

            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(Access::User(token));

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Validates the request's session token against the configured verifier.
pub fn authenticate(req: &HttpRequest) -> Result<(Claims, String), AppError> {
    let jwt_service = req
        .app_data::<web::Data<JwtService>>()
        .ok_or_else(|| AppError::InternalError("Session verifier not configured".to_string()))?;

    let token = extract_session_token(req)
        .ok_or_else(|| AppError::Unauthorized("Missing session".to_string()))?;

    let claims = jwt_service.validate_token(&token)?;
    Ok((claims, token))
}

// Extractor for authenticated user in handlers
pub struct AuthenticatedUser {
    pub claims: Claims,
    /// Backend credential that carries the user's session.
    pub access: Access,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.claims.sub
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let cached = {
            let extensions = req.extensions();
            match (extensions.get::<Claims>(), extensions.get::<Access>()) {
                (Some(claims), Some(access)) => Some(AuthenticatedUser {
                    claims: claims.clone(),
                    access: access.clone(),
                }),
                _ => None,
            }
        };

        // Routes outside the middleware-wrapped scope validate here instead.
        let user = match cached {
            Some(user) => Ok(user),
            None => authenticate(req).map(|(claims, token)| AuthenticatedUser {
                claims,
                access: Access::User(token),
            }),
        };

        ready(user)
    }
}

/// Session claims when present and valid; never rejects the request.
pub struct MaybeUser(pub Option<Claims>);

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let cached = req.extensions().get::<Claims>().cloned();
        // Cookie parsing writes to extensions, so the borrow above must end first.
        let claims = cached.or_else(|| authenticate(req).ok().map(|(claims, _)| claims));

        ready(Ok(MaybeUser(claims)))
    }
}
