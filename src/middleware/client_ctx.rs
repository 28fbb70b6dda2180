use crate::orm::users::Role;
use crate::user::Profile;
use actix::fut::ready;
use actix_session::Session;
use actix_web::dev::{self, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{LocalBoxFuture, Ready};
use std::rc::Rc;

/// Everything the server knows about the caller for the span of one request:
/// the authenticated profile (if any), the session's CSRF token, and the
/// unread notification count the client shows in its header.
#[derive(Clone, Debug, Default)]
pub struct ClientState {
    user: Option<Profile>,
    csrf_token: String,
    unread_notifications: i64,
}

impl ClientState {
    /// Resolves the caller from their session cookie. Guests end up with a
    /// CSRF token and no profile.
    async fn resolve(session: &Session) -> Self {
        let user = crate::session::authenticate_client_by_session(session).await;

        let csrf_token = crate::middleware::csrf::get_or_create_csrf_token(session)
            .unwrap_or_else(|_| String::new());

        let unread_notifications = match &user {
            Some(u) => crate::cache::get_unread_count(u.id).await,
            None => 0,
        };

        ClientState {
            user,
            csrf_token,
            unread_notifications,
        }
    }
}

/// Caller identity, available to any route as an extractor argument. Reads
/// the shared [`ClientState`] the middleware resolved for this request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientState>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientState::default()))
    }
}

impl ClientCtx {
    pub fn get_id(&self) -> Option<i32> {
        self.0.user.as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.user.as_ref()
    }

    pub fn get_role(&self) -> Option<Role> {
        self.0.user.as_ref().map(|u| u.role)
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn get_unread_notifications(&self) -> i64 {
        self.0.unread_notifications
    }

    pub fn is_staff(&self) -> bool {
        self.0.user.as_ref().map(|u| u.is_staff()).unwrap_or(false)
    }

    /// The caller's user id, or 401 for guests.
    pub fn require_login(&self) -> Result<i32, Error> {
        self.get_id()
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("Login required"))
    }

    /// The caller's user id if they hold `role`. 401 for guests, 403 otherwise.
    pub fn require_role(&self, role: Role) -> Result<i32, Error> {
        self.require_any_role(&[role])
    }

    /// The caller's user id if they hold one of `roles`. 401 for guests,
    /// 403 otherwise.
    pub fn require_any_role(&self, roles: &[Role]) -> Result<i32, Error> {
        let user_id = self.require_login()?;
        match self.get_role() {
            Some(role) if roles.contains(&role) => Ok(user_id),
            _ => Err(actix_web::error::ErrorForbidden(
                "Your account cannot perform this action",
            )),
        }
    }

    /// Admins and superadmins only.
    pub fn require_staff(&self) -> Result<i32, Error> {
        self.require_any_role(&[Role::Admin, Role::Superadmin])
    }

    /// Founders only, and only once their document verification is approved.
    /// The client uses this refusal to steer founders back to onboarding.
    pub fn require_verified_founder(&self) -> Result<i32, Error> {
        let user_id = self.require_role(Role::Founder)?;
        let verified = self
            .get_user()
            .map(|u| u.is_verified_founder())
            .unwrap_or(false);
        if !verified {
            return Err(actix_web::error::ErrorForbidden(
                "Document verification must be approved first",
            ));
        }
        Ok(user_id)
    }
}

impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The middleware stores resolved state in the request extensions.
        // A request that skipped the middleware (tests, error renderers)
        // falls back to guest state.
        let mut extensions = req.extensions_mut();
        let state = match extensions.get::<Data<ClientState>>() {
            Some(state) => state.clone(),
            None => {
                let state = Data::new(ClientState::default());
                extensions.insert(state.clone());
                state
            }
        };
        ready(Ok(Self(state)))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Resolves [`ClientState`] once per request, before any route runs.
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Session::extract wants an HttpRequest, so split the ServiceRequest
        // apart and reassemble it before the async block takes ownership.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);

        Box::pin(async move {
            match session {
                Ok(session) => {
                    req.extensions_mut()
                        .insert(Data::new(ClientState::resolve(&session).await));
                }
                Err(err) => {
                    log::error!("Could not read the session for this request: {}", err);
                }
            }

            svc.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::users::VerificationStatus;
    use actix_web::http::StatusCode;

    fn ctx_for(role: Role, verification: VerificationStatus) -> ClientCtx {
        let profile = Profile {
            id: 7,
            name: "Test User".to_string(),
            username: "testuser".to_string(),
            email: "testuser@test.com".to_string(),
            role,
            verification_status: verification,
            created_at: chrono::Utc::now().naive_utc(),
        };
        ClientCtx(Data::new(ClientState {
            user: Some(profile),
            csrf_token: "token".to_string(),
            unread_notifications: 0,
        }))
    }

    fn status_of(err: Error) -> StatusCode {
        err.error_response().status()
    }

    #[test]
    fn guests_get_unauthorized() {
        let ctx = ClientCtx::default();
        let err = ctx.require_login().unwrap_err();
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let ctx = ctx_for(Role::Investor, VerificationStatus::NotSubmitted);
        assert!(ctx.require_login().is_ok());
        let err = ctx.require_role(Role::Founder).unwrap_err();
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unverified_founder_cannot_pass_the_document_gate() {
        for status in [
            VerificationStatus::NotSubmitted,
            VerificationStatus::PendingVerification,
            VerificationStatus::Rejected,
        ] {
            let ctx = ctx_for(Role::Founder, status);
            assert!(ctx.require_role(Role::Founder).is_ok());
            let err = ctx.require_verified_founder().unwrap_err();
            assert_eq!(status_of(err), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn approved_founder_passes_the_document_gate() {
        let ctx = ctx_for(Role::Founder, VerificationStatus::Approved);
        assert_eq!(ctx.require_verified_founder().unwrap(), 7);
    }

    #[test]
    fn staff_check_spans_both_admin_roles() {
        let plain = VerificationStatus::NotSubmitted;
        assert!(ctx_for(Role::Admin, plain).require_staff().is_ok());
        assert!(ctx_for(Role::Superadmin, plain).require_staff().is_ok());
        assert!(ctx_for(Role::Mentor, plain).require_staff().is_err());
    }
}
