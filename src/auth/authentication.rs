use chrono::Utc;
use rocket::Request;
use rocket::http::{RawStr, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::serde::json::Json;

use crate::config::AdminConfig;
use crate::error::{AppError, ErrorEnvelope};

use super::{AdminSession, SESSION_COOKIE};

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("admin_session_guard");
        let _guard = auth_span.enter();

        let admin = match request.rocket().state::<AdminConfig>() {
            Some(admin) => admin,
            _ => {
                tracing::error!("Admin configuration not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        let token = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let Some(token) = token else {
            tracing::debug!("No admin session cookie");
            return Outcome::Error((Status::Unauthorized, ()));
        };

        match AdminSession::from_token(&token) {
            Some(session) if session.is_valid_for(admin, Utc::now()) => {
                tracing::info!(username = %session.username, session_id = %session.session_id, "Admin authenticated via session cookie");
                Outcome::Success(session)
            }
            Some(session) => {
                tracing::warn!(username = %session.username, session_id = %session.session_id, "Admin session expired or no longer matches configuration");
                Outcome::Error((Status::Unauthorized, ()))
            }
            None => {
                tracing::warn!("Malformed admin session token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

pub fn login_redirect_for(requested: &str) -> String {
    format!(
        "/admin/login?next={}",
        RawStr::new(requested).percent_encode()
    )
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> Redirect {
    let requested = req.uri().to_string();
    tracing::warn!(uri = %requested, "Unauthorized page access attempt");
    Redirect::to(login_redirect_for(&requested))
}

#[catch(401)]
pub fn unauthorized_api(req: &Request) -> Custom<Json<ErrorEnvelope>> {
    AppError::Authentication("Authentication required".to_string())
        .to_envelope_with_log(&format!("Unauthorized API access to {}", req.uri()))
}
