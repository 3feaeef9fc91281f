use chrono::Utc;
use rocket::State;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket_dyn_templates::{Template, context};
use tracing::{info, warn};

use crate::config::AdminConfig;

use super::{AdminSession, SESSION_COOKIE, credentials_match, redirect_target};

#[derive(FromForm)]
pub struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

fn login_template(next: Option<&str>, username: &str, error: Option<&str>) -> Template {
    Template::render(
        "login",
        context! {
            title: "Admin Login",
            next: next.unwrap_or_default(),
            username: username,
            error: error,
        },
    )
}

#[get("/login?<next>")]
pub fn login_page(next: Option<String>, session: Option<AdminSession>) -> Result<Template, Redirect> {
    if session.is_some() {
        return Err(Redirect::to(redirect_target(next.as_deref())));
    }

    Ok(login_template(next.as_deref(), "", None))
}

#[post("/login", data = "<form>")]
pub fn process_login(
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    admin: &State<AdminConfig>,
) -> Result<Redirect, Custom<Template>> {
    info!("Login attempt: {}", &form.username);

    if !credentials_match(admin, &form.username, &form.password) {
        warn!("Authentication failed for {}", &form.username);
        return Err(Custom(
            Status::Unauthorized,
            login_template(
                form.next.as_deref(),
                &form.username,
                Some("Invalid username or password"),
            ),
        ));
    }

    let session = AdminSession::issue(&form.username, Utc::now());
    info!(session_id = %session.session_id, "Authentication successful for {}", &form.username);

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, session.to_token()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::seconds(
                admin.session_ttl.num_seconds(),
            )),
    );

    Ok(Redirect::to(redirect_target(form.next.as_deref())))
}

#[post("/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Redirect {
    cookies.remove_private(Cookie::build(SESSION_COOKIE).path("/"));
    Redirect::to("/admin/login")
}

#[get("/")]
pub fn dashboard(session: AdminSession) -> Template {
    Template::render(
        "dashboard",
        context! {
            title: "Enrollment Admin",
            username: session.username,
        },
    )
}
