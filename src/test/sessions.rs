#[cfg(test)]
mod tests {
    use crate::auth::{AdminSession, SESSION_COOKIE};
    use crate::test::test_db::{ADMIN_USERNAME, TestDbBuilder};
    use crate::test::test_utils::{login_test_admin, setup_test_client};
    use chrono::{Duration, Utc};
    use rocket::http::{Cookie, Status};
    use rocket::local::asynchronous::Client;

    async fn client() -> Client {
        let test_db = TestDbBuilder::new().build().await.expect("test db");
        let (client, _) = setup_test_client(test_db).await;
        client
    }

    async fn list_with_session(client: &Client, session: &AdminSession) -> Status {
        client
            .get("/api/applications")
            .private_cookie(Cookie::new(SESSION_COOKIE, session.to_token()))
            .dispatch()
            .await
            .status()
    }

    #[rocket::async_test]
    async fn test_login_sets_private_session_cookie() {
        let client = client().await;
        login_test_admin(&client).await;

        let cookie = client
            .cookies()
            .get_private(SESSION_COOKIE)
            .expect("session cookie set");
        let session = AdminSession::from_token(cookie.value()).expect("token parses");
        assert_eq!(session.username, ADMIN_USERNAME);
        assert!((Utc::now().timestamp() - session.issued_at).abs() < 60);

        let response = client.get("/api/applications").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_fresh_session_token_is_accepted() {
        let client = client().await;
        let session = AdminSession::issue(ADMIN_USERNAME, Utc::now());
        assert_eq!(list_with_session(&client, &session).await, Status::Ok);
    }

    #[rocket::async_test]
    async fn test_expired_session_is_rejected() {
        let client = client().await;
        let session = AdminSession::issue(ADMIN_USERNAME, Utc::now() - Duration::hours(2));
        assert_eq!(
            list_with_session(&client, &session).await,
            Status::Unauthorized
        );
    }

    #[rocket::async_test]
    async fn test_session_for_other_user_is_rejected() {
        let client = client().await;
        let session = AdminSession::issue("someone-else", Utc::now());
        assert_eq!(
            list_with_session(&client, &session).await,
            Status::Unauthorized
        );
    }

    #[rocket::async_test]
    async fn test_unencrypted_cookie_is_rejected() {
        let client = client().await;
        let session = AdminSession::issue(ADMIN_USERNAME, Utc::now());

        let response = client
            .get("/api/applications")
            .cookie(Cookie::new(SESSION_COOKIE, session.to_token()))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_malformed_token_is_rejected() {
        let client = client().await;

        let response = client
            .get("/api/applications")
            .private_cookie(Cookie::new(SESSION_COOKIE, "garbage"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_logout_ends_session() {
        let client = client().await;
        login_test_admin(&client).await;

        let response = client.post("/admin/logout").dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/admin/login"));

        let response = client.get("/api/applications").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }
}
