#[cfg(test)]
pub mod test_db {
    use crate::config::{AdminConfig, AppConfig, TelemetryConfig};
    use crate::database::run_migrations;
    use crate::db::create_enrollment;
    use crate::error::AppError;
    use crate::normalize::normalize_enrollment;
    use crate::validation::validate_enrollment;
    use serde_json::{Map, Value, json};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static ADMIN_USERNAME: &str = "registrar";
    pub static ADMIN_PASSWORD: &str = "password123";

    pub fn init_test_logging() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
                .with_test_writer()
                .try_init();
        });
    }

    /// A fresh in-memory database. One connection only: every new SQLite
    /// memory connection is a separate database.
    pub async fn memory_pool() -> Result<Pool<Sqlite>, AppError> {
        init_test_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(pool)
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            admin: AdminConfig {
                username: ADMIN_USERNAME.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                session_ttl: chrono::Duration::hours(1),
            },
            secret_key: None,
            telemetry: TelemetryConfig::default(),
        }
    }

    pub fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("enrollment payload must be an object, got {other}"),
        }
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        enrollments: Vec<(String, Map<String, Value>)>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn enrollment(mut self, key: &str, value: Value) -> Self {
            self.enrollments.push((key.to_string(), payload(value)));
            self
        }

        pub fn student(self, key: &str, lrn: &str, full_name: &str, strand: &str) -> Self {
            self.enrollment(
                key,
                json!({
                    "lrn": lrn,
                    "fullName": full_name,
                    "gradeLevel": "11",
                    "strand": strand,
                }),
            )
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            let pool = memory_pool().await?;
            run_migrations(&pool).await?;

            let mut application_id_map = HashMap::new();
            for (key, payload) in &self.enrollments {
                let record = validate_enrollment(normalize_enrollment(payload))?;
                let application_id = create_enrollment(&pool, &record).await?;
                application_id_map.insert(key.clone(), application_id);
            }

            Ok(TestDb {
                pool,
                application_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub application_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn application_id(&self, key: &str) -> i64 {
            self.application_id_map
                .get(key)
                .copied()
                .unwrap_or_else(|| panic!("no seeded enrollment named {key}"))
        }

        pub async fn count(&self, table: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await
                .expect("count query")
        }

        pub async fn stored_status(&self, application_id: i64) -> String {
            sqlx::query_scalar("SELECT status FROM applications WHERE id = ?")
                .bind(application_id)
                .fetch_one(&self.pool)
                .await
                .expect("status query")
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use rocket::http::{ContentType, RawStr, Status};
    use rocket::local::asynchronous::Client;

    use super::test_db::{ADMIN_PASSWORD, ADMIN_USERNAME, TestDb, TestDbBuilder, test_config};

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .student("stem", "100000000001", "Jane Doe", "STEM")
            .student("abm", "100000000002", "John Roe", "ABM")
            .enrollment(
                "tvl",
                serde_json::json!({
                    "lrn": "100000000003",
                    "surname": "Santos",
                    "givenName": "Maria",
                    "track": "TVL Track",
                    "tvlSpec": "Cookery",
                    "medicalConditions": ["Asthma", "Allergy"],
                }),
            )
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = crate::init_rocket(test_db.pool.clone(), test_config());
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");
        (client, test_db)
    }

    fn form_encode(value: &str) -> String {
        RawStr::new(value).percent_encode().to_string()
    }

    pub fn login_body(username: &str, password: &str, next: Option<&str>) -> String {
        let mut body = format!(
            "username={}&password={}",
            form_encode(username),
            form_encode(password)
        );
        if let Some(next) = next {
            body.push_str(&format!("&next={}", form_encode(next)));
        }
        body
    }

    /// Logs in as the configured admin; the tracked client keeps the cookie.
    pub async fn login_test_admin(client: &Client) {
        let response = client
            .post("/admin/login")
            .header(ContentType::Form)
            .body(login_body(ADMIN_USERNAME, ADMIN_PASSWORD, None))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::SeeOther, "admin login failed");
    }
}
