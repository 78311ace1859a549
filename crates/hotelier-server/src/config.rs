use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub sqlite_path: String,
    pub jwt_secret: String,
    pub cors_origin: String,
    pub admin_email: Option<String>,
    pub rate_limit: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("PORT must be a valid port number"),
            sqlite_path: env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "./data/hotelier.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|e| !e.is_empty()),
            rate_limit: env::var("RATE_LIMIT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server_port: 0,
            sqlite_path: ":memory:".to_string(),
            jwt_secret: "test-secret-key-for-hotelier-tests".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            admin_email: Some("root@hotelier.test".to_string()),
            rate_limit: false,
        }
    }
}
