use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/campus_events".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            jwt_secret: resolve_jwt_secret(
                env::var("JWT_SECRET").ok(),
                &env::var("RUST_ENV").unwrap_or_default(),
            ),
        }
    }
}

// A missing JWT_SECRET would mint forgeable tokens, so refuse to start in
// production and warn loudly everywhere else.
fn resolve_jwt_secret(secret: Option<String>, rust_env: &str) -> String {
    match secret {
        Some(secret) => secret,
        None if rust_env == "production" => {
            panic!("JWT_SECRET must be set when RUST_ENV=production")
        }
        None => {
            tracing::warn!("JWT_SECRET not set, using insecure dev fallback");
            "dev-secret".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_secret_is_used_as_is() {
        assert_eq!(
            resolve_jwt_secret(Some("s3cret".to_string()), "production"),
            "s3cret"
        );
    }

    #[test]
    fn missing_secret_falls_back_outside_production() {
        assert_eq!(resolve_jwt_secret(None, "development"), "dev-secret");
        assert_eq!(resolve_jwt_secret(None, ""), "dev-secret");
    }

    #[test]
    #[should_panic(expected = "JWT_SECRET must be set")]
    fn missing_secret_refuses_to_start_in_production() {
        resolve_jwt_secret(None, "production");
    }
}
