#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub frontend_url: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        // The signing secret must come from the environment; a source-embedded
        // secret would ship with every build.
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        // Token lifetime in seconds. 86400 (one day) matches the issuance contract.
        let jwt_maxage = std::env::var("JWT_MAXAGE").unwrap_or_else(|_| "86400".to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let frontend_url = std::env::var("FRONTEND_URL").expect("FRONTEND_URL must be set");

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: port.parse::<u16>().unwrap(),
            frontend_url,
        }
    }
}
