use gambit_common::EnvVars;

pub struct ServerEnv {
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl EnvVars for ServerEnv {
    fn load() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}
