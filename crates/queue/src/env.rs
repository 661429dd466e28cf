use std::env;

use gambit_common::EnvVars;

use crate::dispatcher::DispatcherConfig;

pub struct QueueEnv {
    pub processing_interval_ms: u64,
    pub max_retries: i32,
    pub retry_base_delay_ms: u64,
}

impl EnvVars for QueueEnv {
    fn load() -> Self {
        Self {
            processing_interval_ms: parse_or("QUEUE_PROCESSING_INTERVAL_MS", 1000),
            max_retries: parse_or("QUEUE_MAX_RETRIES", 3),
            retry_base_delay_ms: parse_or("QUEUE_RETRY_DELAY_MS", 5000),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "QUEUE_PROCESSING_INTERVAL_MS" => self.processing_interval_ms.to_string(),
            "QUEUE_MAX_RETRIES" => self.max_retries.to_string(),
            "QUEUE_RETRY_DELAY_MS" => self.retry_base_delay_ms.to_string(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}

impl QueueEnv {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            processing_interval_ms: self.processing_interval_ms,
            max_retries: self.max_retries,
            retry_base_delay_ms: self.retry_base_delay_ms,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
