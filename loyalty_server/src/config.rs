use std::env;

use lps_common::Secret;
use rand::RngCore;

use crate::cli::Arguments;

pub const DEFAULT_ADDRESS: &str = ":8090";
pub const DEFAULT_ACCRUAL_ADDRESS: &str = "localhost:8100";

const GENERATED_KEY_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen address, either `host:port` or `:port`.
    pub address: String,
    pub database_uri: String,
    /// Base address of the external accrual scorer.
    pub accrual_address: String,
    pub poll_interval_secs: u64,
    pub rate_limit: usize,
    /// Signs the `jwt` cookie.
    pub jwt_key: Secret<String>,
    /// Keys the password hash.
    pub signature_key: Secret<String>,
    pub log_level: String,
}

impl ServerConfig {
    /// Resolves every setting through the chain: flag when given, else non-empty environment variable,
    /// else default. The two keys fall back to fresh random values, which keeps a dev instance usable but
    /// invalidates sessions and stored passwords across restarts.
    pub fn assemble(args: Arguments) -> Self {
        let jwt_key = args
            .jwt_key
            .or_else(|| non_empty_env("KEY"))
            .unwrap_or_else(generate_key);
        let signature_key = args
            .signature_key
            .or_else(|| non_empty_env("KEY_SIGNATURE"))
            .unwrap_or_else(generate_key);
        Self {
            address: flag_or_env(args.address, "RUN_ADDRESS", DEFAULT_ADDRESS),
            database_uri: flag_or_env(args.database_uri, "DATABASE_URI", ""),
            accrual_address: flag_or_env(args.accrual_address, "ACCRUAL_SYSTEM_ADDRESS", DEFAULT_ACCRUAL_ADDRESS),
            poll_interval_secs: args.poll_interval,
            rate_limit: args.rate_limit,
            jwt_key: Secret::new(jwt_key),
            signature_key: Secret::new(signature_key),
            log_level: args.log_level,
        }
    }

    /// The address in a form the socket binder accepts: a bare `:port` listens on all interfaces.
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

fn flag_or_env(flag: Option<String>, env_name: &str, default: &str) -> String {
    flag.or_else(|| non_empty_env(env_name)).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn generate_key() -> String {
    let mut bytes = [0u8; GENERATED_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_win_over_environment_and_defaults() {
        env::set_var("LPS_TEST_PRECEDENCE", "from-env");
        assert_eq!(flag_or_env(Some("from-flag".into()), "LPS_TEST_PRECEDENCE", "fallback"), "from-flag");
        assert_eq!(flag_or_env(None, "LPS_TEST_PRECEDENCE", "fallback"), "from-env");
        env::set_var("LPS_TEST_PRECEDENCE", "");
        assert_eq!(flag_or_env(None, "LPS_TEST_PRECEDENCE", "fallback"), "fallback");
        env::remove_var("LPS_TEST_PRECEDENCE");
    }

    #[test]
    fn missing_keys_are_generated() {
        let config = ServerConfig::assemble(Arguments::default());
        assert_eq!(config.jwt_key.reveal().len(), GENERATED_KEY_LEN * 2);
        assert_eq!(config.signature_key.reveal().len(), GENERATED_KEY_LEN * 2);
        assert_ne!(config.jwt_key.reveal(), config.signature_key.reveal());
    }

    #[test]
    fn bare_port_addresses_bind_all_interfaces() {
        let mut config = ServerConfig::assemble(Arguments::default());
        config.address = ":8090".to_string();
        assert_eq!(config.bind_address(), "0.0.0.0:8090");
        config.address = "127.0.0.1:9000".to_string();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
