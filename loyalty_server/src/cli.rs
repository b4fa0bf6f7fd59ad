use clap::Parser;

/// Command-line flags. A flag that is given wins over its environment counterpart; see
/// [`crate::config::ServerConfig::assemble`] for the fallback chain.
#[derive(Parser, Debug, Default)]
#[command(name = "loyalty_server", version, about = "Loyalty accrual back-end")]
pub struct Arguments {
    /// Address and port the HTTP server listens on (env: RUN_ADDRESS)
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,

    /// Postgres DSN (env: DATABASE_URI)
    #[arg(short = 'd', long = "database-uri")]
    pub database_uri: Option<String>,

    /// Base URL of the external accrual scorer (env: ACCRUAL_SYSTEM_ADDRESS)
    #[arg(short = 'r', long = "accrual-address")]
    pub accrual_address: Option<String>,

    /// Seconds between accrual poll cycles
    #[arg(short = 'i', long = "poll-interval", default_value_t = 2)]
    pub poll_interval: u64,

    /// Worker count of the accrual client pool; doubles as the request rate limit
    #[arg(short = 'l', long = "rate-limit", default_value_t = 2)]
    pub rate_limit: usize,

    /// JWT signing key (env: KEY). A random key is generated when neither is given.
    #[arg(short = 'k', long = "key")]
    pub jwt_key: Option<String>,

    /// Password hashing key (env: KEY_SIGNATURE). A random key is generated when neither is given.
    #[arg(short = 's', long = "signature-key")]
    pub signature_key: Option<String>,

    /// Log level
    #[arg(short = 'v', long = "log-level", default_value = "debug")]
    pub log_level: String,
}
