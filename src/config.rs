use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt};

const DEFAULT_MUX_BASE_URL: &str = "https://api.mux.com";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub mux_base_url: String,
    pub mux_token_id: Option<String>,
    pub mux_token_secret: Option<String>,
    pub auth_secret: Option<String>,
    pub auth_issuer: Option<String>,
}

/// Credentials for the Mux Video API.
#[derive(Clone)]
pub struct MuxConfig {
    pub base_url: String,
    pub token_id: String,
    pub token_secret: String,
}

/// How incoming bearer tokens are verified.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity provider.
    pub secret: String,
    /// Expected `iss` claim, when set.
    pub issuer: Option<String>,
}

/// What the binary should do after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Migrate,
    Reconcile,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Course chapter authoring API")]
pub struct Args {
    /// Host to bind to (overrides CHAPTERS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CHAPTERS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides CHAPTERS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long, conflicts_with = "reconcile")]
    pub migrate: bool,

    /// Resolve chapters left mid-way through a video replace, then exit
    #[arg(long)]
    pub reconcile: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and run mode.
    pub fn from_env_and_args() -> Result<(Self, Mode)> {
        let args = Args::parse();
        let cfg = Self::resolve(&args, |key| env::var(key).ok())?;

        let mode = if args.migrate {
            Mode::Migrate
        } else if args.reconcile {
            Mode::Reconcile
        } else {
            Mode::Serve
        };

        Ok((cfg, mode))
    }

    /// Merge CLI args over values from `lookup` (the environment in production).
    pub fn resolve(args: &Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = lookup("CHAPTERS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("CHAPTERS_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing CHAPTERS_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_db = lookup("CHAPTERS_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://./data/chapters.db".into());

        // --- Merge ---
        Ok(Self {
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.clone().unwrap_or(env_db),
            mux_base_url: lookup("MUX_BASE_URL").unwrap_or_else(|| DEFAULT_MUX_BASE_URL.into()),
            mux_token_id: lookup("MUX_TOKEN_ID").filter(|v| !v.is_empty()),
            mux_token_secret: lookup("MUX_TOKEN_SECRET").filter(|v| !v.is_empty()),
            auth_secret: lookup("CHAPTERS_AUTH_SECRET").filter(|v| !v.is_empty()),
            auth_issuer: lookup("CHAPTERS_AUTH_ISSUER").filter(|v| !v.is_empty()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Mux credentials; required before serving traffic.
    pub fn mux(&self) -> Result<MuxConfig> {
        let (Some(token_id), Some(token_secret)) = (&self.mux_token_id, &self.mux_token_secret)
        else {
            bail!("MUX_TOKEN_ID and MUX_TOKEN_SECRET must both be set");
        };
        Ok(MuxConfig {
            base_url: self.mux_base_url.clone(),
            token_id: token_id.clone(),
            token_secret: token_secret.clone(),
        })
    }

    /// Token verification settings; required before serving traffic.
    pub fn auth(&self) -> Result<AuthConfig> {
        let secret = self
            .auth_secret
            .clone()
            .context("CHAPTERS_AUTH_SECRET must be set")?;
        Ok(AuthConfig {
            secret,
            issuer: self.auth_issuer.clone(),
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("mux_base_url", &self.mux_base_url)
            .field("mux_token_id", &self.mux_token_id)
            .field("mux_token_secret", &self.mux_token_secret.as_ref().map(|_| "***"))
            .field("auth_secret", &self.auth_secret.as_ref().map(|_| "***"))
            .field("auth_issuer", &self.auth_issuer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = AppConfig::resolve(&Args::default(), |_| None).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.database_url, "sqlite://./data/chapters.db");
        assert_eq!(cfg.mux_base_url, DEFAULT_MUX_BASE_URL);
        assert!(cfg.mux().is_err());
        assert!(cfg.auth().is_err());
    }

    #[test]
    fn flags_override_env() {
        let env = env_of(&[("CHAPTERS_HOST", "10.0.0.1"), ("CHAPTERS_PORT", "8080")]);
        let args = Args {
            port: Some(9090),
            ..Default::default()
        };
        let cfg = AppConfig::resolve(&args, |k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.addr(), "10.0.0.1:9090");
    }

    #[test]
    fn bad_port_is_reported() {
        let env = env_of(&[("CHAPTERS_PORT", "http")]);
        let err = AppConfig::resolve(&Args::default(), |k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("CHAPTERS_PORT"));
    }

    #[test]
    fn credentials_resolve_when_present() {
        let env = env_of(&[
            ("MUX_TOKEN_ID", "id"),
            ("MUX_TOKEN_SECRET", "secret"),
            ("CHAPTERS_AUTH_SECRET", "jwt-secret"),
            ("CHAPTERS_AUTH_ISSUER", "https://clerk.example"),
        ]);
        let cfg = AppConfig::resolve(&Args::default(), |k| env.get(k).cloned()).unwrap();

        let mux = cfg.mux().unwrap();
        assert_eq!(mux.token_id, "id");
        assert_eq!(mux.token_secret, "secret");

        let auth = cfg.auth().unwrap();
        assert_eq!(auth.secret, "jwt-secret");
        assert_eq!(auth.issuer.as_deref(), Some("https://clerk.example"));

        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("jwt-secret"));
        assert!(!printed.contains("\"secret\""));
    }

    #[test]
    fn empty_mux_secret_counts_as_missing() {
        let env = env_of(&[("MUX_TOKEN_ID", "id"), ("MUX_TOKEN_SECRET", "")]);
        let cfg = AppConfig::resolve(&Args::default(), |k| env.get(k).cloned()).unwrap();
        assert!(cfg.mux().is_err());
    }
}
