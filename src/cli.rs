use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug, Default)]
#[command(name = "shopscout", about = "Shopping interview and product search service")]
pub(crate) struct CliArgs {
    /// Config file path (default: "config.toml")
    #[arg(short, long, env = "SHOPSCOUT_CONFIG")]
    pub(crate) config: Option<String>,

    /// Listen address (default: 0.0.0.0)
    #[arg(long, env = "SHOPSCOUT_HOST")]
    pub(crate) host: Option<String>,

    /// Listen port (default: 3333)
    #[arg(short, long, env = "PORT")]
    pub(crate) port: Option<u16>,

    /// RapidAPI key for the product search service
    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub(crate) rapidapi_key: Option<String>,

    /// Search country code (default: US)
    #[arg(long, env = "SHOPSCOUT_REGION")]
    pub(crate) region: Option<String>,

    /// Products per keyword (default: 10)
    #[arg(long, env = "SHOPSCOUT_MAX_RESULTS")]
    pub(crate) max_results: Option<usize>,

    /// Search attempts when rate limited (default: 3)
    #[arg(long, env = "SHOPSCOUT_MAX_RETRIES")]
    pub(crate) max_retries: Option<u32>,

    /// First backoff delay in ms, doubled per retry (default: 2000)
    #[arg(long, env = "SHOPSCOUT_BASE_DELAY_MS")]
    pub(crate) base_delay_ms: Option<u64>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub(crate) gemini_api_key: Option<String>,

    /// Gemini model (default: gemini-1.5-flash-001)
    #[arg(long, env = "SHOPSCOUT_GEMINI_MODEL")]
    pub(crate) gemini_model: Option<String>,

    /// Keywords searched per interview (default: 5)
    #[arg(long, env = "SHOPSCOUT_MAX_KEYWORDS")]
    pub(crate) max_keywords: Option<usize>,
}

#[derive(Serialize, Debug)]
pub(crate) struct ServerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

#[derive(Serialize, Debug)]
pub(crate) struct SearchOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_delay_ms: Option<u64>,
}

#[derive(Serialize, Debug)]
pub(crate) struct GeminiOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Serialize, Debug)]
pub(crate) struct InterviewOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_keywords: Option<usize>,
}

/// Only the values given on the command line or in the environment.
#[derive(Serialize, Debug)]
pub(crate) struct Overrides {
    server: ServerOverrides,
    search: SearchOverrides,
    gemini: GeminiOverrides,
    interview: InterviewOverrides,
}

impl CliArgs {
    pub fn as_overrides(self) -> Overrides {
        Overrides {
            server: ServerOverrides {
                host: self.host,
                port: self.port,
            },
            search: SearchOverrides {
                api_key: self.rapidapi_key,
                region: self.region,
                max_results: self.max_results,
                max_retries: self.max_retries,
                base_delay_ms: self.base_delay_ms,
            },
            gemini: GeminiOverrides {
                api_key: self.gemini_api_key,
                model: self.gemini_model,
            },
            interview: InterviewOverrides {
                max_keywords: self.max_keywords,
            },
        }
    }
}
