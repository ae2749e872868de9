//! Synchronous client for the **StatBank API (v1)** of Statistics Denmark.
//!
//! Four endpoints are covered: `subjects`, `tables`, `tableinfo` and `data`.
//! Each is a `POST` with a JSON body; the response is decoded JSON. Every
//! endpoint has a typed/reshaped method and a `*_raw` twin returning the decoded
//! `serde_json::Value` untouched.
//!
//! ### Notes
//! - Variable codes in `data` requests must be the Danish ids (`KØN`, `Tid`),
//!   whatever the client language.
//! - Failures are not retried. A non-success status surfaces the API's own
//!   `message` as [`Error::Transport`].
//!
//! Typical usage:
//! ```no_run
//! # use statbank::{Client, params::{DataQuery, build_variable_selector}};
//! # use serde_json::Map;
//! let client = Client::default();
//! let query = DataQuery::new("BEF5")
//!     .variable(build_variable_selector("KØN", ["M", "K"], Map::new()))
//!     .variable(build_variable_selector("Tid", "2018", Map::new()));
//! let table = client.data(&query)?;
//! println!("{}", table);
//! # Ok::<(), statbank::Error>(())
//! ```
use crate::dataset::{Dataset, Table, reshape};
use crate::error::{Error, Result};
use crate::hierarchy::{HierarchyNode, parse_subjects};
use crate::models::{TableInfo, TableSummary, VariableValueRow};
use crate::params::{DataQuery, Language, Params, SubjectsQuery, TableInfoQuery, TablesQuery};
use log::{debug, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.statbank.dk/v1";

// Endpoint names are plain words; keep -, _, . unescaped anyway.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Sends one request body to one endpoint and returns the decoded response.
///
/// The seam between the client and the network; tests substitute their own.
pub trait Transport {
    fn post(&self, endpoint: &str, body: &Params) -> Result<Value>;
}

/// Client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub lang: Language,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            lang: Language::Da,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("statbank/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `STATBANK_BASE_URL` and `STATBANK_LANG` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    /// Empty or whitespace-only values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = non_empty("STATBANK_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(lang) = non_empty("STATBANK_LANG") {
            cfg.lang = lang.parse()?;
        }
        Ok(cfg)
    }
}

/// `reqwest`-backed transport. The inner client keeps one connection pool
/// across requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout) // total request timeout
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Transport {
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            percent_encoding::utf8_percent_encode(endpoint, SAFE)
        )
    }
}

impl Transport for HttpTransport {
    fn post(&self, endpoint: &str, body: &Params) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| Error::Transport {
                status: None,
                message: e.to_string(),
            })?;
        let status = resp.status();
        if status.is_success() {
            let text = resp.text().map_err(|e| Error::Transport {
                status: Some(status.as_u16()),
                message: e.to_string(),
            })?;
            return Ok(serde_json::from_str(&text)?);
        }
        // Error bodies look like {"errorTypeCode": "...", "message": "..."}.
        let message = resp
            .json::<Value>()
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| status.to_string());
        warn!("POST {} failed with HTTP {}: {}", url, status.as_u16(), message);
        Err(Error::Transport {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Client<T: Transport = HttpTransport> {
    lang: Language,
    transport: T,
}

impl Default for Client<HttpTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default()).expect("reqwest client build")
    }
}

impl Client<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            lang: config.lang,
            transport,
        })
    }
}

impl<T: Transport> Client<T> {
    /// Client over a custom transport.
    pub fn with_transport(transport: T, lang: Language) -> Self {
        Self { lang, transport }
    }

    pub fn lang(&self) -> Language {
        self.lang
    }

    pub fn set_lang(&mut self, lang: Language) {
        self.lang = lang;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attach the language and send. Shared by all endpoint methods.
    fn request(&self, endpoint: &str, mut params: Params) -> Result<Value> {
        params.insert("lang".into(), Value::String(self.lang.as_str().into()));
        debug!("POST {} {}", endpoint, Value::Object(params.clone()));
        self.transport.post(endpoint, &params)
    }

    /// Subject hierarchy as returned by the API.
    pub fn subjects_raw(&self, query: &SubjectsQuery) -> Result<Value> {
        self.request("subjects", query.to_params()?)
    }

    /// Subject hierarchy decoded into nodes. Flatten with
    /// [`crate::hierarchy::flatten`] to print it.
    ///
    /// ```no_run
    /// # use statbank::{Client, hierarchy::flatten, params::SubjectsQuery};
    /// let client = Client::default();
    /// let roots = client.subjects(&SubjectsQuery {
    ///     subjects: Some(vec!["19".into()]),
    ///     recursive: true,
    ///     ..Default::default()
    /// })?;
    /// for line in flatten(&roots) {
    ///     println!("{}", line);
    /// }
    /// # Ok::<(), statbank::Error>(())
    /// ```
    pub fn subjects(&self, query: &SubjectsQuery) -> Result<Vec<HierarchyNode>> {
        parse_subjects(&self.subjects_raw(query)?)
    }

    /// Table catalog as returned by the API.
    pub fn tables_raw(&self, query: &TablesQuery) -> Result<Value> {
        self.request("tables", query.to_params()?)
    }

    pub fn tables(&self, query: &TablesQuery) -> Result<Vec<TableSummary>> {
        Ok(serde_json::from_value(self.tables_raw(query)?)?)
    }

    pub fn tableinfo_raw(&self, table_id: &str) -> Result<Value> {
        self.request("tableinfo", TableInfoQuery::new(table_id).to_params()?)
    }

    pub fn tableinfo(&self, table_id: &str) -> Result<TableInfo> {
        Ok(serde_json::from_value(self.tableinfo_raw(table_id)?)?)
    }

    /// Selectable values of every variable of a table, one row each. The
    /// `variable` column holds the variable text in English and its code in Danish.
    pub fn table_variables(&self, table_id: &str) -> Result<Vec<VariableValueRow>> {
        Ok(self.tableinfo(table_id)?.variable_rows(self.lang))
    }

    /// Data response (`{"dataset": ...}` in JSON-stat) as returned by the API.
    pub fn data_raw(&self, query: &DataQuery) -> Result<Value> {
        self.request("data", query.to_params()?)
    }

    /// Data as a table, indexed by the dimensions named in the query's selectors
    /// (in selector order). Without selectors the table has default numbering.
    pub fn data(&self, query: &DataQuery) -> Result<Table> {
        let raw = self.data_raw(query)?;
        let dataset = Dataset::from_value(&raw)?;
        reshape(&dataset, &query.index_dimension_names())
    }
}
