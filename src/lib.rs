//! statbank
//!
//! A lightweight Rust library for querying the StatBank API of Statistics
//! Denmark and reshaping its responses. Pairs with the `statbank` CLI.
//!
//! ### Features
//! - Browse the subject hierarchy as a printable tree
//! - List the table catalog and inspect a table's variables
//! - Fetch JSON-stat data as a table indexed by the requested dimensions
//! - Save tables as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use serde_json::Map;
//! use statbank::Client;
//! use statbank::params::{DataQuery, build_variable_selector};
//!
//! let client = Client::default();
//! let query = DataQuery::new("BEF5")
//!     .variable(build_variable_selector("Tid", ["2018", "2019"], Map::new()))
//!     .variable(build_variable_selector("KØN", ["M", "K"], Map::new()));
//! let table = client.data(&query)?;
//! statbank::storage::save_csv(&table, "bef5.csv")?;
//! # Ok::<(), statbank::Error>(())
//! ```

pub mod api;
pub mod dataset;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod params;
pub mod storage;

pub use api::{Client, ClientConfig, HttpTransport, Transport};
pub use dataset::{Dataset, MultiIndex, RowIndex, Table, reshape};
pub use error::{Error, Result};
pub use hierarchy::{HierarchyNode, flatten};
pub use params::{Language, VariableSelector, add_list_field, build_variable_selector};
