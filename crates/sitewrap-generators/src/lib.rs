//! Adapters for 28 static site generators, built on [`sitewrap`].
//!
//! Each generator is a [`sitewrap::adapter::AdapterSpec`] in [`catalog`]:
//! the binary to run, the risk profile its parameters are validated under,
//! and an argument template per tool. [`HubConfig`] layers a TOML file and
//! environment overrides on top and builds the live
//! [`AdapterSet`](sitewrap::adapter::AdapterSet).
//!
//! ```no_run
//! use sitewrap_generators::HubConfig;
//!
//! # async fn demo() -> Result<(), sitewrap_generators::ConfigError> {
//! let hub = HubConfig::discover(None)?;
//! let adapters = hub.build_adapters(hub.framework_config()?.build_runner())?;
//! if let Some(hugo) = adapters.get("hugo") {
//!     let result = hugo
//!         .call("build", &serde_json::json!({"source": "site", "drafts": true}))
//!         .await;
//!     println!("{}", serde_json::to_string(&result).unwrap());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;

pub use config::{ConfigError, HubConfig};
