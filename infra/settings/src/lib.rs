//! # Settings Store
//!
//! Simple get/set-by-key JSON persistence: the durable sibling of the
//! in-memory repository caches. Used for small per-surface state such as a
//! dashboard's selected filter.
//!
//! # Core Features
//!
//! - **Atomic Writes**: a unique temp write followed by `sync` + `rename`, so
//!   a crash never leaves a half-written document behind.
//! - **Validated Keys**: keys map one-to-one onto file names and cannot
//!   escape the store root.
//! - **Self-Healing**: orphaned temp files from earlier crashes are cleaned
//!   up on connect.
//!
//! # Examples
//!
//! ```rust
//! use lhub_settings::{Settings, SettingsError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct WindowState {
//!     width: u32,
//!     height: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SettingsError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("settings");
//!     let settings = Settings::builder().root(&root).create(true).connect().await?;
//!
//!     let state = WindowState { width: 1280, height: 800 };
//!     settings.put("window_state", &state).await?;
//!
//!     let restored: Option<WindowState> = settings.get("window_state").await?;
//!     assert_eq!(restored, Some(state));
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod store;

pub use builder::SettingsBuilder;
pub use error::{SettingsError, SettingsErrorExt};
pub use store::{Settings, SettingsKey};
