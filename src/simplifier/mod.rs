//! Geometry simplification through an external tool
//!
//! The generator only depends on the [`Simplifier`] trait. The shipped
//! implementation, [`MapshaperSimplifier`], runs the `mapshaper` command line
//! tool with the workspace as its working directory.
//!
//! ```no_run
//! use tzshapefilegen::config::ToolsConfig;
//! use tzshapefilegen::simplifier::{MapshaperSimplifier, Simplifier};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let simplifier = MapshaperSimplifier::locate(&ToolsConfig::default())?;
//! simplifier
//!     .simplify(
//!         Path::new("/tmp/work"),
//!         Path::new("combined.json"),
//!         Path::new("reduced.json"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod cli;
mod traits;

pub use cli::MapshaperSimplifier;
pub use traits::{SimplifyOptions, Simplifier};
