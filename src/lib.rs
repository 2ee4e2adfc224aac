//! Natural-language MongoDB queries through a language model and the
//! MongoDB MCP server.
//!
//! ```no_run
//! use mongodb_mcp_client::{api::ApiSettings, ClientOptions, MongoMcpClient};
//!
//! # async fn run(api: ApiSettings) -> mongodb_mcp_client::Result<()> {
//! let options = ClientOptions::new(Some("mongodb://localhost:27017".into()))?;
//! let mut client = MongoMcpClient::from_settings(options, &api)?;
//! client.connect().await?;
//! let result = client.query("How many movies are in sample_mflix?", None).await?;
//! println!("{}", result.response);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod demos;
pub mod error;
pub mod mcp;
pub mod shell;
pub mod ui;

pub use client::{ClientOptions, FindOptions, MongoMcpClient, QueryResult, ToolInvocation};
pub use error::{Error, Result};
