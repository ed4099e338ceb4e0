//! # storybook-mcp
//!
//! MCP (Model Context Protocol) server exposing a running Storybook
//! instance's component documentation to AI assistants and other
//! MCP-compatible clients.
//!
//! ## Features
//!
//! - **MCP-compliant**: Implements JSON-RPC 2.0 over stdio (standard MCP
//!   transport)
//! - **Multi-schema index support**: Reads both the v3 `stories.json` and
//!   the v5 `index.json` Storybook index formats behind one query surface
//! - **Headless extraction**: Renders component docs pages in headless
//!   Chrome to extract the props table markup
//! - **Custom tools**: Operator-defined page-scraping tools configured
//!   entirely through the environment
//!
//! ## Available Tools
//!
//! - `getComponentList`: List all documented components
//! - `getComponentProps`: Extract one component's props table
//!   (also reachable under its older name `getComponentPropsType`)
//! - `getComponentsProps`: Extract props tables for several components in
//!   one call, with per-component error reporting
//! - plus one tool per valid `CUSTOM_TOOLS` entry
//!
//! ## Configuration
//!
//! - `STORYBOOK_URL` (required): absolute URL of the Storybook index
//!   document, e.g. `http://localhost:6006/index.json`. Missing or invalid
//!   values prevent startup.
//! - `CUSTOM_TOOLS` (optional): JSON array of custom tool definitions:
//!
//! ```json
//! [
//!   {
//!     "name": "getIconList",
//!     "description": "Get all icons from the icon page",
//!     "parameters": {},
//!     "page": "https://example.com/storybook/?path=/docs/icon--docs",
//!     "handler": "Array.from(document.querySelectorAll('.icon-name')).map(i => i.textContent)"
//!   }
//! ]
//! ```
//!
//! Invalid entries are dropped individually with a logged diagnostic; a
//! malformed value degrades to zero custom tools and never blocks startup.
//!
//! ## Security Model
//!
//! Custom tool handlers are operator-supplied JavaScript executed verbatim
//! in the target page's context, with everything that context can do. The
//! only isolation is the browser's own page isolation; there is no further
//! sandbox. Treat `CUSTOM_TOOLS` as trusted configuration and never populate
//! it from untrusted input.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod browser;
pub mod config;
pub mod custom;
pub mod error;
pub mod fetch;
pub mod index;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use index::StorybookIndex;
pub use protocol::{JsonRpcRequest, JsonRpcResponse, McpMessage};
pub use server::McpServer;
pub use tools::{Tool, ToolCatalog};
