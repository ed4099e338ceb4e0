//! Error types for the MCP server.

use thiserror::Error;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// MCP server errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing startup configuration. Fatal at construction time;
    /// the only error class allowed to abort the process.
    #[error("{0}")]
    Config(String),

    /// The Storybook index could not be retrieved or returned a non-success
    /// status.
    #[error("failed to fetch Storybook data: {0}")]
    FetchFailed(String),

    /// No index entry matches the requested component name.
    #[error("component \"{0}\" not found in Storybook")]
    NotFound(String),

    /// The headless browser could not be configured or launched.
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Page navigation failed (network error, bad URL, engine error).
    #[error("failed to load page {url}: {reason}")]
    NavigationFailed {
        /// URL that was being navigated to.
        url: String,
        /// Underlying cause.
        reason: String,
    },

    /// The awaited selector never appeared within the timeout. For the props
    /// table this usually means the component has no props, or the docs page
    /// structure changed.
    #[error("timed out after {timeout_secs}s waiting for selector \"{selector}\"")]
    ExtractionTimeout {
        /// CSS selector that was awaited.
        selector: String,
        /// How long the wait lasted, in seconds.
        timeout_secs: u64,
    },

    /// A custom tool's handler script threw inside the page context.
    #[error("custom tool handler failed: {0}")]
    HandlerExecutionFailed(String),

    /// Tool not found.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// Invalid tool-call parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Browser engine error outside the navigation/extraction paths.
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the JSON-RPC error code for this error.
    ///
    /// Only envelope-level failures ever reach the transport as JSON-RPC
    /// errors; tool-level failures are rendered as in-band `Error:` text
    /// payloads instead.
    pub fn code(&self) -> i32 {
        match self {
            Error::ToolNotFound(_) => -32601,
            Error::InvalidParams(_) => -32602,
            Error::Serialization(_) => -32700,
            Error::Config(_) | Error::Io(_) => -32002,
            _ => -32603,
        }
    }
}

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Parse error.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid request.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i32 = -32603;
}
