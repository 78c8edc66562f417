use thiserror::Error;

/// Errors from fetching or normalizing boundary data
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// Network or TLS failure from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch {what}: HTTP {status}")]
    Status {
        what: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse {what} response: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: simd_json::Error,
    },

    #[error("Response for {what} is not valid GeoJSON: {source}")]
    GeoJson {
        what: &'static str,
        #[source]
        source: Box<geojson::Error>,
    },

    #[error("No polygon geometry in {what}")]
    NoGeometry { what: &'static str },

    #[error("Invalid boundary API base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
}
