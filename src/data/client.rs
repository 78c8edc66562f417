//! HTTP client for the boundary API.
//!
//! Two read-only endpoints, fetched at most once per client: responses are
//! cached in memory after the first success. Failures are returned to the
//! caller as-is; there is no retry and no request timeout.

use geojson::GeoJson;
use reqwest::{Client, Url};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{parse_county, parse_wards, BoundaryError, CountyBoundary, WardRecord};

pub const DEFAULT_BASE_URL: &str = "https://smartseed-backend.onrender.com/api";

/// Boundary API client with an in-memory response cache
pub struct BoundaryClient {
    client: Client,
    base_url: Url,
    county: String,
    county_cache: OnceCell<CountyBoundary>,
    wards_cache: OnceCell<Vec<WardRecord>>,
}

impl BoundaryClient {
    /// Creates a client for `county` against `base_url` (a mock server in tests).
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Http`] if the `reqwest::Client` cannot be built
    /// or [`BoundaryError::BaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, county: &str) -> Result<Self, BoundaryError> {
        let client = Client::builder()
            .user_agent(concat!("seedmap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| BoundaryError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            county: county.to_lowercase(),
            county_cache: OnceCell::new(),
            wards_cache: OnceCell::new(),
        })
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    /// Fetches the county outline.
    ///
    /// # Errors
    ///
    /// - [`BoundaryError::Http`] on network failure.
    /// - [`BoundaryError::Status`] on a non-2xx response.
    /// - [`BoundaryError::Json`] / [`BoundaryError::GeoJson`] on a malformed body.
    /// - [`BoundaryError::NoGeometry`] if no polygon is present.
    pub async fn load_county_boundary(&self) -> Result<CountyBoundary, BoundaryError> {
        self.county_cache
            .get_or_try_init(|| async {
                let url = self.endpoint(&format!("boundaries/counties/{}", self.county), &[])?;
                let geojson = self.fetch_geojson(url, "county boundary").await?;
                let county = parse_county(&geojson)?;
                info!(county = %county.name, rings = county.rings.len(), "county boundary loaded");
                Ok::<_, BoundaryError>(county)
            })
            .await
            .cloned()
    }

    /// Fetches and normalizes every ward of the county.
    ///
    /// # Errors
    ///
    /// Same as [`BoundaryClient::load_county_boundary`], except that features
    /// without polygons are skipped rather than reported.
    pub async fn load_wards(&self) -> Result<Vec<WardRecord>, BoundaryError> {
        self.wards_cache
            .get_or_try_init(|| async {
                let url = self.endpoint("boundaries/wards", &[("county", self.county.as_str())])?;
                let geojson = self.fetch_geojson(url, "wards").await?;
                let wards = parse_wards(&geojson);
                info!(count = wards.len(), "wards loaded");
                Ok::<_, BoundaryError>(wards)
            })
            .await
            .cloned()
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BoundaryError> {
        let mut url = self.base_url.join(path).map_err(|e| BoundaryError::BaseUrl {
            url: self.base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch_geojson(&self, url: Url, what: &'static str) -> Result<GeoJson, BoundaryError> {
        debug!(%url, "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BoundaryError::Status { what, status });
        }

        let mut body = resp.bytes().await?.to_vec();
        let json: serde_json::Value = simd_json::serde::from_slice(&mut body)
            .map_err(|source| BoundaryError::Json { what, source })?;

        GeoJson::from_json_value(json).map_err(|source| BoundaryError::GeoJson {
            what,
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ward_collection() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "WARD_NAME": "Kapsabet", "SUB_COUNTY": "Emgwen" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[35.08, 0.18], [35.12, 0.18], [35.12, 0.22], [35.08, 0.22], [35.08, 0.18]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[35.12, 0.18], [35.16, 0.18], [35.16, 0.22], [35.12, 0.18]]]
                    }
                }
            ]
        })
    }

    #[tokio::test]
    async fn load_wards_normalizes_features() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/boundaries/wards"))
            .and(query_param("county", "nandi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ward_collection()))
            .mount(&server)
            .await;

        let client = BoundaryClient::new(&format!("{}/api", server.uri()), "Nandi").unwrap();
        let wards = client.load_wards().await.unwrap();

        assert_eq!(wards.len(), 2);
        assert_eq!(wards[0].name, "Kapsabet");
        assert_eq!(wards[0].sub_county.as_deref(), Some("Emgwen"));
        assert_eq!(wards[1].name, "Unknown Ward");
    }

    #[tokio::test]
    async fn load_wards_is_cached_after_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boundaries/wards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ward_collection()))
            .expect(1)
            .mount(&server)
            .await;

        let client = BoundaryClient::new(&server.uri(), "nandi").unwrap();
        let first = client.load_wards().await.unwrap();
        let second = client.load_wards().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn load_county_boundary_accepts_single_feature() {
        let server = MockServer::start().await;
        let body = json!({
            "type": "Feature",
            "properties": { "COUNTY": "Nandi" },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[34.9, -0.1], [35.5, -0.1], [35.5, 0.6], [34.9, 0.6], [34.9, -0.1]]]]
            }
        });
        Mock::given(method("GET"))
            .and(path("/boundaries/counties/nandi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = BoundaryClient::new(&server.uri(), "nandi").unwrap();
        let county = client.load_county_boundary().await.unwrap();
        assert_eq!(county.name, "Nandi");
        assert_eq!(county.rings.len(), 1);
        assert_eq!(county.rings[0].len(), 4);
    }

    #[tokio::test]
    async fn server_error_is_surfaced_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boundaries/wards"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = BoundaryClient::new(&server.uri(), "nandi").unwrap();
        let err = client.load_wards().await.unwrap_err();
        match err {
            BoundaryError::Status { what, status } => {
                assert_eq!(what, "wards");
                assert_eq!(status.as_u16(), 503);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boundaries/counties/nandi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = BoundaryClient::new(&server.uri(), "nandi").unwrap();
        let err = client.load_county_boundary().await.unwrap_err();
        assert!(matches!(err, BoundaryError::Json { what: "county boundary", .. }));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            BoundaryClient::new("not a url", "nandi"),
            Err(BoundaryError::BaseUrl { .. })
        ));
    }
}
