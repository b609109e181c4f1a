//! Geocoding adapter: address text in, coordinates and administrative
//! metadata out.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::GeocodeError;
use crate::retry::RetryPolicy;

/// Best match for a free-text address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub county: Option<String>,
    pub postal_code: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `text` to its best-matching feature.
    async fn search(&self, text: &str) -> Result<GeocodeResult, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    county: Option<String>,
    postalcode: Option<String>,
}

/// Reads the first feature of a GeoJSON feature collection.
///
/// Coordinates are `[lng, lat]`. A missing county or postal code is only a
/// warning; an empty feature list is an error.
pub fn parse_feature_collection(body: &str) -> Result<GeocodeResult, GeocodeError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoFeatures)?;

    let (lng, lat) = match feature.geometry.as_ref().map(|g| g.coordinates.as_slice()) {
        Some([lng, lat, ..]) => (*lng, *lat),
        _ => return Err(GeocodeError::MissingCoordinates),
    };

    let properties = feature.properties.unwrap_or_default();
    let county = properties.county.filter(|c| !c.trim().is_empty());
    if county.is_none() {
        warn!(lat, lng, "County not found in geocoding properties");
    }
    let postal_code = properties.postalcode.filter(|p| !p.trim().is_empty());
    if postal_code.is_none() {
        warn!(lat, lng, "Postal code not found in geocoding properties");
    }

    Ok(GeocodeResult {
        lat,
        lng,
        county,
        postal_code,
    })
}

/// HTTP client for a Pelias-compatible `/v1/search` endpoint.
pub struct PeliasGeocoder {
    client: reqwest::Client,
    search_url: String,
    result_size: u32,
    retry: RetryPolicy,
}

impl PeliasGeocoder {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            search_url: format!("{}/v1/search", base_url.trim_end_matches('/')),
            result_size: 1,
            retry,
        })
    }

    async fn fetch(&self, text: &str) -> Result<String, GeocodeError> {
        let size = self.result_size.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("text", text), ("size", size.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Geocoder for PeliasGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, text: &str) -> Result<GeocodeResult, GeocodeError> {
        let body = self.retry.run("geocode", || self.fetch(text)).await?;
        let result = parse_feature_collection(&body)?;
        debug!(lat = result.lat, lng = result.lng, "Geocoded address");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Router};
    use std::collections::HashMap;

    const DALLAS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-96.797, 32.7767] },
                "properties": { "county": "Dallas County", "postalcode": "75201" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-80.0, 40.0] },
                "properties": { "county": "Elsewhere" }
            }
        ]
    }"#;

    #[test]
    fn reads_first_feature_as_lng_lat() {
        let result = parse_feature_collection(DALLAS).unwrap();
        assert_eq!(result.lat, 32.7767);
        assert_eq!(result.lng, -96.797);
        assert_eq!(result.county.as_deref(), Some("Dallas County"));
        assert_eq!(result.postal_code.as_deref(), Some("75201"));
    }

    #[test]
    fn missing_county_is_not_an_error() {
        let body = r#"{"features":[{"geometry":{"coordinates":[-87.6,41.8]},"properties":{}}]}"#;
        let result = parse_feature_collection(body).unwrap();
        assert_eq!(result.county, None);
        assert_eq!(result.postal_code, None);

        let body = r#"{"features":[{"geometry":{"coordinates":[-87.6,41.8]}}]}"#;
        assert!(parse_feature_collection(body).is_ok());
    }

    #[test]
    fn empty_feature_list_is_an_error() {
        let err = parse_feature_collection(r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap_err();
        assert!(matches!(err, GeocodeError::NoFeatures));
        assert!(matches!(
            parse_feature_collection("{}").unwrap_err(),
            GeocodeError::NoFeatures
        ));
    }

    #[test]
    fn malformed_geometry_is_an_error() {
        let body = r#"{"features":[{"geometry":{"coordinates":[1.0]}}]}"#;
        assert!(matches!(
            parse_feature_collection(body).unwrap_err(),
            GeocodeError::MissingCoordinates
        ));
        assert!(matches!(
            parse_feature_collection("not json").unwrap_err(),
            GeocodeError::Decode(_)
        ));
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn pelias_client_sends_text_and_size() {
        let router = Router::new().route(
            "/v1/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("text").map(String::as_str), Some("Dallas, TX"));
                assert_eq!(params.get("size").map(String::as_str), Some("1"));
                DALLAS
            }),
        );
        let base = serve(router).await;

        let geocoder =
            PeliasGeocoder::new(&base, Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let result = geocoder.search("Dallas, TX").await.unwrap();
        assert_eq!(result.postal_code.as_deref(), Some("75201"));
    }

    #[tokio::test]
    async fn pelias_client_reports_error_status() {
        let router = Router::new().route(
            "/v1/search",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "down") }),
        );
        let base = serve(router).await;

        let geocoder =
            PeliasGeocoder::new(&base, Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let err = geocoder.search("Nowhere").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status(502)));
    }
}
