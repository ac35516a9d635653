//! OSRM HTTP adapter for route geometry.

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::polyline::Polyline;
use crate::traits::PathProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, stops: &[(f64, f64)]) -> String {
        let coords = stops
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl PathProvider for OsrmClient {
    fn path_for(&self, stops: &[(f64, f64)]) -> Result<Polyline, PathError> {
        if stops.len() < 2 {
            return Err(PathError::TooFewStops(stops.len()));
        }

        let body = self
            .client
            .get(self.route_url(stops))
            .send()?
            .error_for_status()?
            .json::<OsrmRouteResponse>()?;

        route_geometry(body)
    }
}

/// Extracts the first route's geometry as (lat, lng) points.
fn route_geometry(body: OsrmRouteResponse) -> Result<Polyline, PathError> {
    if body.code != "Ok" {
        return Err(PathError::Api(body.message.unwrap_or(body.code)));
    }

    let route = body.routes.into_iter().next().ok_or(PathError::NoRoute)?;
    // GeoJSON is [lng, lat]
    let points = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| (lat, lng))
        .collect();

    Ok(Polyline::new(points))
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Polyline, PathError> {
        route_geometry(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn geometry_is_flipped_to_lat_lng() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1520.4,
                "geometry": {"type": "LineString", "coordinates": [[46.6753, 24.7136], [46.6801, 24.7192]]}
            }],
            "waypoints": []
        }"#;
        let path = parse(json).unwrap();
        assert_eq!(path.points(), &[(24.7136, 46.6753), (24.7192, 46.6801)]);
    }

    #[test]
    fn api_errors_carry_message() {
        let json = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        match parse(json) {
            Err(PathError::Api(message)) => assert_eq!(message, "Impossible route between points"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_route_list() {
        let json = r#"{"code": "Ok", "routes": []}"#;
        assert!(matches!(parse(json), Err(PathError::NoRoute)));
    }

    #[test]
    fn url_uses_lng_lat_order() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://osrm:5000/".to_string(),
            ..OsrmConfig::default()
        })
        .unwrap();
        let url = client.route_url(&[(24.7136, 46.6753), (24.7192, 46.6801)]);
        assert_eq!(
            url,
            "http://osrm:5000/route/v1/car/46.675300,24.713600;46.680100,24.719200?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn single_stop_is_rejected_without_request() {
        let client = OsrmClient::new(OsrmConfig::default()).unwrap();
        assert!(matches!(client.path_for(&[(24.7, 46.6)]), Err(PathError::TooFewStops(1))));
    }
}
