use std::{
    net::{IpAddr, Ipv6Addr},
    sync::Arc,
    time::Duration,
};

use actix_web::{http::header::HeaderMap, HttpRequest};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        demographics::{or_unknown, LocationSource, UNKNOWN},
        GeoLocation,
    },
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// What the server knows about where a request came from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientContext {
    pub ip: Option<IpAddr>,
    /// Location derived from edge-platform headers, if any were present.
    pub header_location: Option<GeoLocation>,
}

impl ClientContext {
    pub fn from_request(req: &HttpRequest) -> Self {
        let peer = req.peer_addr().map(|addr| addr.ip());
        ClientContext {
            ip: client_ip(req.headers(), peer),
            header_location: location_from_headers(req.headers()),
        }
    }
}

/// Client address: first `x-forwarded-for` entry, then `x-real-ip`, then the
/// socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        })
        .or(peer)
}

/// Addresses a public geolocation service cannot say anything about.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unspecified() || is_unique_local(v6) || is_v6_link_local(v6)
        }
    }
}

fn is_unique_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}

fn is_v6_link_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn decoded_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = header_str(headers, name)?;
    match urlencoding::decode(raw) {
        Ok(value) => Some(value.into_owned()),
        Err(_) => Some(raw.to_string()),
    }
}

/// Location from Vercel geo headers, or the Cloudflare country header.
pub fn location_from_headers(headers: &HeaderMap) -> Option<GeoLocation> {
    if let Some(country) = header_str(headers, "x-vercel-ip-country") {
        return Some(GeoLocation {
            country: country.to_string(),
            region: or_unknown(decoded_header(headers, "x-vercel-ip-country-region").as_deref()),
            city: or_unknown(decoded_header(headers, "x-vercel-ip-city").as_deref()),
            latitude: header_str(headers, "x-vercel-ip-latitude").and_then(|v| v.parse().ok()),
            longitude: header_str(headers, "x-vercel-ip-longitude").and_then(|v| v.parse().ok()),
            source: LocationSource::Headers,
        });
    }

    // "XX" is Cloudflare's marker for an unknown country, "T1" for Tor.
    header_str(headers, "cf-ipcountry")
        .filter(|c| !matches!(*c, "XX" | "T1"))
        .map(|country| GeoLocation {
            country: country.to_string(),
            region: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            latitude: None,
            longitude: None,
            source: LocationSource::Headers,
        })
}

/// Hex SHA-256 of the address, so records can be de-duplicated without
/// storing the address itself.
pub fn hash_ip(ip: &IpAddr) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup_ip(&self, ip: IpAddr) -> AppResult<Option<GeoLocation>>;
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> AppResult<Option<GeoLocation>>;
}

/// `ipapi.co`-style IP lookup plus a Nominatim-style reverse geocoder.
pub struct HttpGeoLookup {
    http: reqwest::Client,
    ip_api_url: String,
    reverse_url: String,
}

impl HttpGeoLookup {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            ip_api_url: config.geolocation_api_url.clone(),
            reverse_url: config.reverse_geocode_url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup_ip(&self, ip: IpAddr) -> AppResult<Option<GeoLocation>> {
        let url = format!("{}/{}/json/", self.ip_api_url, ip);
        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("IP lookup failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "IP lookup returned {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("IP lookup response: {}", e))
        })?;

        if body.error {
            log::debug!("IP lookup declined: {}", body.reason.unwrap_or_default());
            return Ok(None);
        }

        Ok(body.country_name.filter(|c| !c.is_empty()).map(|country| GeoLocation {
            country,
            region: or_unknown(body.region.as_deref()),
            city: or_unknown(body.city.as_deref()),
            latitude: body.latitude,
            longitude: body.longitude,
            source: LocationSource::IpLookup,
        }))
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> AppResult<Option<GeoLocation>> {
        let response = self
            .http
            .get(&self.reverse_url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Reverse geocode failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Reverse geocode returned {}",
                response.status()
            )));
        }

        let body: ReverseGeocodeResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Reverse geocode response: {}", e))
        })?;

        Ok(body.address.map(|address| GeoLocation {
            country: or_unknown(address.country.as_deref()),
            region: or_unknown(address.state.as_deref()),
            city: or_unknown(
                address
                    .city
                    .or(address.town)
                    .or(address.village)
                    .as_deref(),
            ),
            latitude: Some(latitude),
            longitude: Some(longitude),
            source: LocationSource::Browser,
        }))
    }
}

pub struct GeolocationService {
    lookup: Arc<dyn GeoLookup>,
}

impl GeolocationService {
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self { lookup }
    }

    /// Tries IP lookup, platform headers, then browser coordinates. Never
    /// fails: when nothing resolves the location is all `"Unknown"`.
    pub async fn resolve(
        &self,
        context: &ClientContext,
        coordinates: Option<(f64, f64)>,
    ) -> GeoLocation {
        if let Some(ip) = context.ip.filter(|ip| !is_private_ip(ip)) {
            match self.lookup.lookup_ip(ip).await {
                Ok(Some(location)) => return location,
                Ok(None) => {}
                Err(e) => log::warn!("IP geolocation failed: {}", e),
            }
        }

        if let Some(location) = &context.header_location {
            return location.clone();
        }

        if let Some((latitude, longitude)) = coordinates {
            return match self.lookup.reverse_geocode(latitude, longitude).await {
                Ok(Some(location)) => location,
                Ok(None) => coordinates_only(latitude, longitude),
                Err(e) => {
                    log::warn!("Reverse geocoding failed: {}", e);
                    coordinates_only(latitude, longitude)
                }
            };
        }

        GeoLocation::unknown()
    }
}

fn coordinates_only(latitude: f64, longitude: f64) -> GeoLocation {
    GeoLocation {
        latitude: Some(latitude),
        longitude: Some(longitude),
        source: LocationSource::Browser,
        ..GeoLocation::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::header::HeaderValue, test::TestRequest};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                actix_web::http::header::HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    fn lisbon() -> GeoLocation {
        GeoLocation {
            country: "Portugal".to_string(),
            region: "Lisbon".to_string(),
            city: "Lisbon".to_string(),
            latitude: Some(38.72),
            longitude: Some(-9.14),
            source: LocationSource::IpLookup,
        }
    }

    #[test]
    fn forwarded_for_wins_over_real_ip_and_peer() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        let peer = "192.0.2.1".parse().ok();
        assert_eq!(client_ip(&map, peer), "203.0.113.7".parse().ok());

        let map = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&map, peer), "198.51.100.2".parse().ok());

        assert_eq!(client_ip(&HeaderMap::new(), peer), peer);
    }

    #[test]
    fn private_addresses_are_recognised() {
        for ip in ["10.1.2.3", "192.168.0.10", "127.0.0.1", "::1", "fd00::1", "fe80::1"] {
            assert!(is_private_ip(&ip.parse().unwrap()), "{} should be private", ip);
        }
        assert!(!is_private_ip(&"203.0.113.7".parse().unwrap()));
        assert!(!is_private_ip(&"2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn vercel_headers_are_decoded() {
        let map = headers(&[
            ("x-vercel-ip-country", "BR"),
            ("x-vercel-ip-country-region", "SP"),
            ("x-vercel-ip-city", "S%C3%A3o%20Paulo"),
            ("x-vercel-ip-latitude", "-23.55"),
        ]);

        let location = location_from_headers(&map).unwrap();
        assert_eq!(location.country, "BR");
        assert_eq!(location.city, "São Paulo");
        assert_eq!(location.latitude, Some(-23.55));
        assert_eq!(location.longitude, None);
        assert_eq!(location.source, LocationSource::Headers);
    }

    #[test]
    fn cloudflare_unknown_country_is_ignored() {
        assert!(location_from_headers(&headers(&[("cf-ipcountry", "XX")])).is_none());

        let location = location_from_headers(&headers(&[("cf-ipcountry", "PT")])).unwrap();
        assert_eq!(location.country, "PT");
        assert_eq!(location.city, UNKNOWN);
    }

    #[test]
    fn ip_hash_is_stable_hex() {
        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        let hash = hash_ip(&ip);
        assert_eq!(
            hash,
            "fec52565aa0cf18f57d7cf5b3ac728503b8992d2d6f7d46da1d1201090902b02"
        );
        assert_eq!(hash, hash_ip(&ip));
        assert_ne!(hash, hash_ip(&"203.0.113.8".parse().unwrap()));
    }

    #[test]
    fn context_reads_request_headers() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .insert_header(("cf-ipcountry", "ES"))
            .to_http_request();

        let context = ClientContext::from_request(&req);
        assert_eq!(context.ip, "203.0.113.7".parse().ok());
        assert_eq!(context.header_location.unwrap().country, "ES");
    }

    #[tokio::test]
    async fn ip_lookup_is_tried_first() {
        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup_ip().times(1).returning(|_| Ok(Some(lisbon())));
        lookup.expect_reverse_geocode().never();

        let service = GeolocationService::new(Arc::new(lookup));
        let context = ClientContext {
            ip: "203.0.113.7".parse().ok(),
            header_location: location_from_headers(&headers(&[("cf-ipcountry", "ES")])),
        };

        let location = service.resolve(&context, Some((1.0, 2.0))).await;
        assert_eq!(location.country, "Portugal");
    }

    #[tokio::test]
    async fn private_ip_falls_through_to_headers() {
        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup_ip().never();

        let service = GeolocationService::new(Arc::new(lookup));
        let context = ClientContext {
            ip: "10.0.0.5".parse().ok(),
            header_location: location_from_headers(&headers(&[("cf-ipcountry", "ES")])),
        };

        let location = service.resolve(&context, None).await;
        assert_eq!(location.country, "ES");
        assert_eq!(location.source, LocationSource::Headers);
    }

    #[tokio::test]
    async fn failed_lookups_keep_browser_coordinates() {
        let mut lookup = MockGeoLookup::new();
        lookup
            .expect_lookup_ip()
            .returning(|_| Err(AppError::ExternalServiceError("timeout".into())));
        lookup
            .expect_reverse_geocode()
            .returning(|_, _| Err(AppError::ExternalServiceError("timeout".into())));

        let service = GeolocationService::new(Arc::new(lookup));
        let context = ClientContext {
            ip: "203.0.113.7".parse().ok(),
            header_location: None,
        };

        let location = service.resolve(&context, Some((38.7, -9.1))).await;
        assert_eq!(location.country, UNKNOWN);
        assert_eq!(location.latitude, Some(38.7));
        assert_eq!(location.source, LocationSource::Browser);
    }

    #[tokio::test]
    async fn nothing_resolved_is_unknown() {
        let service = GeolocationService::new(Arc::new(MockGeoLookup::new()));
        let location = service.resolve(&ClientContext::default(), None).await;
        assert!(location.is_unknown());
    }
}
