//! IP-to-geography resolution.
//!
//! [`GeoLookup`] is the pure lookup collaborator; [`GeoResolver`] wraps it
//! for the rest of the gateway and supplies the `Unknown` fallbacks used in
//! log entries.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::security::identity::ClientIdentity;

pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoLocation {
    pub country: String,
    pub region: String,
}

impl GeoLocation {
    pub fn new(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LOCATION, UNKNOWN_LOCATION)
    }
}

/// Pure IP → location lookup. `None` when the address is not covered.
pub trait GeoLookup: Send + Sync {
    fn resolve(&self, ip: &str) -> Option<GeoLocation>;
}

/// Lookup that never resolves anything.
pub struct NoGeoLookup;

impl GeoLookup for NoGeoLookup {
    fn resolve(&self, _ip: &str) -> Option<GeoLocation> {
        None
    }
}

/// Fixed table lookup, keyed by the exact address string.
#[derive(Default)]
pub struct StaticGeoLookup {
    entries: HashMap<String, GeoLocation>,
}

impl StaticGeoLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ip: &str, country: &str, region: &str) -> Self {
        self.entries
            .insert(ip.to_string(), GeoLocation::new(country, region));
        self
    }
}

impl GeoLookup for StaticGeoLookup {
    fn resolve(&self, ip: &str) -> Option<GeoLocation> {
        self.entries.get(ip).cloned()
    }
}

/// MaxMind City/Country database lookup.
pub struct MaxMindGeoLookup {
    reader: maxminddb::Reader<Vec<u8>>,
}

#[derive(serde::Deserialize, Debug)]
struct GeoIpCity {
    country: Option<IsoRecord>,
    subdivisions: Option<Vec<IsoRecord>>,
}

#[derive(serde::Deserialize, Debug)]
struct IsoRecord {
    iso_code: Option<String>,
}

impl MaxMindGeoLookup {
    pub fn open(path: &Path) -> Result<Self, maxminddb::MaxMindDBError> {
        let reader = maxminddb::Reader::open_readfile(path)?;
        info!(path = %path.display(), "GeoIP database loaded");
        Ok(Self { reader })
    }
}

impl GeoLookup for MaxMindGeoLookup {
    fn resolve(&self, ip: &str) -> Option<GeoLocation> {
        let addr: IpAddr = ip.parse().ok()?;

        match self.reader.lookup::<GeoIpCity>(addr) {
            Ok(record) => {
                let country = record
                    .country
                    .and_then(|c| c.iso_code)
                    .map(|code| code.to_uppercase())
                    .unwrap_or_default();
                let region = record
                    .subdivisions
                    .and_then(|subs| subs.into_iter().next())
                    .and_then(|s| s.iso_code)
                    .unwrap_or_default();
                Some(GeoLocation::new(country, region))
            }
            Err(maxminddb::MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                warn!(ip = %addr, error = %e, "GeoIP lookup error");
                None
            }
        }
    }
}

/// Geography view used by admission and telemetry.
#[derive(Clone)]
pub struct GeoResolver {
    lookup: Arc<dyn GeoLookup>,
}

impl GeoResolver {
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self { lookup }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoGeoLookup))
    }

    /// Raw lookup result for `identity`.
    pub fn resolve(&self, identity: &ClientIdentity) -> Option<GeoLocation> {
        self.lookup.resolve(identity.as_str())
    }

    /// Country code for `identity`, if one is known.
    pub fn country(&self, identity: &ClientIdentity) -> Option<String> {
        self.resolve(identity)
            .map(|geo| geo.country)
            .filter(|c| !c.is_empty())
    }

    /// Location for log entries: missing data becomes `Unknown`.
    pub fn locate(&self, identity: &ClientIdentity) -> GeoLocation {
        match self.resolve(identity) {
            Some(geo) => GeoLocation {
                country: non_empty_or_unknown(geo.country),
                region: non_empty_or_unknown(geo.region),
            },
            None => GeoLocation::unknown(),
        }
    }
}

fn non_empty_or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        value
    }
}
