//! Identification of coordinate reference systems from free-form designators
//!
//! CRS names found in real-world CityGML and OSM exports are rarely
//! standard, so parsing never fails: an unrecognized designator is kept
//! verbatim together with an invalid code.

use std::fmt;

use serde::{Deserialize, Serialize};

const INVALID_CODE: i32 = -1;

/// Canonical identifier of a coordinate reference system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrsId {
    /// EPSG code, `-1` when the designator could not be parsed
    pub code: i32,
    /// Canonical name (`EPSG:<code>`) or the original designator
    pub value: String,
}

impl CrsId {
    /// [EPSG:4326](https://epsg.io/4326), the CRS of GeoJSON and OSM data.
    pub fn wgs84() -> Self {
        Self::of(4326)
    }

    /// [EPSG:25832](https://epsg.io/25832), ETRS89 / UTM zone 32N.
    pub fn utm32() -> Self {
        Self::of(25832)
    }

    /// [EPSG:25833](https://epsg.io/25833), ETRS89 / UTM zone 33N.
    pub fn utm33() -> Self {
        Self::of(25833)
    }

    pub fn of(code: i32) -> Self {
        Self {
            code,
            value: format!("EPSG:{code}"),
        }
    }

    fn unknown(raw: &str) -> Self {
        Self {
            code: INVALID_CODE,
            value: raw.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.code > 0 && !self.value.trim().is_empty()
    }

    /// Parses a designator like `EPSG:25832`, `urn:ogc:def:crs:EPSG::25832`,
    /// `urn:adv:crs:ETRS89_UTM32*DE_DHHN2016_NH` or a compound list
    /// `urn:ogc:def:crs,crs:EPSG:6.12:25833,crs:EPSG:6.12:5783`.
    ///
    /// Tokens are scanned left to right and the first EPSG code or known
    /// datum name wins.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::unknown("");
        }

        let mut expect_code = false;
        for token in raw.split(is_separator).filter(|t| !t.is_empty()) {
            if expect_code {
                // once `EPSG` was seen, non-numeric tokens like versions are skipped
                if let Ok(code) = token.parse::<i32>() {
                    return Self::of(code);
                }
                continue;
            }

            if token.eq_ignore_ascii_case("EPSG") {
                expect_code = true;
            } else if let Some(known) = datum_of(token) {
                return known;
            }
        }

        Self::unknown(raw)
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | ',' | '*')
}

fn datum_of(token: &str) -> Option<CrsId> {
    if token.eq_ignore_ascii_case("ETRS89_UTM32") {
        Some(CrsId::utm32())
    } else if token.eq_ignore_ascii_case("ETRS89_UTM33") {
        Some(CrsId::utm33())
    } else {
        None
    }
}
