use bytes::Bytes;
use resp_proto::Token;

use super::Render;
use crate::arg::Arg;
use crate::builder::one_of;
use crate::error::Error;

const UNITS: &[&str] = &["m", "km", "ft", "mi"];

/// Distance unit for geospatial commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoUnit {
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl GeoUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Feet => "ft",
            Self::Miles => "mi",
        }
    }

    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let token = one_of(command, "unit", arg, UNITS)?;
        Ok(match token.as_bytes() {
            Some(b"km") => Self::Kilometers,
            Some(b"ft") => Self::Feet,
            Some(b"mi") => Self::Miles,
            _ => Self::Meters,
        })
    }
}

impl Render for GeoUnit {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static(self.as_str()));
    }
}

impl From<GeoUnit> for Arg {
    fn from(unit: GeoUnit) -> Self {
        Arg::from(unit.as_str())
    }
}

/// Search origin for `GEOSEARCH`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFrom {
    /// `FROMMEMBER member`.
    Member(Bytes),
    /// `FROMLONLAT longitude latitude`.
    LonLat(f64, f64),
}

impl GeoFrom {
    /// Accepts a member name, a `[lon, lat]` pair, or a map with `member`,
    /// `lonlat` or `longitude`/`latitude` entries.
    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let invalid = || Error::invalid(command, "Invalid FROM argument value given");
        match arg {
            Arg::Bytes(member) => Ok(Self::Member(member.clone())),
            Arg::List(items) => lon_lat(items).ok_or_else(invalid),
            Arg::Map(_) => {
                if let Some(member) = arg.get("member").or_else(|| arg.get("frommember")) {
                    return member
                        .as_bytes()
                        .map(|m| Self::Member(m.clone()))
                        .ok_or_else(invalid);
                }
                if let Some(pair) = arg.get("lonlat").or_else(|| arg.get("fromlonlat")) {
                    return pair.as_list().and_then(lon_lat).ok_or_else(invalid);
                }
                match (arg.get("longitude"), arg.get("latitude")) {
                    (Some(lon), Some(lat)) => Ok(Self::LonLat(
                        lon.as_float().ok_or_else(invalid)?,
                        lat.as_float().ok_or_else(invalid)?,
                    )),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

fn lon_lat(items: &[Arg]) -> Option<GeoFrom> {
    match items {
        [lon, lat] => Some(GeoFrom::LonLat(lon.as_float()?, lat.as_float()?)),
        _ => None,
    }
}

impl Render for GeoFrom {
    fn render(&self, out: &mut Vec<Token>) {
        match self {
            Self::Member(member) => {
                out.push(Token::from_static("FROMMEMBER"));
                out.push(Token::Bulk(member.clone()));
            }
            Self::LonLat(lon, lat) => {
                out.push(Token::from_static("FROMLONLAT"));
                out.push(Token::Float(*lon));
                out.push(Token::Float(*lat));
            }
        }
    }
}

impl From<GeoFrom> for Arg {
    fn from(from: GeoFrom) -> Self {
        match from {
            GeoFrom::Member(member) => Arg::map([("member", member)]),
            GeoFrom::LonLat(lon, lat) => Arg::map([("lonlat", [lon, lat])]),
        }
    }
}

/// Search area for `GEOSEARCH`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoBy {
    /// `BYRADIUS radius unit`.
    Radius(f64, GeoUnit),
    /// `BYBOX width height unit`.
    Box(f64, f64, GeoUnit),
}

impl GeoBy {
    /// Accepts `[radius, unit]`, `[width, height, unit]`, or a map with
    /// `radius`/`unit` or `width`/`height`/`unit` entries.
    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let invalid = || Error::invalid(command, "Invalid BY argument value given");
        let number = |a: &Arg| a.as_float().ok_or_else(invalid);
        match arg {
            Arg::List(items) => match items.as_slice() {
                [radius, unit] => Ok(Self::Radius(number(radius)?, GeoUnit::from_arg(command, unit)?)),
                [width, height, unit] => Ok(Self::Box(
                    number(width)?,
                    number(height)?,
                    GeoUnit::from_arg(command, unit)?,
                )),
                _ => Err(invalid()),
            },
            Arg::Map(_) => {
                let unit = GeoUnit::from_arg(command, arg.get("unit").ok_or_else(invalid)?)?;
                if let Some(radius) = arg.get("radius") {
                    return Ok(Self::Radius(number(radius)?, unit));
                }
                match (arg.get("width"), arg.get("height")) {
                    (Some(width), Some(height)) => Ok(Self::Box(number(width)?, number(height)?, unit)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

impl Render for GeoBy {
    fn render(&self, out: &mut Vec<Token>) {
        match self {
            Self::Radius(radius, unit) => {
                out.push(Token::from_static("BYRADIUS"));
                out.push(Token::Float(*radius));
                unit.render(out);
            }
            Self::Box(width, height, unit) => {
                out.push(Token::from_static("BYBOX"));
                out.push(Token::Float(*width));
                out.push(Token::Float(*height));
                unit.render(out);
            }
        }
    }
}

impl From<GeoBy> for Arg {
    fn from(by: GeoBy) -> Self {
        match by {
            GeoBy::Radius(radius, unit) => Arg::List(vec![Arg::Float(radius), unit.into()]),
            GeoBy::Box(width, height, unit) => {
                Arg::List(vec![Arg::Float(width), Arg::Float(height), unit.into()])
            }
        }
    }
}
