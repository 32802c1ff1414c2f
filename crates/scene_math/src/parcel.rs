//! Land parcel coordinates.
//!
//! Parcels are addressed as `"x,y"` strings everywhere outside the engine:
//! in deployment pointers, in the scene metadata document and on the
//! command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Edge length of one parcel, in metres.
pub const PARCEL_SIZE: f32 = 16.0;

/// A land parcel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Parcel {
    pub x: i32,
    pub y: i32,
}

/// Error returned when a `"x,y"` parcel string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelParseError(pub String);

impl fmt::Display for ParcelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parcel coordinate '{}', expected 'x,y'", self.0)
    }
}

impl std::error::Error for ParcelParseError {}

impl Parcel {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parse a `;`-separated list of parcels (`"0,0;0,1"`).
    ///
    /// # Errors
    ///
    /// Returns [`ParcelParseError`] for the first malformed entry.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ParcelParseError> {
        list.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }

    /// The pointer string used by the content-addressed store.
    #[must_use]
    pub fn pointer(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Parcel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Parcel {
    type Err = ParcelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParcelParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        Ok(Self {
            x: x.trim().parse().map_err(|_| err())?,
            y: y.trim().parse().map_err(|_| err())?,
        })
    }
}

impl Serialize for Parcel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Parcel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parcel() {
        assert_eq!("-3, 12".parse::<Parcel>().unwrap(), Parcel::new(-3, 12));
        assert!("3".parse::<Parcel>().is_err());
        assert!("a,b".parse::<Parcel>().is_err());
    }

    #[test]
    fn test_parse_list() {
        let parcels = Parcel::parse_list("0,0; 0,1;").unwrap();
        assert_eq!(parcels, vec![Parcel::new(0, 0), Parcel::new(0, 1)]);
    }

    #[test]
    fn test_serializes_as_pointer_string() {
        let json = serde_json::to_string(&Parcel::new(4, -2)).unwrap();
        assert_eq!(json, "\"4,-2\"");
        let back: Parcel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Parcel::new(4, -2));
    }
}
