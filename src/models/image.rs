use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FlyerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Rejects blank references; the service uses `""` for "no image".
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(FlyerError::Response("Empty image reference".into()));
        }
        Ok(ImageRef(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    pub fn decode_data_uri(&self) -> Option<Result<Vec<u8>>> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        if !header.ends_with(";base64") {
            return Some(Err(FlyerError::Response(
                "Only base64 data URIs are supported".into(),
            )));
        }
        Some(
            STANDARD
                .decode(payload)
                .map_err(|e| FlyerError::Response(e.to_string())),
        )
    }

    pub fn extension(&self) -> &str {
        self.0
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split(';').next())
            .map(|subtype| if subtype == "jpeg" { "jpg" } else { subtype })
            .unwrap_or("png")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_data_uri() {
            write!(f, "<inline {} image, {} bytes>", self.extension(), self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Img1,
    Img2,
    Img3,
    Img4,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Img1, Slot::Img2, Slot::Img3, Slot::Img4];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Img1 => "img1",
            Slot::Img2 => "img2",
            Slot::Img3 => "img3",
            Slot::Img4 => "img4",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = FlyerError;

    /// Accepts `img1`..`img4` and the gallery's `Design1`..`Design4` ids.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "img1" | "design1" => Ok(Slot::Img1),
            "img2" | "design2" => Ok(Slot::Img2),
            "img3" | "design3" => Ok(Slot::Img3),
            "img4" | "design4" => Ok(Slot::Img4),
            other => Err(FlyerError::Validation(format!("Unknown slot: {}", other))),
        }
    }
}
