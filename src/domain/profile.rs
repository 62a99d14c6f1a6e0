//! Encoding profiles and resolution tiers.
//!
//! A profile is the bundle of encoder settings used for one resolution tier.
//! Profiles are loaded from the `presets` section of the config file and
//! never change afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolution tier used to pick an encoding profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// 2160p and above
    #[serde(rename = "4kUHD")]
    Uhd,

    /// 1080p
    #[serde(rename = "bluray")]
    Bluray,

    /// Anything smaller
    #[serde(rename = "dvd")]
    Dvd,
}

impl Tier {
    /// Tier used when the source resolution cannot be determined
    pub const FALLBACK: Tier = Tier::Uhd;

    pub const ALL: [Tier; 3] = [Tier::Uhd, Tier::Bluray, Tier::Dvd];

    /// Config key for this tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Uhd => "4kUHD",
            Tier::Bluray => "bluray",
            Tier::Dvd => "dvd",
        }
    }

    /// Pick the tier for a source resolution.
    ///
    /// Either axis reaching a threshold is enough, so a very wide but short
    /// frame still lands in the higher tier.
    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        let Dimensions { width, height } = dimensions;
        if width >= 3840 || height >= 2160 {
            Tier::Uhd
        } else if width >= 1920 || height >= 1080 {
            Tier::Bluray
        } else {
            Tier::Dvd
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width and height of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a `WIDTHxHEIGHT` report (surrounding whitespace ignored)
    pub fn parse(text: &str) -> Option<Self> {
        let (width, height) = text.trim().split_once('x')?;
        Some(Self {
            width: width.trim().parse().ok()?,
            height: height.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Encoder settings for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingProfile {
    /// Video encoder name (e.g. x265_10bit)
    pub encoder: String,

    /// Constant quality / RF value
    pub quality: f32,

    /// Encoder speed preset (e.g. slow)
    pub preset: String,

    /// Container format (e.g. av_mkv)
    pub format: String,

    pub audio: AudioSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,

    /// Decomb filter mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomb: Option<String>,

    /// Deinterlace filter mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deinterlace: Option<String>,
}

/// Audio track selection and encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Comma-separated language list (e.g. "eng,jpn")
    pub lang_list: String,

    /// Audio encoder (e.g. copy)
    pub encoder: String,

    /// Encoder used when the track cannot be passed through
    pub fallback: String,

    /// Keep every track matching the language list
    #[serde(default = "default_all_tracks")]
    pub all_tracks: bool,
}

fn default_all_tracks() -> bool {
    true
}

/// One profile per tier, all required
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSet {
    uhd: EncodingProfile,
    bluray: EncodingProfile,
    dvd: EncodingProfile,
}

impl ProfileSet {
    pub fn new(uhd: EncodingProfile, bluray: EncodingProfile, dvd: EncodingProfile) -> Self {
        Self { uhd, bluray, dvd }
    }

    /// Build from the raw `presets` map. Returns the first missing tier on error.
    pub fn from_map(mut presets: HashMap<Tier, EncodingProfile>) -> Result<Self, Tier> {
        let mut take = |tier: Tier| presets.remove(&tier).ok_or(tier);
        Ok(Self {
            uhd: take(Tier::Uhd)?,
            bluray: take(Tier::Bluray)?,
            dvd: take(Tier::Dvd)?,
        })
    }

    pub fn get(&self, tier: Tier) -> &EncodingProfile {
        match tier {
            Tier::Uhd => &self.uhd,
            Tier::Bluray => &self.bluray,
            Tier::Dvd => &self.dvd,
        }
    }
}
