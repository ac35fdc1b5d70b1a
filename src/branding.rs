//! Branding strings and asset location consumed by the UI.

use serde::{Deserialize, Serialize};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{env::EnvConfig, error::BrandingError};

/// File name of the strings inside a branding directory.
pub const STRINGS_FILE: &str = "strings.json";

const BUILTIN_STRINGS: &str = include_str!("../branding/strings.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingStrings {
    pub application: ApplicationStrings,
    pub about: AboutStrings,
    #[serde(default)]
    pub masthead: Masthead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStrings {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutStrings {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

/// Brand images and title shown in the page header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Masthead {
    #[serde(default)]
    pub left_brand: Option<MastheadBrand>,
    #[serde(default)]
    pub left_title: Option<MastheadTitle>,
    #[serde(default)]
    pub right_brand: Option<MastheadBrand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MastheadBrand {
    pub src: String,
    pub alt: String,
    pub height: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MastheadTitle {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<HeadingLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<TitleSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleSize {
    #[serde(rename = "md")]
    Md,
    #[serde(rename = "lg")]
    Lg,
    #[serde(rename = "xl")]
    Xl,
    #[serde(rename = "2xl")]
    Xl2,
    #[serde(rename = "3xl")]
    Xl3,
    #[serde(rename = "4xl")]
    Xl4,
}

impl BrandingStrings {
    /// Strings compiled into the binary.
    pub fn builtin() -> Result<Self, BrandingError> {
        serde_json::from_str(BUILTIN_STRINGS).map_err(BrandingError::Builtin)
    }

    /// Reads `strings.json` from `dir`, or the builtin strings if there is none.
    pub async fn load(dir: &Path) -> Result<Self, BrandingError> {
        let path = dir.join(STRINGS_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|source| BrandingError::Parse { path, source })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Self::builtin(),
            Err(source) => Err(BrandingError::Read { path, source }),
        }
    }
}

/// Directory holding the branding strings and images.
pub fn branding_asset_dir(env: &EnvConfig) -> PathBuf {
    PathBuf::from(env.branding_dir())
}
