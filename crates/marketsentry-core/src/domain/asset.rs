use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AssetIdentity, ValidationError};

/// Asset class as labelled by the server. Labels this client does not know
/// decode as `Unknown` rather than failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Crypto,
    Stock,
    #[serde(other)]
    Unknown,
}

impl AssetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "CRYPTO",
            Self::Stock => "STOCK",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "crypto" => Ok(Self::Crypto),
            "stock" => Ok(Self::Stock),
            _ => Err(ValidationError::InvalidAssetType {
                value: value.to_owned(),
            }),
        }
    }
}

/// Asset record served by `/v1/assets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(deserialize_with = "super::identity::deserialize_lenient")]
    pub identity: AssetIdentity,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub explorer: String,
    pub current_price_usd: f64,
    pub asset_type: AssetType,
    #[serde(default)]
    pub logo: String,
}

impl Asset {
    /// Icon URL used when the server record carries no logo.
    pub fn icon_url(&self) -> String {
        if self.logo.trim().is_empty() {
            format!(
                "https://assets.coincap.io/assets/icons/{}@2x.png",
                self.symbol.to_lowercase()
            )
        } else {
            self.logo.clone()
        }
    }
}

/// Body for creating or replacing an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub identity: AssetIdentity,
    pub symbol: String,
    pub name: String,
    pub explorer: String,
    pub logo: String,
    pub asset_type: AssetType,
}

impl AssetRequest {
    pub fn new(
        identity: AssetIdentity,
        symbol: impl Into<String>,
        name: impl Into<String>,
        asset_type: AssetType,
    ) -> Result<Self, ValidationError> {
        if asset_type == AssetType::Unknown {
            return Err(ValidationError::InvalidAssetType {
                value: String::from(asset_type.as_str()),
            });
        }

        let symbol = symbol.into().trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptyField { field: "symbol" });
        }

        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }

        Ok(Self {
            identity,
            symbol,
            name,
            explorer: String::new(),
            logo: String::new(),
            asset_type,
        })
    }

    pub fn with_explorer(mut self, explorer: impl Into<String>) -> Self {
        self.explorer = explorer.into();
        self
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = logo.into();
        self
    }
}
