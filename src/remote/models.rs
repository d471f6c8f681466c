use serde::{Deserialize, Serialize};

// settings
//  ├── pricingStatus   "online" | "offline"
//  └── ...             (ignored)
//
// property
//  ├── id
//  ├── name
//  └── createdAt

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingStatus {
    Online,
    Offline,
}

impl PricingStatus {
    pub fn is_enabled(self) -> bool {
        self == PricingStatus::Online
    }
}

impl From<bool> for PricingStatus {
    fn from(enabled: bool) -> Self {
        if enabled {
            PricingStatus::Online
        } else {
            PricingStatus::Offline
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub pricing_status: PricingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub pricing_status: PricingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The trimmed copy of a property kept in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: String,
    pub name: String,
}

impl From<&Property> for PropertySnapshot {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
        }
    }
}

/// Minimum sellable price for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MspFact {
    pub date: String,
    pub msp: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorPrice {
    pub competitor: String,
    pub price: f64,
    #[serde(default)]
    pub observed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub date: String,
    #[serde(default)]
    pub prices: Vec<CompetitorPrice>,
}
