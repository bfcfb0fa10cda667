use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry on a service itinerary.
///
/// `date` is `YYYY-MM-DD` and `time` is `HH:MM`, both zero padded so that
/// string order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Supplier,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "supplier" => Ok(Role::Supplier),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Supplier => "supplier",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Axo,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Axo => "AXO",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Draft accumulated across the service-creation wizard. Nothing here is
/// persisted until the wizard submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub price: Option<f64>,
    pub currency: Currency,
    pub discount_percent: Option<f64>,
    pub location: Location,
    pub providers: Vec<String>,
    pub packages: Vec<Package>,
    pub itinerary: Vec<Activity>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub faqs: Vec<Faq>,
}

/// Body sent to the backend when a service is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    pub name: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub price: f64,
    pub currency: Currency,
    pub discount_percent: f64,
    pub location: Location,
    pub providers: Vec<String>,
    pub packages: Vec<Package>,
    pub itinerary: Vec<Activity>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: Currency,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub user_id: String,
    pub balances: Vec<Balance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub transaction_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub from: Currency,
    pub to: Currency,
    pub amount: f64,
    pub converted_amount: f64,
    pub rate: f64,
}

/// Uniform outcome of every wallet operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> WalletResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: if message.trim().is_empty() {
                "Wallet request failed".to_string()
            } else {
                message
            },
            data: None,
        }
    }
}
