use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    /// Price fell to or below the entry's minimum.
    Min,
    /// Price rose to or above the entry's maximum.
    Max,
}

/// A crossing found during one alert run. Lives only until dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCandidate {
    pub kind: AlertKind,
    pub email: String,
    pub symbol: String,
    pub company_name: String,
    pub current_price: String,
    pub target_price: String,
    pub timestamp: String,
}
