use serde::Deserialize;

use super::repo::NewTrackingEvent;
use crate::error::AppError;

const DEFAULT_LOCATION: &str = "Unknown";
const DEFAULT_UPDATED_BY: &str = "System";

#[derive(Debug, Default, Deserialize)]
pub struct AddTrackingRequest {
    #[serde(default, alias = "parcelId")]
    pub tracking_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "updatedBy")]
    pub updated_by: Option<String>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AddTrackingRequest {
    pub fn into_event(self) -> Result<NewTrackingEvent, AppError> {
        let tracking_id = self.tracking_id.trim().to_string();
        let status = self.status.trim().to_string();
        if tracking_id.is_empty() || status.is_empty() {
            return Err(AppError::InvalidInput(
                "tracking_id and status are required".into(),
            ));
        }
        Ok(NewTrackingEvent {
            tracking_id,
            status,
            location: or_default(self.location, DEFAULT_LOCATION),
            updated_by: or_default(self.updated_by, DEFAULT_UPDATED_BY),
        })
    }
}
