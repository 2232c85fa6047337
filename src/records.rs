//! Data model for the search API and the exported output.
//!
//! The API speaks camelCase and omits or nulls fields freely; the export
//! schema is flat snake_case with empty strings standing in for anything
//! missing, so every output row has the same shape.

use serde::{Deserialize, Serialize};

/// One record as the search API returns it. Every field is optional because
/// the API drops keys it has no value for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiRecord {
    pub business_name: Option<String>,
    pub registration_id: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<String>,
    pub agent: Option<ApiAgent>,
}

/// Nested registered-agent object on an [`ApiRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiAgent {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

/// One page of the search API response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    pub results: Vec<ApiRecord>,
    pub total: u64,
}

/// One row of the exported output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_name: String,
    pub registration_id: String,
    pub status: String,
    pub filing_date: String,
    pub agent_name: String,
    pub agent_address: String,
    pub agent_email: String,
}

impl From<ApiRecord> for BusinessRecord {
    fn from(r: ApiRecord) -> Self {
        let agent = r.agent.unwrap_or_default();
        Self {
            business_name: r.business_name.unwrap_or_default(),
            registration_id: r.registration_id.unwrap_or_default(),
            status: r.status.unwrap_or_default(),
            filing_date: r.filing_date.unwrap_or_default(),
            agent_name: agent.name.unwrap_or_default(),
            agent_address: agent.address.unwrap_or_default(),
            agent_email: agent.email.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_record_remap() {
        let raw = serde_json::json!({
            "businessName": "Silver Tech LLC",
            "registrationId": "C-4412907",
            "status": "Active",
            "filingDate": "2019-03-22",
            "agent": {
                "name": "Dana Reeve",
                "address": "310 Pine St, Carson City, NV",
                "email": "dana@silvertech.example"
            }
        });

        let api: ApiRecord = serde_json::from_value(raw).unwrap();
        let rec = BusinessRecord::from(api);

        assert_eq!(rec.business_name, "Silver Tech LLC");
        assert_eq!(rec.registration_id, "C-4412907");
        assert_eq!(rec.status, "Active");
        assert_eq!(rec.filing_date, "2019-03-22");
        assert_eq!(rec.agent_name, "Dana Reeve");
        assert_eq!(rec.agent_address, "310 Pine St, Carson City, NV");
        assert_eq!(rec.agent_email, "dana@silvertech.example");
    }

    #[test]
    fn test_missing_fields_become_empty_strings() {
        let raw = serde_json::json!({
            "businessName": "Bare Minimum Inc"
        });

        let api: ApiRecord = serde_json::from_value(raw).unwrap();
        let rec = BusinessRecord::from(api);

        assert_eq!(rec.business_name, "Bare Minimum Inc");
        assert_eq!(rec.registration_id, "");
        assert_eq!(rec.agent_name, "");
        assert_eq!(rec.agent_email, "");
    }

    #[test]
    fn test_null_agent_and_null_fields() {
        let raw = serde_json::json!({
            "businessName": null,
            "status": "Dissolved",
            "agent": null
        });

        let api: ApiRecord = serde_json::from_value(raw).unwrap();
        let rec = BusinessRecord::from(api);

        assert_eq!(rec.business_name, "");
        assert_eq!(rec.status, "Dissolved");
        assert_eq!(rec.agent_address, "");
    }

    #[test]
    fn test_partial_agent() {
        let raw = serde_json::json!({
            "agent": { "name": "Lee" }
        });

        let api: ApiRecord = serde_json::from_value(raw).unwrap();
        let rec = BusinessRecord::from(api);

        assert_eq!(rec.agent_name, "Lee");
        assert_eq!(rec.agent_address, "");
        assert_eq!(rec.agent_email, "");
    }

    #[test]
    fn test_response_defaults() {
        let resp: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.total, 0);

        let resp: ApiResponse =
            serde_json::from_value(serde_json::json!({"results": [{}], "total": 41})).unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.total, 41);
    }
}
