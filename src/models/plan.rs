use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a plan in the subscription service
pub type PlanId = i64;

/// A subscription offering from a provider, as served by the subscription service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub id: PlanId,
    #[serde(default)]
    pub plan_name: String,
    /// Business entity issuing the plan (e.g., "Netflix")
    pub provider_name: String,
    #[serde(default)]
    pub monthly_fee: f64,
    #[serde(default = "default_billing_cycle", deserialize_with = "billing_cycle_or_default")]
    pub billing_cycle_months: u32,
    /// Opaque feature blob, passed through untouched
    #[serde(default)]
    pub features: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_file_name: Option<String>,
    #[serde(default = "default_active", deserialize_with = "active_or_default")]
    pub is_active: bool,
}

fn default_billing_cycle() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

// Both columns are nullable upstream; a null row is kept with the column default
fn billing_cycle_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_billing_cycle))
}

fn active_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_active))
}

impl Plan {
    /// Creates an active monthly plan with no features
    pub fn new(id: PlanId, plan_name: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self {
            id,
            plan_name: plan_name.into(),
            provider_name: provider_name.into(),
            monthly_fee: 0.0,
            billing_cycle_months: default_billing_cycle(),
            features: serde_json::Value::Null,
            logo_file_name: None,
            is_active: true,
        }
    }

    pub fn with_fee(mut self, monthly_fee: f64) -> Self {
        self.monthly_fee = monthly_fee;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_deserialization_from_catalog() {
        let json = r#"{
            "id": 7,
            "plan_name": "Premium",
            "monthly_fee": 17000.0,
            "billing_cycle_months": 1,
            "logo_file_name": "netflix.png",
            "features": {"screens": 4, "uhd": true},
            "provider_name": "Netflix",
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": null
        }"#;

        let plan: Plan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.id, 7);
        assert_eq!(plan.plan_name, "Premium");
        assert_eq!(plan.provider_name, "Netflix");
        assert_eq!(plan.monthly_fee, 17000.0);
        assert_eq!(plan.features["screens"], 4);
        assert_eq!(plan.logo_file_name.as_deref(), Some("netflix.png"));
        assert!(plan.is_active);
    }

    #[test]
    fn test_plan_defaults_for_missing_fields() {
        let plan: Plan = serde_json::from_str(r#"{"id": 1, "provider_name": "A"}"#).unwrap();
        assert_eq!(plan.billing_cycle_months, 1);
        assert!(plan.features.is_null());
        assert!(plan.is_active);
    }

    #[test]
    fn test_catalog_with_null_columns_keeps_every_row() {
        let json = r#"[
            {"id": 1, "plan_name": "Basic", "provider_name": "A", "billing_cycle_months": null, "is_active": null},
            {"id": 2, "plan_name": "Annual", "provider_name": "B", "billing_cycle_months": 12, "is_active": true}
        ]"#;

        let plans: Vec<Plan> = serde_json::from_str(json).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].billing_cycle_months, 1);
        assert!(plans[0].is_active);
        assert_eq!(plans[1].billing_cycle_months, 12);
    }

    #[test]
    fn test_inactive_plan_flag() {
        let plan: Plan =
            serde_json::from_str(r#"{"id": 1, "provider_name": "A", "is_active": false}"#)
                .unwrap();
        assert!(!plan.is_active);
    }
}
