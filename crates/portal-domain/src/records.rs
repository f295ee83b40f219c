use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Scoping key for every customer-specific fetch. Owned by the auth
/// collaborator; read-only to the rest of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(email: impl AsRef<str>) -> Self {
        Self(email.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Customer profile row. The portal treats it as a read snapshot; the only
/// write path is the password-change side channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub custom_email: String,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_mobile_no: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_billing_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_partner: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_billing_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_city: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_street: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_zip_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_portal_login: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_portal_password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_date_added: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub customer: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub posting_date: String,
    #[serde(default, deserialize_with = "deserialize_numberish")]
    pub grand_total: f64,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub currency: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDetail {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub plan: String,
    #[serde(default, deserialize_with = "deserialize_numberish")]
    pub qty: f64,
    #[serde(default, deserialize_with = "deserialize_numberish")]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub party_type: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub party: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub status: String,
    #[serde(default)]
    pub plans: Vec<PlanDetail>,
}

impl Subscription {
    pub fn has_plan(&self, plan_name: &str) -> bool {
        self.plans
            .iter()
            .any(|detail| detail.plan.eq_ignore_ascii_case(plan_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub customer: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub priority: String,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_group: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_assigned_to: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_stringish")]
    pub custom_watchers: Option<String>,
}

/// Catalog item; not owned by any customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_numberish")]
    pub cost: f64,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub currency: String,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub item: String,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub price_determination: String,
}

/// Dropdown option row (issue types, priorities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRow {
    #[serde(deserialize_with = "deserialize_stringish")]
    pub name: String,
}

fn json_value_to_non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let normalized = raw.trim();
            if normalized.is_empty() {
                None
            } else {
                Some(normalized.to_owned())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn deserialize_stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(json_value_to_non_empty_string)
        .unwrap_or_default())
}

fn deserialize_optional_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(json_value_to_non_empty_string))
}

fn deserialize_numberish<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Number(number)) => Ok(number.as_f64().unwrap_or(0.0)),
        Some(Value::String(raw)) => Ok(raw.trim().parse::<f64>().unwrap_or(0.0)),
        _ => Ok(0.0),
    }
}
