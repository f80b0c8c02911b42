use serde_json::{Map, Value};

pub const DEDUP_KEY_PREFIX: &str = "pointdata";
pub const ALIAS_KEY_PREFIX: &str = "email-to-username-";
pub const IP_RESOLVE_QUEUE: &str = "ip-resolve-queue";

/// Placeholder rendered into the fingerprint for an absent field.
const ABSENT: &str = "None";

/// Event fields as received. JSON `null` and a missing key are both `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub timestamp: Option<Value>,
    pub system: Option<Value>,
    pub username: Option<Value>,
    pub data: Option<Value>,
    pub remote_ip: Option<Value>,
    pub server_ip: Option<Value>,
    pub is_utc: Option<Value>,
    pub tzinfo: Option<Value>,
}

impl From<&Map<String, Value>> for RawEvent {
    fn from(object: &Map<String, Value>) -> Self {
        let field = |name: &str| object.get(name).filter(|value| !value.is_null()).cloned();
        Self {
            timestamp: field("timestamp"),
            system: field("system"),
            username: field("username"),
            data: field("data"),
            remote_ip: field("remote_ip"),
            server_ip: field("server_ip"),
            is_utc: field("is_utc"),
            tzinfo: field("tzinfo"),
        }
    }
}

impl RawEvent {
    /// Dedup identity. `is_utc` and `tzinfo` are deliberately left out, and
    /// the username is taken before case folding.
    pub fn fingerprint(&self) -> String {
        let parts = [
            &self.timestamp,
            &self.system,
            &self.username,
            &self.data,
            &self.remote_ip,
            &self.server_ip,
        ];
        let mut key = String::from(DEDUP_KEY_PREFIX);
        for part in parts {
            key.push('-');
            match part {
                Some(value) => key.push_str(&value_text(value)),
                None => key.push_str(ABSENT),
            }
        }
        key
    }

    pub fn is_utc_flag(&self) -> i16 {
        i16::from(self.is_utc.as_ref().is_some_and(is_truthy))
    }
}

/// Text form of a field for keys and columns: strings verbatim, booleans as
/// `True`/`False`, numbers and containers as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => ABSENT.to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// `"10.0.0.5:4444"` -> `"10.0.0.5"`. Everything after the first `:` goes.
pub fn strip_port(address: &str) -> &str {
    address.split(':').next().unwrap_or(address)
}

pub fn alias_key(username: &str) -> String {
    format!("{ALIAS_KEY_PREFIX}{username}")
}
