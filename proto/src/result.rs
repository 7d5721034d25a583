use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Validation messages keyed by field name, plus an optional message about the record as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(flatten)]
    fields: BTreeMap<String, Vec<String>>,
    #[serde(rename = "_record", default, skip_serializing_if = "Option::is_none")]
    record: Option<String>,
}

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) { self.fields.entry(field.into()).or_default().push(message.into()); }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn set_record(&mut self, message: impl Into<String>) { self.record = Some(message.into()); }

    pub fn with_record(mut self, message: impl Into<String>) -> Self {
        self.set_record(message);
        self
    }

    /// Messages for `field`, in the order they were added.
    pub fn get(&self, field: &str) -> &[String] { self.fields.get(field).map(Vec::as_slice).unwrap_or(&[]) }

    pub fn contains(&self, field: &str) -> bool { self.fields.contains_key(field) }

    pub fn record(&self) -> Option<&str> { self.record.as_deref() }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> { self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice())) }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() && self.record.is_none() }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        if other.record.is_some() {
            self.record = other.record;
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> { if self.is_empty() { Ok(()) } else { Err(self) } }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        if let Some(record) = &self.record {
            write!(f, "{record}")?;
            first = false;
        }
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Machine-readable reason attached to a failed server action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCode {
    Validation,
    NotFound,
    Internal,
}

/// What every server action returns.
///
/// On the wire this is `{success: true, data, message}` or
/// `{success: false, message, errors?, code?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    Success { data: T, message: String },
    Failure { message: String, errors: Option<FieldErrors>, code: Option<FailureCode> },
}

impl<T> ActionResult<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self { ActionResult::Success { data, message: message.into() } }

    pub fn failure(message: impl Into<String>) -> Self { ActionResult::Failure { message: message.into(), errors: None, code: None } }

    pub fn invalid(message: impl Into<String>, errors: FieldErrors) -> Self {
        ActionResult::Failure { message: message.into(), errors: Some(errors), code: Some(FailureCode::Validation) }
    }

    pub fn not_found(message: impl Into<String>) -> Self { ActionResult::Failure { message: message.into(), errors: None, code: Some(FailureCode::NotFound) } }

    pub fn internal(message: impl Into<String>) -> Self { ActionResult::Failure { message: message.into(), errors: None, code: Some(FailureCode::Internal) } }

    pub fn is_success(&self) -> bool { matches!(self, ActionResult::Success { .. }) }

    pub fn message(&self) -> &str {
        match self {
            ActionResult::Success { message, .. } | ActionResult::Failure { message, .. } => message,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            ActionResult::Success { data, message } => ActionResult::Success { data: f(data), message },
            ActionResult::Failure { message, errors, code } => ActionResult::Failure { message, errors, code },
        }
    }
}

#[derive(Serialize)]
struct WireRef<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<FailureCode>,
}

#[derive(Deserialize)]
struct Wire<T> {
    success: bool,
    // absent Option fields deserialize as None
    data: Option<T>,
    message: String,
    errors: Option<FieldErrors>,
    code: Option<FailureCode>,
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            ActionResult::Success { data, message } => WireRef { success: true, data: Some(data), message, errors: None, code: None },
            ActionResult::Failure { message, errors, code } => {
                WireRef { success: false, data: None, message, errors: errors.as_ref(), code: *code }
            }
        };
        wire.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ActionResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        if !wire.success {
            return Ok(ActionResult::Failure { message: wire.message, errors: wire.errors, code: wire.code });
        }
        let data = match wire.data {
            Some(data) => data,
            // payload-less successes (delete) carry no data, or `null`
            None => T::deserialize(serde::de::value::UnitDeserializer::<D::Error>::new()).map_err(|_| D::Error::missing_field("data"))?,
        };
        Ok(ActionResult::Success { data, message: wire.message })
    }
}
