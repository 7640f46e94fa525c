//! Principal (clinic user) data model.
//!
//! A principal carries four validated core fields plus a role-dependent bag
//! of profile attributes. The serialised form is a single flat JSON object
//! so persisted records and profile updates share one key space.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the core principal fields. Attributes may not reuse them.
pub const RESERVED_KEYS: [&str; 4] = ["id", "email", "name", "role"];

/// Validation errors returned by principal constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    EmptyDisplayName,
    UnknownRole { value: String },
    ReservedAttribute { key: String },
}

impl fmt::Display for PrincipalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "principal id must not be empty"),
            Self::InvalidId => write!(f, "principal id must not contain surrounding whitespace"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::UnknownRole { value } => write!(
                f,
                "role must be one of patient, practitioner, admin (got {value})"
            ),
            Self::ReservedAttribute { key } => {
                write!(f, "attribute key {key} is reserved for a core field")
            }
        }
    }
}

impl std::error::Error for PrincipalValidationError {}

/// Stable principal identifier.
///
/// Fixture identifiers such as `user1` are opaque strings, not UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Validate and construct a [`PrincipalId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, PrincipalValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, PrincipalValidationError> {
        if id.trim().is_empty() {
            return Err(PrincipalValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(PrincipalValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for PrincipalId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PrincipalId> for String {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl TryFrom<String> for PrincipalId {
    type Error = PrincipalValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Email address used as the secondary lookup key.
///
/// Stored verbatim, since login matches it exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, PrincipalValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, PrincipalValidationError> {
        if email.trim().is_empty() {
            return Err(PrincipalValidationError::EmptyEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = PrincipalValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Human readable name shown on dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, PrincipalValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, PrincipalValidationError> {
        if display_name.trim().is_empty() {
            return Err(PrincipalValidationError::EmptyDisplayName);
        }
        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = PrincipalValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Dashboard a principal is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Patient,
    Practitioner,
    Admin,
}

impl Role {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Practitioner => "practitioner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_owned()
    }
}

impl TryFrom<String> for Role {
    type Error = PrincipalValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "patient" => Ok(Self::Patient),
            "practitioner" => Ok(Self::Practitioner),
            "admin" => Ok(Self::Admin),
            _ => Err(PrincipalValidationError::UnknownRole { value }),
        }
    }
}

/// Authenticated clinic user.
///
/// ## Invariants
/// - Core fields are individually validated.
/// - `attributes` never contains a key from [`RESERVED_KEYS`].
///
/// # Examples
/// ```
/// use clinic_session::domain::{Principal, Role};
/// use serde_json::json;
///
/// let principal = Principal::try_from_record(
///     json!({
///         "id": "user1",
///         "email": "sarah.johnson@email.com",
///         "name": "Sarah Johnson",
///         "role": "patient",
///         "constitution": "Vata-Pitta"
///     })
///     .as_object()
///     .cloned()
///     .unwrap_or_default(),
/// )
/// .unwrap();
/// assert_eq!(principal.role(), Role::Patient);
/// assert_eq!(principal.attribute("constitution"), Some(&json!("Vata-Pitta")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PrincipalDto", into = "PrincipalDto")]
pub struct Principal {
    id: PrincipalId,
    email: Email,
    name: DisplayName,
    role: Role,
    attributes: Map<String, Value>,
}

impl Principal {
    /// Build a principal with no profile attributes.
    pub fn new(id: PrincipalId, email: Email, name: DisplayName, role: Role) -> Self {
        Self {
            id,
            email,
            name,
            role,
            attributes: Map::new(),
        }
    }

    /// Attach the role-dependent attribute bag, rejecting reserved keys.
    pub fn with_attributes(
        mut self,
        attributes: Map<String, Value>,
    ) -> Result<Self, PrincipalValidationError> {
        if let Some(key) = attributes
            .keys()
            .find(|key| RESERVED_KEYS.contains(&key.as_str()))
        {
            return Err(PrincipalValidationError::ReservedAttribute { key: key.clone() });
        }
        self.attributes = attributes;
        Ok(self)
    }

    /// Rebuild a principal from its flat record form.
    pub fn try_from_record(
        mut record: Map<String, Value>,
    ) -> Result<Self, PrincipalValidationError> {
        let id = PrincipalId::new(take_string(&mut record, "id"))?;
        let email = Email::new(take_string(&mut record, "email"))?;
        let name = DisplayName::new(take_string(&mut record, "name"))?;
        let role = Role::try_from(take_string(&mut record, "role"))?;
        Self::new(id, email, name, role).with_attributes(record)
    }

    /// Flatten the principal into a single JSON object.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("id".to_owned(), Value::String(self.id.to_string()));
        record.insert("email".to_owned(), Value::String(self.email.to_string()));
        record.insert("name".to_owned(), Value::String(self.name.to_string()));
        record.insert("role".to_owned(), Value::String(self.role.to_string()));
        for (key, value) in &self.attributes {
            record.insert(key.clone(), value.clone());
        }
        record
    }

    /// Stable principal identifier.
    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    /// Email used for login lookups.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Display name rendered on dashboards.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Principal role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Role-dependent profile attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Look up a single profile attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

// Missing or non-string values become empty strings so the field
// constructors report the precise validation failure.
fn take_string(record: &mut Map<String, Value>, key: &str) -> String {
    match record.remove(key) {
        Some(Value::String(value)) => value,
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct PrincipalDto(Map<String, Value>);

impl From<Principal> for PrincipalDto {
    fn from(value: Principal) -> Self {
        Self(value.to_record())
    }
}

impl TryFrom<PrincipalDto> for Principal {
    type Error = PrincipalValidationError;

    fn try_from(value: PrincipalDto) -> Result<Self, Self::Error> {
        Self::try_from_record(value.0)
    }
}
