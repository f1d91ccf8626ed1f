//! Declarative endpoint descriptions.
//!
//! An [`EndpointSpec`] says everything the client needs to know about a
//! Helix endpoint before calling it: method, path, the capability and scopes
//! it requires, and which query parameters and body fields it accepts.
//! Specs are plain `const` data; see the `twitchkit-helix` crate for the
//! catalog.

use serde_json::{Map, Value};
use tracing::debug;

use crate::dispatch::QueryParams;
use crate::error::{Error, Result};
use crate::model::CapabilityRequirement;
use crate::scope::ScopeSet;
use crate::transport::HttpMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Stable identifier, e.g. `get_users`.
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path below the API base URL, with a leading slash.
    pub path: &'static str,
    pub requirement: CapabilityRequirement,
    pub required_scopes: &'static [&'static str],
    pub required_params: &'static [&'static str],
    pub optional_params: &'static [&'static str],
    /// Parameters that must be sent together or not at all.
    pub paired_params: &'static [(&'static str, &'static str)],
    pub required_body_fields: &'static [&'static str],
    pub optional_body_fields: &'static [&'static str],
}

impl EndpointSpec {
    pub const fn new(
        name: &'static str,
        method: HttpMethod,
        path: &'static str,
        requirement: CapabilityRequirement,
    ) -> Self {
        Self {
            name,
            method,
            path,
            requirement,
            required_scopes: &[],
            required_params: &[],
            optional_params: &[],
            paired_params: &[],
            required_body_fields: &[],
            optional_body_fields: &[],
        }
    }

    pub const fn scopes(mut self, scopes: &'static [&'static str]) -> Self {
        self.required_scopes = scopes;
        self
    }

    pub const fn required(mut self, params: &'static [&'static str]) -> Self {
        self.required_params = params;
        self
    }

    pub const fn optional(mut self, params: &'static [&'static str]) -> Self {
        self.optional_params = params;
        self
    }

    pub const fn paired(mut self, pairs: &'static [(&'static str, &'static str)]) -> Self {
        self.paired_params = pairs;
        self
    }

    pub const fn body(
        mut self,
        required: &'static [&'static str],
        optional: &'static [&'static str],
    ) -> Self {
        self.required_body_fields = required;
        self.optional_body_fields = optional;
        self
    }

    pub fn accepts_param(&self, name: &str) -> bool {
        self.required_params.contains(&name) || self.optional_params.contains(&name)
    }

    pub fn accepts_body(&self) -> bool {
        !self.required_body_fields.is_empty() || !self.optional_body_fields.is_empty()
    }

    /// Every required scope must have been granted to the credential.
    pub fn check_scopes(&self, granted: &ScopeSet) -> Result<()> {
        match self.required_scopes.iter().find(|s| !granted.contains(s)) {
            Some(scope) => Err(Error::MissingScope {
                endpoint: self.name.to_string(),
                scope: (*scope).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Required parameters present, no undeclared names, pairs complete.
    pub fn check_params(&self, query: &QueryParams) -> Result<()> {
        for name in self.required_params {
            if !query.is_present(name) {
                return Err(Error::invalid_request(format!(
                    "{} requires the `{}` parameter",
                    self.name, name
                )));
            }
        }

        if let Some(unknown) = query.names().find(|n| !self.accepts_param(n)) {
            return Err(Error::invalid_request(format!(
                "{} does not accept the `{}` parameter",
                self.name, unknown
            )));
        }

        for (a, b) in self.paired_params {
            if query.is_present(a) != query.is_present(b) {
                return Err(Error::invalid_request(format!(
                    "{}: `{}` and `{}` must be used together",
                    self.name, a, b
                )));
            }
        }

        Ok(())
    }

    /// Filter `body` down to the declared fields.
    ///
    /// Undeclared fields are dropped; a missing required field is an error.
    pub fn prepare_body(&self, body: Option<Value>) -> Result<Option<Value>> {
        if !self.accepts_body() {
            return match body {
                Some(_) => Err(Error::invalid_request(format!(
                    "{} does not take a request body",
                    self.name
                ))),
                None => Ok(None),
            };
        }

        let fields = match body {
            Some(Value::Object(fields)) => fields,
            Some(_) => {
                return Err(Error::invalid_request(format!(
                    "{} expects a JSON object body",
                    self.name
                )));
            }
            None if self.required_body_fields.is_empty() => return Ok(None),
            None => Map::new(),
        };

        let mut kept = Map::new();
        for (key, value) in fields {
            if self.required_body_fields.contains(&key.as_str())
                || self.optional_body_fields.contains(&key.as_str())
            {
                kept.insert(key, value);
            } else {
                debug!(endpoint = self.name, field = %key, "dropping undeclared body field");
            }
        }

        for field in self.required_body_fields {
            if kept.get(*field).is_none_or(Value::is_null) {
                return Err(Error::invalid_request(format!(
                    "{} requires the `{}` body field",
                    self.name, field
                )));
            }
        }

        Ok(Some(Value::Object(kept)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const GET_BITS_LEADERBOARD: EndpointSpec = EndpointSpec::new(
        "get_bits_leaderboard",
        HttpMethod::Get,
        "/bits/leaderboard",
        CapabilityRequirement::User,
    )
    .scopes(&["bits:read"])
    .optional(&["count", "period", "started_at", "user_id"])
    .paired(&[("period", "started_at")]);

    const SEND_ANNOUNCEMENT: EndpointSpec = EndpointSpec::new(
        "send_chat_announcement",
        HttpMethod::Post,
        "/chat/announcements",
        CapabilityRequirement::User,
    )
    .required(&["broadcaster_id", "moderator_id"])
    .body(&["message"], &["color"]);

    #[test]
    fn missing_scope_names_the_scope() {
        let granted = ScopeSet::new(["chat:read"]).unwrap();
        let err = GET_BITS_LEADERBOARD.check_scopes(&granted).unwrap_err();
        assert!(matches!(err, Error::MissingScope { scope, .. } if scope == "bits:read"));

        let granted = ScopeSet::new(["bits:read"]).unwrap();
        assert!(GET_BITS_LEADERBOARD.check_scopes(&granted).is_ok());
    }

    #[test]
    fn required_and_unknown_params() {
        let ok = QueryParams::new()
            .scalar("broadcaster_id", "1")
            .scalar("moderator_id", "2");
        assert!(SEND_ANNOUNCEMENT.check_params(&ok).is_ok());

        let missing = QueryParams::new().scalar("broadcaster_id", "1");
        assert!(SEND_ANNOUNCEMENT.check_params(&missing).is_err());

        let absent = QueryParams::new()
            .scalar("broadcaster_id", "1")
            .optional::<&str>("moderator_id", None);
        assert!(SEND_ANNOUNCEMENT.check_params(&absent).is_err());

        let unknown = ok.clone().scalar("first", 10);
        let err = SEND_ANNOUNCEMENT.check_params(&unknown).unwrap_err();
        assert!(err.to_string().contains("`first`"));
    }

    #[test]
    fn paired_params_must_travel_together() {
        let neither = QueryParams::new().scalar("count", 5);
        assert!(GET_BITS_LEADERBOARD.check_params(&neither).is_ok());

        let both = QueryParams::new()
            .scalar("period", "week")
            .scalar("started_at", "2024-01-01T00:00:00Z");
        assert!(GET_BITS_LEADERBOARD.check_params(&both).is_ok());

        let one = QueryParams::new().scalar("period", "week");
        assert!(GET_BITS_LEADERBOARD.check_params(&one).is_err());
    }

    #[test]
    fn body_drops_unknown_fields() {
        let body = SEND_ANNOUNCEMENT
            .prepare_body(Some(json!({"message": "hi", "color": "blue", "extra": 1})))
            .unwrap()
            .unwrap();
        assert_eq!(body, json!({"message": "hi", "color": "blue"}));
    }

    #[test]
    fn body_requires_declared_fields() {
        assert!(SEND_ANNOUNCEMENT.prepare_body(Some(json!({"color": "blue"}))).is_err());
        assert!(SEND_ANNOUNCEMENT.prepare_body(Some(json!({"message": null}))).is_err());
        assert!(SEND_ANNOUNCEMENT.prepare_body(None).is_err());
        assert!(SEND_ANNOUNCEMENT.prepare_body(Some(json!(["message"]))).is_err());
    }

    #[test]
    fn bodyless_endpoint_rejects_body() {
        assert_eq!(GET_BITS_LEADERBOARD.prepare_body(None).unwrap(), None);
        assert!(GET_BITS_LEADERBOARD.prepare_body(Some(json!({}))).is_err());
    }
}
