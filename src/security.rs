use crate::document::SecurityRequirement;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// OpenAPI Security Scheme object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        flows: OAuthFlows,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

impl ApiKeyLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyLocation::Query => "query",
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Cookie => "cookie",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Scope name -> description
    pub scopes: IndexMap<String, String>,
}

impl OAuthFlow {
    pub fn new<I, K, V>(scopes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Default::default()
        }
    }

    pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }
}

impl SecurityScheme {
    pub fn basic() -> Self {
        SecurityScheme::Http {
            scheme: "basic".to_string(),
            bearer_format: None,
            description: None,
        }
    }

    pub fn bearer(format: Option<&str>) -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: format.map(str::to_string),
            description: None,
        }
    }

    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        SecurityScheme::ApiKey {
            name: name.into(),
            location,
            description: None,
        }
    }

    pub fn oauth2(flows: OAuthFlows) -> Self {
        SecurityScheme::OAuth2 {
            flows,
            description: None,
        }
    }

    pub fn open_id_connect(url: impl Into<String>) -> Self {
        SecurityScheme::OpenIdConnect {
            open_id_connect_url: url.into(),
            description: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SecurityScheme::ApiKey { .. } => "apiKey",
            SecurityScheme::Http { .. } => "http",
            SecurityScheme::OAuth2 { .. } => "oauth2",
            SecurityScheme::OpenIdConnect { .. } => "openIdConnect",
        }
    }

    /// Name derived from the scheme's structure, so identical schemes share one component
    ///
    /// `http` + `bearer` + `JWT` becomes `http_bearer_JWT`; oauth2 appends its flow names.
    pub fn auto_name(&self) -> String {
        let mut parts = vec![self.type_name().to_string()];
        match self {
            SecurityScheme::ApiKey { location, .. } => parts.push(location.as_str().to_string()),
            SecurityScheme::Http {
                scheme,
                bearer_format,
                ..
            } => {
                parts.push(scheme.clone());
                parts.extend(bearer_format.clone());
            }
            SecurityScheme::OAuth2 { flows, .. } => {
                let names = [
                    (flows.password.is_some(), "password"),
                    (flows.client_credentials.is_some(), "clientCredentials"),
                    (flows.authorization_code.is_some(), "authorizationCode"),
                    (flows.implicit.is_some(), "implicit"),
                ];
                parts.extend(
                    names
                        .iter()
                        .filter(|(present, _)| *present)
                        .map(|(_, name)| name.to_string()),
                );
            }
            SecurityScheme::OpenIdConnect { .. } => {}
        }
        parts.join("_")
    }

    /// Every scope defined by the scheme's OAuth flows
    pub fn all_scopes(&self) -> Vec<String> {
        let SecurityScheme::OAuth2 { flows, .. } = self else {
            return Vec::new();
        };
        let mut scopes: Vec<String> = Vec::new();
        for flow in [
            &flows.implicit,
            &flows.authorization_code,
            &flows.client_credentials,
            &flows.password,
        ]
        .into_iter()
        .flatten()
        {
            for scope in flow.scopes.keys() {
                if !scopes.contains(scope) {
                    scopes.push(scope.clone());
                }
            }
        }
        scopes
    }
}

/// A security scheme applied to a route, with the scopes the route requires
#[derive(Debug, Clone, PartialEq)]
pub struct AuthScheme {
    /// Component name; derived from the scheme when absent
    pub id: Option<String>,
    pub scopes: Vec<String>,
    pub scheme: SecurityScheme,
}

impl AuthScheme {
    pub fn new(scheme: SecurityScheme) -> Self {
        Self {
            id: None,
            scopes: Vec::new(),
            scheme,
        }
    }

    pub fn named(id: impl Into<String>, scheme: SecurityScheme) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(scheme)
        }
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.scheme.auto_name())
    }

    /// Requirement entry: declared scopes, or every scope of the scheme when none are declared
    pub fn requirement(&self) -> SecurityRequirement {
        let scopes = if self.scopes.is_empty() {
            self.scheme.all_scopes()
        } else {
            self.scopes.clone()
        };
        IndexMap::from([(self.name(), scopes)])
    }

    /// Adds the scopes of `other` that are not present yet
    pub fn merge_scopes(&mut self, other: &AuthScheme) {
        for scope in &other.scopes {
            if !self.scopes.contains(scope) {
                self.scopes.push(scope.clone());
            }
        }
    }
}
