use serde::{Deserialize, Serialize};

/// Form body of `POST /login` and `POST /register`.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Page data for the login and register views.
#[derive(Debug, Default, Serialize)]
pub struct AuthPage {
    pub email: String,
    pub error: Option<String>,
}
