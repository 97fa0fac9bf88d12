use serde::Deserialize;

/// Request body for registration. Absent and `null` fields both arrive as
/// `None` and are rejected by the handler.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub fullname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}
