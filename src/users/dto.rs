use serde::Deserialize;

use crate::users::repo_types::UserUpdate;

/// Fields a caller may change through `PUT /users/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    /// Accepted so it can be reported; never applied.
    pub role: Option<String>,
}

impl UserChanges {
    /// Column patch for the store. `role` is dropped; the password must already be hashed.
    pub fn into_update(self, password_hash: Option<String>) -> UserUpdate {
        UserUpdate {
            username: self.username,
            email: self.email,
            password: password_hash,
            department: self.department,
            category: self.category,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}
