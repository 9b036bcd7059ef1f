use invoicer_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; every protected handler reads its user id from
/// here and never from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
    email: String,
}

impl UserContext {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
