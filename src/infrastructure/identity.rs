use std::sync::RwLock;

use crate::domain::catalog::User;
use crate::domain::ports::IdentityProvider;

/// Holds the signed-in user for this process.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user: RwLock<Option<User>>,
}

impl SessionIdentity {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub fn sign_in(&self, user: User) {
        if let Ok(mut current) = self.user.write() {
            log::info!("Signed in as {}", user.id);
            *current = Some(user);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut current) = self.user.write() {
            *current = None;
        }
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.read().ok().and_then(|u| u.clone())
    }
}
