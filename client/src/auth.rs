//! The signed-in session.
//!
//! [`AuthSession`] persists under [`AUTH_KEY`], independently of the data
//! store, and delegates credential checks to an [`AuthGateway`]. It does not
//! serialize concurrent `login`/`signup` calls; callers keep at most one in
//! flight.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{ApiUser, AuthGateway, SignupForm};
use crate::models::{Role, User, UserPatch};
use crate::storage::{load_json, save_json, Storage, AUTH_KEY};
use crate::store::ClientStore;

/// Public landing route.
pub const LANDING_ROUTE: &str = "/";

/// Full navigation the caller performs after logout.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub location: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl User {
    fn from_account(account: ApiUser) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name,
            email: account.email,
            role: account.role,
            department: account.department.unwrap_or_default(),
            year: match account.role {
                Role::Student => account.year,
                Role::Admin => None,
            },
            phone: account.phone.unwrap_or_default(),
            avatar: None,
        }
    }

    fn from_signup(id: i32, form: &SignupForm) -> Self {
        Self {
            id: id.to_string(),
            name: format!("{} {}", form.first_name, form.last_name),
            email: form.email.clone(),
            role: form.role,
            department: form.department.clone(),
            year: match form.role {
                Role::Student => form.year.clone(),
                Role::Admin => None,
            },
            phone: form.phone.clone(),
            avatar: None,
        }
    }
}

pub struct AuthSession<G> {
    gateway: G,
    storage: Arc<dyn Storage>,
    state: SessionState,
    last_error: Option<String>,
}

impl<G> AuthSession<G>
where
    G: AuthGateway,
{
    pub fn new(gateway: G, storage: Arc<dyn Storage>) -> Self {
        let state = match load_json::<SessionState>(storage.as_ref(), AUTH_KEY) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, key = AUTH_KEY, "discarding unreadable session snapshot");
                SessionState::default()
            }
        };

        Self {
            gateway,
            storage,
            state,
            last_error: None,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    /// Why the last `login` or `signup` returned `false`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Signs in as `role`. Fails when the credentials are rejected or the
    /// account holds a different role.
    pub async fn login(&mut self, email: &str, password: &str, role: Role) -> bool {
        let account = match self.gateway.login(email, password).await {
            Ok(auth) => auth.user,
            Err(e) => {
                debug!(error = %e, "login rejected");
                self.last_error = Some(e.to_string());
                return false;
            }
        };

        if account.role != role {
            self.gateway.clear_token();
            self.last_error = Some(format!(
                "This account is not registered as {}",
                role.as_str()
            ));
            return false;
        }

        info!(user_id = account.id, role = role.as_str(), "signed in");
        self.adopt(User::from_account(account));
        true
    }

    pub async fn signup(&mut self, form: SignupForm) -> bool {
        match self.gateway.register(&form).await {
            Ok(auth) => {
                info!(user_id = auth.user.id, role = form.role.as_str(), "account created");
                self.adopt(User::from_signup(auth.user.id, &form));
                true
            }
            Err(e) => {
                debug!(error = %e, "signup rejected");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Ends the session and wipes every persisted namespace.
    pub fn logout(&mut self, store: &mut ClientStore) -> Redirect {
        self.state = SessionState::default();
        self.last_error = None;

        store.clear_user_data();
        store.discard_persisted();
        if let Err(e) = self.storage.remove(AUTH_KEY) {
            warn!(error = %e, key = AUTH_KEY, "session snapshot not removed");
        }
        self.gateway.clear_token();

        info!("signed out");
        Redirect {
            location: LANDING_ROUTE,
        }
    }

    pub fn update_profile(&mut self, patch: UserPatch) {
        let Some(user) = self.state.user.as_mut() else {
            return;
        };
        patch.apply(user);
        self.persist();
    }

    fn adopt(&mut self, user: User) {
        self.state = SessionState {
            user: Some(user),
            is_authenticated: true,
        };
        self.last_error = None;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), AUTH_KEY, &self.state) {
            warn!(error = %e, key = AUTH_KEY, "session snapshot not persisted");
        }
    }
}
