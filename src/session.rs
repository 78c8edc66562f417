//! Signed-in role, current view, and their persistence across restarts.
//!
//! Login itself belongs to an external identity provider; the only thing
//! consumed here is whether someone is signed in and which role they were
//! granted. Both that and the last view are kept in a small JSON key/value
//! file under two fixed keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const AUTH_KEY: &str = "smartseed_auth";
pub const VIEW_KEY: &str = "smartseed_currentView";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Landing,
    Dashboard,
    Recommendations,
    Explorer,
    Admin,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Landing,
        View::Dashboard,
        View::Recommendations,
        View::Explorer,
        View::Admin,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Landing => "Home",
            View::Dashboard => "Map Dashboard",
            View::Recommendations => "Seed Recommendations",
            View::Explorer => "Data Explorer",
            View::Admin => "Admin Portal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAuth {
    is_authenticated: bool,
    user_role: Option<Role>,
}

/// Flat string-keyed JSON document on disk
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, serde_json::Value>,
}

impl LocalStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Open `path`, starting empty if the file is missing.
    ///
    /// # Errors
    ///
    /// [`SessionError::Io`] if the file exists but cannot be read, or
    /// [`SessionError::Json`] if it is not a JSON object.
    pub fn open(path: &Path) -> Result<Self, SessionError> {
        let entries = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Open `path`, or fall back to an empty store bound to the same path
    pub fn open_or_default(path: &Path) -> Self {
        Self::open(path).unwrap_or_else(|e| {
            warn!("ignoring unreadable session store: {e}");
            Self {
                path: Some(path.to_path_buf()),
                entries: BTreeMap::new(),
            }
        })
    }

    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, "ignoring malformed session entry: {e}");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Serialization or write failures.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), SessionError> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    fn flush(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, content).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })
    }
}

/// Authenticated role plus the view being shown
#[derive(Debug)]
pub struct Session {
    role: Option<Role>,
    view: View,
    store: LocalStore,
}

impl Session {
    /// Restore from the store; missing or malformed entries mean logged out on the landing view
    pub fn restore(store: LocalStore) -> Self {
        let auth: Option<StoredAuth> = store.get(AUTH_KEY);
        let role = auth.filter(|a| a.is_authenticated).and_then(|a| a.user_role);
        let mut view = store.get(VIEW_KEY).unwrap_or_default();
        let allowed = match view {
            View::Landing => true,
            View::Admin => role == Some(Role::Admin),
            _ => role.is_some(),
        };
        if !allowed {
            view = View::Landing;
        }
        debug!(?role, ?view, "session restored");
        Self { role, view, store }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Record the role granted by the identity provider
    pub fn login(&mut self, role: Role) {
        self.role = Some(role);
        self.persist_auth();
    }

    pub fn logout(&mut self) {
        self.role = None;
        self.view = View::Landing;
        self.persist_auth();
        self.persist_view();
    }

    /// Switch views. Returns false, changing nothing, when a non-admin asks for the admin view.
    pub fn navigate(&mut self, view: View) -> bool {
        if view == View::Admin && !self.is_admin() {
            debug!("admin view refused for role {:?}", self.role);
            return false;
        }
        self.view = view;
        self.persist_view();
        true
    }

    /// Views reachable by the current role
    pub fn available_views(&self) -> impl Iterator<Item = View> + '_ {
        View::ALL
            .into_iter()
            .filter(move |v| *v != View::Admin || self.is_admin())
    }

    fn persist_auth(&mut self) {
        let auth = StoredAuth {
            is_authenticated: self.role.is_some(),
            user_role: self.role,
        };
        if let Err(e) = self.store.set(AUTH_KEY, &auth) {
            warn!("failed to persist auth state: {e}");
        }
    }

    fn persist_view(&mut self) {
        let view = self.view;
        if let Err(e) = self.store.set(VIEW_KEY, &view) {
            warn!("failed to persist current view: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("seedmap-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_user_cannot_navigate_to_admin() {
        let mut session = Session::restore(LocalStore::in_memory());
        session.login(Role::User);
        assert!(session.navigate(View::Dashboard));
        assert!(!session.navigate(View::Admin));
        assert_eq!(session.view(), View::Dashboard);
        assert!(!session.available_views().any(|v| v == View::Admin));
    }

    #[test]
    fn test_admin_can_navigate_to_admin() {
        let mut session = Session::restore(LocalStore::in_memory());
        session.login(Role::Admin);
        assert!(session.navigate(View::Admin));
        assert_eq!(session.view(), View::Admin);
    }

    #[test]
    fn test_logout_returns_to_landing() {
        let mut session = Session::restore(LocalStore::in_memory());
        session.login(Role::Admin);
        session.navigate(View::Explorer);
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.view(), View::Landing);
    }

    #[test]
    fn test_session_survives_restart() {
        let path = temp_path("restart");
        let _ = fs::remove_file(&path);

        let mut session = Session::restore(LocalStore::open(&path).unwrap());
        session.login(Role::Admin);
        session.navigate(View::Recommendations);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[AUTH_KEY]["isAuthenticated"], true);
        assert_eq!(raw[AUTH_KEY]["userRole"], "admin");
        assert_eq!(raw[VIEW_KEY], "recommendations");

        let restored = Session::restore(LocalStore::open(&path).unwrap());
        assert_eq!(restored.role(), Some(Role::Admin));
        assert_eq!(restored.view(), View::Recommendations);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_store_falls_back_to_logged_out() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(LocalStore::open(&path), Err(SessionError::Json(_))));
        let session = Session::restore(LocalStore::open_or_default(&path));
        assert!(!session.is_authenticated());
        assert_eq!(session.view(), View::Landing);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stored_admin_view_requires_admin_role() {
        let mut store = LocalStore::in_memory();
        store
            .set(
                AUTH_KEY,
                &StoredAuth {
                    is_authenticated: true,
                    user_role: Some(Role::User),
                },
            )
            .unwrap();
        store.set(VIEW_KEY, &View::Admin).unwrap();

        let session = Session::restore(store);
        assert_eq!(session.view(), View::Landing);
    }

    #[test]
    fn test_stored_view_requires_login() {
        let path = std::env::temp_dir().join(format!("seedmap-logged-out-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"smartseed_auth":{"isAuthenticated":false,"userRole":null},"smartseed_currentView":"explorer"}"#,
        )
        .unwrap();

        let session = Session::restore(LocalStore::open(&path).unwrap());
        std::fs::remove_file(&path).ok();
        assert!(!session.is_authenticated());
        assert_eq!(session.view(), View::Landing);
    }

    #[test]
    fn test_stored_view_kept_for_signed_in_user() {
        let mut store = LocalStore::in_memory();
        store
            .set(
                AUTH_KEY,
                &StoredAuth {
                    is_authenticated: true,
                    user_role: Some(Role::User),
                },
            )
            .unwrap();
        store.set(VIEW_KEY, &View::Explorer).unwrap();

        assert_eq!(Session::restore(store).view(), View::Explorer);
    }
}
