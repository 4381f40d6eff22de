//! Navigation seam between the session client and whatever renders pages.

use parking_lot::Mutex;

pub mod routes {
    pub const LANDING: &str = "/";
    pub const LOGIN: &str = "/auth?mode=login";
    pub const PARTICIPANT_DASHBOARD: &str = "/participant/dashboard";
    pub const ORGANIZER_DASHBOARD: &str = "/organizer/dashboard";
    pub const SUPER_ADMIN_DASHBOARD: &str = "/super-admin/dashboard";
}

/// Moves the user between routes.
///
/// `push` adds a history entry; `replace` swaps the current one so the
/// back button cannot return to a page the user was bounced from.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
    fn replace(&self, path: &str);
}

/// One recorded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Push(String),
    Replace(String),
}

impl Navigation {
    pub fn path(&self) -> &str {
        match self {
            Navigation::Push(path) | Navigation::Replace(path) => path,
        }
    }
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.history.lock().push(Navigation::Push(path.to_string()));
    }

    fn replace(&self, path: &str) {
        self.history.lock().push(Navigation::Replace(path.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        navigator.push(routes::LOGIN);
        navigator.replace(routes::LANDING);

        assert_eq!(
            navigator.history(),
            vec![
                Navigation::Push("/auth?mode=login".to_string()),
                Navigation::Replace("/".to_string()),
            ]
        );
        assert_eq!(navigator.last().unwrap().path(), "/");
    }
}
