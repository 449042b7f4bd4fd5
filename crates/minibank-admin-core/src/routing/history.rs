use super::route::Route;

/// Navigation history with browser-style push/replace/back.
///
/// Never empty: it starts with the initial route and entries are only ever
/// added or overwritten.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Route>,
    index: usize,
}

impl History {
    pub fn new(initial: Route) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Route {
        &self.entries[self.index]
    }

    /// Add an entry after the current one, dropping anything past it.
    pub fn push(&mut self, route: Route) {
        self.entries.truncate(self.index + 1);
        self.entries.push(route);
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry.
    pub fn replace(&mut self, route: Route) {
        self.entries[self.index] = route;
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::AdminPage;

    #[test]
    fn test_push_then_back() {
        let mut history = History::new(Route::Admin(AdminPage::Dashboard));
        assert!(!history.can_go_back());
        history.push(Route::Admin(AdminPage::Users));
        assert!(history.can_go_back());
        assert!(history.back());
        assert_eq!(history.current(), &Route::Admin(AdminPage::Dashboard));
        assert!(!history.back());
    }

    #[test]
    fn test_push_after_back_drops_later_entries() {
        let mut history = History::new(Route::Admin(AdminPage::Dashboard));
        history.push(Route::Admin(AdminPage::Users));
        history.back();
        history.push(Route::Admin(AdminPage::Kyc));
        assert!(history.back());
        assert_eq!(history.current(), &Route::Admin(AdminPage::Dashboard));
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_replace_does_not_add_entry() {
        let mut history = History::new(Route::Root);
        history.replace(Route::Login);
        assert_eq!(history.current(), &Route::Login);
        assert!(!history.can_go_back());
    }
}
