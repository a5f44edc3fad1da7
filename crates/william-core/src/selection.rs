// ── Selection state machine ──
//
// Tracks the "current" entity of a list view. Re-evaluated against every
// fetched list so the selection is always empty or a member of it.

use serde::Serialize;

/// Current selection of a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

/// How a view reacts when its list changes while nothing is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Select the first entry of a non-empty list.
    FirstAvailable,
    /// Only clear a stale selection; never pick one.
    Manual,
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Selected(id) => Some(id),
            Self::Unselected => None,
        }
    }

    /// The selected id, or `""` when unselected.
    pub fn as_key(&self) -> &str {
        self.id().unwrap_or_default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.id() == Some(id)
    }

    /// Explicit selection. An empty id clears.
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        *self = if id.is_empty() {
            Self::Unselected
        } else {
            Self::Selected(id)
        };
    }

    pub fn clear(&mut self) {
        *self = Self::Unselected;
    }

    /// Reconcile against the latest list of ids. Returns `true` if the
    /// selection changed.
    pub fn reconcile<'a, I>(&mut self, ids: I, policy: SelectionPolicy) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids = ids.into_iter();
        let next = match self {
            Self::Selected(current) => {
                if ids.any(|id| id == current.as_str()) {
                    return false;
                }
                Self::Unselected
            }
            Self::Unselected => match (policy, ids.next()) {
                (SelectionPolicy::FirstAvailable, Some(first)) => Self::Selected(first.to_owned()),
                _ => return false,
            },
        };
        *self = next;
        true
    }
}
