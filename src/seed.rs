//! Fixed seed set used to populate an empty store.

use crate::models::{CopyStatus, NewCopy, NewUser, UserRole};

/// The records a migration inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub users: Vec<NewUser>,
    pub copies: Vec<NewCopy>,
}

impl Seed {
    pub fn new(users: Vec<NewUser>, copies: Vec<NewCopy>) -> Self {
        Self { users, copies }
    }

    /// The initial data the admin tool ships with: one user per role and a
    /// few copy entries, including one still waiting for a slug.
    pub fn initial() -> Self {
        let users = vec![
            NewUser::new("admin", "admin@copydesk.local", UserRole::Admin, &["en", "es"]),
            NewUser::new(
                "translator",
                "translator@copydesk.local",
                UserRole::Translator,
                &["es", "fr"],
            ),
            NewUser::new(
                "reviewer",
                "reviewer@copydesk.local",
                UserRole::Reviewer,
                &["es"],
            ),
            NewUser::new(
                "developer",
                "developer@copydesk.local",
                UserRole::Developer,
                &["en"],
            ),
        ];

        let copies = vec![
            NewCopy::new(Some("home.welcome_title"), "Welcome to the dashboard", "en")
                .with_status(CopyStatus::Approved)
                .with_tags(&["home", "title"]),
            NewCopy::new(Some("home.welcome_title"), "Bienvenido al panel", "es")
                .with_status(CopyStatus::Translated)
                .with_tags(&["home", "title"]),
            NewCopy::new(Some("home.welcome_title"), "Bienvenue sur le tableau de bord", "fr")
                .with_status(CopyStatus::Assigned)
                .with_tags(&["home", "title"]),
            NewCopy::new(Some("common.save_button"), "Save changes", "en")
                .with_status(CopyStatus::Reviewed)
                .with_tags(&["button"]),
            NewCopy::new(None, "Your session has expired", "en").with_tags(&["auth"]),
        ];

        Self { users, copies }
    }
}
