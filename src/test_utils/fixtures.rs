use std::sync::MutexGuard;

use axum::Router;
use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState,
    database_id::{UserId, VenueId},
    reconcile::ReconciliationConfig,
    user::create_user,
    venue::create_venue,
};

/// An initialized in-memory database with one venue and one of its staff.
pub(crate) struct TestVenue {
    pub state: AppState,
    pub venue_id: VenueId,
    pub user_id: UserId,
}

pub(crate) fn new_test_venue() -> TestVenue {
    let state = AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory SQLite database"),
        ReconciliationConfig::default(),
    )
    .expect("Could not create app state");

    let (venue_id, user_id) = {
        let connection = state.db_connection.lock().unwrap();
        let venue = create_venue("Bar Centrale", &connection).expect("Could not create venue");
        let user = create_user("Giulia", venue.id, &connection).expect("Could not create user");
        (venue.id, user.id)
    };

    TestVenue {
        state,
        venue_id,
        user_id,
    }
}

impl TestVenue {
    pub(crate) fn connection(&self) -> MutexGuard<'_, Connection> {
        self.state
            .db_connection
            .lock()
            .expect("Could not acquire database lock")
    }

    /// Add a second venue with its own user, returning `(venue_id, user_id)`.
    pub(crate) fn add_other_venue(&self) -> (VenueId, UserId) {
        let connection = self.connection();
        let venue = create_venue("Pasticceria Lucia", &connection).unwrap();
        let user = create_user("Lucia", venue.id, &connection).unwrap();
        (venue.id, user.id)
    }

    pub(crate) fn server(&self, router: Router<AppState>) -> TestServer {
        TestServer::try_new(router.with_state(self.state.clone()))
            .expect("Could not create test server.")
    }
}
