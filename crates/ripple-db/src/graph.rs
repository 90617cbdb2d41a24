//! Friend graph operations. Every operation runs its precondition checks
//! and both sides of the update inside a single transaction, so the
//! symmetric invariant cannot be observed half-applied and two racing
//! operations on the same pair serialize cleanly.

use anyhow::anyhow;
use rusqlite::{Connection, Transaction};
use thiserror::Error;

use crate::Database;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("user not found")]
    UserMissing,
    #[error("already friends")]
    AlreadyFriends,
    #[error("friend request pending")]
    RequestPending,
    #[error("no pending friend request")]
    NoPendingRequest,
    #[error("not friends")]
    NotFriends,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for GraphError {
    fn from(e: rusqlite::Error) -> Self {
        GraphError::Store(e.into())
    }
}

impl Database {
    /// Record a pending request from `uid` to `friend_id`. Rejected when the
    /// pair is already linked by a friendship or by a pending request in
    /// either direction, keeping the pair in at most one relationship state.
    pub fn send_friend_request(&self, uid: &str, friend_id: &str) -> Result<(), GraphError> {
        self.with_graph_tx(|tx| {
            require_users(tx, uid, friend_id)?;

            if are_friends(tx, uid, friend_id)? {
                return Err(GraphError::AlreadyFriends);
            }
            if request_pending(tx, uid, friend_id)? || request_pending(tx, friend_id, uid)? {
                return Err(GraphError::RequestPending);
            }

            tx.execute(
                "INSERT INTO friend_requests (sender, receiver) VALUES (?1, ?2)",
                (uid, friend_id),
            )?;
            Ok(())
        })
    }

    /// Promote a pending `requester_id` → `uid` request to a friendship.
    pub fn accept_friend_request(&self, uid: &str, requester_id: &str) -> Result<(), GraphError> {
        self.with_graph_tx(|tx| {
            require_users(tx, uid, requester_id)?;

            if are_friends(tx, uid, requester_id)? {
                return Err(GraphError::AlreadyFriends);
            }
            if !request_pending(tx, requester_id, uid)? {
                return Err(GraphError::NoPendingRequest);
            }

            tx.execute(
                "DELETE FROM friend_requests WHERE sender = ?1 AND receiver = ?2",
                (requester_id, uid),
            )?;

            let (a, b) = ordered_pair(uid, requester_id);
            tx.execute("INSERT INTO friendships (user_a, user_b) VALUES (?1, ?2)", (a, b))?;
            Ok(())
        })
    }

    /// Drop a pending `requester_id` → `uid` request without linking.
    pub fn decline_friend_request(&self, uid: &str, requester_id: &str) -> Result<(), GraphError> {
        self.with_graph_tx(|tx| {
            require_users(tx, uid, requester_id)?;

            if !request_pending(tx, requester_id, uid)? {
                return Err(GraphError::NoPendingRequest);
            }

            tx.execute(
                "DELETE FROM friend_requests WHERE sender = ?1 AND receiver = ?2",
                (requester_id, uid),
            )?;
            Ok(())
        })
    }

    /// Dissolve an existing friendship between `uid` and `friend_id`.
    pub fn remove_friend(&self, uid: &str, friend_id: &str) -> Result<(), GraphError> {
        self.with_graph_tx(|tx| {
            require_users(tx, uid, friend_id)?;

            if !are_friends(tx, uid, friend_id)? {
                return Err(GraphError::NotFriends);
            }

            let (a, b) = ordered_pair(uid, friend_id);
            tx.execute(
                "DELETE FROM friendships WHERE user_a = ?1 AND user_b = ?2",
                (a, b),
            )?;
            Ok(())
        })
    }

    fn with_graph_tx<F>(&self, f: F) -> Result<(), GraphError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<(), GraphError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| GraphError::Store(anyhow!("DB lock poisoned: {}", e)))?;

        let tx = conn.transaction()?;
        f(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a < b { (a, b) } else { (b, a) }
}

fn require_users(conn: &Connection, a: &str, b: &str) -> Result<(), GraphError> {
    if !user_exists(conn, a)? || !user_exists(conn, b)? {
        return Err(GraphError::UserMissing);
    }
    Ok(())
}

fn user_exists(conn: &Connection, id: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )
}

fn are_friends(conn: &Connection, a: &str, b: &str) -> Result<bool, rusqlite::Error> {
    let (lo, hi) = ordered_pair(a, b);
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_a = ?1 AND user_b = ?2)",
        [lo, hi],
        |row| row.get(0),
    )
}

fn request_pending(conn: &Connection, sender: &str, receiver: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM friend_requests WHERE sender = ?1 AND receiver = ?2)",
        [sender, receiver],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::GraphError;
    use crate::{Database, generate_id};

    fn seed_user(db: &Database, username: &str) -> String {
        let id = generate_id();
        assert!(
            db.create_user(&id, username, "$argon2id$fake", "Test", "User", "t@example.com")
                .unwrap()
        );
        id
    }

    fn graph_of(db: &Database, id: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
        let p = db.load_profile(id).unwrap().unwrap();
        (p.friends, p.sent, p.received)
    }

    #[test]
    fn accept_links_both_sides_and_clears_pending() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        db.accept_friend_request(&bob, &alice).unwrap();

        let (a_friends, a_sent, a_recv) = graph_of(&db, &alice);
        let (b_friends, b_sent, b_recv) = graph_of(&db, &bob);

        assert_eq!(a_friends, vec![bob.clone()]);
        assert_eq!(b_friends, vec![alice.clone()]);
        assert!(a_sent.is_empty() && a_recv.is_empty());
        assert!(b_sent.is_empty() && b_recv.is_empty());
    }

    #[test]
    fn duplicate_request_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        let err = db.send_friend_request(&alice, &bob).unwrap_err();
        assert!(matches!(err, GraphError::RequestPending));
    }

    #[test]
    fn reverse_pending_request_is_a_conflict() {
        // A→B pending excludes B→A: the pair may hold at most one
        // relationship state at a time.
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        let err = db.send_friend_request(&bob, &alice).unwrap_err();
        assert!(matches!(err, GraphError::RequestPending));
    }

    #[test]
    fn request_between_friends_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        db.accept_friend_request(&bob, &alice).unwrap();

        let err = db.send_friend_request(&bob, &alice).unwrap_err();
        assert!(matches!(err, GraphError::AlreadyFriends));
    }

    #[test]
    fn accept_without_pending_never_succeeds() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let err = db.accept_friend_request(&bob, &alice).unwrap_err();
        assert!(matches!(err, GraphError::NoPendingRequest));

        // Accepting in the wrong direction must not work either: the
        // request is alice→bob, only bob may accept it.
        db.send_friend_request(&alice, &bob).unwrap();
        let err = db.accept_friend_request(&alice, &bob).unwrap_err();
        assert!(matches!(err, GraphError::NoPendingRequest));
    }

    #[test]
    fn decline_clears_pending_and_allows_retry() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        db.decline_friend_request(&bob, &alice).unwrap();

        let (_, a_sent, _) = graph_of(&db, &alice);
        let (_, _, b_recv) = graph_of(&db, &bob);
        assert!(a_sent.is_empty());
        assert!(b_recv.is_empty());

        let err = db.decline_friend_request(&bob, &alice).unwrap_err();
        assert!(matches!(err, GraphError::NoPendingRequest));

        // Declined is not banned: a fresh request goes through.
        db.send_friend_request(&alice, &bob).unwrap();
    }

    #[test]
    fn remove_clears_both_sides() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.send_friend_request(&alice, &bob).unwrap();
        db.accept_friend_request(&bob, &alice).unwrap();
        db.remove_friend(&bob, &alice).unwrap();

        let (a_friends, _, _) = graph_of(&db, &alice);
        let (b_friends, _, _) = graph_of(&db, &bob);
        assert!(a_friends.is_empty());
        assert!(b_friends.is_empty());

        let err = db.remove_friend(&bob, &alice).unwrap_err();
        assert!(matches!(err, GraphError::NotFriends));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let ghost = generate_id();

        let err = db.send_friend_request(&alice, &ghost).unwrap_err();
        assert!(matches!(err, GraphError::UserMissing));

        let err = db.remove_friend(&ghost, &alice).unwrap_err();
        assert!(matches!(err, GraphError::UserMissing));
    }
}
