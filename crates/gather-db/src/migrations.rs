use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                country_code    TEXT NOT NULL,
                phone_number    TEXT NOT NULL,
                password        TEXT NOT NULL,
                display_name    TEXT NOT NULL,
                profile_picture TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(country_code, phone_number)
            );

            -- Both directions of every friendship are stored.
            CREATE TABLE friends (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                friend_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, friend_id),
                CHECK (user_id != friend_id)
            );

            CREATE TABLE friend_requests (
                recipient_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                sender_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (recipient_id, sender_id),
                CHECK (recipient_id != sender_id)
            );

            CREATE INDEX idx_friend_requests_sender ON friend_requests(sender_id);

            CREATE TABLE communities (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT NOT NULL DEFAULT '',
                is_open     INTEGER NOT NULL,
                is_hidden   INTEGER NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE community_owners (
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (community_id, user_id)
            );

            CREATE TABLE community_members (
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (community_id, user_id)
            );

            CREATE INDEX idx_community_members_user ON community_members(user_id);

            -- Requests to join live on the community...
            CREATE TABLE community_requests (
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (community_id, user_id)
            );

            -- ...invites live on the user.
            CREATE TABLE community_invites (
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                inviter_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, community_id)
            );

            CREATE TABLE posts (
                id           TEXT PRIMARY KEY,
                owner_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                community_id TEXT REFERENCES communities(id) ON DELETE CASCADE,
                body         TEXT NOT NULL,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_posts_owner ON posts(owner_id, created_at);
            CREATE INDEX idx_posts_community ON posts(community_id, created_at);

            CREATE TABLE post_likes (
                post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (post_id, user_id)
            );

            CREATE TABLE post_comments (
                id         TEXT PRIMARY KEY,
                post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_post_comments_post ON post_comments(post_id, created_at);

            CREATE TABLE outings (
                id           TEXT PRIMARY KEY,
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                owner_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL DEFAULT '',
                location     TEXT,
                starts_at    TEXT,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_outings_community ON outings(community_id, created_at);

            CREATE TABLE outing_attendees (
                outing_id  TEXT NOT NULL REFERENCES outings(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (outing_id, user_id)
            );

            CREATE TABLE outing_interestees (
                outing_id  TEXT NOT NULL REFERENCES outings(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (outing_id, user_id)
            );

            CREATE TABLE outing_comments (
                id         TEXT PRIMARY KEY,
                outing_id  TEXT NOT NULL REFERENCES outings(id) ON DELETE CASCADE,
                author_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE polls (
                id         TEXT PRIMARY KEY,
                outing_id  TEXT NOT NULL REFERENCES outings(id) ON DELETE CASCADE,
                question   TEXT NOT NULL,
                created_by TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE poll_options (
                id       TEXT PRIMARY KEY,
                poll_id  TEXT NOT NULL REFERENCES polls(id) ON DELETE CASCADE,
                label    TEXT NOT NULL,
                position INTEGER NOT NULL
            );

            CREATE TABLE poll_votes (
                poll_id    TEXT NOT NULL REFERENCES polls(id) ON DELETE CASCADE,
                option_id  TEXT NOT NULL REFERENCES poll_options(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (poll_id, user_id)
            );

            CREATE TABLE notifications (
                id           TEXT PRIMARY KEY,
                recipient_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                actor_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind         TEXT NOT NULL,
                entity_id    TEXT NOT NULL,
                read         INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_recipient ON notifications(recipient_id, read);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
