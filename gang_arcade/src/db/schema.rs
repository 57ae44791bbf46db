//! Table definitions.
//!
//! Enumerated columns carry `CHECK` constraints mirroring the Rust enums in
//! [`crate::profile::models`] and [`crate::friendship::models`].

/// DDL applied in order by [`super::Database::migrate`].
pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT,
        email TEXT UNIQUE NOT NULL,
        two_factor_code TEXT,
        two_factor_expires_at INTEGER,
        reset_token_hash TEXT,
        reset_expires_at INTEGER,
        first_name TEXT,
        last_name TEXT,
        date_of_birth TEXT,
        gender TEXT NOT NULL DEFAULT 'other'
            CHECK (gender IN ('male', 'female', 'other')),
        fav_avatar TEXT NOT NULL DEFAULT 'None'
            CHECK (fav_avatar IN ('None', 'QueenOfTheSpoons', 'JustBorn', 'Maslina',
                'BossLady', 'Inka', 'Burek', 'Fish', 'WarMachine', 'Finn',
                'GangGanger', 'StabIlity', 'VampBoy')),
        language TEXT NOT NULL DEFAULT 'english'
            CHECK (language IN ('english', 'serbian', 'finnish', 'russian')),
        wins INTEGER NOT NULL DEFAULT 0,
        losses INTEGER NOT NULL DEFAULT 0,
        profile_pic TEXT,
        online_status TEXT NOT NULL DEFAULT 'offline'
            CHECK (online_status IN ('offline', 'online')),
        last_activity INTEGER NOT NULL DEFAULT 0,
        auth_provider TEXT NOT NULL DEFAULT 'email'
            CHECK (auth_provider IN ('email', 'google')),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS friendships (
        sender_id INTEGER NOT NULL,
        receiver_id INTEGER NOT NULL,
        sender_username TEXT NOT NULL,
        receiver_username TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('Not Friend', 'Pending', 'Friend')),
        PRIMARY KEY (sender_id, receiver_id),
        FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id_game INTEGER PRIMARY KEY AUTOINCREMENT,
        id_user INTEGER NOT NULL,
        date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        rounds_json TEXT NOT NULL,
        game_name TEXT NOT NULL CHECK (game_name IN ('ping-pong', 'tic-tac-toe')),
        FOREIGN KEY (id_user) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_friendships_receiver ON friendships (receiver_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_games_user ON games (id_user)",
];
