// Catalog store and query layer (SQLite via sqlx).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

/// Which half of a round an operator plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Attacker => "Attacker",
            Side::Defender => "Defender",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("attacker") {
            Ok(Side::Attacker)
        } else if s.eq_ignore_ascii_case("defender") {
            Ok(Side::Defender)
        } else {
            Err(format!("unknown side '{s}' (expected Attacker or Defender)"))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Operator {
    pub id: i64,
    pub name: String,
    pub side: Side,
    pub ability: String,
    /// Comma-separated.
    pub secondary_gadgets: String,
    pub armor: i32,
    pub speed: i32,
    pub role: String,
    pub short_bio: String,
    /// Comma-separated operator names.
    pub synergy_examples: String,
    /// Comma-separated operator names.
    pub counter_examples: String,
    pub solo_friendly: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Map {
    pub id: i64,
    pub name: String,
    pub image_url: String,
    /// Comma-separated free-text site labels.
    pub defender_sites: String,
    pub electricity_needed: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InfoSection {
    pub id: i64,
    pub section_title: String,
    pub content: String,
}

/// Operator record as it appears in a seed document.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOperator {
    pub name: String,
    pub side: Side,
    pub ability: String,
    #[serde(default)]
    pub secondary_gadgets: String,
    pub armor: i32,
    pub speed: i32,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub short_bio: String,
    #[serde(default)]
    pub synergy_examples: String,
    #[serde(default)]
    pub counter_examples: String,
    #[serde(default)]
    pub solo_friendly: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMap {
    pub name: String,
    pub image_url: String,
    pub defender_sites: String,
    pub electricity_needed: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInfoSection {
    pub section_title: String,
    pub content: String,
}

const OPERATOR_COLUMNS: &str = "id, name, side, ability, secondary_gadgets, armor, speed, role, short_bio, synergy_examples, counter_examples, solo_friendly";
const MAP_COLUMNS: &str = "id, name, image_url, defender_sites, electricity_needed, description";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // Every in-memory connection would otherwise need its own migrations.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS operators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
                side TEXT NOT NULL CHECK (side IN ('Attacker', 'Defender')),
                ability TEXT NOT NULL,
                secondary_gadgets TEXT NOT NULL DEFAULT '',
                armor INTEGER NOT NULL CHECK (armor BETWEEN 1 AND 3),
                speed INTEGER NOT NULL CHECK (speed BETWEEN 1 AND 3),
                role TEXT NOT NULL DEFAULT '',
                short_bio TEXT NOT NULL DEFAULT '',
                synergy_examples TEXT NOT NULL DEFAULT '',
                counter_examples TEXT NOT NULL DEFAULT '',
                solo_friendly BOOLEAN NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS maps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
                image_url TEXT NOT NULL,
                defender_sites TEXT NOT NULL,
                electricity_needed BOOLEAN NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                section_title TEXT NOT NULL,
                content TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Operators ─────────────────────────────────────────────────────

    /// Insert an operator unless one with the same name exists.
    /// Returns `None` when the name was already taken.
    pub async fn insert_operator(&self, op: &NewOperator) -> Result<Option<Operator>, sqlx::Error> {
        let sql = format!(
            "INSERT INTO operators (name, side, ability, secondary_gadgets, armor, speed, role, short_bio, synergy_examples, counter_examples, solo_friendly) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(name) DO NOTHING RETURNING {OPERATOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Operator>(&sql)
            .bind(&op.name)
            .bind(op.side)
            .bind(&op.ability)
            .bind(&op.secondary_gadgets)
            .bind(op.armor)
            .bind(op.speed)
            .bind(&op.role)
            .bind(&op.short_bio)
            .bind(&op.synergy_examples)
            .bind(&op.counter_examples)
            .bind(op.solo_friendly)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_operators(&self) -> Result<Vec<Operator>, sqlx::Error> {
        let sql = format!("SELECT {OPERATOR_COLUMNS} FROM operators ORDER BY side, name");
        sqlx::query_as::<_, Operator>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_operators_by_side(&self, side: Side) -> Result<Vec<Operator>, sqlx::Error> {
        let sql = format!("SELECT {OPERATOR_COLUMNS} FROM operators WHERE side = ? ORDER BY name");
        sqlx::query_as::<_, Operator>(&sql)
            .bind(side)
            .fetch_all(&self.pool)
            .await
    }

    /// Exact, case-sensitive name lookup.
    pub async fn find_operator_by_name(&self, name: &str) -> Result<Option<Operator>, sqlx::Error> {
        let sql = format!("SELECT {OPERATOR_COLUMNS} FROM operators WHERE name = ?");
        sqlx::query_as::<_, Operator>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lookup by URL slug (`kafe-dostoyevsky` style, case-insensitive).
    pub async fn find_operator_by_slug(&self, slug: &str) -> Result<Option<Operator>, sqlx::Error> {
        let sql = format!(
            "SELECT {OPERATOR_COLUMNS} FROM operators WHERE lower(replace(name, ' ', '-')) = ?"
        );
        sqlx::query_as::<_, Operator>(&sql)
            .bind(slug.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
    }

    /// Operators on `side` whose name exactly matches one of `names`.
    /// Result order is by name, not by the order of `names`.
    pub async fn find_operators_by_names(
        &self,
        names: &[String],
        side: Side,
    ) -> Result<Vec<Operator>, sqlx::Error> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {OPERATOR_COLUMNS} FROM operators WHERE side = "
        ));
        builder.push_bind(side);
        builder.push(" AND name IN (");
        let mut separated = builder.separated(", ");
        for name in names {
            separated.push_bind(name);
        }
        separated.push_unseparated(") ORDER BY name");

        builder
            .build_query_as::<Operator>()
            .fetch_all(&self.pool)
            .await
    }

    /// Case-insensitive substring search on operator names, ordered by name.
    /// Case folding is Unicode-aware, so `JÄG` finds `Jäger`. A blank query matches nothing.
    pub async fn search_operators(&self, query: &str) -> Result<Vec<Operator>, sqlx::Error> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<Operator> = self
            .list_operators()
            .await?
            .into_iter()
            .filter(|op| op.name.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    // ── Maps ──────────────────────────────────────────────────────────

    /// Insert a map unless one with the same name exists.
    pub async fn insert_map(&self, map: &NewMap) -> Result<Option<Map>, sqlx::Error> {
        let sql = format!(
            "INSERT INTO maps (name, image_url, defender_sites, electricity_needed, description) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT(name) DO NOTHING RETURNING {MAP_COLUMNS}"
        );
        sqlx::query_as::<_, Map>(&sql)
            .bind(&map.name)
            .bind(&map.image_url)
            .bind(&map.defender_sites)
            .bind(map.electricity_needed)
            .bind(&map.description)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_maps(&self) -> Result<Vec<Map>, sqlx::Error> {
        let sql = format!("SELECT {MAP_COLUMNS} FROM maps ORDER BY name");
        sqlx::query_as::<_, Map>(&sql).fetch_all(&self.pool).await
    }

    pub async fn find_map_by_name(&self, name: &str) -> Result<Option<Map>, sqlx::Error> {
        let sql = format!("SELECT {MAP_COLUMNS} FROM maps WHERE name = ?");
        sqlx::query_as::<_, Map>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_map_by_slug(&self, slug: &str) -> Result<Option<Map>, sqlx::Error> {
        let sql =
            format!("SELECT {MAP_COLUMNS} FROM maps WHERE lower(replace(name, ' ', '-')) = ?");
        sqlx::query_as::<_, Map>(&sql)
            .bind(slug.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
    }

    // ── Info sections ─────────────────────────────────────────────────

    pub async fn insert_info_section(
        &self,
        section: &NewInfoSection,
    ) -> Result<InfoSection, sqlx::Error> {
        sqlx::query_as::<_, InfoSection>(
            "INSERT INTO game_info (section_title, content) VALUES (?, ?) RETURNING id, section_title, content",
        )
        .bind(&section.section_title)
        .bind(&section.content)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn count_info_sections(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM game_info")
            .fetch_one(&self.pool)
            .await
    }

    /// All sections in insertion order.
    pub async fn list_info_sections(&self) -> Result<Vec<InfoSection>, sqlx::Error> {
        sqlx::query_as::<_, InfoSection>(
            "SELECT id, section_title, content FROM game_info ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }
}
