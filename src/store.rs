//! Persistence: four operations against one SurrealDB document table.

use chrono::Utc;
use log::info;
use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{RecordId, Surreal};

use crate::config::DatabaseConfig;
use crate::error::KeeperError;
use crate::model::Recipe;

const TABLE: &str = "recipe";

/// Full-text search setup: one analyzer, one BM25 index per searched field.
/// All statements are idempotent so reconnecting is safe.
const SCHEMA: &str = "\
DEFINE ANALYZER IF NOT EXISTS recipe_text TOKENIZERS class FILTERS lowercase, ascii;
DEFINE INDEX IF NOT EXISTS recipe_title_txt ON TABLE recipe FIELDS title SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_ingredients_txt ON TABLE recipe FIELDS ingredients SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_instructions_txt ON TABLE recipe FIELDS instructions SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_cuisine_txt ON TABLE recipe FIELDS cuisine SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_meal_type_txt ON TABLE recipe FIELDS meal_type SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_description_txt ON TABLE recipe FIELDS description SEARCH ANALYZER recipe_text BM25;
DEFINE INDEX IF NOT EXISTS recipe_keywords_txt ON TABLE recipe FIELDS keywords SEARCH ANALYZER recipe_text BM25;
";

const SEARCH_SQL: &str = "\
SELECT *, \
search::score(0) + search::score(1) + search::score(2) + search::score(3) \
+ search::score(4) + search::score(5) + search::score(6) AS score \
FROM recipe \
WHERE title @0@ $query \
OR ingredients @1@ $query \
OR instructions @2@ $query \
OR cuisine @3@ $query \
OR meal_type @4@ $query \
OR description @5@ $query \
OR keywords @6@ $query \
ORDER BY score DESC";

/// Sort orders offered by the browse tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Title => "title",
        }
    }

    /// Anything unrecognized falls back to newest-first.
    pub fn parse(value: &str) -> Self {
        match value {
            "oldest" => SortOrder::Oldest,
            "title" => SortOrder::Title,
            _ => SortOrder::Newest,
        }
    }
}

/// Handle to the recipe collection.
#[derive(Clone)]
pub struct RecipeStore {
    db: Surreal<Any>,
}

impl RecipeStore {
    /// Connect per configuration and make sure the search indexes exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, KeeperError> {
        let endpoint = config.endpoint()?;
        let db = connect(endpoint.as_str()).await?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }
        db.use_ns(&config.namespace).use_db(&config.database).await?;
        info!("connected to document store at {endpoint}");

        let store = Self { db };
        store.define_schema().await?;
        Ok(store)
    }

    /// In-memory store, used by tests and by `endpoint = "memory"` setups.
    pub async fn connect_memory() -> Result<Self, KeeperError> {
        let db = connect("mem://").await?;
        db.use_ns("keeper").use_db("recipes").await?;
        let store = Self { db };
        store.define_schema().await?;
        Ok(store)
    }

    async fn define_schema(&self) -> Result<(), KeeperError> {
        self.db.query(SCHEMA).await?.check()?;
        Ok(())
    }

    /// Insert a recipe, stamping `added_on`, and return the new id.
    pub async fn insert(&self, recipe: &Recipe) -> Result<RecordId, KeeperError> {
        let mut document = recipe.clone();
        document.added_on = Some(Utc::now().into());

        let created: Option<Recipe> = self.db.create(TABLE).content(document).await?;
        created
            .and_then(|record| record.id)
            .ok_or_else(|| KeeperError::Store("insert returned no record".to_string()))
    }

    /// Every saved recipe in the requested order.
    pub async fn list_all(&self, order: SortOrder) -> Result<Vec<Recipe>, KeeperError> {
        let sql = match order {
            SortOrder::Newest => "SELECT * FROM recipe ORDER BY added_on DESC",
            SortOrder::Oldest => "SELECT * FROM recipe ORDER BY added_on ASC",
            SortOrder::Title => "SELECT * FROM recipe ORDER BY title ASC",
        };
        let mut response = self.db.query(sql).await?;
        Ok(response.take(0)?)
    }

    /// Native full-text search across the indexed fields, best match first.
    /// Guarding against empty query text is the caller's job.
    pub async fn search(&self, query: &str) -> Result<Vec<Recipe>, KeeperError> {
        let mut response = self
            .db
            .query(SEARCH_SQL)
            .bind(("query", query.to_string()))
            .await?;
        Ok(response.take(0)?)
    }

    /// Delete by record key; `Ok(false)` when nothing matched.
    pub async fn delete(&self, id: &str) -> Result<bool, KeeperError> {
        let deleted: Option<Recipe> = self.db.delete((TABLE, id)).await?;
        Ok(deleted.is_some())
    }
}
