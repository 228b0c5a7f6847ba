//! SQLite-backed person store

use async_trait::async_trait;
use people_common::config::PaginationConfig;
use people_common::db::PERSONS_TABLE;
use people_common::{
    EnrichedPerson, EnrichmentResult, Error, FullPerson, Gender, Person, PersonUpdate, Result,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use super::{PersonPage, PersonStore};
use crate::query::{PersonFilter, QueryPlanner, PERSON_COLUMNS};

const PERSON_EXISTS: &str = "person already exists";
const PERSON_NOT_FOUND: &str = "person not found";

/// Person store over a SQLite pool
#[derive(Clone)]
pub struct SqlitePersonStore {
    pool: SqlitePool,
    planner: QueryPlanner,
}

impl SqlitePersonStore {
    pub fn new(pool: SqlitePool, pagination: PaginationConfig) -> Self {
        Self {
            pool,
            planner: QueryPlanner::new(pagination),
        }
    }
}

#[async_trait]
impl PersonStore for SqlitePersonStore {
    async fn create(&self, person: &EnrichedPerson) -> Result<i64> {
        let EnrichedPerson { person, enrichment } = person;

        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (name, surname, patronymic, age, gender, nationality) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
            PERSONS_TABLE
        ))
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.patronymic)
        .bind(enrichment.age.map(i64::from))
        .bind(enrichment.gender.map(|g| g.as_str()))
        .bind(&enrichment.nationality)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        debug!(id, "Person inserted");
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<FullPerson> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            PERSON_COLUMNS, PERSONS_TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => person_from_row(&row),
            None => Err(Error::NotFound(PERSON_NOT_FOUND.to_string())),
        }
    }

    async fn list(&self, filter: &PersonFilter) -> Result<PersonPage> {
        let mut plan = self.planner.plan(filter);

        let total: i64 = plan
            .count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        let total = u64::try_from(total).unwrap_or(0);

        // Past the end: empty page, real total
        if plan.offset >= total {
            return Ok(PersonPage {
                persons: Vec::new(),
                total,
                limit: plan.limit,
                offset: plan.offset,
            });
        }

        let rows = plan.page.build().fetch_all(&self.pool).await?;
        let persons = rows
            .iter()
            .map(person_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(PersonPage {
            persons,
            total,
            limit: plan.limit,
            offset: plan.offset,
        })
    }

    async fn update(&self, id: i64, update: &PersonUpdate) -> Result<FullPerson> {
        if update.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", PERSONS_TABLE));
        {
            let mut assignments = builder.separated(", ");
            for (column, value) in [
                ("name", &update.name),
                ("surname", &update.surname),
                ("patronymic", &update.patronymic),
                ("nationality", &update.nationality),
            ] {
                if let Some(value) = value {
                    assignments.push(format!("{} = ", column));
                    assignments.push_bind_unseparated(value.clone());
                }
            }
            if let Some(age) = update.age {
                assignments.push("age = ");
                assignments.push_bind_unseparated(i64::from(age));
            }
            if let Some(gender) = update.gender {
                assignments.push("gender = ");
                assignments.push_bind_unseparated(gender.as_str());
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", PERSON_COLUMNS));

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)?;

        match row {
            Some(row) => person_from_row(&row),
            None => Err(Error::NotFound(PERSON_NOT_FOUND.to_string())),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", PERSONS_TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(PERSON_NOT_FOUND.to_string()));
        }
        Ok(())
    }
}

/// Unique violations become `AlreadyExists`
fn write_error(err: sqlx::Error) -> Error {
    let unique_violation = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());
    if unique_violation {
        Error::AlreadyExists(PERSON_EXISTS.to_string())
    } else {
        Error::Database(err)
    }
}

fn person_from_row(row: &SqliteRow) -> Result<FullPerson> {
    let age: Option<i64> = row.try_get("age")?;
    let age = age
        .map(u8::try_from)
        .transpose()
        .map_err(|_| Error::Internal(format!("stored age out of range: {:?}", age)))?;

    let gender: Option<String> = row.try_get("gender")?;
    let gender = gender
        .as_deref()
        .map(str::parse::<Gender>)
        .transpose()
        .map_err(Error::Internal)?;

    Ok(FullPerson {
        id: row.try_get("id")?,
        enriched: EnrichedPerson::new(
            Person {
                name: row.try_get("name")?,
                surname: row.try_get("surname")?,
                patronymic: row.try_get("patronymic")?,
            },
            EnrichmentResult {
                age,
                gender,
                nationality: row.try_get("nationality")?,
            },
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use people_common::db::init_in_memory;

    async fn store() -> SqlitePersonStore {
        let pool = init_in_memory().await.expect("Should open in-memory database");
        SqlitePersonStore::new(pool, PaginationConfig::default())
    }

    fn enriched(name: &str, surname: &str, age: Option<u8>, gender: Option<Gender>) -> EnrichedPerson {
        EnrichedPerson::new(
            Person {
                name: name.to_string(),
                surname: surname.to_string(),
                patronymic: None,
            },
            EnrichmentResult {
                age,
                gender,
                nationality: Some("RU".to_string()),
            },
        )
    }

    async fn seed(store: &SqlitePersonStore, count: usize) -> Vec<i64> {
        let mut ids = Vec::new();
        for i in 0..count {
            let person = enriched(&format!("Name{:02}", i), "Petrov", Some(20 + i as u8), None);
            ids.push(store.create(&person).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = store().await;
        let mut person = enriched("Dmitriy", "Ushakov", Some(42), Some(Gender::Male));
        person.person.patronymic = Some("Vasilevich".to_string());

        let id = store.create(&person).await.unwrap();
        let fetched = store.get_by_id(id).await.unwrap();

        assert_eq!(fetched.id, id);
        assert_eq!(fetched.enriched, person);
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let store = store().await;
        let person = enriched("Dmitriy", "Ushakov", None, None);

        store.create(&person).await.unwrap();
        let err = store.create(&person).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = store().await;
        assert!(matches!(store.get_by_id(99).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let store = store().await;
        let ids = seed(&store, 12).await;

        let filter = PersonFilter {
            limit: Some(5),
            offset: Some(5),
            ..Default::default()
        };
        let page = store.list(&filter).await.unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(
            page.persons.iter().map(|p| p.id).collect::<Vec<_>>(),
            ids[5..10].to_vec()
        );

        let filter = PersonFilter {
            limit: Some(5),
            offset: Some(10),
            ..Default::default()
        };
        let page = store.list(&filter).await.unwrap();
        assert_eq!(page.persons.len(), 2);
        assert_eq!(page.total, 12);
    }

    #[tokio::test]
    async fn test_list_uses_default_window() {
        let store = store().await;
        seed(&store, 7).await;

        let page = store.list(&PersonFilter::default()).await.unwrap();
        assert_eq!((page.limit, page.offset), (5, 0));
        assert_eq!(page.persons.len(), 5);
        assert_eq!(page.total, 7);
    }

    #[tokio::test]
    async fn test_list_offset_beyond_total() {
        let store = store().await;
        seed(&store, 3).await;

        let filter = PersonFilter {
            offset: Some(10),
            ..Default::default()
        };
        let page = store.list(&filter).await.unwrap();
        assert!(page.persons.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.offset, 10);
    }

    #[tokio::test]
    async fn test_list_filter_combination() {
        let store = store().await;
        for (name, age, gender) in [
            ("Ivan", 25, Gender::Male),
            ("Oleg", 35, Gender::Male),
            ("Olga", 25, Gender::Female),
            ("Petr", 20, Gender::Male),
            ("Pavel", 30, Gender::Male),
            ("Boris", 19, Gender::Male),
        ] {
            store
                .create(&enriched(name, "Sidorov", Some(age), Some(gender)))
                .await
                .unwrap();
        }
        store.create(&enriched("Nobody", "Sidorov", None, None)).await.unwrap();

        let filter = PersonFilter {
            age_min: Some(20),
            age_max: Some(30),
            gender: Some(Gender::Male),
            limit: Some(100),
            ..Default::default()
        };
        let page = store.list(&filter).await.unwrap();

        let names: Vec<_> = page
            .persons
            .iter()
            .map(|p| p.enriched.person.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ivan", "Petr", "Pavel"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let store = store().await;
        let id = store
            .create(&enriched("Dmitriy", "Ushakov", Some(42), Some(Gender::Male)))
            .await
            .unwrap();

        let update = PersonUpdate {
            surname: Some("Ivanov".to_string()),
            age: Some(43),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        let updated = store.update(id, &update).await.unwrap();

        assert_eq!(updated.enriched.person.name, "Dmitriy");
        assert_eq!(updated.enriched.person.surname, "Ivanov");
        assert_eq!(updated.enriched.enrichment.age, Some(43));
        assert_eq!(updated.enriched.enrichment.gender, Some(Gender::Female));
        assert_eq!(updated.enriched.enrichment.nationality.as_deref(), Some("RU"));
        assert_eq!(store.get_by_id(id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let store = store().await;
        let first = store.create(&enriched("Ivan", "Petrov", None, None)).await.unwrap();
        store.create(&enriched("Oleg", "Petrov", None, None)).await.unwrap();

        let rename = PersonUpdate {
            name: Some("Oleg".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.update(first, &rename).await, Err(Error::AlreadyExists(_))));
        assert!(matches!(store.update(999, &rename).await, Err(Error::NotFound(_))));
        assert!(matches!(
            store.update(first, &PersonUpdate::default()).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store().await;
        let id = store.create(&enriched("Ivan", "Petrov", None, None)).await.unwrap();

        store.delete(id).await.unwrap();
        assert!(matches!(store.get_by_id(id).await, Err(Error::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(Error::NotFound(_))));
    }
}
