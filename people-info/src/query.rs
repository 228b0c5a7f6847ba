//! Person filter translation
//!
//! Turns a `PersonFilter` into a count query and a page query over the same
//! predicate. Present fields become equality conjuncts (age becomes an
//! inclusive range), absent fields impose nothing, and pages are always
//! ordered by id so offsets stay stable.

use people_common::config::PaginationConfig;
use people_common::db::PERSONS_TABLE;
use people_common::Gender;
use sqlx::{QueryBuilder, Sqlite};

/// Columns returned for every person row
pub const PERSON_COLUMNS: &str = "id, name, surname, patronymic, age, gender, nationality";

/// Structured predicate plus pagination window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub gender: Option<Gender>,
    pub nationality: Option<String>,
    /// Inclusive lower age bound
    pub age_min: Option<u8>,
    /// Inclusive upper age bound
    pub age_max: Option<u8>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Count and page queries for one filter, plus the resolved window
pub struct QueryPlan {
    pub count: QueryBuilder<'static, Sqlite>,
    pub page: QueryBuilder<'static, Sqlite>,
    pub limit: u64,
    pub offset: u64,
}

/// Builds queries from filters using explicit window defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner {
    defaults: PaginationConfig,
}

enum BindValue {
    Text(String),
    Integer(i64),
}

impl QueryPlanner {
    pub fn new(defaults: PaginationConfig) -> Self {
        Self { defaults }
    }

    /// Limit and offset after applying defaults
    pub fn window(&self, filter: &PersonFilter) -> (u64, u64) {
        (
            filter.limit.unwrap_or(self.defaults.default_limit),
            filter.offset.unwrap_or(self.defaults.default_offset),
        )
    }

    pub fn plan(&self, filter: &PersonFilter) -> QueryPlan {
        let (limit, offset) = self.window(filter);

        let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", PERSONS_TABLE));
        push_predicate(&mut count, filter);

        let mut page = QueryBuilder::new(format!("SELECT {} FROM {}", PERSON_COLUMNS, PERSONS_TABLE));
        push_predicate(&mut page, filter);
        page.push(" ORDER BY id ASC LIMIT ");
        page.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        page.push(" OFFSET ");
        page.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        QueryPlan {
            count,
            page,
            limit,
            offset,
        }
    }
}

/// Conjuncts in a fixed column order
fn conjuncts(filter: &PersonFilter) -> Vec<(&'static str, BindValue)> {
    let mut conjuncts = Vec::new();

    let text = [
        ("name = ", &filter.name),
        ("surname = ", &filter.surname),
        ("patronymic = ", &filter.patronymic),
        ("nationality = ", &filter.nationality),
    ];
    for (predicate, value) in text {
        if let Some(value) = value {
            conjuncts.push((predicate, BindValue::Text(value.clone())));
        }
    }

    if let Some(gender) = filter.gender {
        conjuncts.push(("gender = ", BindValue::Text(gender.as_str().to_string())));
    }
    if let Some(age_min) = filter.age_min {
        conjuncts.push(("age >= ", BindValue::Integer(i64::from(age_min))));
    }
    if let Some(age_max) = filter.age_max {
        conjuncts.push(("age <= ", BindValue::Integer(i64::from(age_max))));
    }

    conjuncts
}

fn push_predicate(builder: &mut QueryBuilder<'static, Sqlite>, filter: &PersonFilter) {
    for (i, (predicate, value)) in conjuncts(filter).into_iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate);
        match value {
            BindValue::Text(text) => builder.push_bind(text),
            BindValue::Integer(number) => builder.push_bind(number),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> QueryPlanner {
        QueryPlanner::new(PaginationConfig::default())
    }

    #[test]
    fn test_empty_filter_has_no_predicate() {
        let plan = planner().plan(&PersonFilter::default());

        assert_eq!(plan.count.sql(), "SELECT COUNT(*) FROM persons");
        assert_eq!(
            plan.page.sql(),
            "SELECT id, name, surname, patronymic, age, gender, nationality FROM persons \
             ORDER BY id ASC LIMIT ? OFFSET ?"
        );
        assert_eq!((plan.limit, plan.offset), (5, 0));
    }

    #[test]
    fn test_conjuncts_are_anded() {
        let filter = PersonFilter {
            surname: Some("Ushakov".to_string()),
            gender: Some(Gender::Male),
            age_min: Some(20),
            age_max: Some(30),
            ..Default::default()
        };
        let plan = planner().plan(&filter);

        assert_eq!(
            plan.count.sql(),
            "SELECT COUNT(*) FROM persons WHERE surname = ? AND gender = ? AND age >= ? AND age <= ?"
        );
        assert!(plan
            .page
            .sql()
            .ends_with("WHERE surname = ? AND gender = ? AND age >= ? AND age <= ? ORDER BY id ASC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_gender_binds_gender_column() {
        let filter = PersonFilter {
            gender: Some(Gender::Female),
            ..Default::default()
        };
        let plan = planner().plan(&filter);
        assert_eq!(plan.count.sql(), "SELECT COUNT(*) FROM persons WHERE gender = ?");
    }

    #[test]
    fn test_window_defaults_come_from_config() {
        let planner = QueryPlanner::new(PaginationConfig {
            default_limit: 20,
            default_offset: 40,
            max_limit: 100,
        });
        assert_eq!(planner.window(&PersonFilter::default()), (20, 40));

        let filter = PersonFilter {
            limit: Some(3),
            offset: Some(0),
            ..Default::default()
        };
        assert_eq!(planner.window(&filter), (3, 0));
    }
}
