use sqlite_wrapper::{
    ColumnDefinition, DataType, DefaultValue, Error, Filter, ForeignKey, IndexDefinition,
    Location, Row, Schema, Select, SqliteConfig, SqliteWrapper, TableDefinition, Value,
};
use tempfile::NamedTempFile;

fn people_table() -> TableDefinition {
    TableDefinition::new("people")
        .column(
            ColumnDefinition::new("id")
                .with_type(DataType::Integer)
                .primary_key()
                .not_null(),
        )
        .column(
            ColumnDefinition::new("name")
                .with_type(DataType::Text)
                .not_null()
                .unique()
                .default_value(DefaultValue::Text("John Doe".to_string())),
        )
        .column(
            ColumnDefinition::new("city_id")
                .with_type(DataType::Integer)
                .not_null()
                .references(ForeignKey::new("cities")),
        )
}

fn cities_table() -> TableDefinition {
    TableDefinition::new("cities")
        .column(
            ColumnDefinition::new("id")
                .with_type(DataType::Integer)
                .primary_key()
                .not_null(),
        )
        .column(
            ColumnDefinition::new("name")
                .with_type(DataType::Text)
                .not_null()
                .unique(),
        )
}

fn city(id: i64, name: &str) -> Row {
    Row::new().with_value("name", name).with_value("id", id)
}

// Helper function to create an in-memory database for testing
async fn create_test_db() -> sqlite_wrapper::Result<SqliteWrapper> {
    let schema = Schema::new()
        .add_table(people_table())
        .add_table(cities_table());
    SqliteWrapper::open(SqliteConfig::memory().with_schema(schema)).await
}

// Helper function to create a temporary file-based database
async fn create_temp_db() -> anyhow::Result<(SqliteWrapper, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let config = SqliteConfig::file(temp_file.path()).with_schema(Schema::new().add_table(cities_table()));
    let db = SqliteWrapper::open(config).await?;
    Ok((db, temp_file))
}

#[tokio::test]
async fn test_create_table_is_idempotent() -> anyhow::Result<()> {
    let db = create_test_db().await?;

    // The schema already created both tables at open time
    db.create_table(&people_table()).await?;
    db.create_table(&people_table()).await?;
    assert!(db.list("people").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_basic_operations() -> anyhow::Result<()> {
    let db = create_test_db().await?;

    // Insert a new person
    let id = db
        .insert(
            "people",
            &Row::new()
                .with_value("name", "Donald Knuth")
                .with_value("city_id", 42),
        )
        .await?;

    // Query the person
    let person = db.find("people", id).await?.expect("inserted row");
    assert_eq!(person.get("id"), Some(&Value::Integer(id)));
    assert_eq!(person.get("name"), Some(&Value::from("Donald Knuth")));
    assert_eq!(person.get("city_id"), Some(&Value::Integer(42)));

    // Update the person
    let changed = db
        .update(
            "people",
            &Filter::new("id=?", [id]),
            &Row::new().with_value("city_id", 378),
        )
        .await?;
    assert_eq!(changed, 1);
    let person = db.find("people", id).await?.expect("updated row");
    assert_eq!(person.get("city_id"), Some(&Value::Integer(378)));
    assert_eq!(person.get("name"), Some(&Value::from("Donald Knuth")));

    // Delete the person
    assert_eq!(db.remove_by_id("people", id).await?, 1);
    assert!(db.find("people", id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_insert_all_inserts_every_row() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let cities = vec![
        city(42, "New York"),
        city(23, "Paris"),
        city(347, "San Francisco"),
        city(378, "Helsinki"),
    ];

    assert_eq!(db.insert_all("cities", &cities).await?, 4);

    let stored = db.list("cities").await?;
    assert_eq!(stored.len(), cities.len());
    for source in &cities {
        let id = source.get("id").cloned().expect("id");
        let found = db.find("cities", id).await?.expect("city");
        assert_eq!(found.get("name"), source.get("name"));
    }
    Ok(())
}

#[tokio::test]
async fn test_insert_all_keeps_duplicate_rows() -> anyhow::Result<()> {
    let db = SqliteWrapper::open(SqliteConfig::memory()).await?;
    db.create_table(
        &TableDefinition::new("visits").column(ColumnDefinition::new("city").with_type(DataType::Text)),
    )
    .await?;

    let visit = Row::new().with_value("city", "Paris");
    assert_eq!(db.insert_all("visits", &[visit.clone(), visit]).await?, 2);
    assert_eq!(db.list("visits").await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_insert_all_is_all_or_nothing() -> anyhow::Result<()> {
    let db = create_test_db().await?;

    let err = db
        .insert_all("cities", &[city(1, "Oslo"), city(2, "Oslo")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
    assert!(db.list("cities").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_insert_all_rejects_empty_batch() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    assert!(matches!(
        db.insert_all("cities", &[]).await,
        Err(Error::EmptyBatch)
    ));
    Ok(())
}

#[tokio::test]
async fn test_people_and_cities_scenario() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    db.insert_all(
        "cities",
        &[
            city(42, "New York"),
            city(23, "Paris"),
            city(347, "San Francisco"),
            city(378, "Helsinki"),
        ],
    )
    .await?;

    db.insert(
        "people",
        &Row::new()
            .with_value("name", "Donald Knuth")
            .with_value("city_id", 42),
    )
    .await?;
    db.update(
        "people",
        &Filter::new("name=?", ["Donald Knuth"]),
        &Row::new().with_value("city_id", 378),
    )
    .await?;
    db.insert_all(
        "people",
        &[
            Row::new()
                .with_value("name", "Dennis Ritchie")
                .with_value("city_id", 23),
            Row::new()
                .with_value("name", "Bjarne Stroustrup")
                .with_value("city_id", 347),
        ],
    )
    .await?;

    let rows = db
        .select(
            &Select::from("people")
                .join("cities", "cities.id=people.city_id")
                .column_as("cities.name", "city_name")
                .column_as("people.name", "person_name")
                .order_by("people.name DESC")
                .limit(100),
        )
        .await?;

    assert_eq!(rows.len(), 3);
    // DESC: Donald, Dennis, Bjarne
    let knuth = &rows[0];
    assert_eq!(knuth.columns().collect::<Vec<_>>(), vec!["city_name", "person_name"]);
    assert_eq!(knuth.get("person_name"), Some(&Value::from("Donald Knuth")));
    assert_eq!(knuth.get("city_name"), Some(&Value::from("Helsinki")));
    assert_eq!(rows[1].get("person_name"), Some(&Value::from("Dennis Ritchie")));
    assert_eq!(rows[2].get("city_name"), Some(&Value::from("San Francisco")));

    // Select with single result
    let one = db
        .select_one(
            &Select::from("people")
                .column("name")
                .filter(Filter::new("name LIKE ?", ["%Donald%"])),
        )
        .await?
        .expect("a match");
    assert_eq!(one.get("name"), Some(&Value::from("Donald Knuth")));

    // Nothing lives in city 666
    assert_eq!(db.remove("people", &Filter::new("city_id=?", ["666"])).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_defaults_apply_to_omitted_columns() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let id = db
        .insert("people", &Row::new().with_value("city_id", 23))
        .await?;
    let person = db.find("people", id).await?.expect("person");
    assert_eq!(person.get("name"), Some(&Value::from("John Doe")));
    Ok(())
}

#[tokio::test]
async fn test_unique_constraint_violation() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let knuth = Row::new()
        .with_value("name", "Donald Knuth")
        .with_value("city_id", 42);
    db.insert("people", &knuth).await?;

    let err = db.insert("people", &knuth).await.unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));

    let err = db
        .insert("people", &Row::new().with_value("name", Value::Null))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
    Ok(())
}

#[tokio::test]
async fn test_foreign_keys_when_enabled() -> anyhow::Result<()> {
    let schema = Schema::new()
        .add_table(cities_table())
        .add_table(people_table());
    let db = SqliteWrapper::open(
        SqliteConfig::memory()
            .with_schema(schema)
            .with_foreign_keys(true),
    )
    .await?;

    db.insert("cities", &city(42, "New York")).await?;
    db.insert(
        "people",
        &Row::new().with_value("name", "Ada").with_value("city_id", 42),
    )
    .await?;

    let err = db
        .insert(
            "people",
            &Row::new().with_value("name", "Grace").with_value("city_id", 999),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
    Ok(())
}

#[tokio::test]
async fn test_parameter_mismatch_surfaces_from_engine() -> anyhow::Result<()> {
    let db = create_test_db().await?;

    let err = db
        .update(
            "people",
            &Filter::new("id=? AND name=?", [1]),
            &Row::new().with_value("city_id", 378),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ParameterMismatch {
            given: 2,
            expected: 3
        }
    ));

    let err = db
        .remove("people", &Filter::new("id=?", [1, 2]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ParameterMismatch { .. }));
    Ok(())
}

#[tokio::test]
async fn test_update_by_id_and_with_id() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let id = db
        .insert(
            "people",
            &Row::new().with_value("name", "Alan").with_value("city_id", 23),
        )
        .await?;

    db.update_by_id("people", id, &Row::new().with_value("city_id", 42))
        .await?;
    db.update_with_id(
        "people",
        &Row::new().with_value("id", id).with_value("name", "Alan Turing"),
    )
    .await?;

    let person = db.find("people", id).await?.expect("person");
    assert_eq!(person.get("name"), Some(&Value::from("Alan Turing")));
    assert_eq!(person.get("city_id"), Some(&Value::Integer(42)));

    let err = db
        .update_with_id("people", &Row::new().with_value("name", "nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingId));
    Ok(())
}

#[tokio::test]
async fn test_invalid_table_name_is_rejected() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let err = db.list("people; DROP TABLE people").await.unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));
    Ok(())
}

#[tokio::test]
async fn test_file_database_persists_across_reopen() -> anyhow::Result<()> {
    let (db, temp_file) = create_temp_db().await?;
    db.create_index(
        "cities",
        &IndexDefinition::new("idx_cities_name", ["name"]).unique(),
    )
    .await?;
    db.insert("cities", &city(378, "Helsinki")).await?;
    db.close().await?;

    let reopened = SqliteWrapper::open(SqliteConfig::new(Location::File(
        temp_file.path().to_path_buf(),
    )))
    .await?;
    let helsinki = reopened.find("cities", 378).await?.expect("persisted");
    assert_eq!(helsinki.get("name"), Some(&Value::from("Helsinki")));
    Ok(())
}

#[tokio::test]
async fn test_anonymous_database() -> anyhow::Result<()> {
    let db = SqliteWrapper::open(
        SqliteConfig::new(Location::Anonymous).with_schema(Schema::new().add_table(cities_table())),
    )
    .await?;
    db.insert("cities", &city(1, "Turku")).await?;
    assert_eq!(db.list("cities").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_closed_database_refuses_work() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    db.close().await?;

    assert!(matches!(db.list("cities").await, Err(Error::Closed)));
    assert!(matches!(db.close().await, Err(Error::Closed)));
    Ok(())
}

#[tokio::test]
async fn test_serialize_runs_block_in_order() -> anyhow::Result<()> {
    let db = create_test_db().await?;

    let found = db
        .serialize(|db| async move {
            let id = db.insert("cities", &city(5, "Oslo")).await?;
            db.update_by_id("cities", id, &Row::new().with_value("name", "Bergen"))
                .await?;
            Ok::<_, Error>(db.find("cities", id).await?)
        })
        .await?
        .expect("city");
    assert_eq!(found.get("name"), Some(&Value::from("Bergen")));
    Ok(())
}

#[tokio::test]
async fn test_parallelize_returns_results_in_input_order() -> anyhow::Result<()> {
    let db = create_test_db().await?;
    let cities = vec![city(1, "Lyon"), city(2, "Nice"), city(3, "Lille")];

    let ids = db
        .parallelize(cities.iter().map(|c| db.insert("cities", c)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(db.list("cities").await?.len(), 3);
    Ok(())
}
