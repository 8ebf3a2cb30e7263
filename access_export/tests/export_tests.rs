//! End-to-end tests for access_export
//!
//! Each test writes a JSON snapshot into a temporary directory, exports it and
//! reads the result back.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use access_export::config::{self, Config, ExportFormat};
use access_export::{AccessExportClient, Error, ExportRequest, TableFilter};

const PEOPLE: &str = r#"{
    "tables": [
        {
            "name": "T",
            "columns": [
                { "name": "id", "type": "long" },
                { "name": "name", "type": "text" }
            ],
            "indexes": [ { "name": "PrimaryKey", "columns": ["id"], "primary_key": true } ],
            "rows": [ { "id": 1, "name": "a" } ]
        }
    ]
}"#;

const RELATED: &str = r#"{
    "tables": [
        {
            "name": "T",
            "columns": [ { "name": "id", "type": "long" } ],
            "indexes": [ { "name": "PrimaryKey", "columns": ["id"], "primary_key": true } ],
            "rows": [ { "id": 1 } ]
        },
        {
            "name": "U",
            "columns": [ { "name": "id", "type": "long" }, { "name": "tid", "type": "long" } ],
            "indexes": [
                { "name": "PrimaryKey", "columns": ["id"], "primary_key": true },
                { "name": "tid", "columns": ["tid"] },
                { "name": "TU", "columns": ["tid"] }
            ],
            "rows": [ { "id": 10, "tid": 1 } ]
        }
    ],
    "relationships": [
        { "name": "TU", "from_table": "T", "from_columns": ["id"],
          "to_table": "U", "to_columns": ["tid"] }
    ]
}"#;

const TWO_TABLES: &str = r#"{
    "tables": [
        { "name": "A", "columns": [ { "name": "a", "type": "long" } ], "rows": [ { "a": 1 } ] },
        { "name": "B", "columns": [ { "name": "b", "type": "long" } ], "rows": [ { "b": 2 } ] }
    ]
}"#;

const DUPLICATE_KEYS: &str = r#"{
    "tables": [
        {
            "name": "Good",
            "columns": [ { "name": "id", "type": "long" } ],
            "rows": [ { "id": 1 }, { "id": 2 } ]
        },
        {
            "name": "Bad",
            "columns": [ { "name": "id", "type": "long" } ],
            "indexes": [ { "name": "PrimaryKey", "columns": ["id"], "primary_key": true } ],
            "rows": [ { "id": 1 }, { "id": 2 }, { "id": 1 } ]
        }
    ]
}"#;

const ALL_TYPES: &str = r#"{
    "tables": [
        {
            "name": "Samples",
            "columns": [
                { "name": "flag", "type": "boolean" },
                { "name": "small", "type": "byte" },
                { "name": "amount", "type": "money" },
                { "name": "ratio", "type": "double" },
                { "name": "created", "type": "short_date_time" },
                { "name": "payload", "type": "binary" },
                { "name": "note", "type": "memo" },
                { "name": "short", "type": "int" },
                { "name": "total", "type": "long" },
                { "name": "weight", "type": "float" },
                { "name": "rate", "type": "numeric" },
                { "name": "label", "type": "text" },
                { "name": "uid", "type": "guid" },
                { "name": "picture", "type": "ole" }
            ],
            "rows": [
                {
                    "flag": true,
                    "small": 7,
                    "amount": "3.21",
                    "ratio": 0.5,
                    "created": "2024-02-29 13:45:10.25",
                    "payload": [1, 2, 254],
                    "note": "hello",
                    "short": -300,
                    "total": 70000,
                    "weight": 1.25,
                    "rate": "10.5",
                    "label": "O'Hara",
                    "uid": "{6F9619FF-8B86-D011-B42D-00C04FC964FF}",
                    "picture": [0, 255]
                },
                { "flag": false }
            ]
        }
    ]
}"#;

fn write_snapshot(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("source.json");
    fs::write(&path, contents).unwrap();
    path
}

fn request(source: &Path, target: &Path, format: ExportFormat, filter: TableFilter) -> ExportRequest {
    ExportRequest {
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        format,
        filter,
    }
}

fn client() -> AccessExportClient {
    AccessExportClient::new(Config::default()).unwrap()
}

async fn open_target(path: &Path) -> SqlitePool {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap()
}

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(pool)
        .await
        .unwrap()
}

async fn table_sql(pool: &SqlitePool, table: &str) -> String {
    sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind(table)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_exports_table_with_primary_key_and_row() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, PEOPLE);
    let target = dir.path().join("target.sqlite");

    let summary = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap();
    assert_eq!(summary.tables(), ["T"]);
    assert_eq!(summary.total_rows(), 1);

    let pool = open_target(&target).await;
    assert_eq!(
        table_sql(&pool, "T").await,
        "CREATE TABLE 'T' ('id' INTEGER PRIMARY KEY, 'name' TEXT)"
    );

    let pk: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('T') WHERE pk > 0")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(pk, ["id"]);

    let row = sqlx::query("SELECT id, name FROM 'T'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("id"), 1);
    assert_eq!(row.get::<String, _>("name"), "a");
}

#[tokio::test]
async fn test_exports_foreign_keys_and_deduplicated_indexes() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, RELATED);
    let target = dir.path().join("target.sqlite");

    let summary = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap();
    // T: PrimaryKey; U: PrimaryKey and one of the two indexes on tid
    assert_eq!(summary.indexes_created, 3);

    let pool = open_target(&target).await;
    assert_eq!(
        table_sql(&pool, "U").await,
        "CREATE TABLE 'U' ('id' INTEGER PRIMARY KEY, 'tid' INTEGER, FOREIGN KEY('tid') REFERENCES 'T'('id'))"
    );

    let foreign_keys = sqlx::query("SELECT \"table\", \"from\", \"to\" FROM pragma_foreign_key_list('U')")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(foreign_keys.len(), 1);
    assert_eq!(foreign_keys[0].get::<String, _>("table"), "T");
    assert_eq!(foreign_keys[0].get::<String, _>("from"), "tid");
    assert_eq!(foreign_keys[0].get::<String, _>("to"), "id");

    let indexes: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'U' AND sql IS NOT NULL ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(indexes, ["U_PrimaryKey", "U_tid"]);
}

#[tokio::test]
async fn test_foreign_key_to_excluded_table_is_still_emitted() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, RELATED);
    let target = dir.path().join("target.sqlite");

    client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::only(["U"])))
        .await
        .unwrap();

    let pool = open_target(&target).await;
    assert_eq!(table_names(&pool).await, ["U"]);
    assert!(table_sql(&pool, "U").await.contains("REFERENCES 'T'('id')"));
}

#[rstest]
#[case::filtered(TableFilter::only(["A"]), vec!["A"])]
#[case::unfiltered(TableFilter::All, vec!["A", "B"])]
#[case::explicit_empty(TableFilter::from_option(Some(vec![])), vec![])]
#[tokio::test]
async fn test_table_filter(#[case] filter: TableFilter, #[case] expected: Vec<&str>) {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, TWO_TABLES);
    let target = dir.path().join("target.sqlite");

    let summary = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, filter))
        .await
        .unwrap();
    assert_eq!(summary.tables(), expected);

    let pool = open_target(&target).await;
    assert_eq!(table_names(&pool).await, expected);
}

#[tokio::test]
async fn test_failed_insert_rolls_back_the_whole_run() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, DUPLICATE_KEYS);
    let target = dir.path().join("target.sqlite");

    let err = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Execution { .. }));
    assert_eq!(err.exit_code(), 6);

    let pool = open_target(&target).await;
    assert!(table_names(&pool).await.is_empty());
}

#[tokio::test]
async fn test_values_are_coerced_uniformly() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, ALL_TYPES);
    let target = dir.path().join("target.sqlite");

    client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap();

    let pool = open_target(&target).await;
    let row = sqlx::query(
        "SELECT flag, small, typeof(amount) AS amount_type, amount, ratio, created, typeof(created) AS created_type, payload, note, \
         short, total, weight, typeof(rate) AS rate_type, rate, label, uid, picture \
         FROM 'Samples' WHERE flag = 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(row.get::<i64, _>("flag"), 1);
    assert_eq!(row.get::<i64, _>("small"), 7);
    assert_eq!(row.get::<String, _>("amount_type"), "real");
    assert_eq!(row.get::<f64, _>("amount"), 3.21);
    assert_eq!(row.get::<f64, _>("ratio"), 0.5);
    assert_eq!(row.get::<String, _>("created_type"), "text");
    assert_eq!(row.get::<String, _>("created"), "2024-02-29T13:45:10.250");
    assert_eq!(row.get::<Vec<u8>, _>("payload"), vec![1, 2, 254]);
    assert_eq!(row.get::<String, _>("note"), "hello");
    assert_eq!(row.get::<i64, _>("short"), -300);
    assert_eq!(row.get::<i64, _>("total"), 70000);
    assert_eq!(row.get::<f64, _>("weight"), 1.25);
    assert_eq!(row.get::<String, _>("rate_type"), "real");
    assert_eq!(row.get::<f64, _>("rate"), 10.5);
    assert_eq!(row.get::<String, _>("label"), "O'Hara");
    assert_eq!(row.get::<String, _>("uid"), "{6F9619FF-8B86-D011-B42D-00C04FC964FF}");
    assert_eq!(row.get::<Vec<u8>, _>("picture"), vec![0, 255]);

    let nulls: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM 'Samples' WHERE flag = 0 AND small IS NULL AND amount IS NULL AND ratio IS NULL \
         AND created IS NULL AND payload IS NULL AND note IS NULL AND short IS NULL AND total IS NULL \
         AND weight IS NULL AND rate IS NULL AND label IS NULL AND uid IS NULL AND picture IS NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(nulls, 1);
}

#[tokio::test]
async fn test_identifiers_with_quotes_are_usable() {
    let dir = tempdir().unwrap();
    let snapshot = r#"{ "tables": [ {
        "name": "O'Brien",
        "columns": [ { "name": "it's", "type": "text" } ],
        "indexes": [ { "name": "who's", "columns": ["it's"], "unique": true } ],
        "rows": [ { "it's": "x" } ]
    } ] }"#;
    let source = write_snapshot(&dir, snapshot);
    let target = dir.path().join("target.sqlite");

    client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap();

    let pool = open_target(&target).await;
    let value: String = sqlx::query_scalar("SELECT \"it's\" FROM \"O'Brien\"")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(value, "x");

    let unique: i64 = sqlx::query_scalar("SELECT \"unique\" FROM pragma_index_list('O''Brien') WHERE name = 'O''Brien_who''s'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(unique, 1);
}

#[tokio::test]
async fn test_unsupported_column_type_aborts_export() {
    let dir = tempdir().unwrap();
    let snapshot = r#"{ "tables": [
        { "name": "Ok", "columns": [ { "name": "a", "type": "long" } ] },
        { "name": "Attachments", "columns": [ { "name": "files", "type": "complex_type" } ] }
    ] }"#;
    let source = write_snapshot(&dir, snapshot);
    let target = dir.path().join("target.sqlite");

    let err = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { ref column, .. } if column == "files"));

    let pool = open_target(&target).await;
    assert!(table_names(&pool).await.is_empty());
}

#[tokio::test]
async fn test_type_mapping_override_from_config() {
    let dir = tempdir().unwrap();
    let snapshot = r#"{ "tables": [
        { "name": "Big", "columns": [ { "name": "n", "type": "big_int" } ], "rows": [ { "n": 9007199254740993 } ] }
    ] }"#;
    let source = write_snapshot(&dir, snapshot);
    let target = dir.path().join("target.sqlite");

    let config = config::parse("[type_mapping.overrides]\nbig_int = \"integer\"\n").unwrap();
    AccessExportClient::new(config)
        .unwrap()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap();

    let pool = open_target(&target).await;
    let n: i64 = sqlx::query_scalar("SELECT n FROM 'Big'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(n, 9007199254740993);
}

#[tokio::test]
async fn test_csv_export_writes_one_file_per_table() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, ALL_TYPES);
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let summary = client()
        .run(&request(&source, &out, ExportFormat::Csv, TableFilter::All))
        .await
        .unwrap();
    assert_eq!(summary.tables(), ["Samples"]);

    let contents = fs::read_to_string(out.join("Samples.csv")).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("flag,small,amount,ratio,created,payload,note,short,total,weight,rate,label,uid,picture")
    );
    assert_eq!(
        lines.next(),
        Some("1,7,3.21,0.5,2024-02-29T13:45:10.250,0102fe,hello,-300,70000,1.25,10.5,O'Hara,{6F9619FF-8B86-D011-B42D-00C04FC964FF},00ff")
    );
    assert_eq!(lines.next(), Some("0,,,,,,,,,,,,,"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_csv_export_respects_filter() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, TWO_TABLES);
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    client()
        .run(&request(&source, &out, ExportFormat::Csv, TableFilter::only(["B"])))
        .await
        .unwrap();

    assert!(!out.join("A.csv").exists());
    assert_eq!(fs::read_to_string(out.join("B.csv")).unwrap(), "b\n2\n");
}

#[rstest]
#[case::missing_source(false, true, ExportFormat::Sqlite, 2)]
#[case::existing_sqlite_target(true, true, ExportFormat::Sqlite, 3)]
#[case::csv_target_is_a_file(true, true, ExportFormat::Csv, 7)]
#[case::missing_csv_directory(true, false, ExportFormat::Csv, 7)]
#[tokio::test]
async fn test_preconditions_fail_before_opening_anything(
    #[case] source_exists: bool,
    #[case] target_exists: bool,
    #[case] format: ExportFormat,
    #[case] exit_code: i32,
) {
    let dir = tempdir().unwrap();
    let source = if source_exists {
        write_snapshot(&dir, PEOPLE)
    } else {
        dir.path().join("missing.json")
    };
    let target = dir.path().join("target");
    if target_exists {
        fs::write(&target, b"keep").unwrap();
    }

    let err = client()
        .run(&request(&source, &target, format, TableFilter::All))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), exit_code);

    if target_exists {
        assert_eq!(fs::read(&target).unwrap(), b"keep");
    } else {
        assert!(!target.exists());
    }
}

#[tokio::test]
async fn test_unreadable_source_is_an_open_error() {
    let dir = tempdir().unwrap();
    let source = write_snapshot(&dir, "not json");
    let target = dir.path().join("target.sqlite");

    let err = client()
        .run(&request(&source, &target, ExportFormat::Sqlite, TableFilter::All))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(!target.exists());
}
