#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use rusqlite::Connection;
use tempfile::tempdir;

fn create_database(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (
             id INTEGER PRIMARY KEY,
             email VARCHAR(120) NOT NULL UNIQUE
         );
         CREATE TABLE invoices (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER NOT NULL REFERENCES customers(id),
             total DECIMAL(10,2) NOT NULL
         );
         CREATE TABLE audit_logs (id INTEGER PRIMARY KEY, entry TEXT);",
    )
    .unwrap();
}

fn schemaforge(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemaforge"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("SCHEMAFORGE_LOG_LEVEL", "warn")
        .args(args)
        .output()
        .expect("run cli")
}

#[test]
fn test_cli_generate_with_auto_detected_config() {
    let dir = tempdir().unwrap();
    create_database(&dir.path().join("app.sqlite"));
    fs::write(
        dir.path().join("schemaforge.toml"),
        r#"
[connection]
driver = "sqlite"
dbname = "app.sqlite"

[generate]
namespace = "billing"
components = ["model", "service", "controller"]
"#,
    )
    .unwrap();

    let output = schemaforge(dir.path(), &["generate"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("for 2 table(s) from database"), "{stdout}");

    let src = dir.path().join("src");
    assert!(src.join("models/invoice.rs").exists());
    assert!(src.join("services/customer_service.rs").exists());
    assert!(src.join("http/controllers/invoices_controller.rs").exists());
    assert!(!src.join("dto").exists());
    assert!(src.join("routes.rs").exists());
    assert!(dir.path().join(".schemaforge/components.json").exists());

    let routes = schemaforge(dir.path(), &["routes"]);
    assert!(routes.status.success());
    let listing = String::from_utf8_lossy(&routes.stdout);
    assert!(listing.contains("/customers"), "{listing}");
    assert!(listing.contains("billing::http::controllers::InvoicesController"), "{listing}");

    // Served from the cache now: a bogus database path is never opened.
    let again = schemaforge(dir.path(), &["generate", "--dbname", "missing.sqlite"]);
    assert!(again.status.success(), "{}", String::from_utf8_lossy(&again.stderr));
    assert!(String::from_utf8_lossy(&again.stdout).contains("from cache"));
}

#[test]
fn test_cli_tables_applies_exclusions() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("app.sqlite");
    create_database(&db);

    let output = schemaforge(
        dir.path(),
        &["tables", "--driver", "sqlite", "--dbname", db.to_str().unwrap(), "--exclude", "^invoices$"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let tables: Vec<&str> = stdout.lines().collect();
    assert_eq!(tables, vec!["customers"]);
}

#[test]
fn test_cli_reports_unsupported_driver() {
    let dir = tempdir().unwrap();
    let output = schemaforge(dir.path(), &["generate", "--no-cache", "--driver", "mysql", "--host", "db"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing capability"), "{stderr}");
    assert!(!dir.path().join("src").exists());
}

#[test]
fn test_cli_explicit_config_must_exist() {
    let dir = tempdir().unwrap();
    let output = schemaforge(dir.path(), &["--config", "nope.toml", "routes"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}
