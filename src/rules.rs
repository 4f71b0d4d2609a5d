//! # Type & Rule Mapper
//!
//! Table-driven translation of native column types into a generic value type
//! and a pipe-delimited validation [`RuleExpression`], plus the structural
//! `exists:` / `unique:` clauses derived from key constraints.
//!
//! The mapping is deterministic: identical columns always produce the same
//! clauses in the same order.
//!
//! | Native type | Generic | Clauses |
//! |---|---|---|
//! | `text[:N]` | string | `string`, `max:N` (65535 when unspecified) |
//! | `varchar:N` | string | `string`, `max:N` |
//! | `integer[:N]`, `bigint` | integer | `integer`, `max:N` when N is present |
//! | `decimal` | decimal | `numeric` |
//! | `datetime:FORMAT` | datetime | `date_format:FORMAT` |
//! | `datetime`, `date` | datetime / date | `date` |
//! | `boolean` | boolean | `boolean` |
//! | `enum(a,b)` | string | `string`, `in:a,b` |
//! | anything else | string | `string` |

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::schema::introspect::RawTableDescriptor;
use crate::schema::types::{
    ColumnDefinition, ForeignKeyConstraint, NativeType, TableModel, TableModelRecord,
    UniqueKeyConstraint,
};

/// Upper bound used for `text` columns without a declared length.
pub const DEFAULT_TEXT_LENGTH: u32 = 65535;

/// Language-neutral value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
}

impl GenericType {
    /// Rust type used for this value in generated source.
    pub fn rust_type(self) -> &'static str {
        match self {
            GenericType::String | GenericType::Date | GenericType::DateTime => "String",
            GenericType::Integer => "i64",
            // Precision beyond f64 is not preserved in generated structs.
            GenericType::Decimal => "f64",
            GenericType::Boolean => "bool",
        }
    }
}

/// Ordered, duplicate-free list of validation clauses, rendered as
/// `clause|clause|...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RuleExpression {
    clauses: Vec<String>,
}

impl RuleExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a pipe-delimited expression, dropping blank clauses.
    pub fn parse(expr: &str) -> Self {
        let mut rule = Self::new();
        for clause in expr.split('|') {
            rule.push(clause);
        }
        rule
    }

    /// Append a clause unless it is blank or already present.
    pub fn push(&mut self, clause: impl AsRef<str>) -> &mut Self {
        let clause = clause.as_ref().trim();
        if !clause.is_empty() && !self.clauses.iter().any(|c| c == clause) {
            self.clauses.push(clause.to_string());
        }
        self
    }

    pub fn extend<I, S>(&mut self, clauses: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for clause in clauses {
            self.push(clause);
        }
        self
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether a clause named `name` (the part before `:`) is present.
    pub fn has(&self, name: &str) -> bool {
        self.clauses
            .iter()
            .any(|c| c.split(':').next() == Some(name))
    }
}

impl fmt::Display for RuleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join("|"))
    }
}

impl From<String> for RuleExpression {
    fn from(expr: String) -> Self {
        Self::parse(&expr)
    }
}

impl From<&str> for RuleExpression {
    fn from(expr: &str) -> Self {
        Self::parse(expr)
    }
}

impl From<RuleExpression> for String {
    fn from(rule: RuleExpression) -> Self {
        rule.to_string()
    }
}

/// Which request shape a rule set validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Full payload: non-nullable columns are required.
    Create,
    /// Partial payload: every column is optional.
    Update,
}

/// Split `varchar(255)`, `varchar:255` or `decimal(10, 2)` into base and arguments.
fn split_type(raw: &str) -> (String, Vec<String>) {
    let lowered = raw.trim().to_ascii_lowercase();
    if let Some(open) = lowered.find('(') {
        let base = lowered[..open].trim().to_string();
        let close = lowered.rfind(')').unwrap_or(lowered.len());
        let inner = if close > open { &raw.trim()[open + 1..close] } else { "" };
        let args = inner
            .split(',')
            .map(|a| a.trim().trim_matches('\'').trim_matches('"').to_string())
            .filter(|a| !a.is_empty())
            .collect();
        return (base, args);
    }
    if let Some((base, rest)) = raw.trim().split_once(':') {
        let base = base.trim().to_ascii_lowercase();
        // A datetime format may itself contain commas; keep it whole.
        let args = if base == "datetime" {
            vec![rest.to_string()]
        } else {
            rest.split(',').map(|a| a.trim().to_string()).collect()
        };
        return (base, args);
    }
    (lowered, Vec::new())
}

/// Parse a declared catalog type into a [`NativeType`].
///
/// Unrecognized spellings become [`NativeType::Unknown`] rather than failing.
pub fn parse_native_type(raw: &str) -> NativeType {
    let (base, args) = split_type(raw);
    // "bigint unsigned", "int(10) unsigned", "timestamp with time zone"
    let head = base.split_whitespace().next().unwrap_or("").to_string();
    let num = |i: usize| args.get(i).and_then(|a| a.parse::<u32>().ok());

    match head.as_str() {
        "varchar" | "nvarchar" | "char" | "nchar" | "character" | "string" | "citext" => {
            NativeType::Varchar(num(0))
        }
        "text" | "clob" | "ntext" => NativeType::Text(num(0)),
        "tinytext" => NativeType::Text(Some(255)),
        "mediumtext" => NativeType::Text(Some(16_777_215)),
        "longtext" => NativeType::Text(Some(u32::MAX)),
        "tinyint" if num(0) == Some(1) => NativeType::Boolean,
        "int" | "integer" | "smallint" | "tinyint" | "mediumint" | "int2" | "int4" | "serial" => {
            NativeType::Integer(num(0))
        }
        "bigint" | "int8" | "bigserial" => NativeType::BigInt,
        "decimal" | "numeric" | "float" | "double" | "real" | "money" => NativeType::Decimal {
            precision: num(0),
            scale: num(1),
        },
        "datetime" | "datetime2" | "timestamp" | "timestamptz" | "smalldatetime" => {
            NativeType::DateTime(args.first().filter(|a| a.parse::<u32>().is_err()).cloned())
        }
        "date" => NativeType::Date,
        "bool" | "boolean" | "bit" => NativeType::Boolean,
        "enum" => NativeType::Enum(args),
        _ => {
            warn!(native_type = raw, "Unknown native type, mapping to string");
            NativeType::Unknown(raw.trim().to_string())
        }
    }
}

/// Map a native type to its generic type and type clauses.
pub fn map_type(native: &NativeType) -> (GenericType, RuleExpression) {
    let mut rule = RuleExpression::new();
    let generic = match native {
        NativeType::Text(len) => {
            rule.push("string")
                .push(format!("max:{}", len.unwrap_or(DEFAULT_TEXT_LENGTH)));
            GenericType::String
        }
        NativeType::Varchar(len) => {
            rule.push("string");
            if let Some(len) = len {
                rule.push(format!("max:{len}"));
            }
            GenericType::String
        }
        NativeType::Integer(width) => {
            rule.push("integer");
            if let Some(width) = width {
                rule.push(format!("max:{width}"));
            }
            GenericType::Integer
        }
        NativeType::BigInt => {
            rule.push("integer");
            GenericType::Integer
        }
        NativeType::Decimal { .. } => {
            rule.push("numeric");
            GenericType::Decimal
        }
        NativeType::DateTime(Some(format)) => {
            rule.push(format!("date_format:{format}"));
            GenericType::DateTime
        }
        NativeType::DateTime(None) => {
            rule.push("date");
            GenericType::DateTime
        }
        NativeType::Date => {
            rule.push("date");
            GenericType::Date
        }
        NativeType::Boolean => {
            rule.push("boolean");
            GenericType::Boolean
        }
        NativeType::Enum(values) => {
            rule.push("string");
            if !values.is_empty() {
                rule.push(format!("in:{}", values.join(",")));
            }
            GenericType::String
        }
        NativeType::Unknown(_) => {
            rule.push("string");
            GenericType::String
        }
    };
    (generic, rule)
}

/// `exists:` clauses for every local column of a foreign key.
///
/// # Errors
///
/// [`Error::Config`](crate::Error::Config) when the local and foreign column lists differ in arity.
pub fn foreign_key_rules(
    local_table: &str,
    local_columns: &[String],
    foreign_table: &str,
    foreign_columns: &[String],
) -> Result<Vec<(String, String)>> {
    let fk = ForeignKeyConstraint::new(
        local_table,
        local_columns.to_vec(),
        foreign_table,
        foreign_columns.to_vec(),
    )?;
    Ok(fk
        .local_columns()
        .iter()
        .filter_map(|local| exists_clause(&fk, local).map(|clause| (local.clone(), clause)))
        .collect())
}

/// `exists:<foreign_table>,<foreign_column>` when `column` takes part in `fk`.
pub fn exists_clause(fk: &ForeignKeyConstraint, column: &str) -> Option<String> {
    fk.foreign_column_for(column)
        .map(|foreign| format!("exists:{},{foreign}", fk.foreign_table()))
}

/// `unique:<table>,<column>` when `column` alone forms the unique key.
///
/// Composite keys cannot be checked one field at a time and yield nothing.
pub fn unique_clause(key: &UniqueKeyConstraint, column: &str) -> Option<String> {
    match key.columns.as_slice() {
        [only] if only == column => Some(format!("unique:{},{column}", key.table)),
        _ => None,
    }
}

/// Full rule expression for one column of `table`.
///
/// Clause order: presence, type clauses, `exists:`, `unique:`.
pub fn column_rule(table: &TableModel, column: &ColumnDefinition, mode: RuleMode) -> RuleExpression {
    let mut rule = RuleExpression::new();
    match mode {
        RuleMode::Create => {
            rule.push(if column.nullable { "nullable" } else { "required" });
        }
        RuleMode::Update => {
            rule.push("sometimes");
            if column.nullable {
                rule.push("nullable");
            }
        }
    }
    let (_, type_rule) = map_type(&column.native_type);
    rule.extend(type_rule.clauses());
    for fk in table.foreign_keys() {
        if let Some(clause) = exists_clause(fk, &column.name) {
            rule.push(clause);
        }
    }
    for key in table.unique_keys() {
        if let Some(clause) = unique_clause(key, &column.name) {
            rule.push(clause);
        }
    }
    rule
}

/// Convert a catalog descriptor into the canonical [`TableModel`].
///
/// # Errors
///
/// [`Error::Config`](crate::Error::Config) on foreign keys with mismatched arity or an inconsistent
/// primary key.
pub fn table_model(raw: RawTableDescriptor, namespace: Option<&str>) -> Result<TableModel> {
    let pk_columns = &raw.primary_key.columns;
    if pk_columns.len() > 1 {
        warn!(
            table = %raw.name,
            columns = %pk_columns.join(","),
            "Composite primary key, using first column"
        );
    }
    let primary_key = pk_columns.first().cloned();
    let increments = raw.primary_key.auto_increment && pk_columns.len() == 1;

    let columns = raw
        .columns
        .iter()
        .map(|c| {
            let mut column = ColumnDefinition::new(&c.name, parse_native_type(&c.data_type))
                .nullable(c.nullable);
            if primary_key.as_deref() == Some(c.name.as_str()) {
                column = column.primary_key();
            }
            if let Some(default) = &c.default {
                column = column.with_default(default);
            }
            column
        })
        .collect();

    let foreign_keys = raw
        .foreign_keys
        .into_iter()
        .map(|fk| ForeignKeyConstraint::new(&raw.name, fk.columns, fk.foreign_table, fk.foreign_columns))
        .collect::<Result<Vec<_>>>()?;

    let unique_keys = raw
        .unique_keys
        .into_iter()
        .map(|cols| UniqueKeyConstraint::new(&raw.name, cols))
        .collect();

    TableModel::try_from(TableModelRecord {
        name: raw.name,
        primary_key,
        columns,
        foreign_keys,
        unique_keys,
        increments,
        namespace: namespace.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::Error;
    use crate::schema::introspect::{RawColumn, RawForeignKey, RawPrimaryKey};

    fn raw_posts() -> RawTableDescriptor {
        let col = |name: &str, ty: &str, nullable: bool| RawColumn {
            name: name.into(),
            data_type: ty.into(),
            nullable,
            default: None,
        };
        RawTableDescriptor {
            name: "posts".into(),
            columns: vec![
                col("id", "INTEGER", false),
                col("author_id", "BIGINT", false),
                col("editor_id", "BIGINT", true),
                col("slug", "VARCHAR(80)", false),
                col("body", "TEXT", true),
                col("score", "DECIMAL(8,2)", false),
                col("published_at", "DATETIME", true),
                col("payload", "JSONB", true),
            ],
            primary_key: RawPrimaryKey {
                columns: vec!["id".into()],
                auto_increment: true,
            },
            unique_keys: vec![vec!["slug".into()]],
            foreign_keys: vec![
                RawForeignKey {
                    columns: vec!["author_id".into()],
                    foreign_table: "people".into(),
                    foreign_columns: vec!["id".into()],
                },
                RawForeignKey {
                    columns: vec!["editor_id".into()],
                    foreign_table: "people".into(),
                    foreign_columns: vec!["id".into()],
                },
            ],
        }
    }

    #[test]
    fn parses_common_spellings() {
        assert_eq!(parse_native_type("VARCHAR(255)"), NativeType::Varchar(Some(255)));
        assert_eq!(parse_native_type("varchar:64"), NativeType::Varchar(Some(64)));
        assert_eq!(parse_native_type("int(11) unsigned"), NativeType::Integer(Some(11)));
        assert_eq!(parse_native_type("bigint unsigned"), NativeType::BigInt);
        assert_eq!(parse_native_type("tinyint(1)"), NativeType::Boolean);
        assert_eq!(
            parse_native_type("decimal(10, 2)"),
            NativeType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
        assert_eq!(
            parse_native_type("enum('draft','published')"),
            NativeType::Enum(vec!["draft".into(), "published".into()])
        );
        assert_eq!(
            parse_native_type("datetime:Y-m-d H:i"),
            NativeType::DateTime(Some("Y-m-d H:i".into()))
        );
        assert_eq!(parse_native_type("timestamp(6)"), NativeType::DateTime(None));
        assert_eq!(parse_native_type("timestamp with time zone"), NativeType::DateTime(None));
    }

    #[test]
    fn unknown_types_degrade_to_string() {
        let native = parse_native_type("GEOMETRY");
        assert_eq!(native, NativeType::Unknown("GEOMETRY".into()));
        let (generic, rule) = map_type(&native);
        assert_eq!(generic, GenericType::String);
        assert_eq!(rule.to_string(), "string");
    }

    #[test]
    fn maps_type_table() {
        let cases = [
            (NativeType::Text(None), "string|max:65535"),
            (NativeType::Text(Some(1000)), "string|max:1000"),
            (NativeType::Varchar(Some(80)), "string|max:80"),
            (NativeType::Integer(Some(11)), "integer|max:11"),
            (NativeType::Integer(None), "integer"),
            (NativeType::BigInt, "integer"),
            (
                NativeType::Decimal {
                    precision: Some(8),
                    scale: Some(2),
                },
                "numeric",
            ),
            (NativeType::DateTime(Some("Y-m-d H:i:s".into())), "date_format:Y-m-d H:i:s"),
            (NativeType::Date, "date"),
            (NativeType::Boolean, "boolean"),
            (NativeType::Enum(vec!["a".into(), "b".into()]), "string|in:a,b"),
        ];
        for (native, expected) in cases {
            assert_eq!(map_type(&native).1.to_string(), expected, "{native}");
        }
    }

    #[test]
    fn foreign_key_rules_require_matching_arity() {
        let err = foreign_key_rules("posts", &["a".into(), "b".into()], "people", &["id".into()])
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let rules = foreign_key_rules(
            "posts",
            &["author_id".into(), "tenant_id".into()],
            "people",
            &["id".into(), "tenant".into()],
        )
        .unwrap();
        assert_eq!(
            rules,
            vec![
                ("author_id".to_string(), "exists:people,id".to_string()),
                ("tenant_id".to_string(), "exists:people,tenant".to_string()),
            ]
        );
    }

    #[test]
    fn nullable_foreign_key_has_exists_but_no_required() {
        let table = table_model(raw_posts(), None).unwrap();
        let editor = table.column("editor_id").unwrap();
        let first = column_rule(&table, editor, RuleMode::Create).to_string();
        assert_eq!(first, "nullable|integer|exists:people,id");
        assert!(!first.contains("required"));
        for _ in 0..5 {
            assert_eq!(column_rule(&table, editor, RuleMode::Create).to_string(), first);
        }
    }

    #[test]
    fn update_rules_are_always_optional() {
        let table = table_model(raw_posts(), None).unwrap();
        let slug = table.column("slug").unwrap();
        assert_eq!(
            column_rule(&table, slug, RuleMode::Create).to_string(),
            "required|string|max:80|unique:posts,slug"
        );
        assert_eq!(
            column_rule(&table, slug, RuleMode::Update).to_string(),
            "sometimes|string|max:80|unique:posts,slug"
        );
    }

    #[test]
    fn composite_unique_keys_yield_no_clause() {
        let key = UniqueKeyConstraint::new("posts", vec!["tenant".into(), "slug".into()]);
        assert_eq!(unique_clause(&key, "slug"), None);
    }

    #[test]
    fn table_model_marks_primary_key_and_increments() {
        let table = table_model(raw_posts(), Some("blog")).unwrap();
        assert_eq!(table.primary_key(), Some("id"));
        assert!(table.increments());
        assert!(table.column("id").unwrap().primary_key);
        assert_eq!(table.namespace(), Some("blog"));
        assert_eq!(
            table.column("payload").unwrap().native_type,
            NativeType::Unknown("JSONB".into())
        );
    }

    #[test]
    fn rule_expression_dedupes_and_round_trips() {
        let mut rule = RuleExpression::parse("required|string||string");
        rule.push("max:10");
        assert_eq!(rule.to_string(), "required|string|max:10");
        assert!(rule.has("max"));
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, "\"required|string|max:10\"");
    }
}
