//! `\d NAME` Queries
//!
//! The relation is resolved with `to_regclass($1)`, so the name is always a bound
//! parameter. An unknown relation yields zero column rows instead of an error.
//!
//! The column query also carries the relation's `relkind`, which picks the caption.
//! Every enrichment section query returns two text columns: `name` and `definition`.

/// Column listing for one relation
pub const DESCRIBE_COLUMNS: &str = "SELECT a.attname AS \"Column\",
      pg_catalog.format_type(a.atttypid, a.atttypmod) AS \"Type\",
      CASE WHEN a.attnotnull THEN 'not null' ELSE '' END AS \"Nullable\",
      COALESCE(pg_catalog.pg_get_expr(d.adbin, d.adrelid), '') AS \"Default\",
      c.relkind::text AS relkind
    FROM pg_catalog.pg_attribute a
      JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
      LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE a.attrelid = pg_catalog.to_regclass($1)
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum";

/// Column headers of the describe listing, in display order
pub const DESCRIBE_HEADERS: [&str; 4] = ["Column", "Type", "Nullable", "Default"];

const INDEXES: &str = "SELECT c2.relname AS name,
      CASE WHEN i.indisprimary THEN 'PRIMARY KEY, '
           WHEN i.indisunique THEN 'UNIQUE, '
           ELSE ''
      END || pg_catalog.regexp_replace(
        pg_catalog.pg_get_indexdef(i.indexrelid, 0, true), '^.* USING ', ''
      ) AS definition
    FROM pg_catalog.pg_index i
      JOIN pg_catalog.pg_class c2 ON c2.oid = i.indexrelid
    WHERE i.indrelid = pg_catalog.to_regclass($1)
    ORDER BY i.indisprimary DESC, c2.relname";

const CHECK_CONSTRAINTS: &str = "SELECT r.conname AS name,
      pg_catalog.pg_get_constraintdef(r.oid, true) AS definition
    FROM pg_catalog.pg_constraint r
    WHERE r.conrelid = pg_catalog.to_regclass($1)
      AND r.contype IN ('c', 'u')
    ORDER BY r.contype, r.conname";

const FOREIGN_KEYS: &str = "SELECT r.conname AS name,
      pg_catalog.pg_get_constraintdef(r.oid, true) AS definition
    FROM pg_catalog.pg_constraint r
    WHERE r.conrelid = pg_catalog.to_regclass($1)
      AND r.contype = 'f'
    ORDER BY r.conname";

const REFERENCED_BY: &str = "SELECT r.conname AS name,
      'TABLE ' || r.conrelid::pg_catalog.regclass::text || ' '
        || pg_catalog.pg_get_constraintdef(r.oid, true) AS definition
    FROM pg_catalog.pg_constraint r
    WHERE r.confrelid = pg_catalog.to_regclass($1)
      AND r.contype = 'f'
    ORDER BY r.conrelid::pg_catalog.regclass::text, r.conname";

/// Enrichment sections appended after the column listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeSection {
    Indexes,
    CheckConstraints,
    ForeignKeys,
    ReferencedBy,
}

impl DescribeSection {
    /// Sections in output order
    pub const ALL: [Self; 4] =
        [Self::Indexes, Self::CheckConstraints, Self::ForeignKeys, Self::ReferencedBy];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Indexes => "Indexes:",
            Self::CheckConstraints => "Check constraints:",
            Self::ForeignKeys => "Foreign-key constraints:",
            Self::ReferencedBy => "Referenced by:",
        }
    }

    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Indexes => INDEXES,
            Self::CheckConstraints => CHECK_CONSTRAINTS,
            Self::ForeignKeys => FOREIGN_KEYS,
            Self::ReferencedBy => REFERENCED_BY,
        }
    }
}

/// Column of [`DESCRIBE_COLUMNS`] holding `pg_class.relkind`
pub const RELKIND_COLUMN: &str = "relkind";

/// Caption for `\d NAME`, e.g. `View "public.v1"`
///
/// Unrecognized kinds fall back to `Table`.
#[must_use]
pub fn describe_caption(relkind: &str, qualified_name: &str) -> String {
    let object = match relkind {
        "p" => "Partitioned table",
        "v" => "View",
        "m" => "Materialized view",
        "i" => "Index",
        "I" => "Partitioned index",
        "S" => "Sequence",
        "f" => "Foreign table",
        "t" => "TOAST table",
        "c" => "Composite type",
        _ => "Table",
    };
    format!("{object} \"{qualified_name}\"")
}
