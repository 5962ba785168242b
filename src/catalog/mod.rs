//! Catalog Query Library
//!
//! SQL templates for the `\d*` family, keyed by command type and the extended flag.
//!
//! # Layout
//! - Relation listings (`\d`, `\dt`, `\dv`, `\dm`, `\di`, `\ds`, `\dE`) share one
//!   projection builder and the same system-namespace filter; only the `relkind` set,
//!   the caption and the extended columns vary
//! - Non-relation listings (`\df`, `\dn`, `\l`, `\du`, `\dx`, `\dp`, `\conninfo`) have
//!   their own templates
//! - [`describe`] holds the `\d NAME` base query and its enrichment sections
//!
//! Patterns are translated with [`crate::sanitize`] before being spliced in; nothing
//! else from user input reaches the SQL text.

pub mod describe;

pub use describe::{DescribeSection, DESCRIBE_COLUMNS};

use crate::command::CommandType;
use crate::sanitize::{build_condition, build_name_condition};

/// A ready-to-run catalog query and the caption shown above its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub sql: String,
    pub caption: String,
}

impl CatalogQuery {
    fn new(sql: String, caption: &str) -> Self {
        Self { sql, caption: caption.to_string() }
    }
}

/// Hides system namespaces from relation-kind listings
pub(crate) const USER_NAMESPACES: &str = "n.nspname <> 'pg_catalog'
      AND n.nspname <> 'information_schema'
      AND n.nspname !~ '^pg_toast'";

const RELKIND_LABEL: &str = "CASE c.relkind
        WHEN 'r' THEN 'table'
        WHEN 'v' THEN 'view'
        WHEN 'm' THEN 'materialized view'
        WHEN 'i' THEN 'index'
        WHEN 'S' THEN 'sequence'
        WHEN 't' THEN 'TOAST table'
        WHEN 'f' THEN 'foreign table'
        WHEN 'p' THEN 'partitioned table'
        WHEN 'I' THEN 'partitioned index'
      END";

const RELATION_EXTENDED_COLUMNS: &str = ",
      CASE c.relpersistence
        WHEN 'p' THEN 'permanent'
        WHEN 't' THEN 'temporary'
        WHEN 'u' THEN 'unlogged'
      END AS \"Persistence\",
      pg_catalog.pg_size_pretty(pg_catalog.pg_table_size(c.oid)) AS \"Size\",
      pg_catalog.obj_description(c.oid, 'pg_class') AS \"Description\"";

/// One relation-kind listing
struct RelationFamily {
    relkinds: &'static str,
    caption: &'static str,
    /// Adds the owning table column and joins (`\di`)
    index_owner: bool,
}

const RELATIONS: RelationFamily = RelationFamily {
    relkinds: "'r','p','v','m','S','f'",
    caption: "List of relations",
    index_owner: false,
};
const TABLES: RelationFamily =
    RelationFamily { relkinds: "'r','p'", caption: "List of tables", index_owner: false };
const VIEWS: RelationFamily =
    RelationFamily { relkinds: "'v'", caption: "List of views", index_owner: false };
const MATERIALIZED_VIEWS: RelationFamily = RelationFamily {
    relkinds: "'m'",
    caption: "List of materialized views",
    index_owner: false,
};
const INDEXES: RelationFamily =
    RelationFamily { relkinds: "'i','I'", caption: "List of indexes", index_owner: true };
const SEQUENCES: RelationFamily =
    RelationFamily { relkinds: "'S'", caption: "List of sequences", index_owner: false };
const FOREIGN_TABLES: RelationFamily =
    RelationFamily { relkinds: "'f'", caption: "List of foreign tables", index_owner: false };

/// Build the listing query for `kind`
///
/// `pattern` is a raw psql glob; when present it narrows the listing. Returns `None`
/// for command types that are not catalog listings.
#[must_use]
pub fn list_query(kind: CommandType, extended: bool, pattern: Option<&str>) -> Option<CatalogQuery> {
    let pattern = pattern.unwrap_or_default();

    let query = match kind {
        CommandType::Describe => relation_query(&RELATIONS, extended, pattern),
        CommandType::ListTables => relation_query(&TABLES, extended, pattern),
        CommandType::ListViews => relation_query(&VIEWS, extended, pattern),
        CommandType::ListMaterializedViews => {
            relation_query(&MATERIALIZED_VIEWS, extended, pattern)
        }
        CommandType::ListIndexes => relation_query(&INDEXES, extended, pattern),
        CommandType::ListSequences => relation_query(&SEQUENCES, extended, pattern),
        CommandType::ListForeignTables => relation_query(&FOREIGN_TABLES, extended, pattern),
        CommandType::ListFunctions => functions_query(extended, pattern),
        CommandType::ListSchemas => schemas_query(extended, pattern),
        CommandType::ListDatabases => databases_query(extended, pattern),
        CommandType::ListUsers => roles_query(extended, pattern),
        CommandType::ListExtensions => extensions_query(extended, pattern),
        CommandType::ListPrivileges => privileges_query(pattern),
        CommandType::ConnInfo => conninfo_query(),
        _ => return None,
    };

    Some(query)
}

fn relation_query(family: &RelationFamily, extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_condition(pattern, "n.nspname", "c.relname");

    let (table_column, index_join) = if family.index_owner {
        (
            ",\n      c2.relname AS \"Table\"",
            "\n      LEFT JOIN pg_catalog.pg_index i ON i.indexrelid = c.oid\
             \n      LEFT JOIN pg_catalog.pg_class c2 ON i.indrelid = c2.oid",
        )
    } else {
        ("", "")
    };
    let extended_columns = if extended { RELATION_EXTENDED_COLUMNS } else { "" };

    let sql = format!(
        "SELECT n.nspname AS \"Schema\",
      c.relname AS \"Name\",
      {RELKIND_LABEL} AS \"Type\",
      pg_catalog.pg_get_userbyid(c.relowner) AS \"Owner\"{table_column}{extended_columns}
    FROM pg_catalog.pg_class c
      LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace{index_join}
    WHERE c.relkind IN ({relkinds})
      AND {USER_NAMESPACES}{condition}
    ORDER BY 1, 2",
        relkinds = family.relkinds,
    );

    CatalogQuery::new(sql, family.caption)
}

fn functions_query(extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_condition(pattern, "n.nspname", "p.proname");

    let (extended_columns, language_join) = if extended {
        (
            ",
      CASE p.provolatile
        WHEN 'i' THEN 'immutable'
        WHEN 's' THEN 'stable'
        WHEN 'v' THEN 'volatile'
      END AS \"Volatility\",
      pg_catalog.pg_get_userbyid(p.proowner) AS \"Owner\",
      l.lanname AS \"Language\",
      pg_catalog.obj_description(p.oid, 'pg_proc') AS \"Description\"",
            "\n      LEFT JOIN pg_catalog.pg_language l ON l.oid = p.prolang",
        )
    } else {
        ("", "")
    };

    let sql = format!(
        "SELECT n.nspname AS \"Schema\",
      p.proname AS \"Name\",
      pg_catalog.pg_get_function_result(p.oid) AS \"Result data type\",
      pg_catalog.pg_get_function_arguments(p.oid) AS \"Argument data types\",
      CASE p.prokind
        WHEN 'a' THEN 'agg'
        WHEN 'w' THEN 'window'
        WHEN 'p' THEN 'proc'
        ELSE 'func'
      END AS \"Type\"{extended_columns}
    FROM pg_catalog.pg_proc p
      LEFT JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace{language_join}
    WHERE {USER_NAMESPACES}{condition}
    ORDER BY 1, 2, 4"
    );

    CatalogQuery::new(sql, "List of functions")
}

fn schemas_query(extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_name_condition(pattern, "n.nspname");
    let extended_columns = if extended {
        ",
      pg_catalog.array_to_string(n.nspacl, E'\\n') AS \"Access privileges\",
      pg_catalog.obj_description(n.oid, 'pg_namespace') AS \"Description\""
    } else {
        ""
    };

    let sql = format!(
        "SELECT n.nspname AS \"Name\",
      pg_catalog.pg_get_userbyid(n.nspowner) AS \"Owner\"{extended_columns}
    FROM pg_catalog.pg_namespace n
    WHERE n.nspname !~ '^pg_'
      AND n.nspname <> 'information_schema'{condition}
    ORDER BY 1"
    );

    CatalogQuery::new(sql, "List of schemas")
}

fn databases_query(extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_name_condition(pattern, "d.datname");
    let (extended_columns, tablespace_join) = if extended {
        (
            ",
      CASE WHEN pg_catalog.has_database_privilege(d.datname, 'CONNECT')
        THEN pg_catalog.pg_size_pretty(pg_catalog.pg_database_size(d.datname))
        ELSE 'No Access'
      END AS \"Size\",
      t.spcname AS \"Tablespace\",
      pg_catalog.shobj_description(d.oid, 'pg_database') AS \"Description\"",
            "\n      JOIN pg_catalog.pg_tablespace t ON d.dattablespace = t.oid",
        )
    } else {
        ("", "")
    };

    let sql = format!(
        "SELECT d.datname AS \"Name\",
      pg_catalog.pg_get_userbyid(d.datdba) AS \"Owner\",
      pg_catalog.pg_encoding_to_char(d.encoding) AS \"Encoding\",
      d.datcollate::text AS \"Collate\",
      d.datctype::text AS \"Ctype\",
      pg_catalog.array_to_string(d.datacl, E'\\n') AS \"Access privileges\"{extended_columns}
    FROM pg_catalog.pg_database d{tablespace_join}
    WHERE true{condition}
    ORDER BY 1"
    );

    CatalogQuery::new(sql, "List of databases")
}

fn roles_query(extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_name_condition(pattern, "r.rolname");
    let extended_columns = if extended {
        ",
      pg_catalog.shobj_description(r.oid, 'pg_authid') AS \"Description\""
    } else {
        ""
    };

    let sql = format!(
        "SELECT r.rolname AS \"Role name\",
      pg_catalog.concat_ws(', ',
        CASE WHEN r.rolsuper THEN 'Superuser' END,
        CASE WHEN NOT r.rolinherit THEN 'No inheritance' END,
        CASE WHEN r.rolcreaterole THEN 'Create role' END,
        CASE WHEN r.rolcreatedb THEN 'Create DB' END,
        CASE WHEN NOT r.rolcanlogin THEN 'Cannot login' END,
        CASE WHEN r.rolreplication THEN 'Replication' END,
        CASE WHEN r.rolbypassrls THEN 'Bypass RLS' END
      ) AS \"Attributes\",
      pg_catalog.array_to_string(ARRAY(
        SELECT b.rolname
        FROM pg_catalog.pg_auth_members m
          JOIN pg_catalog.pg_roles b ON m.roleid = b.oid
        WHERE m.member = r.oid
        ORDER BY 1
      ), ', ') AS \"Member of\"{extended_columns}
    FROM pg_catalog.pg_roles r
    WHERE r.rolname !~ '^pg_'{condition}
    ORDER BY 1"
    );

    CatalogQuery::new(sql, "List of roles")
}

fn extensions_query(extended: bool, pattern: &str) -> CatalogQuery {
    let condition = build_name_condition(pattern, "e.extname");

    if extended {
        let sql = format!(
            "SELECT e.extname AS \"Extension\",
      pg_catalog.pg_describe_object(d.classid, d.objid, 0) AS \"Object description\"
    FROM pg_catalog.pg_depend d
      JOIN pg_catalog.pg_extension e ON d.refobjid = e.oid
    WHERE d.refclassid = 'pg_catalog.pg_extension'::pg_catalog.regclass
      AND d.deptype = 'e'{condition}
    ORDER BY 1, 2"
        );
        return CatalogQuery::new(sql, "Objects in extensions");
    }

    let sql = format!(
        "SELECT e.extname AS \"Name\",
      e.extversion AS \"Version\",
      n.nspname AS \"Schema\",
      c.description AS \"Description\"
    FROM pg_catalog.pg_extension e
      LEFT JOIN pg_catalog.pg_namespace n ON n.oid = e.extnamespace
      LEFT JOIN pg_catalog.pg_description c ON c.objoid = e.oid
        AND c.classoid = 'pg_catalog.pg_extension'::pg_catalog.regclass
    WHERE true{condition}
    ORDER BY 1"
    );

    CatalogQuery::new(sql, "List of installed extensions")
}

fn privileges_query(pattern: &str) -> CatalogQuery {
    let condition = build_condition(pattern, "n.nspname", "c.relname");

    let sql = format!(
        "SELECT n.nspname AS \"Schema\",
      c.relname AS \"Name\",
      {RELKIND_LABEL} AS \"Type\",
      pg_catalog.array_to_string(c.relacl, E'\\n') AS \"Access privileges\",
      pg_catalog.array_to_string(ARRAY(
        SELECT a.attname || ':' || pg_catalog.array_to_string(a.attacl, ' ')
        FROM pg_catalog.pg_attribute a
        WHERE a.attrelid = c.oid AND NOT a.attisdropped AND a.attacl IS NOT NULL
      ), E'\\n') AS \"Column privileges\"
    FROM pg_catalog.pg_class c
      LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r','p','v','m','S','f')
      AND {USER_NAMESPACES}{condition}
    ORDER BY 1, 2"
    );

    CatalogQuery::new(sql, "Access privileges")
}

fn conninfo_query() -> CatalogQuery {
    let sql = "SELECT pg_catalog.current_database() AS \"Database\",
      current_user::text AS \"User\",
      COALESCE(pg_catalog.inet_server_addr()::text, 'local socket') AS \"Host\",
      pg_catalog.inet_server_port() AS \"Port\",
      pg_catalog.version() AS \"Server version\""
        .to_string();

    CatalogQuery::new(sql, "Connection information")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(kind: CommandType, extended: bool, pattern: Option<&str>) -> String {
        list_query(kind, extended, pattern).unwrap().sql
    }

    #[test]
    fn test_relation_listings_share_namespace_filter() {
        for kind in [
            CommandType::Describe,
            CommandType::ListTables,
            CommandType::ListViews,
            CommandType::ListMaterializedViews,
            CommandType::ListIndexes,
            CommandType::ListSequences,
            CommandType::ListForeignTables,
            CommandType::ListPrivileges,
        ] {
            for extended in [false, true] {
                let text = sql(kind, extended, None);
                assert!(text.contains(USER_NAMESPACES), "{kind:?} misses namespace filter");
            }
        }
    }

    #[test]
    fn test_extended_tables_add_columns() {
        let plain = sql(CommandType::ListTables, false, None);
        let extended = sql(CommandType::ListTables, true, None);

        for column in ["\"Schema\"", "\"Name\"", "\"Type\"", "\"Owner\""] {
            assert!(plain.contains(column));
            assert!(extended.contains(column));
        }
        for column in ["\"Persistence\"", "\"Size\"", "\"Description\""] {
            assert!(!plain.contains(column));
            assert!(extended.contains(column));
        }
    }

    #[test]
    fn test_relkinds_per_family() {
        assert!(sql(CommandType::ListTables, false, None).contains("c.relkind IN ('r','p')"));
        assert!(sql(CommandType::ListViews, false, None).contains("c.relkind IN ('v')"));
        assert!(sql(CommandType::ListMaterializedViews, false, None)
            .contains("c.relkind IN ('m')"));
        assert!(sql(CommandType::ListSequences, false, None).contains("c.relkind IN ('S')"));
        assert!(sql(CommandType::ListForeignTables, false, None).contains("c.relkind IN ('f')"));
    }

    #[test]
    fn test_index_listing_includes_owning_table() {
        let text = sql(CommandType::ListIndexes, false, None);
        assert!(text.contains("c2.relname AS \"Table\""));
        assert!(text.contains("pg_catalog.pg_index i"));
        assert!(!sql(CommandType::ListTables, false, None).contains("\"Table\""));
    }

    #[test]
    fn test_pattern_condition_is_spliced() {
        let text = sql(CommandType::ListTables, false, Some("public.user*"));
        assert!(text.contains(
            " AND n.nspname LIKE 'public' ESCAPE '\\' AND c.relname LIKE 'user%' ESCAPE '\\'"
        ));
    }

    #[test]
    fn test_name_only_families_do_not_split_on_dot() {
        let text = sql(CommandType::ListDatabases, false, Some("app.v2"));
        assert!(text.contains(" AND d.datname LIKE 'app.v2' ESCAPE '\\'"));
        let text = sql(CommandType::ListUsers, false, Some("admin*"));
        assert!(text.contains(" AND r.rolname LIKE 'admin%' ESCAPE '\\'"));
    }

    #[test]
    fn test_captions() {
        let caption = |kind, extended| list_query(kind, extended, None).unwrap().caption;
        assert_eq!(caption(CommandType::Describe, false), "List of relations");
        assert_eq!(caption(CommandType::ListTables, true), "List of tables");
        assert_eq!(caption(CommandType::ListUsers, false), "List of roles");
        assert_eq!(caption(CommandType::ListExtensions, false), "List of installed extensions");
        assert_eq!(caption(CommandType::ListExtensions, true), "Objects in extensions");
        assert_eq!(caption(CommandType::ConnInfo, false), "Connection information");
    }

    #[test]
    fn test_non_catalog_commands_have_no_query() {
        for kind in [
            CommandType::DescribeTable,
            CommandType::Help,
            CommandType::Quit,
            CommandType::Connect,
            CommandType::ToggleExpanded,
            CommandType::ToggleTiming,
            CommandType::Unknown,
        ] {
            assert!(list_query(kind, false, None).is_none(), "{kind:?} should have no query");
        }
    }

    #[test]
    fn test_quotes_in_pattern_cannot_close_literal() {
        let text = sql(CommandType::ListSchemas, false, Some("x' OR '1'='1"));
        assert!(text.contains("LIKE 'x'' OR ''1''=''1' ESCAPE"));
    }
}
