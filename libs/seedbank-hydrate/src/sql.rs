//! Statement text helpers.
//!
//! Selected columns are aliased to their qualified name (`t.c AS "t.c"`) so
//! rows of joined queries are addressed the same way regardless of which
//! tables were joined.

use crate::database::Mapped;

/// Unqualified column name: `"datasets.name"` becomes `"name"`.
#[must_use]
pub fn column_name(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map_or(qualified, |(_, column)| column)
}

#[must_use]
pub fn select_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{c} AS \"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[must_use]
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[must_use]
pub fn insert_sql(table: &str, columns: &[&str]) -> String {
    let names = columns
        .iter()
        .map(|c| column_name(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({names}) VALUES ({})",
        placeholders(columns.len())
    )
}

/// `SELECT <columns> FROM <table> WHERE <id column> = ?`
#[must_use]
pub fn select_by_id<E: Mapped>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_list(E::COLUMNS),
        E::TABLE,
        E::ID_COLUMN
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_support::Crop;

    #[test]
    fn builds_insert_with_unqualified_columns() {
        assert_eq!(
            insert_sql("samples", &["samples.label", "samples.crop_id"]),
            "INSERT INTO samples (label, crop_id) VALUES (?, ?)"
        );
    }

    #[test]
    fn aliases_selected_columns() {
        assert_eq!(
            select_list(&["crops.id", "crops.name"]),
            r#"crops.id AS "crops.id", crops.name AS "crops.name""#
        );
    }

    #[test]
    fn select_by_id_uses_mapping() {
        assert_eq!(
            select_by_id::<Crop>(),
            r#"SELECT crops.id AS "crops.id", crops.name AS "crops.name", crops.kind AS "crops.kind" FROM crops WHERE crops.id = ?"#
        );
    }

    #[test]
    fn column_name_of_unqualified_is_itself() {
        assert_eq!(column_name("count"), "count");
        assert_eq!(placeholders(0), "");
    }
}
