#[cfg(test)]
mod tests {
    use crate::error::AptxError;
    use crate::parsing::sql_parser::{list_tables, list_tables_excluding, parse_insert, rows_for};

    const EXPORT: &str = "\
insert into exposures (obs, exp, filter) values (1, 1, 'F200W');
insert into visits (obs, visit) values (1, 1);
insert into ppsdb_bookkeeping (version) values ('1.0');
insert into exposures (obs, exp, filter) values (1, 2, 'F444W');
-- trailing comment
";

    /// Test table listing skips the bookkeeping pseudo-table
    #[test]
    fn test_list_tables_sorted_and_distinct() {
        let tables: Vec<String> = list_tables(EXPORT.lines()).into_iter().collect();
        assert_eq!(tables, vec!["exposures", "visits"]);
    }

    /// Test custom exclusion list
    #[test]
    fn test_list_tables_excluding_custom() {
        let excluded = vec!["visits".to_string()];
        let tables: Vec<String> = list_tables_excluding(EXPORT.lines(), &excluded)
            .into_iter()
            .collect();
        assert_eq!(tables, vec!["exposures", "ppsdb_bookkeeping"]);
    }

    /// Test an export without statements has no tables
    #[test]
    fn test_list_tables_empty_export() {
        assert!(list_tables(Vec::<String>::new()).is_empty());
        assert!(list_tables(["-- nothing here"]).is_empty());
    }

    /// Test rows come back in file order with raw value text
    #[test]
    fn test_rows_for_table() {
        let rows = rows_for(EXPORT.lines(), "exposures").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["exp"], "1");
        assert_eq!(rows[0]["filter"], "'F200W'");
        assert_eq!(rows[1]["filter"], "'F444W'");
    }

    /// Test a table name that is a prefix of another does not match it
    #[test]
    fn test_rows_for_prefix_table_name() {
        let lines = ["insert into visits_extra (a) values (1)"];
        let result = rows_for(lines, "visits");
        assert!(matches!(result, Err(AptxError::NoSuchTable { .. })));
    }

    /// Test requesting a table that is absent
    #[test]
    fn test_rows_for_missing_table() {
        match rows_for(EXPORT.lines(), "targets") {
            Err(AptxError::NoSuchTable { table }) => assert_eq!(table, "targets"),
            other => panic!("Expected NoSuchTable, got {:?}", other),
        }
    }

    /// Test column/value count mismatch is rejected
    #[test]
    fn test_rows_for_arity_mismatch() {
        let lines = ["insert into t (a, b, c) values (1, 2, 3, 4);\n"];
        match rows_for(lines, "t") {
            Err(AptxError::MalformedRow { table, line, reason }) => {
                assert_eq!(table, "t");
                assert_eq!(line, "insert into t (a, b, c) values (1, 2, 3, 4);");
                assert_eq!(reason, "3 columns but 4 values");
            }
            other => panic!("Expected MalformedRow, got {:?}", other),
        }
    }

    /// Test uppercase keyword, brackets and missing semicolon
    #[test]
    fn test_parse_insert_variants() {
        let row = parse_insert("t", "", "[a, b] VALUES [1, 'x, y']").unwrap();
        assert_eq!(row["a"], "1");
        assert_eq!(row["b"], "'x, y'");

        let row = parse_insert("t", "", "(a) values ('O''Brien');").unwrap();
        assert_eq!(row["a"], "'O''Brien'");
    }

    /// Test the column list ends at the keyword, not at the first parenthesis
    #[test]
    fn test_parse_insert_mixed_enclosures() {
        let row = parse_insert("t", "", "[a, b] values (1, 2)").unwrap();
        assert_eq!(row["a"], "1");
        assert_eq!(row["b"], "2");

        let row = parse_insert("t", "", "(note, n) values ('keep values, here', 3)").unwrap();
        assert_eq!(row["note"], "'keep values, here'");
        assert_eq!(row["n"], "3");
    }

    /// Test statements without a values clause
    #[test]
    fn test_parse_insert_missing_values() {
        assert!(matches!(
            parse_insert("t", "", "(a, b) (1, 2)"),
            Err(AptxError::MalformedRow { .. })
        ));
        assert!(matches!(
            parse_insert("t", "", "(a, b"),
            Err(AptxError::MalformedRow { .. })
        ));
    }
}
