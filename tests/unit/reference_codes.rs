//! Reference tables loaded from a directory

use std::fs;
use std::sync::Arc;

use comtrade_downloader::query::ComtradeQuery;
use comtrade_downloader::registry::{AreaCode, AreaKind, ReferenceCodes, RegistryError};
use comtrade_downloader::ComtradeError;
use tempfile::TempDir;

fn write_tables(dir: &TempDir) {
    fs::write(
        dir.path().join("reporterAreas.json"),
        r#"{"results": [{"id": "all", "text": "All"}, {"id": "36", "text": "Australia"}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("partnerAreas.json"),
        r#"{"results": [{"id": "0", "text": "World"}, {"id": "554", "text": "New Zealand"}]}"#,
    )
    .unwrap();
}

#[test]
fn test_from_dir_loads_both_tables() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);

    let codes = ReferenceCodes::from_dir(dir.path()).unwrap();
    let reporters = codes.table(AreaKind::Reporter);
    assert_eq!(reporters.len(), 1);
    assert_eq!(reporters.resolve_name("all"), Some(AreaCode::All));
    assert_eq!(
        codes.table(AreaKind::Partner).resolve_name("new zealand"),
        Some(AreaCode::Code(554))
    );
}

#[test]
fn test_from_dir_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        ReferenceCodes::from_dir(dir.path()),
        Err(RegistryError::Io(_))
    ));
}

#[test]
fn test_query_validates_against_custom_tables() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let codes = Arc::new(ReferenceCodes::from_dir(dir.path()).unwrap());

    let mut query = ComtradeQuery::with_codes(codes);
    query.set_partner_area("New Zealand").unwrap();
    query.set_reporting_area(36u32).unwrap();
    assert!(query.url().contains("p=554&r=36"));

    // Canada is in the bundled tables but not in these
    assert!(matches!(
        query.set_reporting_area(124u32),
        Err(ComtradeError::Validation(_))
    ));
}
