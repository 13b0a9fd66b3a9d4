//! Tests for presentation tables

use crate::{Presentation, Severity, TransactionStatus};

#[test]
fn test_short_status_and_severity() {
    let p = Presentation::Short;
    assert_eq!(p.transaction_status("U"), "Committed");
    assert_eq!(p.transaction_status("C"), "RolledBack");
    assert_eq!(p.transaction_status("R"), "InProgress");
    assert_eq!(p.transaction_status("N"), "NotApplicable");
    assert_eq!(p.severity("I"), "Information");
    assert_eq!(p.severity("E"), "Error");
    assert_eq!(p.severity("W"), "Warning");
    assert_eq!(p.severity("N"), "Notification");
}

#[test]
fn test_short_leaves_application_and_event_codes() {
    let p = Presentation::Short;
    assert_eq!(p.application("1CV8C"), "1CV8C");
    assert_eq!(p.event("_$Session$_.Start"), "_$Session$_.Start");
}

#[test]
fn test_long_tables() {
    let p = Presentation::Long;
    assert_eq!(p.transaction_status("U"), "Зафиксирована");
    assert_eq!(p.severity("E"), "Ошибка");
    assert_eq!(p.application("1CV8C"), "Тонкий клиент");
    assert_eq!(p.event("_$Session$_.Start"), "Сеанс. Начало");
}

#[test]
fn test_unknown_codes_pass_through() {
    for p in [Presentation::Short, Presentation::Long] {
        assert_eq!(p.transaction_status("Z"), "Z");
        assert_eq!(p.severity(""), "");
        assert_eq!(p.application("MyApp"), "MyApp");
        assert_eq!(p.event("Custom.Event"), "Custom.Event");
    }
}

#[test]
fn test_code_parsing() {
    assert_eq!(TransactionStatus::from_code("C"), Some(TransactionStatus::RolledBack));
    assert_eq!(TransactionStatus::from_code("u"), None);
    assert_eq!(Severity::from_code("W"), Some(Severity::Warning));
}

#[test]
fn test_presentation_from_str() {
    assert_eq!("short".parse::<Presentation>().unwrap(), Presentation::Short);
    assert_eq!("LONG".parse::<Presentation>().unwrap(), Presentation::Long);
    assert!("medium".parse::<Presentation>().is_err());
    assert_eq!(Presentation::Long.to_string(), "long");
}
