use error_printer::ErrorPrinter;
use tracing_test::traced_test;

fn failing_put() -> Result<(), String> {
    Err("disk full".to_string())
}

#[test]
#[traced_test]
fn test_warn_error_logs_and_passes_through() {
    let result = failing_put().warn_error("failed to populate page");
    assert_eq!(result, Err("disk full".to_string()));
    assert!(logs_contain("failed to populate page, error: \"disk full\""));
    assert!(logs_contain("test_error.rs"));
}

#[test]
#[traced_test]
fn test_ok_is_silent() {
    let result: Result<u32, String> = Ok(5);
    assert_eq!(result.log_error("should not appear"), Ok(5));
    assert!(!logs_contain("should not appear"));
}

#[test]
#[traced_test]
fn test_debug_error_level() {
    let _ = failing_put().debug_error("cache lookup failed");
    assert!(logs_contain("DEBUG"));
    assert!(logs_contain("cache lookup failed"));
}
