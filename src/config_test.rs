use super::*;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK` so no other test in this module mutates the env concurrently.
unsafe fn clear_leads_env() {
    unsafe {
        std::env::remove_var("LEADS_API_BASE_URL");
        std::env::remove_var("LEADS_DEBOUNCE_MS");
        std::env::remove_var("LEADS_LIST_POLL_SECS");
        std::env::remove_var("LEADS_DETAIL_POLL_SECS");
        std::env::remove_var("LEADS_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("LEADS_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("LEADS_OPTIMISTIC_POLICY");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_leads_env() };

    let cfg = SyncConfig::from_env().unwrap();
    assert_eq!(cfg, SyncConfig::default());
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.debounce, Duration::from_millis(500));
    assert_eq!(cfg.list_poll, Some(Duration::from_secs(10)));
    assert_eq!(cfg.detail_poll, Some(Duration::from_secs(30)));
    assert_eq!(cfg.policy, OptimisticPolicy::NoRollback);
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leads_env();
        std::env::set_var("LEADS_API_BASE_URL", "https://crm.example.test/");
        std::env::set_var("LEADS_DEBOUNCE_MS", "250");
        std::env::set_var("LEADS_LIST_POLL_SECS", "0");
        std::env::set_var("LEADS_DETAIL_POLL_SECS", "5");
        std::env::set_var("LEADS_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("LEADS_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("LEADS_OPTIMISTIC_POLICY", "rollback");
    }

    let cfg = SyncConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://crm.example.test");
    assert_eq!(cfg.debounce, Duration::from_millis(250));
    assert_eq!(cfg.list_poll, None);
    assert_eq!(cfg.detail_poll, Some(Duration::from_secs(5)));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.policy, OptimisticPolicy::RollbackOnFailure);

    unsafe { clear_leads_env() };
}

#[test]
fn from_env_unparsable_numbers_fall_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leads_env();
        std::env::set_var("LEADS_DEBOUNCE_MS", "soon");
    }

    let cfg = SyncConfig::from_env().unwrap();
    assert_eq!(cfg.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));

    unsafe { clear_leads_env() };
}

#[test]
fn from_env_unknown_policy_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leads_env();
        std::env::set_var("LEADS_OPTIMISTIC_POLICY", "sometimes");
    }

    let err = SyncConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPolicy(ref p) if p == "sometimes"));

    unsafe { clear_leads_env() };
}

#[test]
fn from_env_rejects_non_http_base_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leads_env();
        std::env::set_var("LEADS_API_BASE_URL", "ftp://files.example.test");
    }

    let err = SyncConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("scheme must be http or https"));

    unsafe { clear_leads_env() };
}

#[test]
fn from_env_rejects_relative_base_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_leads_env();
        std::env::set_var("LEADS_API_BASE_URL", "/api");
    }

    assert!(matches!(SyncConfig::from_env(), Err(ConfigError::InvalidBaseUrl { .. })));

    unsafe { clear_leads_env() };
}

#[test]
fn env_parse_missing_returns_default() {
    let val: u64 = env_parse("__LEADS_TEST_NONEXISTENT_KEY__", 42);
    assert_eq!(val, 42);
}
