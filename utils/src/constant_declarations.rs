use std::str::FromStr;

/// Prefix of every environment variable that can override a configurable constant.
pub const ENV_VAR_PREFIX: &str = "LOCALCACHE_";

/// How a configurable constant may be overridden.
///
/// `Overridable` values are read from the environment in every build, `DebugOnly` values
/// only honor the environment in debug builds and are fixed in release builds.
pub enum ConfigMode<T> {
    DebugOnly(T),
    Overridable(T),
}

/// Marks a constant as fixed in release builds, e.g. `ref PAGE_SIZE_BYTES: u64 = release_fixed(4096);`
#[allow(dead_code)]
pub fn release_fixed<T>(t: T) -> ConfigMode<T> {
    ConfigMode::DebugOnly(t)
}

impl<T> From<T> for ConfigMode<T> {
    fn from(value: T) -> Self {
        ConfigMode::Overridable(value)
    }
}

/// Parses `env_var` as a `T`, falling back to `default` when unset or unparsable.
pub fn load_from_env<T: FromStr>(env_var: &str, default: T) -> T {
    std::env::var(env_var).ok().and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

/// Resolves the value of a configurable constant given its declared mode.
pub fn resolve<T: FromStr>(env_var: &str, mode: ConfigMode<T>) -> T {
    match (mode, cfg!(debug_assertions)) {
        (ConfigMode::DebugOnly(v), false) => v,
        (ConfigMode::DebugOnly(v), true) => load_from_env(env_var, v),
        (ConfigMode::Overridable(v), _) => load_from_env(env_var, v),
    }
}

/// Declares lazily initialized globals whose defaults can be overridden through
/// `LOCALCACHE_<NAME>` environment variables.
#[macro_export]
macro_rules! configurable_constants {
    ($(
        $(#[$meta:meta])*
        ref $name:ident : $type:ty = $value:expr;
    )+) => {
        $(
            #[allow(unused_imports)]
            use utils::constant_declarations::*;
            lazy_static::lazy_static! {
                $(#[$meta])*
                pub static ref $name: $type = {
                    let mode: utils::constant_declarations::ConfigMode<$type> = ($value).into();
                    utils::constant_declarations::resolve(concat!("LOCALCACHE_", stringify!($name)), mode)
                };
            }
        )+
    };
}

#[cfg(not(doctest))]
/// Sets `LOCALCACHE_<NAME>` to `$value` for a test and forces the global to load, panicking
/// if the global was already initialized with a different value.
///
/// # Example
/// ```rust
/// use utils::{configurable_constants, test_set_global};
/// configurable_constants! {
///    ref READ_AHEAD_PAGES: u64 = 4;
/// }
///
/// fn test_read_ahead() {
///     test_set_global!(READ_AHEAD_PAGES, 8);
///     assert_eq!(*READ_AHEAD_PAGES, 8);
/// }
/// ```
#[macro_export]
macro_rules! test_set_global {
    ($global_name:ident, $value:expr) => {{
        let env_var_name = concat!("LOCALCACHE_", stringify!($global_name));
        ::std::env::set_var(env_var_name, $value.to_string());

        let actual_value = *$global_name;

        if actual_value != $value {
            panic!(
                "test_set_global! failed: wanted {} to be {}, but got {}",
                stringify!($global_name),
                $value,
                actual_value
            );
        }
    }};
}
