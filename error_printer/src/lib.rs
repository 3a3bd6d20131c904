use std::fmt::{Debug, Display};

use tracing::{debug, error, info, warn, Level};

/// Logs the error of a `Result` and hands the `Result` back unchanged, for call sites
/// where a failure is tolerated (best-effort cache population, drop-time cleanup).
///
/// The reported callsite is the first caller up the stack without `#[track_caller]`.
pub trait ErrorPrinter {
    fn log_error<M: Display>(self, message: M) -> Self;

    fn warn_error<M: Display>(self, message: M) -> Self;

    fn debug_error<M: Display>(self, message: M) -> Self;

    fn info_error<M: Display>(self, message: M) -> Self;
}

impl<T, E: Debug> ErrorPrinter for Result<T, E> {
    #[track_caller]
    fn log_error<M: Display>(self, message: M) -> Self {
        print_error(&self, Level::ERROR, message);
        self
    }

    #[track_caller]
    fn warn_error<M: Display>(self, message: M) -> Self {
        print_error(&self, Level::WARN, message);
        self
    }

    #[track_caller]
    fn debug_error<M: Display>(self, message: M) -> Self {
        print_error(&self, Level::DEBUG, message);
        self
    }

    #[track_caller]
    fn info_error<M: Display>(self, message: M) -> Self {
        print_error(&self, Level::INFO, message);
        self
    }
}

#[track_caller]
fn print_error<T, E: Debug, M: Display>(result: &Result<T, E>, level: Level, message: M) {
    let Err(e) = result else {
        return;
    };
    let location = std::panic::Location::caller();
    let caller = format!("{}:{}", location.file(), location.line());
    // tracing needs the level at compile time
    if level == Level::ERROR {
        error!(caller, "{message}, error: {e:?}")
    } else if level == Level::WARN {
        warn!(caller, "{message}, error: {e:?}")
    } else if level == Level::INFO {
        info!(caller, "{message}, error: {e:?}")
    } else {
        debug!(caller, "{message}, error: {e:?}")
    }
}
