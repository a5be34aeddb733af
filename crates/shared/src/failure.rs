use tracing::error;

fn log_and_panic<Err: core::fmt::Display>(error: Err, message: &str) -> ! {
    error!("{message}: {error}");

    panic!("{message}: {error}");
}

/// Extension trait for start-up failures the keeper cannot recover from.
pub trait Failure<T> {
    /// Log the error then panic with the same message.
    fn or_log_and_panic(self, message: &str) -> T;
}

impl<T, E: core::fmt::Display> Failure<T> for Result<T, E> {
    fn or_log_and_panic(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(error) => log_and_panic(error, message),
        }
    }
}

impl<T> Failure<T> for Option<T> {
    fn or_log_and_panic(self, message: &str) -> T {
        match self {
            Some(value) => value,
            None => log_and_panic("value was missing", message),
        }
    }
}
