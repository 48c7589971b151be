pub trait ResultExt<T> {
    fn unwrap_or_warn(self, default: T, error_message: &str) -> T;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for Result<T, E> {
    fn unwrap_or_warn(self, default: T, error_message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{}: {:?}", error_message, e);
                default
            }
        }
    }
}
