use crate::error::Error;

pub fn try_or_raise<T>(func: impl FnOnce() -> Result<T, Error>) -> T {
    func().unwrap_or_else(|err| raise_exception(err))
}
