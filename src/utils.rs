use std::iter::FromIterator;
use std::time::SystemTime;

/// Collects an iterator that is expected to yield exactly one item.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AllowOnlyOne<T> {
    inner: Result<T, AllowOnlyOneError<T>>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum AllowOnlyOneError<T> {
    NoneFound,
    GotSecond(T),
}

impl<T> AllowOnlyOne<T> {
    pub fn into_res(self) -> Result<T, AllowOnlyOneError<T>> {
        self.inner
    }
}

impl<T> FromIterator<T> for AllowOnlyOne<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut iter = iter.into_iter();
        let inner = match (iter.next(), iter.next()) {
            (None, _) => Err(AllowOnlyOneError::NoneFound),
            (Some(first), None) => Ok(first),
            (Some(_), Some(second)) => Err(AllowOnlyOneError::GotSecond(second)),
        };
        Self { inner }
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is set before it.
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|diff| (diff.as_millis() & u128::from(u64::max_value())) as u64)
        .unwrap_or(0)
}
