//! Convenience macros

/// Build a [`NamedParams`](crate::query::NamedParams) map
///
/// Every value goes through [`ValueType`](crate::ValueType), so `Option<T>`
/// binds the typed NULL of `T`.
///
/// ```rust
/// use shelfmap::named_params;
///
/// let status: Option<i32> = None;
/// let params = named_params! {
///     "userID" => 7i64,
///     "status" => status,
/// };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! named_params {
    () => {
        $crate::query::NamedParams::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::query::NamedParams::new()
            $(.bind($name, $value))+
    };
}
