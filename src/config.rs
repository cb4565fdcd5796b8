#[derive(Clone, Debug, Default)]
pub enum Timeout {
    Instant,
    Duration(std::time::Duration),
    #[default]
    Infinite,
}

#[derive(Clone, Debug, Default)]
pub struct CellConfig<T> {
    /// Returned by a cancelled read instead of an error, unless it equals `T::default()`.
    pub default_value: T,
}

impl<T: PartialEq + Default> CellConfig<T> {
    pub fn with_default(default_value: T) -> Self {
        CellConfig { default_value }
    }

    pub(crate) fn fallback(&self) -> Option<&T> {
        if self.default_value != T::default() {
            Some(&self.default_value)
        } else {
            None
        }
    }
}
