use crate::client::{self, Backend, ClientError};
use crate::models::{self, Entity};

/// In-memory copy of one remote collection. The only write path is a
/// wholesale [`Mirror::replace`] with the result of a successful fetch.
#[derive(Clone, Debug)]
pub struct Mirror<T> {
    items: Vec<T>,
    loaded: bool,
}

impl<T> Default for Mirror<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

impl<T: Entity> Mirror<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.loaded = true;
    }

    /// Fetches the collection and swaps it in. On failure the previous
    /// snapshot is left untouched.
    pub async fn reload<B>(&mut self, backend: &B) -> Result<usize, ClientError>
    where
        B: Backend + ?Sized,
    {
        let items = client::list::<T, B>(backend).await?;
        let count = items.len();
        self.replace(items);
        log::debug!("reloaded {} ({} records)", T::COLLECTION, count);
        Ok(count)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn next_id(&self) -> String {
        models::next_id(self.items.iter().map(|item| item.id()))
    }
}
