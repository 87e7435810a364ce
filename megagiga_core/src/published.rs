use tokio::sync::watch;

/// A value owned by one writer and observed by any number of readers.
///
/// Readers can either poll the current value with `get` or `subscribe` and
/// wait for changes. Only whoever holds the `Published` can change it.
#[derive(Debug)]
pub struct Published<T> {
    /// The sending half holds the current value.
    tx: watch::Sender<T>,
}

impl<T> Published<T> {
    /// Start publishing a value.
    pub fn new(value: T) -> Self {
        let (tx, _) = watch::channel(value);
        Self { tx }
    }

    /// A copy of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Look at the current value without copying it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.tx.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Change the value in place and notify subscribers.
    pub fn update(&self, edit: impl FnOnce(&mut T)) {
        self.tx.send_modify(edit);
    }

    /// Get a handle that is notified every time the value changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Default> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_reflects_updates() {
        let published = Published::new(1);

        published.update(|n| *n += 1);
        assert_eq!(published.get(), 2);

        published.set(10);
        assert_eq!(published.get(), 10);
    }

    #[test]
    fn with_reads_in_place() {
        let published = Published::new(vec![1, 2, 3]);

        assert_eq!(published.with(Vec::len), 3);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let published = Published::new("before");
        let mut rx = published.subscribe();

        published.set("after");

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "after");
    }

    #[tokio::test]
    async fn late_subscribers_start_from_current_value() {
        let published = Published::new(0);
        published.set(5);

        let rx = published.subscribe();

        assert_eq!(*rx.borrow(), 5);
        assert!(!rx.has_changed().unwrap());
    }
}
