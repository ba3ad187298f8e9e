/// Iterator keeping track of how many items were consumed and how many there are in total.
///
/// Progress bars read the total to compute the epoch progress and the count to know where to
/// resume when an epoch is restarted from a checkpoint.
pub struct CountingIterator<I> {
    iter: I,
    n: usize,
    total: usize,
}

impl<I: ExactSizeIterator> CountingIterator<I> {
    /// Create a new counting iterator starting at the first item.
    pub fn new<T>(iterable: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        let iter = iterable.into_iter();
        let total = iter.len();

        Self { iter, n: 0, total }
    }

    /// Create a counting iterator over the remaining items of a partially consumed epoch.
    ///
    /// The first `start` items of the epoch are expected to be already consumed, so `iterable`
    /// only contains the remaining ones.
    pub fn resume<T>(iterable: T, start: usize) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        let iter = iterable.into_iter();
        let total = start + iter.len();

        Self {
            iter,
            n: start,
            total,
        }
    }

    /// Skip the first `start` items, as when resuming an epoch.
    pub fn with_offset(mut self, start: usize) -> Self {
        for _ in self.n..start {
            if self.next().is_none() {
                break;
            }
        }
        self
    }
}

impl<I> CountingIterator<I> {
    /// Number of items consumed, including the ones skipped when resuming.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Total number of items of the epoch.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether there are items left.
    pub fn has_next(&self) -> bool {
        self.n < self.total
    }
}

impl<I: Iterator> Iterator for CountingIterator<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next()?;
        self.n += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
