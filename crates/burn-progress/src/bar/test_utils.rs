use super::{BarState, ProgressBar};
use crate::{
    CountingIterator, ProgressError,
    stat::{Stats, format_stats},
    tracker::RunConfig,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BarCall {
    Log {
        stats: Vec<(String, String)>,
        tag: Option<String>,
        step: Option<u64>,
    },
    Print {
        stats: Vec<(String, String)>,
        tag: Option<String>,
        step: Option<u64>,
    },
    UpdateConfig(RunConfig),
    Close,
}

pub(crate) type BarCalls = Rc<RefCell<Vec<BarCall>>>;

/// Bar recording every call it receives.
pub(crate) struct RecordingBar<I> {
    iterable: CountingIterator<I>,
    state: BarState,
    calls: BarCalls,
}

impl<T> RecordingBar<std::vec::IntoIter<T>> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self::from_iterable(CountingIterator::new(items), None, None)
    }
}

impl<I> RecordingBar<I> {
    pub(crate) fn from_iterable(
        iterable: CountingIterator<I>,
        epoch: Option<usize>,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            state: BarState::new(iterable.n(), epoch, prefix),
            iterable,
            calls: Rc::default(),
        }
    }

    pub(crate) fn calls(&self) -> BarCalls {
        self.calls.clone()
    }
}

impl<I: Iterator> Iterator for RecordingBar<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.size.is_none() {
            self.state.size = Some(self.iterable.total());
        }

        let item = self.iterable.next()?;
        self.state.i = Some(self.iterable.n() - 1);
        Some(item)
    }
}

impl<I: Iterator> ProgressBar for RecordingBar<I> {
    fn state(&self) -> &BarState {
        &self.state
    }

    fn length(&self) -> usize {
        self.iterable.total()
    }

    fn log(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        self.calls.borrow_mut().push(BarCall::Log {
            stats: format_stats(stats),
            tag: tag.map(str::to_string),
            step,
        });
        Ok(())
    }

    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        self.calls.borrow_mut().push(BarCall::Print {
            stats: format_stats(stats),
            tag: tag.map(str::to_string),
            step,
        });
        Ok(())
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), ProgressError> {
        self.calls
            .borrow_mut()
            .push(BarCall::UpdateConfig(config.clone()));
        Ok(())
    }

    fn close(&mut self) {
        self.calls.borrow_mut().push(BarCall::Close);
    }
}
