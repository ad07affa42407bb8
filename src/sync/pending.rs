/// Single-resolution background handles and presentation outcomes
///
/// Service operations run on a tokio task and resolve exactly once. Dropping
/// a `Pending` detaches the task rather than aborting it, so a write that has
/// started always completes.

use crate::store::StoreError;
use anyhow::Result;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::task::JoinHandle;

/// Handle to an operation running on a background task
#[derive(Debug)]
pub struct Pending<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(operation: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(operation),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join)) => Poll::Ready(Err(StoreError::Background(join.to_string()).into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// What the presentation layer gets to see of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Data(T),
    Empty,
    Error(String),
}

impl<T> ViewState<Vec<T>> {
    /// Empty collections become `Empty`
    pub fn from_list(result: Result<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Data(items),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

impl<T> ViewState<T> {
    /// A lookup that found nothing becomes `Empty`
    pub fn from_lookup(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Data(value),
            Err(e) if is_not_found(&e) => Self::Empty,
            Err(e) => Self::Error(e.to_string()),
        }
    }

    pub fn from_value(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Data(value),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

pub(crate) fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_resolves_once_with_task_result() {
        let pending = Pending::spawn(async { Ok(41 + 1) });
        assert_eq!(pending.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn panicking_task_surfaces_as_error() {
        let pending: Pending<()> = Pending::spawn(async { panic!("boom") });
        let err = pending.await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Background(_))));
    }

    #[test]
    fn outcomes_collapse_to_three_states() {
        assert_eq!(ViewState::from_list(Ok(Vec::<u8>::new())), ViewState::Empty);
        assert_eq!(ViewState::from_list(Ok(vec![1])), ViewState::Data(vec![1]));

        let missing: Result<u8> = Err(StoreError::NotFound {
            namespace: "favs".into(),
            id: "x".into(),
        }
        .into());
        assert_eq!(ViewState::from_lookup(missing), ViewState::Empty);

        let broken: Result<u8> = Err(anyhow::anyhow!("disk on fire"));
        assert_eq!(ViewState::from_lookup(broken), ViewState::Error("disk on fire".into()));
    }
}
