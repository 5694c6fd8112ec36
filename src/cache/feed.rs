//! Multi-delivery result channel for cached reads.

use futures::Stream;
use tokio::sync::watch;

use super::traits::Snapshot;

/// Receiving end of a read.
///
/// A read may deliver more than once: an immediate value from the store,
/// then a refreshed value once the network answers. Each delivery replaces
/// the previous one. Dropping the feed drops later deliveries but never
/// cancels the store write behind them.
#[derive(Debug)]
pub struct Feed<T> {
  rx: watch::Receiver<Option<Snapshot<T>>>,
  primed: bool,
}

/// Producing end of a [`Feed`]. The feed settles when this is dropped.
#[derive(Debug)]
pub(crate) struct FeedSender<T> {
  tx: watch::Sender<Option<Snapshot<T>>>,
}

impl<T> FeedSender<T> {
  /// Replace the current delivery. Returns false if the consumer is gone.
  pub(crate) fn deliver(&self, snapshot: Snapshot<T>) -> bool {
    self.tx.send_replace(Some(snapshot));
    !self.tx.is_closed()
  }
}

impl<T: Clone> Feed<T> {
  pub(crate) fn channel(initial: Option<Snapshot<T>>) -> (FeedSender<T>, Self) {
    let (tx, rx) = watch::channel(initial);
    (FeedSender { tx }, Self { rx, primed: false })
  }

  /// A feed holding a single, final delivery.
  pub fn ready(snapshot: Snapshot<T>) -> Self {
    let (_tx, feed) = Self::channel(Some(snapshot));
    feed
  }

  /// Wait for the next delivery not yet returned by this method.
  ///
  /// Returns `None` once the producer is finished and everything has been seen.
  pub async fn next(&mut self) -> Option<Snapshot<T>> {
    if !self.primed {
      self.primed = true;
      if let Some(current) = self.rx.borrow_and_update().clone() {
        return Some(current);
      }
    }

    loop {
      if self.rx.changed().await.is_err() {
        return None;
      }
      if let Some(current) = self.rx.borrow_and_update().clone() {
        return Some(current);
      }
    }
  }

  /// The most recent delivery, without waiting.
  pub fn latest(&self) -> Option<Snapshot<T>> {
    self.rx.borrow().clone()
  }

  /// Wait for the producer to finish and return the final delivery.
  pub async fn settled(mut self) -> Option<Snapshot<T>> {
    let mut last = None;
    while let Some(snapshot) = self.next().await {
      last = Some(snapshot);
    }
    last
  }

  /// Wait until there is at least one delivery (or the producer gave up).
  pub(crate) async fn wait_first(&mut self) {
    // The value stays unseen for `next` because `primed` is untouched
    let _ = self.rx.wait_for(Option::is_some).await;
  }

  pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> {
    futures::stream::unfold(self, |mut feed| async move {
      feed.next().await.map(|snapshot| (snapshot, feed))
    })
  }
}
