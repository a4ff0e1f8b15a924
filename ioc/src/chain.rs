//! Cycle detection, within one call chain and across concurrent ones.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::error::BeanError;

static NEXT_CHAIN_ID: AtomicU64 = AtomicU64::new(1);

/// The ids currently under construction by one top-level resolution.
///
/// A fresh chain is created for every `Container::get_bean` call and passed
/// down through each recursive resolution, so unrelated resolutions running
/// on other threads never see each other's entries.
#[derive(Debug)]
pub(crate) struct ResolutionChain {
  id: u64,
  ids: RefCell<Vec<String>>,
}

impl ResolutionChain {
  pub(crate) fn new() -> Self {
    Self {
      id: NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed),
      ids: RefCell::new(Vec::new()),
    }
  }

  pub(crate) fn id(&self) -> u64 {
    self.id
  }

  /// Pushes `id`, or fails if it is already in the chain.
  pub(crate) fn enter(&self, id: &str) -> Result<ResolutionGuard<'_>, BeanError> {
    let mut ids = self.ids.borrow_mut();
    if ids.iter().any(|entry| entry == id) {
      let mut chain = ids.clone();
      chain.push(id.to_owned());
      return Err(BeanError::CircularDependency { chain });
    }
    ids.push(id.to_owned());
    Ok(ResolutionGuard { chain: self })
  }

  pub(crate) fn snapshot(&self) -> Vec<String> {
    self.ids.borrow().clone()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.ids.borrow().is_empty()
  }
}

/// RAII guard popping its id from the chain on every exit path.
pub(crate) struct ResolutionGuard<'a> {
  chain: &'a ResolutionChain,
}

impl Drop for ResolutionGuard<'_> {
  fn drop(&mut self) {
    self.chain.ids.borrow_mut().pop();
  }
}

/// Which chain is building each in-progress singleton, and which singleton
/// each blocked chain is waiting for.
///
/// A chain that would block on a singleton cell first follows the
/// owner → awaited id → owner edges. Reaching itself means the wait could
/// never end, so it fails with `CircularDependency` instead of blocking.
#[derive(Debug, Default)]
pub(crate) struct WaitGraph {
  builders: DashMap<String, u64>,
  waiting: DashMap<u64, String>,
}

impl WaitGraph {
  /// Records that `chain` is about to wait for the singleton `id`.
  pub(crate) fn wait_for(&self, id: &str, chain: &ResolutionChain) -> Result<WaitGuard<'_>, BeanError> {
    let me = chain.id();
    self.waiting.insert(me, id.to_owned());
    let guard = WaitGuard {
      graph: self,
      chain: me,
      id: id.to_owned(),
    };

    let mut target = id.to_owned();
    let mut seen = HashSet::new();
    loop {
      let owner = match self.builders.get(&target) {
        Some(entry) => *entry.value(),
        None => break,
      };
      if owner == me {
        let mut cycle = chain.snapshot();
        cycle.push(target);
        return Err(BeanError::CircularDependency { chain: cycle });
      }
      if !seen.insert(owner) {
        break;
      }
      target = match self.waiting.get(&owner) {
        Some(entry) => entry.value().clone(),
        None => break,
      };
    }
    Ok(guard)
  }

  /// Marks `chain` as the builder of `id` for the guard's lifetime.
  pub(crate) fn build(&self, id: &str, chain: u64) -> BuildGuard<'_> {
    // The chain got the cell, so it no longer waits on it.
    self.waiting.remove_if(&chain, |_, awaited| awaited == id);
    self.builders.insert(id.to_owned(), chain);
    BuildGuard {
      graph: self,
      chain,
      id: id.to_owned(),
    }
  }
}

pub(crate) struct WaitGuard<'a> {
  graph: &'a WaitGraph,
  chain: u64,
  id: String,
}

impl Drop for WaitGuard<'_> {
  fn drop(&mut self) {
    self
      .graph
      .waiting
      .remove_if(&self.chain, |_, awaited| *awaited == self.id);
  }
}

pub(crate) struct BuildGuard<'a> {
  graph: &'a WaitGraph,
  chain: u64,
  id: String,
}

impl Drop for BuildGuard<'_> {
  fn drop(&mut self) {
    self
      .graph
      .builders
      .remove_if(&self.id, |_, owner| *owner == self.chain);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn guard_pops_on_drop() {
    let chain = ResolutionChain::new();
    {
      let _a = chain.enter("a").unwrap();
      let _b = chain.enter("b").unwrap();
      assert!(!chain.is_empty());
    }
    assert!(chain.is_empty());
  }

  #[test]
  fn reentry_reports_the_full_chain() {
    let chain = ResolutionChain::new();
    let _a = chain.enter("a").unwrap();
    let _b = chain.enter("b").unwrap();
    let result = chain.enter("a").map(|_| ());
    match result {
      Err(BeanError::CircularDependency { chain }) => {
        assert_eq!(chain, vec!["a".to_string(), "b".into(), "a".into()]);
      }
      Err(other) => panic!("unexpected error: {other}"),
      Ok(()) => panic!("re-entering 'a' should fail"),
    };
  }

  #[test]
  fn sibling_resolutions_may_share_an_id() {
    let chain = ResolutionChain::new();
    let _root = chain.enter("root").unwrap();
    drop(chain.enter("shared").unwrap());
    assert!(chain.enter("shared").is_ok());
  }

  #[test]
  fn chains_get_distinct_ids() {
    assert_ne!(ResolutionChain::new().id(), ResolutionChain::new().id());
  }

  #[test]
  fn waiting_on_an_unrelated_builder_is_allowed() {
    let graph = WaitGraph::default();
    let builder = ResolutionChain::new();
    let waiter = ResolutionChain::new();
    let _building = graph.build("shared", builder.id());

    assert!(graph.wait_for("shared", &waiter).is_ok());
  }

  #[test]
  fn crossed_waits_are_reported_as_a_cycle() {
    let graph = WaitGraph::default();
    let first = ResolutionChain::new();
    let second = ResolutionChain::new();

    // `first` builds a and waits for b; `second` builds b and asks for a.
    let _a = first.enter("a").unwrap();
    let _building_a = graph.build("a", first.id());
    let _b = second.enter("b").unwrap();
    let _building_b = graph.build("b", second.id());
    let _first_waits = graph.wait_for("b", &first).unwrap();

    let _a_second = second.enter("a").unwrap();
    let err = graph.wait_for("a", &second).map(|_| ()).unwrap_err();

    match err {
      BeanError::CircularDependency { chain } => {
        assert_eq!(chain, vec!["b".to_string(), "a".into(), "b".into()]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn guards_clear_the_graph() {
    let graph = WaitGraph::default();
    let chain = ResolutionChain::new();
    {
      let _building = graph.build("a", chain.id());
      let _waiting = graph.wait_for("b", &chain).unwrap();
    }
    assert!(graph.builders.is_empty());
    assert!(graph.waiting.is_empty());
  }
}
