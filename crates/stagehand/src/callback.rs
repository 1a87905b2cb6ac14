//! Completion and tick hooks of a layout run.
//!
//! A [`CallbackChain`] is an ordered list of stages built once per run and
//! fired at most once. A [`TickHook`] runs on every step of an iterative
//! strategy.

use std::{fmt, mem};

use log::trace;

use crate::{config::Hook, event::LayoutEvent, host::GraphHost, snapshot::LayoutSnapshot};

/// Caller-supplied callback run after a layout completes, typically to fit the
/// view.
pub type ReadyCallback = Box<dyn FnOnce()>;

enum Stage {
    User(Hook),
    Emit(LayoutEvent),
    RefreshPositions,
    Ready(ReadyCallback),
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(_) => f.write_str("User"),
            Self::Emit(event) => write!(f, "Emit({event})"),
            Self::RefreshPositions => f.write_str("RefreshPositions"),
            Self::Ready(_) => f.write_str("Ready"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Armed,
    Fired,
}

/// Ordered completion stages of one layout run.
#[derive(Debug)]
pub struct CallbackChain {
    stages: Vec<Stage>,
    state: ChainState,
}

impl CallbackChain {
    /// The chain that ends a full layout run.
    ///
    /// Stages run in this order: the user's `on_layout_end`, the
    /// `afterlayout` event, the position refresh, then `ready`. Listeners on
    /// `afterlayout` therefore still see the previous positions on the paint
    /// surface.
    pub fn completion(user: Option<Hook>, ready: Option<ReadyCallback>) -> Self {
        let mut stages = Vec::with_capacity(4);
        stages.extend(user.map(Stage::User));
        stages.push(Stage::Emit(LayoutEvent::AfterLayout));
        stages.push(Stage::RefreshPositions);
        stages.extend(ready.map(Stage::Ready));
        Self::armed(stages)
    }

    /// The chain that ends an in-place reconfiguration: the position refresh,
    /// then the user's `on_layout_end`. No event is emitted.
    pub fn direct(user: Option<Hook>) -> Self {
        let mut stages = vec![Stage::RefreshPositions];
        stages.extend(user.map(Stage::User));
        Self::armed(stages)
    }

    fn armed(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            state: ChainState::Armed,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_fired(&self) -> bool {
        self.state == ChainState::Fired
    }

    /// Runs every stage in order.
    ///
    /// Returns false without doing anything if the chain already fired.
    pub fn fire(&mut self, host: &dyn GraphHost, snapshot: &LayoutSnapshot) -> bool {
        if self.is_fired() {
            return false;
        }
        self.state = ChainState::Fired;

        for stage in mem::take(&mut self.stages) {
            trace!(stage:? = stage; "Running completion stage");
            match stage {
                Stage::User(hook) => hook(),
                Stage::Emit(event) => host.emit(event),
                Stage::RefreshPositions => host.refresh_positions(snapshot.nodes()),
                Stage::Ready(ready) => ready(),
            }
        }
        true
    }
}

/// Runs on every step of an iterative strategy: the user's `on_tick`, then a
/// position refresh.
#[derive(Clone, Default)]
pub struct TickHook {
    user: Option<Hook>,
}

impl TickHook {
    pub fn new(user: Option<Hook>) -> Self {
        Self { user }
    }

    pub fn call(&self, host: &dyn GraphHost, snapshot: &LayoutSnapshot) {
        if let Some(user) = &self.user {
            user();
        }
        host.refresh_positions(snapshot.nodes());
    }
}

impl fmt::Debug for TickHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHook")
            .field("user", &self.user.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use stagehand_core::model::{ComboTree, GraphData};

    use super::*;
    use crate::{config::LayoutConfig, host::RenderBridge, snapshot::NodeRecord};

    #[derive(Default)]
    struct Journal {
        entries: RefCell<Vec<String>>,
    }

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.entries.borrow_mut().push(entry.into());
        }

        fn take(&self) -> Vec<String> {
            mem::take(&mut self.entries.borrow_mut())
        }
    }

    impl RenderBridge for Journal {
        fn refresh_positions(&self, nodes: &[NodeRecord]) {
            self.push(format!("refresh:{}", nodes.len()));
        }
    }

    impl GraphHost for Journal {
        fn width(&self) -> f32 {
            800.0
        }

        fn height(&self) -> f32 {
            600.0
        }

        fn layout_config(&self) -> Option<LayoutConfig> {
            None
        }

        fn combo_trees(&self) -> Vec<ComboTree> {
            Vec::new()
        }

        fn graph_data(&self) -> GraphData {
            GraphData::default()
        }

        fn emit(&self, event: LayoutEvent) {
            self.push(event.name());
        }
    }

    fn one_node() -> LayoutSnapshot {
        LayoutSnapshot::new(vec![NodeRecord::new("a")], Vec::new(), Vec::new())
    }

    #[test]
    fn test_completion_order() {
        let journal = Rc::new(Journal::default());
        let user_journal = Rc::clone(&journal);
        let ready_journal = Rc::clone(&journal);
        let mut chain = CallbackChain::completion(
            Some(Rc::new(move || user_journal.push("user"))),
            Some(Box::new(move || ready_journal.push("ready"))),
        );

        assert!(chain.fire(journal.as_ref(), &one_node()));

        assert_eq!(journal.take(), vec!["user", "afterlayout", "refresh:1", "ready"]);
    }

    #[test]
    fn test_fires_once() {
        let journal = Journal::default();
        let mut chain = CallbackChain::completion(None, None);

        assert!(chain.fire(&journal, &one_node()));
        assert!(!chain.fire(&journal, &one_node()));

        assert_eq!(chain.state(), ChainState::Fired);
        assert_eq!(journal.take(), vec!["afterlayout", "refresh:1"]);
    }

    #[test]
    fn test_direct_skips_events() {
        let journal = Rc::new(Journal::default());
        let user_journal = Rc::clone(&journal);
        let mut chain = CallbackChain::direct(Some(Rc::new(move || user_journal.push("user"))));

        chain.fire(journal.as_ref(), &one_node());

        assert_eq!(journal.take(), vec!["refresh:1", "user"]);
    }

    #[test]
    fn test_tick_hook_runs_user_before_refresh() {
        let journal = Rc::new(Journal::default());
        let user_journal = Rc::clone(&journal);
        let hook = TickHook::new(Some(Rc::new(move || user_journal.push("tick"))));

        hook.call(journal.as_ref(), &one_node());
        hook.clone().call(journal.as_ref(), &one_node());

        assert_eq!(journal.take(), vec!["tick", "refresh:1", "tick", "refresh:1"]);
    }
}
