//! The layout controller.
//!
//! [`LayoutController`] owns the configuration and the live strategy of one
//! graph. It projects the host's graph into a snapshot, seeds missing
//! positions, runs the configured strategy (in place, tick by tick, or on a
//! worker thread) and hands the result back to the host through
//! [`RenderBridge::refresh_positions`](crate::host::RenderBridge::refresh_positions).
//!
//! None of the public operations return errors. Configuration problems are
//! logged as warnings and leave the graph at its scattered positions; an empty
//! graph is a silent no-op.
//!
//! Hooks and ready callbacks run while the controller is mutably borrowed, so
//! they must not call back into it.

use std::{
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use log::{debug, info, trace, warn};

use stagehand_core::geometry::Size;

use crate::{
    callback::{CallbackChain, ReadyCallback, TickHook},
    config::LayoutConfig,
    error::LayoutError,
    event::LayoutEvent,
    host::GraphHost,
    position::{PositionInitializer, ScatterPolicy},
    projector::project,
    slot::{StrategyInstance, StrategySlot},
    snapshot::LayoutSnapshot,
    strategy::{COMBO_FORCE, Progress, StrategyRegistry, is_force_family},
    worker::{WorkerEvent, WorkerHandle, WorkerMessage},
};

/// How long [`LayoutController::run_to_completion`] waits for a worker
/// message per tick.
const WORKER_WAIT: Duration = Duration::from_millis(50);

/// Lifecycle state of a [`LayoutController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No run has happened yet, or the last one was acknowledged.
    Idle,
    /// The configuration is being replaced or patched.
    Configuring,
    /// A strategy is executing.
    Running,
    /// An iterative or offloaded run awaits further ticks.
    Ticking,
    /// The last run completed.
    Settled,
    /// Terminal.
    Destroyed,
}

/// Outcome of one [`LayoutController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No run is pending.
    Idle,
    /// The run needs more ticks.
    Running,
    /// This tick completed the run.
    Settled,
    /// The controller is destroyed.
    Destroyed,
}

impl TickStatus {
    /// Returns true unless more ticks are needed.
    pub fn is_done(self) -> bool {
        self != Self::Running
    }
}

/// A run that started but has not completed.
struct PendingRun {
    generation: u64,
    chain: CallbackChain,
    tick_hook: Option<TickHook>,
}

/// Orchestrates layout runs for one host graph.
pub struct LayoutController {
    host: Option<Weak<dyn GraphHost>>,
    registry: StrategyRegistry,
    initializer: PositionInitializer,
    config: Option<LayoutConfig>,
    kind: Option<String>,
    slot: StrategySlot,
    snapshot: LayoutSnapshot,
    pending: Option<PendingRun>,
    tick_hook: Option<TickHook>,
    generation: u64,
    state: ControllerState,
    destroyed: bool,
}

impl LayoutController {
    /// Creates a controller for `host`, configured from the host's declared
    /// layout options.
    ///
    /// The controller only keeps a weak reference; it becomes inert once the
    /// host is dropped.
    pub fn new<H: GraphHost + 'static>(host: &Rc<H>) -> Self {
        let weak: Weak<dyn GraphHost> = Rc::downgrade(host) as Weak<dyn GraphHost>;
        let mut controller = Self {
            host: Some(weak),
            registry: StrategyRegistry::with_builtins(),
            initializer: PositionInitializer::default(),
            config: None,
            kind: None,
            slot: StrategySlot::new(),
            snapshot: LayoutSnapshot::default(),
            pending: None,
            tick_hook: None,
            generation: 0,
            state: ControllerState::Idle,
            destroyed: false,
        };
        controller.configure(host.layout_config());
        controller
    }

    /// Replaces the strategy registry.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the policy used to seed nodes without positions.
    pub fn with_scatter(mut self, policy: impl ScatterPolicy + 'static) -> Self {
        self.initializer = PositionInitializer::new(policy);
        self
    }

    pub fn registry_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.registry
    }

    /// Sets the stored configuration and strategy type. Nothing is drawn.
    pub fn configure(&mut self, config: Option<LayoutConfig>) {
        if self.destroyed {
            return;
        }
        self.state = ControllerState::Configuring;
        let config = config.unwrap_or_default();
        self.kind = config.kind().map(str::to_string);
        debug!(kind:? = self.kind; "Configured layout");
        self.config = Some(config);
        self.state = ControllerState::Idle;
    }

    fn host(&self) -> Option<Rc<dyn GraphHost>> {
        self.host.as_ref()?.upgrade()
    }

    /// Lays out the host's graph with the stored configuration.
    ///
    /// `on_ready` runs once the run completes, after positions were pushed to
    /// the host; it is where a host fits the view. Iterative and offloaded
    /// runs complete on a later [`tick`](Self::tick).
    ///
    /// Always returns false: completion is observed through callbacks, events
    /// and [`state`](Self::state).
    pub fn layout(&mut self, on_ready: Option<ReadyCallback>) -> bool {
        if self.destroyed {
            debug!("Layout requested on a destroyed controller");
            return false;
        }
        let Some(host) = self.host() else {
            return false;
        };
        let host: &dyn GraphHost = &*host;

        let mut snapshot = project(&host.graph_data());
        if snapshot.is_empty() {
            debug!(reason:% = LayoutError::EmptyGraph; "Skipping layout");
            return false;
        }

        let canvas = Size::new(host.width(), host.height());
        let stored = self.config.clone().unwrap_or_default();
        let mut effective = stored.clone().with_canvas_defaults(canvas);

        // Previous run: strategy destroyed, pending completion dropped.
        self.slot.clear();
        self.pending = None;
        self.generation += 1;
        self.state = ControllerState::Running;

        host.emit(LayoutEvent::BeforeLayout);

        let center = effective.center().unwrap_or_else(|| canvas.center());
        let area = effective.size().unwrap_or(canvas);
        let placement = self.initializer.initialize(center, area, &mut snapshot);

        let hooks = stored.hooks();
        let chain = CallbackChain::completion(hooks.on_layout_end(), on_ready);

        let kind = self.kind.clone();
        let mut tick_hook = kind
            .as_deref()
            .filter(|kind| is_force_family(kind))
            .map(|_| TickHook::new(hooks.on_tick()));
        if kind.as_deref() == Some(COMBO_FORCE) {
            effective.set_combo_trees(host.combo_trees());
        }

        let Some(kind) = kind else {
            debug!(nodes = snapshot.len(); "No layout type configured, completing");
            self.snapshot = snapshot;
            self.tick_hook = None;
            self.complete(host, chain);
            return false;
        };

        let strategy = match self.registry.create(&kind, &effective) {
            Ok(strategy) => strategy,
            Err(err) => {
                warn!(kind = kind.as_str(), err:%; "Failed to create layout strategy");
                host.refresh_positions(snapshot.nodes());
                self.snapshot = snapshot;
                self.tick_hook = None;
                self.state = ControllerState::Idle;
                return false;
            }
        };
        let mut instance = StrategyInstance::new(kind.as_str(), strategy);

        if instance.enable_tick() && tick_hook.is_none() {
            tick_hook = Some(TickHook::new(hooks.on_tick()));
        }
        self.tick_hook = tick_hook.clone();

        instance.init(&snapshot);

        info!(
            kind = kind.as_str(),
            nodes = snapshot.len(),
            edges = snapshot.edges().len(),
            fresh = !placement.all_positioned(),
            worker = effective.worker_enabled();
            "Starting layout"
        );
        host.emit(LayoutEvent::BeginLayout);

        if effective.worker_enabled() {
            self.offload(host, instance, snapshot, chain, tick_hook);
            return false;
        }

        self.slot.install_local(instance);
        self.start(host, snapshot, chain, tick_hook);
        false
    }

    /// Hands `instance` to a worker thread. The run completes when
    /// [`tick`](Self::tick) receives the worker's result.
    fn offload(
        &mut self,
        host: &dyn GraphHost,
        instance: StrategyInstance,
        snapshot: LayoutSnapshot,
        chain: CallbackChain,
        tick_hook: Option<TickHook>,
    ) {
        let generation = self.generation;
        let emit_ticks = tick_hook.is_some();
        match WorkerHandle::spawn(instance, snapshot.clone(), generation, emit_ticks) {
            Ok(handle) => {
                self.slot.install_offloaded(handle);
                self.snapshot = snapshot;
                self.pending = Some(PendingRun {
                    generation,
                    chain,
                    tick_hook,
                });
                self.state = ControllerState::Ticking;
            }
            Err(err) => {
                warn!(err:%; "Failed to start layout worker");
                self.snapshot = snapshot;
                self.complete(host, chain);
            }
        }
    }

    /// Executes the local strategy on `snapshot` and either completes the run
    /// or leaves it pending for [`tick`](Self::tick).
    fn start(
        &mut self,
        host: &dyn GraphHost,
        mut snapshot: LayoutSnapshot,
        chain: CallbackChain,
        tick_hook: Option<TickHook>,
    ) {
        let progress = match self.slot.local_mut() {
            Some(instance) => instance.execute(&mut snapshot),
            None => Ok(Progress::Settled),
        };
        self.snapshot = snapshot;
        let run = PendingRun {
            generation: self.generation,
            chain,
            tick_hook,
        };
        self.advance(host, run, progress);
    }

    fn advance(
        &mut self,
        host: &dyn GraphHost,
        run: PendingRun,
        progress: Result<Progress, LayoutError>,
    ) -> TickStatus {
        match progress {
            Ok(Progress::Running) => {
                self.pending = Some(run);
                self.state = ControllerState::Ticking;
                TickStatus::Running
            }
            Ok(Progress::Settled) => {
                self.complete(host, run.chain);
                TickStatus::Settled
            }
            Err(err) => {
                warn!(kind:? = self.kind, err:%; "Layout strategy failed");
                self.complete(host, run.chain);
                TickStatus::Settled
            }
        }
    }

    fn complete(&mut self, host: &dyn GraphHost, mut chain: CallbackChain) {
        self.pending = None;
        self.state = ControllerState::Settled;
        chain.fire(host, &self.snapshot);
        debug!(generation = self.generation; "Layout completed");
    }

    /// Patches the configuration, reusing the live strategy when possible.
    ///
    /// Without a live local strategy, or when `patch` names a different
    /// type, this is a fresh [`layout`](Self::layout) with the merged
    /// configuration. Otherwise the strategy is re-seeded with freshly
    /// projected data, receives only the patched keys and executes again.
    /// Completion then refreshes positions and calls `on_layout_end`, without
    /// `afterlayout`.
    pub fn update_config(&mut self, mut patch: LayoutConfig) {
        if self.destroyed {
            return;
        }
        self.state = ControllerState::Configuring;
        if let Some(kind) = patch.kind() {
            self.kind = Some(kind.to_string());
        }
        let merged = self
            .config
            .take()
            .unwrap_or_default()
            .merged_with(&patch);
        self.config = Some(merged);

        let reusable = self
            .slot
            .local_mut()
            .is_some_and(|instance| patch.kind().is_none_or(|kind| kind == instance.kind()));
        if !reusable {
            debug!(kind:? = self.kind; "No reusable strategy, running a fresh layout");
            self.layout(None);
            return;
        }

        let Some(host) = self.host() else {
            return;
        };
        let host: &dyn GraphHost = &*host;
        let mut snapshot = project(&host.graph_data());
        if snapshot.is_empty() {
            debug!(reason:% = LayoutError::EmptyGraph; "Skipping update");
            self.state = ControllerState::Idle;
            return;
        }
        let canvas = Size::new(host.width(), host.height());
        let effective = self
            .config
            .clone()
            .unwrap_or_default()
            .with_canvas_defaults(canvas);
        self.initializer.initialize(
            effective.center().unwrap_or_else(|| canvas.center()),
            effective.size().unwrap_or(canvas),
            &mut snapshot,
        );

        self.pending = None;
        self.generation += 1;
        if let Some(instance) = self.slot.local_mut() {
            if instance.kind() == COMBO_FORCE {
                patch.set_combo_trees(host.combo_trees());
            }
            instance.init(&snapshot);
            if let Err(err) = instance.update_config(&patch) {
                warn!(err:%; "Rejected layout option patch, keeping previous options");
            }
            debug!(kind = instance.kind(); "Reusing layout strategy");
        }

        self.state = ControllerState::Running;
        host.emit(LayoutEvent::BeforeLayout);

        let on_layout_end = self
            .config
            .as_ref()
            .and_then(|config| config.hooks().on_layout_end());
        let chain = CallbackChain::direct(on_layout_end);
        let tick_hook = self.tick_hook.clone();
        self.start(host, snapshot, chain, tick_hook);
    }

    /// Runs the live strategy again.
    ///
    /// With `reload_data` the strategy is re-seeded with freshly projected
    /// data; otherwise it continues from the positions of the last run.
    /// Falls back to [`layout`](Self::layout) without a live local strategy.
    pub fn relayout(&mut self, reload_data: bool) {
        if self.destroyed {
            return;
        }
        if self.slot.local_mut().is_none() {
            self.layout(None);
            return;
        }
        let Some(host) = self.host() else {
            return;
        };
        let host: &dyn GraphHost = &*host;

        let snapshot = if reload_data {
            let mut snapshot = project(&host.graph_data());
            let canvas = Size::new(host.width(), host.height());
            let effective = self
                .config
                .clone()
                .unwrap_or_default()
                .with_canvas_defaults(canvas);
            self.initializer.initialize(
                effective.center().unwrap_or_else(|| canvas.center()),
                effective.size().unwrap_or(canvas),
                &mut snapshot,
            );
            snapshot
        } else {
            self.snapshot.clone()
        };
        if snapshot.is_empty() {
            return;
        }

        self.pending = None;
        self.generation += 1;
        if let Some(instance) = self.slot.local_mut() {
            instance.init(&snapshot);
        }
        self.state = ControllerState::Running;
        host.emit(LayoutEvent::BeforeLayout);

        let on_layout_end = self
            .config
            .as_ref()
            .and_then(|config| config.hooks().on_layout_end());
        let chain = CallbackChain::completion(on_layout_end, None);
        let tick_hook = self.tick_hook.clone();
        self.start(host, snapshot, chain, tick_hook);
    }

    /// Advances the pending run by one step: one tick of a local iterative
    /// strategy, or every message a worker has delivered so far.
    ///
    /// Hosts call this once per frame while it returns
    /// [`TickStatus::Running`].
    pub fn tick(&mut self) -> TickStatus {
        self.tick_with(None)
    }

    /// Ticks until the run completes or `max_ticks` ticks have passed.
    ///
    /// Worker runs wait briefly for each message instead of polling.
    pub fn run_to_completion(&mut self, max_ticks: usize) -> TickStatus {
        let wait = self.slot.worker().map(|_| WORKER_WAIT);
        let mut status = TickStatus::Idle;
        for _ in 0..max_ticks {
            status = self.tick_with(wait);
            if status.is_done() {
                return status;
            }
        }
        status
    }

    fn tick_with(&mut self, wait: Option<Duration>) -> TickStatus {
        if self.destroyed {
            return TickStatus::Destroyed;
        }
        let Some(run) = self.pending.take() else {
            if self.state == ControllerState::Settled {
                self.state = ControllerState::Idle;
            }
            return TickStatus::Idle;
        };
        let Some(host) = self.host() else {
            return TickStatus::Idle;
        };
        let host: &dyn GraphHost = &*host;

        if self.slot.worker().is_some() {
            return self.poll_worker(host, run, wait);
        }

        let progress = match self.slot.local_mut() {
            Some(instance) => instance.tick(&mut self.snapshot),
            None => {
                debug!(generation = run.generation; "Dropping run without a strategy");
                self.state = ControllerState::Idle;
                return TickStatus::Idle;
            }
        };
        trace!(generation = run.generation, progress:? = progress; "Ticked layout");
        if let (Ok(_), Some(hook)) = (&progress, &run.tick_hook) {
            hook.call(host, &self.snapshot);
        }
        self.advance(host, run, progress)
    }

    fn poll_worker(
        &mut self,
        host: &dyn GraphHost,
        run: PendingRun,
        wait: Option<Duration>,
    ) -> TickStatus {
        loop {
            let next = match self.slot.worker() {
                Some(handle) => match wait {
                    Some(timeout) => handle.next_timeout(timeout),
                    None => handle.try_next(),
                },
                None => return TickStatus::Idle,
            };

            let message = match next {
                Ok(Some(message)) => message,
                Ok(None) => {
                    self.pending = Some(run);
                    return TickStatus::Running;
                }
                Err(err) => {
                    warn!(err:%; "Layout worker went away");
                    self.slot.clear();
                    self.complete(host, run.chain);
                    return TickStatus::Settled;
                }
            };

            if message.generation != run.generation {
                let stale = LayoutError::StaleResult {
                    generation: message.generation,
                };
                debug!(reason:% = stale; "Ignoring worker message");
                continue;
            }

            match message {
                WorkerMessage {
                    event: WorkerEvent::Tick(points),
                    ..
                } => {
                    self.snapshot.apply_positions(&points);
                    if let Some(hook) = &run.tick_hook {
                        hook.call(host, &self.snapshot);
                    }
                }
                WorkerMessage {
                    event: WorkerEvent::Settled(points),
                    ..
                } => {
                    self.snapshot.apply_positions(&points);
                    self.slot.clear();
                    self.complete(host, run.chain);
                    return TickStatus::Settled;
                }
                WorkerMessage {
                    event: WorkerEvent::Failed(reason),
                    ..
                } => {
                    warn!(kind:? = self.kind, reason = reason.as_str(); "Layout worker failed");
                    self.slot.clear();
                    self.complete(host, run.chain);
                    return TickStatus::Settled;
                }
            }
        }
    }

    /// Tears the controller down.
    ///
    /// The live strategy is destroyed, a worker is cancelled and any pending
    /// completion is dropped. The host's declared layout options are cleared
    /// and the host reference released. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.slot.clear();
        self.pending = None;
        self.tick_hook = None;
        self.destroyed = true;
        self.state = ControllerState::Destroyed;
        self.config = None;
        self.kind = None;
        self.snapshot = LayoutSnapshot::default();
        if let Some(host) = self.host() {
            host.set_layout_config(None);
        }
        self.host = None;
        info!("Layout controller destroyed");
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The configured strategy type.
    pub fn layout_type(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// The stored configuration, without canvas-derived fields.
    pub fn config(&self) -> Option<&LayoutConfig> {
        self.config.as_ref()
    }

    /// The snapshot of the latest run, with the positions it computed so far.
    pub fn snapshot(&self) -> &LayoutSnapshot {
        &self.snapshot
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns true while a run awaits further ticks.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for LayoutController {
    fn drop(&mut self) {
        self.slot.clear();
    }
}

impl fmt::Debug for LayoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutController")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("slot", &self.slot)
            .field("pending", &self.pending.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
