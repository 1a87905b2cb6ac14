//! Layout configuration.
//!
//! A [`LayoutConfig`] names the strategy to run (`type`) and carries the
//! geometry it runs in plus any strategy-specific options, which are passed
//! through verbatim. Run-time hooks ride along with the configuration but are
//! never serialized.
//!
//! # Example
//!
//! ```
//! # use stagehand::config::LayoutConfig;
//! let config = LayoutConfig::new("force")
//!     .with_option("link_distance", 50.0)
//!     .on_layout_end(|| println!("settled"));
//!
//! assert_eq!(config.kind(), Some("force"));
//! assert_eq!(config.number_option("link_distance").unwrap(), Some(50.0));
//! ```

use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use serde::Deserialize;

use stagehand_core::{
    geometry::{Point, Size},
    model::ComboTree,
    value::OptionValue,
};

use crate::error::LayoutError;

/// A user hook invoked by the controller.
pub type Hook = Rc<dyn Fn()>;

/// Strategy-specific options, in declaration order.
pub type LayoutOptions = IndexMap<String, OptionValue>;

/// User hooks attached to a configuration.
#[derive(Clone, Default)]
pub struct LayoutHooks {
    on_tick: Option<Hook>,
    on_layout_end: Option<Hook>,
}

impl LayoutHooks {
    /// Hook called after every simulation step.
    pub fn on_tick(&self) -> Option<Hook> {
        self.on_tick.clone()
    }

    /// Hook called once a run has produced its final positions.
    pub fn on_layout_end(&self) -> Option<Hook> {
        self.on_layout_end.clone()
    }
}

impl fmt::Debug for LayoutHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutHooks")
            .field("on_tick", &self.on_tick.is_some())
            .field("on_layout_end", &self.on_layout_end.is_some())
            .finish()
    }
}

/// Configuration of a layout run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Strategy identifier. Absent means no algorithmic layout, only scatter.
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    center: Option<Point>,

    #[serde(default)]
    width: Option<f32>,

    #[serde(default)]
    height: Option<f32>,

    /// Run the strategy on the worker substrate instead of the host loop.
    #[serde(default)]
    worker_enabled: Option<bool>,

    /// Every other key, passed to the strategy untouched.
    #[serde(flatten)]
    options: LayoutOptions,

    #[serde(skip)]
    hooks: LayoutHooks,

    #[serde(skip)]
    combo_trees: Option<Vec<ComboTree>>,
}

impl LayoutConfig {
    /// Creates a configuration for the strategy registered as `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Returns the strategy identifier, if any.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn center(&self) -> Option<Point> {
        self.center
    }

    pub fn width(&self) -> Option<f32> {
        self.width
    }

    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Width and height when both are known.
    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }

    pub fn worker_enabled(&self) -> bool {
        self.worker_enabled.unwrap_or(false)
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn hooks(&self) -> &LayoutHooks {
        &self.hooks
    }

    /// Combo hierarchy attached for combo-aware strategies.
    pub fn combo_trees(&self) -> Option<&[ComboTree]> {
        self.combo_trees.as_deref()
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.width = Some(size.width());
        self.height = Some(size.height());
        self
    }

    pub fn with_worker(mut self, enabled: bool) -> Self {
        self.worker_enabled = Some(enabled);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn on_tick(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.on_tick = Some(Rc::new(hook));
        self
    }

    pub fn on_layout_end(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.on_layout_end = Some(Rc::new(hook));
        self
    }

    pub(crate) fn set_combo_trees(&mut self, trees: Vec<ComboTree>) {
        self.combo_trees = Some(trees);
    }

    /// Returns a copy of `self` with every field set in `patch` overriding
    /// the stored value. Options merge key by key.
    pub fn merged_with(&self, patch: &LayoutConfig) -> LayoutConfig {
        let mut options = self.options.clone();
        for (key, value) in &patch.options {
            options.insert(key.clone(), value.clone());
        }
        LayoutConfig {
            kind: patch.kind.clone().or_else(|| self.kind.clone()),
            center: patch.center.or(self.center),
            width: patch.width.or(self.width),
            height: patch.height.or(self.height),
            worker_enabled: patch.worker_enabled.or(self.worker_enabled),
            options,
            hooks: LayoutHooks {
                on_tick: patch.hooks.on_tick().or_else(|| self.hooks.on_tick()),
                on_layout_end: patch
                    .hooks
                    .on_layout_end()
                    .or_else(|| self.hooks.on_layout_end()),
            },
            combo_trees: patch
                .combo_trees
                .clone()
                .or_else(|| self.combo_trees.clone()),
        }
    }

    /// Fills `width`, `height` and `center` from the canvas where the
    /// configuration is silent. Configured values always win.
    pub fn with_canvas_defaults(mut self, canvas: Size) -> Self {
        self.width = self.width.or(Some(canvas.width()));
        self.height = self.height.or(Some(canvas.height()));
        self.center = self.center.or(Some(canvas.center()));
        self
    }

    fn strategy_name(&self) -> &str {
        self.kind.as_deref().unwrap_or("<none>")
    }

    /// Reads a numeric option.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] if the key holds a non-number or
    /// a non-finite number.
    pub fn number_option(&self, key: &str) -> Result<Option<f32>, LayoutError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Number(value)) if value.is_finite() => Ok(Some(*value as f32)),
            Some(other) => Err(LayoutError::invalid_option(
                self.strategy_name(),
                key,
                format!("expected a finite number, found {other}"),
            )),
        }
    }

    /// Reads a boolean option.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] if the key holds a non-boolean.
    pub fn bool_option(&self, key: &str) -> Result<Option<bool>, LayoutError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                LayoutError::invalid_option(
                    self.strategy_name(),
                    key,
                    format!("expected a bool, found {} {value}", value.kind()),
                )
            }),
        }
    }

    /// Reads a string option.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] if the key holds a non-string.
    pub fn text_option(&self, key: &str) -> Result<Option<&str>, LayoutError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or_else(|| {
                LayoutError::invalid_option(
                    self.strategy_name(),
                    key,
                    format!("expected a string, found {} {value}", value.kind()),
                )
            }),
        }
    }
}
