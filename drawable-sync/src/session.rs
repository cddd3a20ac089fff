//! A mounted canvas session.
//!
//! [`CanvasSession`] owns the drawable surface, the tool registry and the
//! undo/redo history, and is the only consumer of the history's one-shot
//! action flags. After every input it reloads the surface if the history asks
//! for it and submits the current snapshot to the debouncer when it changed
//! or a send was forced.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use drawable_core::{
    BindingId, CanvasError, DrawableSurface, DrawingSnapshot, EventKind, HistoryStore,
    PointerButton, SurfaceEvent, ToolRegistry,
};
use drawable_renderer::TextureData;
use tracing::{debug, info, warn};

use crate::command::HostCommand;
use crate::config::SessionConfig;
use crate::debounce::SyncHandle;
use crate::error::SyncResult;

/// One mounted canvas.
pub struct CanvasSession {
    config: SessionConfig,
    surface: DrawableSurface,
    registry: ToolRegistry,
    history: Rc<RefCell<HistoryStore>>,
    commit_bindings: Vec<BindingId>,
    sync: SyncHandle,
    last_submitted: Option<DrawingSnapshot>,
    background_image: Option<TextureData>,
}

impl std::fmt::Debug for CanvasSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSession")
            .field("config", &self.config)
            .field("surface", &self.surface)
            .field("registry", &self.registry)
            .field("history_len", &self.history.borrow().len())
            .finish_non_exhaustive()
    }
}

impl CanvasSession {
    /// Mount a session: load the initial drawing, activate the configured
    /// tool and submit the initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the initial drawing
    /// is malformed ([`CanvasError::SnapshotLoad`]), the drawing mode is
    /// unknown ([`CanvasError::UnknownTool`]) or the sync task is gone.
    pub fn mount(config: SessionConfig, sync: SyncHandle) -> SyncResult<Self> {
        config.validate()?;
        let initial = config.initial_snapshot()?;

        let (width, height) = config.surface_size();
        let mut surface = DrawableSurface::new(width, height);
        surface.load(&initial)?;

        let mut registry = ToolRegistry::with_defaults();
        registry.activate(&mut surface, &config.drawing_mode, &config.tool_config())?;
        sync.set_realtime(config.realtime_update_streamlit)?;

        let mut session = Self {
            config,
            surface,
            registry,
            history: Rc::new(RefCell::new(HistoryStore::new(initial))),
            commit_bindings: Vec::new(),
            sync,
            last_submitted: None,
            background_image: None,
        };
        session.bind_commit_listener();
        session.process_actions()?;

        info!(
            "Mounted {}x{} canvas in {} mode",
            session.config.canvas_width, session.config.canvas_height, session.config.drawing_mode
        );
        Ok(session)
    }

    /// Apply one host command.
    ///
    /// # Errors
    ///
    /// See the individual operations.
    pub fn apply(&mut self, command: HostCommand) -> SyncResult<()> {
        match command {
            HostCommand::Pointer { event } => self.handle_event(&event),
            HostCommand::Undo => self.undo().map(drop),
            HostCommand::Redo => self.redo().map(drop),
            HostCommand::Reset => self.reset(),
            HostCommand::Download => self.force_sync(),
            HostCommand::Configure { config } => self.update_config(*config),
        }
    }

    /// Dispatch pointer input to the surface and the active tool.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync task is gone.
    pub fn handle_event(&mut self, event: &SurfaceEvent) -> SyncResult<()> {
        self.surface.dispatch(event);
        self.process_actions()
    }

    /// Step back one history entry. Returns `false` at the oldest entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reloaded or the sync task
    /// is gone.
    pub fn undo(&mut self) -> SyncResult<bool> {
        let moved = self.history.borrow_mut().undo();
        self.process_actions()?;
        Ok(moved)
    }

    /// Step forward one history entry. Returns `false` at the newest entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reloaded or the sync task
    /// is gone.
    pub fn redo(&mut self) -> SyncResult<bool> {
        let moved = self.history.borrow_mut().redo();
        self.process_actions()?;
        Ok(moved)
    }

    /// Discard the history and return to the initial drawing.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reloaded or the sync task
    /// is gone.
    pub fn reset(&mut self) -> SyncResult<()> {
        let initial = self.history.borrow().initial().clone();
        self.history.borrow_mut().reset(initial);
        self.process_actions()
    }

    /// Send the current drawing after the quiet window even with live
    /// updates off.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync task is gone.
    pub fn force_sync(&mut self) -> SyncResult<()> {
        self.history.borrow_mut().force_sync();
        self.process_actions()
    }

    /// Replace the configuration.
    ///
    /// A changed drawing mode or style reconfigures the tool; a changed
    /// initial drawing resets the history to it. Canvas size is fixed for the
    /// lifetime of a session. Nothing is applied if the new configuration is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, its initial drawing
    /// is malformed or its drawing mode is unknown.
    pub fn update_config(&mut self, mut config: SessionConfig) -> SyncResult<()> {
        config.validate()?;
        if !self.registry.contains(&config.drawing_mode) {
            return Err(CanvasError::UnknownTool(config.drawing_mode).into());
        }
        let initial_changed = config.initial_drawing != self.config.initial_drawing;
        let initial = if initial_changed {
            Some(config.initial_snapshot()?)
        } else {
            None
        };

        if config.surface_size() != self.config.surface_size() {
            warn!(
                "Ignoring canvas resize to {}x{}; remount to change size",
                config.canvas_width, config.canvas_height
            );
            config.canvas_width = self.config.canvas_width;
            config.canvas_height = self.config.canvas_height;
        }

        if let Some(initial) = initial {
            let differs = &initial != self.history.borrow().initial();
            if differs {
                debug!("Initial drawing changed, resetting history");
                self.history.borrow_mut().reset(initial);
            }
        }

        let tool_changed = config.drawing_mode != self.config.drawing_mode
            || config.tool_config() != self.config.tool_config();
        if tool_changed || initial_changed {
            self.registry
                .activate(&mut self.surface, &config.drawing_mode, &config.tool_config())?;
            self.bind_commit_listener();
        }

        if config.realtime_update_streamlit != self.config.realtime_update_streamlit {
            self.sync.set_realtime(config.realtime_update_streamlit)?;
        }

        self.config = config;
        self.process_actions()
    }

    /// Install a decoded background image.
    pub fn set_background_image(&mut self, texture: TextureData) {
        debug!("Background image set: {}x{}", texture.width, texture.height);
        self.background_image = Some(texture);
    }

    /// The background image, once loaded.
    #[must_use]
    pub fn background_image(&self) -> Option<&TextureData> {
        self.background_image.as_ref()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The drawable surface.
    #[must_use]
    pub fn surface(&self) -> &DrawableSurface {
        &self.surface
    }

    /// The undo/redo history.
    #[must_use]
    pub fn history(&self) -> Ref<'_, HistoryStore> {
        self.history.borrow()
    }

    /// Key of the active tool.
    #[must_use]
    pub fn active_tool(&self) -> Option<&str> {
        self.registry.active_key()
    }

    /// Check if the host should offer undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.borrow().can_undo()
    }

    /// Check if the host should offer redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.borrow().can_redo()
    }

    /// Tear the session down: release every binding and stop the debouncer,
    /// discarding a pending send.
    pub async fn unmount(self) {
        self.release().shutdown().await;
    }

    /// Tear the session down after the pending send, if any, has gone out.
    pub async fn close(self) {
        self.release().finish().await;
    }

    fn release(mut self) -> SyncHandle {
        self.registry.deactivate(&mut self.surface);
        for id in self.commit_bindings.drain(..) {
            self.surface.off(id);
        }
        debug!(
            "Released canvas session ({} bindings left)",
            self.surface.binding_count(None)
        );
        self.sync
    }

    /// (Re)bind the commit listener after the active tool's handlers.
    fn bind_commit_listener(&mut self) {
        for id in self.commit_bindings.drain(..) {
            self.surface.off(id);
        }

        let history = Rc::clone(&self.history);
        let on_up = self.surface.on(
            EventKind::PointerUp,
            Box::new(move |state, event| {
                let mut history = history.borrow_mut();
                if history.push(state.snapshot()) {
                    debug!("Committed drawing ({} objects)", state.objects().len());
                }
                if event.button() == Some(PointerButton::Secondary) {
                    history.force_sync();
                }
            }),
        );

        let history = Rc::clone(&self.history);
        let on_double_click = self.surface.on(
            EventKind::DoubleClick,
            Box::new(move |state, _event| {
                if history.borrow_mut().push(state.snapshot()) {
                    debug!("Committed drawing ({} objects)", state.objects().len());
                }
            }),
        );

        self.commit_bindings = vec![on_up, on_double_click];
    }

    /// Consume the history's action flags.
    fn process_actions(&mut self) -> SyncResult<()> {
        let actions = self.history.borrow_mut().take_actions();
        let pending = {
            let history = self.history.borrow();
            let current = history.current();
            let changed = self.last_submitted.as_ref() != Some(current);
            (changed || actions.any()).then(|| (current.clone(), changed))
        };
        let Some((current, changed)) = pending else {
            return Ok(());
        };

        if actions.should_reload_canvas {
            self.surface.load(&current)?;
            // Tool gestures hold shape indices into the replaced drawing.
            self.registry.activate(
                &mut self.surface,
                &self.config.drawing_mode,
                &self.config.tool_config(),
            )?;
            self.bind_commit_listener();
            debug!("Reloaded surface from history entry {}", self.history.borrow().cursor());
        }
        if changed || actions.force_send {
            self.sync.submit(current.clone(), actions.force_send)?;
            self.last_submitted = Some(current);
        }
        Ok(())
    }
}
