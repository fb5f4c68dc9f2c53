//! Input dispatch for one editing session
//!
//! [`Editor`] turns host input events into document commands and caret
//! movement, and keeps the view state (caret layer, viewport) in sync.
//! Each event is handled to completion before the next one. A failure
//! inside the pipeline never leaves a half-applied change behind: the
//! document is restored to its state before the event.

use crate::{
    Direction, Document, EditCommand, InputEvent, Key, KeyEvent, MovementUnit, PointerEvent, PointerKind, Result,
};
use layout_engine::LayoutEvent;
use perf::{time_scope, TimerCategory};
use render_model::{CaretConfig, CaretLayer, Rect, RenderConverter, RenderModel, SelectionRenderer, Viewport, ViewportConfig};
use std::time::Duration;
use tracing::{debug, error};

/// Result of handling one input event
#[derive(Debug, Clone, Default)]
pub struct InputOutcome {
    pub events: Vec<LayoutEvent>,
    /// The event failed and the document was rolled back
    pub restored: bool,
    /// Description of the failure when `restored` is set
    pub error: Option<String>,
}

/// An editing session bound to a viewport
#[derive(Debug)]
pub struct Editor {
    document: Document,
    caret: CaretLayer,
    viewport: Viewport,
    selection_renderer: SelectionRenderer,
    converter: RenderConverter,
    pointer_down: bool,
    /// Last pointer position in viewport coordinates while dragging
    last_pointer: Option<(f64, f64)>,
}

impl Editor {
    pub fn new(document: Document, viewport: ViewportConfig, width: f64, height: f64) -> Self {
        let mut editor = Self {
            document,
            caret: CaretLayer::new(CaretConfig::default()),
            viewport: Viewport::new(viewport, width, height),
            selection_renderer: SelectionRenderer::default(),
            converter: RenderConverter::default(),
            pointer_down: false,
            last_pointer: None,
        };
        editor.sync_view(false);
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn caret(&self) -> &CaretLayer {
        &self.caret
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Run a command outside of key handling, with the same rollback
    pub fn apply(&mut self, command: EditCommand) -> InputOutcome {
        let snapshot = self.document.clone();
        let result = self.document.apply(command).map(|outcome| outcome.events);
        self.finish("command", snapshot, result, true)
    }

    /// Handle one input event to completion
    pub fn handle(&mut self, event: InputEvent) -> InputOutcome {
        time_scope!("input", TimerCategory::Input);
        let name = event.name();
        if let InputEvent::Resize { width, height } = event {
            self.resize(width, height);
            return InputOutcome::default();
        }
        // Outside a drag auto-scroll a tick only animates the view
        if let InputEvent::Tick { ms } = event {
            if !self.is_drag_scrolling() {
                let elapsed = Duration::from_millis(ms);
                self.viewport.tick(elapsed);
                self.caret.tick(elapsed);
                return InputOutcome::default();
            }
        }

        let snapshot = self.document.clone();
        let (result, scroll) = match event {
            InputEvent::Key(key) => (self.handle_key(key), true),
            InputEvent::Pointer(pointer) => (self.handle_pointer(pointer), false),
            InputEvent::Tick { ms } => (self.advance(Duration::from_millis(ms)), false),
            InputEvent::Resize { .. } => (Ok(Vec::new()), false),
        };
        self.finish(name, snapshot, result, scroll)
    }

    fn finish(&mut self, name: &str, snapshot: Document, result: Result<Vec<LayoutEvent>>, scroll: bool) -> InputOutcome {
        match result {
            Ok(events) => {
                if name != "tick" {
                    self.sync_view(scroll);
                }
                InputOutcome {
                    events,
                    restored: false,
                    error: None,
                }
            }
            Err(e) => {
                error!(event = name, error = %e, "input handling failed, restoring document");
                self.document = snapshot;
                self.pointer_down = false;
                self.last_pointer = None;
                self.viewport.stop_auto_scroll();
                self.sync_view(false);
                InputOutcome {
                    events: Vec::new(),
                    restored: true,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        debug!(width, height, "viewport resized");
        self.viewport.resize(width, height);
        self.sync_view(false);
    }

    /// Advance caret blink, scroll animation and drag auto-scroll
    pub fn tick(&mut self, elapsed: Duration) -> InputOutcome {
        self.handle(InputEvent::Tick {
            ms: elapsed.as_millis() as u64,
        })
    }

    fn handle_key(&mut self, event: KeyEvent) -> Result<Vec<LayoutEvent>> {
        let command = event.has_command_modifier();
        let collapsed = self.document.selection().is_collapsed();
        let edit = match event.key {
            Key::Char(c) if command => {
                if c.eq_ignore_ascii_case(&'a') {
                    self.document.select_all()?;
                }
                None
            }
            Key::Char(c) => Some(EditCommand::InsertText(c.to_string())),
            Key::Enter => Some(EditCommand::InsertNewline),
            Key::Backspace if !collapsed => Some(EditCommand::RemoveSelection),
            Key::Backspace => Some(EditCommand::DeleteBackward),
            Key::Delete if !collapsed => Some(EditCommand::RemoveSelection),
            Key::Delete => Some(EditCommand::DeleteForward),
            Key::Left => self.navigate(Direction::Backward, MovementUnit::Character, event.shift)?,
            Key::Right => self.navigate(Direction::Forward, MovementUnit::Character, event.shift)?,
            Key::Up => self.navigate(Direction::Backward, MovementUnit::Line, event.shift)?,
            Key::Down => self.navigate(Direction::Forward, MovementUnit::Line, event.shift)?,
            Key::Home if command => self.navigate(Direction::Backward, MovementUnit::DocumentBoundary, event.shift)?,
            Key::End if command => self.navigate(Direction::Forward, MovementUnit::DocumentBoundary, event.shift)?,
            Key::Home => self.navigate(Direction::Backward, MovementUnit::LineBoundary, event.shift)?,
            Key::End => self.navigate(Direction::Forward, MovementUnit::LineBoundary, event.shift)?,
        };
        match edit {
            Some(command) => Ok(self.document.apply(command)?.events),
            None => Ok(Vec::new()),
        }
    }

    fn navigate(&mut self, direction: Direction, unit: MovementUnit, extend: bool) -> Result<Option<EditCommand>> {
        self.document.move_caret(direction, unit, extend)?;
        Ok(None)
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Result<Vec<LayoutEvent>> {
        match event.kind {
            PointerKind::Down => {
                self.pointer_down = true;
                self.last_pointer = Some((event.x, event.y));
                self.viewport.cancel_animation();
                let y = event.y + self.viewport.scroll_y();
                if let Some(position) = self.document.position_at(event.x as f32, y as f32) {
                    self.document.set_caret(position)?;
                }
            }
            PointerKind::Move => {
                if !self.pointer_down {
                    return Ok(Vec::new());
                }
                self.last_pointer = Some((event.x, event.y));
                self.extend_to_pointer()?;
                self.viewport.update_auto_scroll(event.y);
            }
            PointerKind::Up => {
                self.pointer_down = false;
                self.last_pointer = None;
                self.viewport.stop_auto_scroll();
            }
        }
        Ok(Vec::new())
    }

    /// Extend the selection to the last pointer position
    fn extend_to_pointer(&mut self) -> Result<()> {
        let Some((x, y)) = self.last_pointer else {
            return Ok(());
        };
        let y = y + self.viewport.scroll_y();
        if let Some(position) = self.document.position_at(x as f32, y as f32) {
            self.document.extend_selection(position)?;
        }
        Ok(())
    }

    fn advance(&mut self, elapsed: Duration) -> Result<Vec<LayoutEvent>> {
        let scrolled = self.viewport.tick(elapsed);
        if scrolled && self.is_drag_scrolling() {
            self.extend_to_pointer()?;
            self.sync_view(false);
        }
        self.caret.tick(elapsed);
        Ok(Vec::new())
    }

    fn is_drag_scrolling(&self) -> bool {
        self.pointer_down && self.viewport.is_auto_scrolling()
    }

    /// Refresh document height and caret; optionally scroll the focus into view
    fn sync_view(&mut self, scroll: bool) {
        let view = self.document.view();
        self.viewport
            .set_document_height(f64::from(view.layout().document_height()));
        let selection = self.document.selection();
        self.caret.sync(selection.range(), &view);
        if scroll {
            if let Some(rect) = view.caret_rect(&selection.focus().info) {
                self.viewport.scroll_into_view(Rect::from(rect));
            }
        }
    }

    /// Paint items for the visible pages plus selection and caret overlays
    pub fn render(&self) -> Result<RenderModel> {
        time_scope!("render", TimerCategory::Render);
        let view = self.document.view();
        let pages = self.viewport.visible_page_range(view.layout());
        let mut model = self.converter.convert_pages(&view, pages)?;
        model.overlay.extend(self.selection_renderer.render(&view));
        model.overlay.extend(self.caret.render());
        Ok(model)
    }
}
