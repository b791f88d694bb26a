//! WASM bridge for RP — exposes the annotation engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the PDF
//! viewer. One [`PageCanvas`] per visible page canvas; the host forwards
//! DOM events in canvas pixels and drives `render` from
//! requestAnimationFrame while the ghost ticker is running.

mod export2d;
mod metrics2d;
mod render2d;

use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use rp_core::codec::{
    Snapshot, annotations_from_json, annotations_to_json, snapshot_from_bytes, snapshot_to_bytes,
};
use rp_core::id::{AnnotationId, DocumentId};
use rp_core::model::StylePatch;
use rp_core::store::{AnnotationStore, Tool};
use rp_editor::{
    CommandStack, DEFAULT_HISTORY_DEPTH, EditorSignal, GhostTicker, InputEvent, Modifiers,
    PageSurface, ShortcutAction, ShortcutMap, SurfaceUpdate, TickerCommand,
};
use rp_render::{ExportPlan, FrameState};

use metrics2d::CanvasMetrics;

/// The main WASM-facing canvas controller for one page.
///
/// Owns the store, the gesture surface, and the undo history. All
/// interaction from the viewer JS goes through this struct; the canvas
/// context handed to the constructor doubles as the text measurer, so hit
/// boxes always match what gets drawn.
#[wasm_bindgen]
pub struct PageCanvas {
    document: DocumentId,
    store: AnnotationStore,
    surface: PageSurface,
    history: CommandStack,
    shortcuts: ShortcutMap,
    ticker: GhostTicker,
    metrics: CanvasMetrics,
    ctx: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl PageCanvas {
    /// Create a controller bound to one document page and its 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(document_id: &str, page: u32, scale: f64, ctx: CanvasRenderingContext2d) -> Self {
        console_error_panic_hook_setup();

        let document = DocumentId::intern(document_id);
        Self {
            document,
            store: AnnotationStore::new(),
            surface: PageSurface::new(document, page, scale),
            history: CommandStack::new(DEFAULT_HISTORY_DEPTH),
            shortcuts: ShortcutMap,
            ticker: GhostTicker::new(),
            metrics: CanvasMetrics::new(ctx.clone()),
            ctx,
        }
    }

    // ─── Viewer state ────────────────────────────────────────────────────

    pub fn set_scale(&mut self, scale: f64) {
        self.surface.set_scale(scale);
    }

    /// Navigate to another page. Any in-flight gesture and the selection
    /// are dropped; the armed tool survives.
    pub fn set_page(&mut self, page: u32) {
        self.surface.set_page(page, &mut self.store);
    }

    pub fn page(&self) -> u32 {
        self.surface.page()
    }

    pub fn set_author(&mut self, author: &str) {
        self.store.set_author(author);
    }

    /// Switch the armed tool by name. Returns JSON:
    /// `{"ok":bool,"tool":"<name>","ticker":"start"|"stop"|""}`
    ///
    /// The ticker field tells the host to start or stop its animation loop
    /// for the hover ghost.
    pub fn set_tool(&mut self, name: &str) -> String {
        let (ok, tool) = match Tool::from_name(name) {
            Some(tool) => {
                self.store.set_tool(self.document, tool);
                self.surface.tool_changed();
                (true, tool)
            }
            None => (false, self.store.tool()),
        };
        let ticker = self.sync_ticker();
        format!(
            r#"{{"ok":{ok},"tool":"{}","ticker":"{ticker}"}}"#,
            tool.name()
        )
    }

    pub fn tool(&self) -> String {
        self.store.tool().name().to_string()
    }

    /// Apply a partial style change, e.g. `{"color":"#FF0000"}`.
    /// Selected annotations restyle too. Returns `false` on bad JSON.
    pub fn set_style_json(&mut self, json: &str) -> bool {
        let patch: StylePatch = match serde_json::from_str(json) {
            Ok(patch) => patch,
            Err(reason) => {
                log::warn!("rejected style patch: {reason}");
                return false;
            }
        };
        self.store.set_style(self.document, &patch);
        true
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    /// Pointer down in canvas pixels. Returns update JSON (see
    /// [`PageCanvas::on_pointer_up`]): a press can blur-commit an open
    /// text editor, which the host must tear down.
    #[allow(clippy::too_many_arguments)]
    pub fn on_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> String {
        let (x, y) = self.to_page(x, y);
        let event = InputEvent::pointer_down(x, y, mods(shift, ctrl, alt, meta), time_ms as u64);
        let update = self.feed(&event);
        self.update_json(update)
    }

    /// Pointer move. Returns `true` when a repaint is needed.
    #[allow(clippy::too_many_arguments)]
    pub fn on_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> bool {
        let (x, y) = self.to_page(x, y);
        let event = InputEvent::pointer_move(x, y, mods(shift, ctrl, alt, meta), time_ms as u64);
        self.feed(&event).repaint
    }

    /// Pointer up — gestures commit here. Returns JSON:
    /// `{"repaint":bool,"editor":"opened"|"closed"|"","ticker":...}`
    ///
    /// `editor:"opened"` asks the host to show its overlay textarea at the
    /// position reported by [`PageCanvas::editor_state`].
    #[allow(clippy::too_many_arguments)]
    pub fn on_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> String {
        let (x, y) = self.to_page(x, y);
        let event = InputEvent::pointer_up(x, y, mods(shift, ctrl, alt, meta), time_ms as u64);
        let update = self.feed(&event);
        self.update_json(update)
    }

    /// Pointer left the canvas mid-gesture. Freehand commits, everything
    /// else abandons. Returns `true` when a repaint is needed.
    pub fn on_pointer_leave(&mut self) -> bool {
        self.feed(&InputEvent::PointerLeave).repaint
    }

    /// Double click re-opens text or sticky-note annotations for editing.
    /// Returns update JSON.
    pub fn on_double_click(&mut self, x: f64, y: f64, time_ms: f64) -> String {
        let (x, y) = self.to_page(x, y);
        let event = InputEvent::double_click(x, y, time_ms as u64);
        let update = self.feed(&event);
        self.update_json(update)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a keyboard event. Returns JSON:
    /// `{"repaint":bool,"action":"<name>","tool":"<name>","editor":...,"ticker":...}`
    ///
    /// While a text session is open the event goes to the session (Enter
    /// commits, Shift+Enter inserts a newline, Escape cancels); otherwise
    /// it resolves through the shortcut map.
    pub fn on_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> String {
        if self.surface.session().is_some() {
            let event = InputEvent::key(key, mods(shift, ctrl, alt, meta), time_ms as u64);
            let update = self.feed(&event);
            return self.key_json(update, "editor");
        }

        let Some(action) = self.shortcuts.resolve(key, ctrl, shift, alt, meta) else {
            return self.key_json(SurfaceUpdate::none(), "none");
        };
        self.store.touch(time_ms as u64);
        let (update, name) = self.dispatch_action(action);
        self.key_json(update, name)
    }

    // ─── Text editor overlay ─────────────────────────────────────────────

    /// Mirror the host textarea's content into the open session.
    pub fn text_input(&mut self, text: &str) -> bool {
        match self.surface.session_mut() {
            Some(session) => {
                session.set_text(text);
                true
            }
            None => false,
        }
    }

    /// Commit the open text session (host-driven, e.g. a toolbar button).
    /// Returns update JSON; committing new text switches back to Select.
    pub fn text_commit(&mut self, time_ms: f64) -> String {
        self.store.touch(time_ms as u64);
        let committed = self.surface.commit_text(&mut self.store, &mut self.history);
        let update = SurfaceUpdate {
            repaint: committed,
            editor: committed.then_some(EditorSignal::Closed),
        };
        self.update_json(update)
    }

    /// Discard the open text session without committing.
    pub fn text_cancel(&mut self) -> bool {
        self.surface.cancel_text()
    }

    /// State of the open text session as JSON, or `{"open":false}`.
    /// Coordinates are page units; the host multiplies by the scale.
    pub fn editor_state(&self) -> String {
        let Some(session) = self.surface.session() else {
            return r#"{"open":false}"#.to_string();
        };
        let style = self.store.style();
        let options = style.text_options.clone().unwrap_or_default();
        let state = serde_json::json!({
            "open": true,
            "x": session.anchor.x,
            "y": session.anchor.y,
            "width": session.dims.map(|d| d.0),
            "height": session.dims.map(|d| d.1),
            "sticky": session.sticky,
            "existing": session.existing.map(|id| id.as_str().to_string()),
            "text": session.buffer,
            "color": style.color.to_hex(),
            "fontSize": options.font_size,
            "fontFamily": options.font_family,
        });
        state.to_string()
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Paint the annotation layer into the bound context. The host clears
    /// the canvas (or draws the PDF page) first. `time_ms` drives the
    /// ghost pulse.
    pub fn render(&self, time_ms: f64) {
        let doc = self.document;
        let transient = self.surface.transient(&self.store);
        let frame = FrameState {
            annotations: self.store.annotations(doc),
            selected: self.store.selected_ids(doc),
            editing: self.surface.editing(),
            page: self.surface.page(),
            scale: self.surface.scale(),
            transient: &transient,
        };
        render2d::render_page(&self.ctx, &frame, &self.metrics, time_ms);
    }

    /// CSS cursor for the current pointer position and gesture.
    pub fn cursor(&self) -> String {
        self.surface.cursor(&self.store, &self.metrics).to_string()
    }

    /// Output pixel size for an export of this page at `quality`. Returns
    /// `{"width":u32,"height":u32}` so the host can size the offscreen
    /// canvas before calling [`PageCanvas::export_page`].
    pub fn export_size(&self, quality: f64, page_width: f64, page_height: f64) -> String {
        let plan = ExportPlan::new(&[], self.surface.page(), self.surface.scale(), quality, page_width, page_height);
        format!(
            r#"{{"width":{},"height":{}}}"#,
            plan.pixel_width, plan.pixel_height
        )
    }

    /// Flatten this page into `ctx`: white background, the optional
    /// rendered PDF raster stretched to the output size, then the
    /// annotations with highlights multiplied on top. Returns the same
    /// size JSON as [`PageCanvas::export_size`].
    pub fn export_page(
        &self,
        ctx: &CanvasRenderingContext2d,
        raster: Option<HtmlCanvasElement>,
        quality: f64,
        page_width: f64,
        page_height: f64,
    ) -> String {
        let plan = ExportPlan::new(
            self.store.annotations(self.document),
            self.surface.page(),
            self.surface.scale(),
            quality,
            page_width,
            page_height,
        );
        export2d::export_page(ctx, &plan, raster.as_ref(), &self.metrics);
        format!(
            r#"{{"width":{},"height":{}}}"#,
            plan.pixel_width, plan.pixel_height
        )
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Serialize the document's annotations to interchange JSON.
    pub fn export_json(&self) -> String {
        annotations_to_json(self.store.annotations(self.document)).unwrap_or_else(|reason| {
            log::error!("export failed: {reason}");
            "[]".to_string()
        })
    }

    /// Replace the document's annotations from interchange JSON. Clears
    /// selection and history. Returns JSON:
    /// `{"ok":true,"count":n}` or `{"ok":false,"error":"..."}`.
    pub fn import_json(&mut self, json: &str) -> String {
        match annotations_from_json(json) {
            Ok(annotations) => {
                let count = annotations.len();
                self.store.replace_annotations(self.document, annotations);
                self.history.clear();
                format!(r#"{{"ok":true,"count":{count}}}"#)
            }
            Err(reason) => {
                log::warn!("import rejected: {reason}");
                let escaped = reason.replace('\\', "\\\\").replace('"', "\\\"");
                format!(r#"{{"ok":false,"error":"{escaped}"}}"#)
            }
        }
    }

    /// Pack the document into the MessagePack snapshot envelope. Returns
    /// an empty buffer on encode failure.
    pub fn save_snapshot(&self, time_ms: f64) -> Vec<u8> {
        let snapshot = Snapshot::new(
            self.store.annotations(self.document).to_vec(),
            time_ms as u64,
        );
        snapshot_to_bytes(&snapshot).unwrap_or_else(|reason| {
            log::error!("snapshot encode failed: {reason}");
            Vec::new()
        })
    }

    /// Restore from a snapshot buffer. Clears selection and history.
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> bool {
        match snapshot_from_bytes(bytes) {
            Ok(snapshot) => {
                self.store
                    .replace_annotations(self.document, snapshot.annotations);
                self.history.clear();
                true
            }
            Err(reason) => {
                log::warn!("snapshot rejected: {reason}");
                false
            }
        }
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.store).is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.store).is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Delete the selected annotations as one undoable step.
    pub fn delete_selected(&mut self) -> bool {
        self.surface.delete_selected(&mut self.store, &mut self.history)
    }

    /// All selected annotation ids as a JSON array.
    pub fn selected_ids(&self) -> String {
        let ids: Vec<&str> = self
            .store
            .selected_ids(self.document)
            .iter()
            .map(AnnotationId::as_str)
            .collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn annotation_count(&self) -> u32 {
        self.store.annotations(self.document).len() as u32
    }

    /// Teardown hook: guarantees the host's animation loop stops.
    pub fn release(&mut self) -> String {
        ticker_name(self.ticker.release()).to_string()
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl PageCanvas {
    /// Canvas pixels → page units. Events cross this boundary exactly once.
    fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.surface.scale();
        (x / scale, y / scale)
    }

    fn feed(&mut self, event: &InputEvent) -> SurfaceUpdate {
        self.surface
            .handle_event(event, &mut self.store, &mut self.history, &self.metrics)
    }

    /// Reconcile the ghost ticker with the armed tool. The ghost only shows
    /// while idle with a text tool armed, so commits that switch back to
    /// Select produce the stop edge here.
    fn sync_ticker(&mut self) -> &'static str {
        let armed = self.store.tool().is_text_like() && self.surface.session().is_none();
        ticker_name(self.ticker.sync(armed))
    }

    fn update_json(&mut self, update: SurfaceUpdate) -> String {
        let ticker = self.sync_ticker();
        format!(
            r#"{{"repaint":{},"editor":"{}","ticker":"{ticker}"}}"#,
            update.repaint,
            editor_name(update.editor),
        )
    }

    fn key_json(&mut self, update: SurfaceUpdate, action: &str) -> String {
        let ticker = self.sync_ticker();
        format!(
            r#"{{"repaint":{},"action":"{action}","tool":"{}","editor":"{}","ticker":"{ticker}"}}"#,
            update.repaint,
            self.store.tool().name(),
            editor_name(update.editor),
        )
    }

    /// Run one resolved shortcut. Returns the update plus the action name
    /// reported back to the host.
    fn dispatch_action(&mut self, action: ShortcutAction) -> (SurfaceUpdate, &'static str) {
        let doc = self.document;
        match action {
            ShortcutAction::SwitchTool(tool) => {
                self.store.set_tool(doc, tool);
                self.surface.tool_changed();
                (SurfaceUpdate::repaint(), "switchTool")
            }
            ShortcutAction::Undo => {
                let undone = self.history.undo(&mut self.store).is_some();
                (update_if(undone), "undo")
            }
            ShortcutAction::Redo => {
                let redone = self.history.redo(&mut self.store).is_some();
                (update_if(redone), "redo")
            }
            ShortcutAction::DeleteSelection => {
                let deleted = self.delete_selected();
                (update_if(deleted), "delete")
            }
            ShortcutAction::SelectAll => {
                let ids: Vec<AnnotationId> = self
                    .store
                    .annotations_for_page(doc, self.surface.page())
                    .map(|a| a.id)
                    .collect();
                let changed = !ids.is_empty();
                self.store.select_annotations(doc, ids);
                (update_if(changed), "selectAll")
            }
            ShortcutAction::Escape => {
                let cleared = self.store.clear_highlights(doc);
                (update_if(cleared > 0), "escape")
            }
        }
    }
}

fn mods(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn update_if(changed: bool) -> SurfaceUpdate {
    if changed {
        SurfaceUpdate::repaint()
    } else {
        SurfaceUpdate::none()
    }
}

fn editor_name(signal: Option<EditorSignal>) -> &'static str {
    match signal {
        Some(EditorSignal::Opened) => "opened",
        Some(EditorSignal::Closed) => "closed",
        None => "",
    }
}

fn ticker_name(command: Option<TickerCommand>) -> &'static str {
    match command {
        Some(TickerCommand::Start) => "start",
        Some(TickerCommand::Stop) => "stop",
        None => "",
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("RP WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate interchange JSON without touching a store. Returns JSON:
/// `{"ok":true,"count":n}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_annotations(json: &str) -> String {
    match annotations_from_json(json) {
        Ok(annotations) => format!(r#"{{"ok":true,"count":{}}}"#, annotations.len()),
        Err(reason) => {
            let escaped = reason.replace('\\', "\\\\").replace('"', "\\\"");
            format!(r#"{{"ok":false,"error":"{escaped}"}}"#)
        }
    }
}
