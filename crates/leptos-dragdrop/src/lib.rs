//! Leptos DragDrop Utilities
//!
//! Pointer-driven drag-and-drop of cards onto drop zones (board columns).
//! A press only becomes a drag once the pointer moves past an activation
//! threshold, so plain clicks still reach the card.

use std::time::Duration;

use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Default movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 8;

/// How long clicks are suppressed after a drag ends
const CLICK_SUPPRESS_MS: u64 = 100;

/// Press recorded on a card that has not yet moved far enough to drag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDrag {
    pub item_id: u32,
    pub start_x: i32,
    pub start_y: i32,
}

/// Result of releasing an active drag.
/// `zone` is `None` when the pointer was released outside every drop zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropEvent {
    pub item_id: u32,
    pub zone: Option<u32>,
}

/// True once the pointer has travelled beyond `threshold` on either axis
pub fn exceeds_threshold(start: (i32, i32), now: (i32, i32), threshold: i32) -> bool {
    (now.0 - start.0).abs() > threshold || (now.1 - start.1).abs() > threshold
}

/// DnD state signals
#[derive(Clone, Copy)]
pub struct DndSignals {
    pub dragging_id_read: ReadSignal<Option<u32>>,
    pub dragging_id_write: WriteSignal<Option<u32>>,
    /// Drop zone currently under the pointer
    pub over_zone_read: ReadSignal<Option<u32>>,
    pub over_zone_write: WriteSignal<Option<u32>>,
    pub drag_just_ended_read: ReadSignal<bool>,
    pub drag_just_ended_write: WriteSignal<bool>,
    pub pending_read: ReadSignal<Option<PendingDrag>>,
    pub pending_write: WriteSignal<Option<PendingDrag>>,
    pub threshold: i32,
}

pub fn create_dnd_signals(threshold: i32) -> DndSignals {
    let (dragging_id_read, dragging_id_write) = signal(None::<u32>);
    let (over_zone_read, over_zone_write) = signal(None::<u32>);
    let (drag_just_ended_read, drag_just_ended_write) = signal(false);
    let (pending_read, pending_write) = signal(None::<PendingDrag>);
    DndSignals {
        dragging_id_read,
        dragging_id_write,
        over_zone_read,
        over_zone_write,
        drag_just_ended_read,
        drag_just_ended_write,
        pending_read,
        pending_write,
        threshold,
    }
}

impl DndSignals {
    pub fn is_dragging(&self, item_id: u32) -> bool {
        self.dragging_id_read.get() == Some(item_id)
    }

    pub fn is_over(&self, zone_id: u32) -> bool {
        self.dragging_id_read.get().is_some() && self.over_zone_read.get() == Some(zone_id)
    }

    /// Whether a click landing right now is the tail of a drag
    pub fn suppress_click(&self) -> bool {
        self.drag_just_ended_read.get_untracked()
    }
}

/// End drag operation
pub fn end_drag(dnd: &DndSignals) {
    dnd.dragging_id_write.set(None);
    dnd.over_zone_write.set(None);
    dnd.pending_write.set(None);
    dnd.drag_just_ended_write.set(true);

    let clear = dnd.drag_just_ended_write;
    set_timeout(move || clear.set(false), Duration::from_millis(CLICK_SUPPRESS_MS));
}

fn is_form_control(target: &web_sys::EventTarget) -> bool {
    target.dyn_ref::<web_sys::HtmlInputElement>().is_some()
        || target.dyn_ref::<web_sys::HtmlButtonElement>().is_some()
        || target.dyn_ref::<web_sys::HtmlSelectElement>().is_some()
        || target.dyn_ref::<web_sys::HtmlTextAreaElement>().is_some()
}

/// Create pointerdown handler for draggable cards.
/// Records a pending drag with its start position.
pub fn make_on_pointerdown(dnd: DndSignals, item_id: u32) -> impl Fn(web_sys::PointerEvent) + Copy + 'static {
    move |ev: web_sys::PointerEvent| {
        if ev.button() != 0 {
            return;
        }
        if let Some(target) = ev.target() {
            if is_form_control(&target) { return; }
        }
        dnd.pending_write.set(Some(PendingDrag {
            item_id,
            start_x: ev.client_x(),
            start_y: ev.client_y(),
        }));
    }
}

/// Create pointerenter handler for a drop zone
pub fn make_on_zone_pointerenter(dnd: DndSignals, zone_id: u32) -> impl Fn(web_sys::PointerEvent) + Copy + 'static {
    move |_ev: web_sys::PointerEvent| {
        if dnd.dragging_id_read.get_untracked().is_some() {
            dnd.over_zone_write.set(Some(zone_id));
        }
    }
}

/// Create pointerleave handler for a drop zone.
/// Only clears the hover if no other zone was entered in the meantime.
pub fn make_on_zone_pointerleave(dnd: DndSignals, zone_id: u32) -> impl Fn(web_sys::PointerEvent) + Copy + 'static {
    move |_ev: web_sys::PointerEvent| {
        if dnd.over_zone_read.get_untracked() == Some(zone_id) {
            dnd.over_zone_write.set(None);
        }
    }
}

/// Bind document-level pointermove/pointerup handlers for the lifetime of
/// the calling component. `on_drop` fires only for real drags, never for
/// clicks.
pub fn bind_global_handlers<F>(dnd: DndSignals, on_drop: F)
where
    F: Fn(DropEvent) + 'static,
{
    let on_move = window_event_listener(ev::pointermove, move |ev: web_sys::PointerEvent| {
        let Some(pending) = dnd.pending_read.get_untracked() else { return };
        if dnd.dragging_id_read.get_untracked().is_some() {
            return;
        }
        let start = (pending.start_x, pending.start_y);
        if exceeds_threshold(start, (ev.client_x(), ev.client_y()), dnd.threshold) {
            dnd.dragging_id_write.set(Some(pending.item_id));
        }
    });

    let on_up = window_event_listener(ev::pointerup, move |_ev: web_sys::PointerEvent| {
        let dragging_id = dnd.dragging_id_read.get_untracked();
        let zone = dnd.over_zone_read.get_untracked();

        dnd.pending_write.set(None);

        if let Some(item_id) = dragging_id {
            end_drag(&dnd);
            on_drop(DropEvent { item_id, zone });
        }
        // Not dragging: the click event fires naturally on the card
    });

    on_cleanup(move || {
        on_move.remove();
        on_up.remove();
    });
}
