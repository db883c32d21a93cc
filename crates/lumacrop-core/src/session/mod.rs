//! Pointer-driven interaction state machines.
//!
//! Each session is a value that exists only while the interaction is live.
//! Committing or cancelling consumes it, so a finished session cannot be
//! driven further. [`InteractionMode`] holds at most one session at a time,
//! which makes cropping, drawing and overlay editing mutually exclusive.
//!
//! All pointer coordinates are display-space points relative to the canvas.

mod crop;
mod draw;
mod edit;

pub use crop::{CropGesture, CropSession};
pub use draw::OverlayDrawSession;
pub use edit::{handle_at, EditGesture, OverlayEditSession, Selection};

use serde::{Deserialize, Serialize};

/// The single active interaction, if any.
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Cropping(CropSession),
    Drawing(OverlayDrawSession),
    Editing(OverlayEditSession),
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    pub fn is_cropping(&self) -> bool {
        matches!(self, InteractionMode::Cropping(_))
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, InteractionMode::Drawing(_))
    }

    /// True while a gesture is in flight and global pointer listeners should
    /// stay attached.
    pub fn is_capturing(&self) -> bool {
        match self {
            InteractionMode::Idle => false,
            InteractionMode::Cropping(session) => session.is_capturing(),
            InteractionMode::Drawing(session) => session.is_capturing(),
            InteractionMode::Editing(_) => true,
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Cropping(_) => "cropping",
            InteractionMode::Drawing(_) => "drawing",
            InteractionMode::Editing(_) => "editing",
        }
    }
}

/// One of the eight overlay resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    Nw,
    N,
    Ne,
    W,
    E,
    Sw,
    S,
    Se,
}

impl ResizeHandle {
    /// Hit-test order.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Nw,
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::W,
        ResizeHandle::E,
        ResizeHandle::Sw,
        ResizeHandle::S,
        ResizeHandle::Se,
    ];

    /// Position along the box as fractions of width and height.
    pub fn anchor(&self) -> (f64, f64) {
        match self {
            ResizeHandle::Nw => (0.0, 0.0),
            ResizeHandle::N => (0.5, 0.0),
            ResizeHandle::Ne => (1.0, 0.0),
            ResizeHandle::W => (0.0, 0.5),
            ResizeHandle::E => (1.0, 0.5),
            ResizeHandle::Sw => (0.0, 1.0),
            ResizeHandle::S => (0.5, 1.0),
            ResizeHandle::Se => (1.0, 1.0),
        }
    }

    pub fn moves_left(&self) -> bool {
        matches!(self, ResizeHandle::Nw | ResizeHandle::W | ResizeHandle::Sw)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, ResizeHandle::Ne | ResizeHandle::E | ResizeHandle::Se)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, ResizeHandle::Nw | ResizeHandle::N | ResizeHandle::Ne)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, ResizeHandle::Sw | ResizeHandle::S | ResizeHandle::Se)
    }

    /// CSS cursor for hosts that style the handle.
    pub fn cursor(&self) -> &'static str {
        match self {
            ResizeHandle::Nw | ResizeHandle::Se => "nwse-resize",
            ResizeHandle::Ne | ResizeHandle::Sw => "nesw-resize",
            ResizeHandle::N | ResizeHandle::S => "ns-resize",
            ResizeHandle::W | ResizeHandle::E => "ew-resize",
        }
    }
}
