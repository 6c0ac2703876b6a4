use eframe::egui::{Pos2, Rect, Vec2};

pub const MIN_SIZE_PERCENT: f32 = 5.0;
pub const MAX_SIZE_PERCENT: f32 = 50.0;

/// Position and width of an overlay, all in percent of the container.
///
/// `x`/`y` locate the top-left corner. Height is not stored: it follows from
/// the overlay image's own aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayState {
    pub x: f32,
    pub y: f32,
    pub size_percent: f32,
}

impl OverlayState {
    /// Builds a state and clamps it into the valid range.
    pub fn new(x: f32, y: f32, size_percent: f32) -> Self {
        let size_percent = size_percent.clamp(MIN_SIZE_PERCENT, MAX_SIZE_PERCENT);
        Self {
            x: x.clamp(0.0, 100.0 - size_percent),
            y: y.clamp(0.0, 100.0),
            size_percent,
        }
    }

    /// Screen rectangle of the overlay inside `container`.
    ///
    /// `height_over_width` is the overlay image's native `h / w`.
    pub fn screen_rect(&self, container: Rect, height_over_width: f32) -> Rect {
        let width = container.width() * self.size_percent / 100.0;
        let min = container.min
            + Vec2::new(
                container.width() * self.x / 100.0,
                container.height() * self.y / 100.0,
            );
        Rect::from_min_size(min, Vec2::new(width, width * height_over_width))
    }
}

/// Which logo slot an overlay belongs to. Each slot starts from its own
/// default corner, matching where the prompt asks the generator to leave
/// empty space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoPlacement {
    FrontCover,
    BackCover,
}

impl LogoPlacement {
    pub fn default_state(self) -> OverlayState {
        match self {
            // top-right corner
            LogoPlacement::FrontCover => OverlayState::new(78.0, 4.0, 18.0),
            // bottom-left corner
            LogoPlacement::BackCover => OverlayState::new(4.0, 78.0, 28.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogoPlacement::FrontCover => "front logo",
            LogoPlacement::BackCover => "back logo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Resizing,
}

/// Context captured at pointer-down and kept for the whole gesture.
#[derive(Debug, Clone, Copy)]
struct InteractionSession {
    mode: InteractionMode,
    anchor_pointer: Pos2,
    anchor_state: OverlayState,
}

pub type CommitHook = Box<dyn FnMut(&OverlayState)>;

pub struct OverlayController {
    placement: LogoPlacement,
    current: OverlayState,
    committed: OverlayState,
    session: Option<InteractionSession>,
    on_commit: Option<CommitHook>,
}

impl OverlayController {
    pub fn new(placement: LogoPlacement) -> Self {
        let initial = placement.default_state();
        Self {
            placement,
            current: initial,
            committed: initial,
            session: None,
            on_commit: None,
        }
    }

    /// Registers a callback invoked once per committed gesture.
    pub fn with_commit_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&OverlayState) + 'static,
    {
        self.on_commit = Some(Box::new(hook));
        self
    }

    pub fn placement(&self) -> LogoPlacement {
        self.placement
    }

    /// State to draw right now, including an in-progress gesture.
    pub fn state(&self) -> OverlayState {
        self.current
    }

    /// State of record, updated only when a gesture ends.
    pub fn committed(&self) -> OverlayState {
        self.committed
    }

    pub fn mode(&self) -> InteractionMode {
        self.session.map_or(InteractionMode::Idle, |s| s.mode)
    }

    /// Whether pointer events should currently be routed to this controller.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts moving the overlay. Returns `false` if a gesture is already running.
    pub fn begin_drag(&mut self, pointer: Pos2) -> bool {
        self.begin(InteractionMode::Dragging, pointer)
    }

    /// Starts resizing the overlay. Returns `false` if a gesture is already running.
    pub fn begin_resize(&mut self, pointer: Pos2) -> bool {
        self.begin(InteractionMode::Resizing, pointer)
    }

    fn begin(&mut self, mode: InteractionMode, pointer: Pos2) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(InteractionSession {
            mode,
            anchor_pointer: pointer,
            anchor_state: self.current,
        });
        true
    }

    /// Applies a pointer move against the container's current geometry.
    ///
    /// Returns `true` when the transient state changed.
    pub fn on_pointer_move(&mut self, pointer: Pos2, container: Rect) -> bool {
        let Some(session) = self.session else {
            return false;
        };
        if container.width() <= 0.0 || container.height() <= 0.0 {
            return false;
        }

        let delta = pointer - session.anchor_pointer;
        let dx = delta.x / container.width() * 100.0;
        let dy = delta.y / container.height() * 100.0;
        let anchor = session.anchor_state;

        let next = match session.mode {
            InteractionMode::Dragging => OverlayState {
                x: (anchor.x + dx).clamp(0.0, 100.0 - self.current.size_percent),
                y: (anchor.y + dy).clamp(0.0, 100.0),
                size_percent: self.current.size_percent,
            },
            InteractionMode::Resizing => {
                // The right edge must stay inside the container.
                let max = MAX_SIZE_PERCENT.min(100.0 - anchor.x).max(MIN_SIZE_PERCENT);
                OverlayState {
                    size_percent: (anchor.size_percent + dx).clamp(MIN_SIZE_PERCENT, max),
                    ..self.current
                }
            }
            InteractionMode::Idle => return false,
        };

        if next == self.current {
            return false;
        }
        self.current = next;
        true
    }

    /// Ends the running gesture and commits the last transient state.
    ///
    /// Returns the committed state, or `None` when no gesture was running.
    pub fn end_interaction(&mut self) -> Option<OverlayState> {
        self.session.take()?;
        self.committed = self.current;
        log::debug!(
            "{} committed at ({:.1}%, {:.1}%) size {:.1}%",
            self.placement.label(),
            self.committed.x,
            self.committed.y,
            self.committed.size_percent
        );
        if let Some(hook) = self.on_commit.as_mut() {
            hook(&self.committed);
        }
        Some(self.committed)
    }
}
