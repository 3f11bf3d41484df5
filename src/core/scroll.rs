//! Auto-follow policy for the transcript viewport.
//!
//! Offsets count wrapped lines from the top of the transcript, so the bottom of
//! the conversation is at `max_offset`.

pub const DEFAULT_FOLLOW_THRESHOLD: u16 = 2;

/// Viewport input after keybinding/mouse translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    LineUp,
    LineDown,
    WheelUp(u16),
    WheelDown(u16),
    PageUp(u16),
    PageDown(u16),
    Top,
    Bottom,
    /// Explicit jump to an earlier position, such as the user's last question.
    JumpTo(u16),
    /// Position reported by the view itself.
    Scrolled(u16),
}

impl ViewportEvent {
    /// Whether the user is asking to look at earlier content.
    pub fn is_upward_intent(self) -> bool {
        matches!(
            self,
            ViewportEvent::LineUp
                | ViewportEvent::WheelUp(_)
                | ViewportEvent::PageUp(_)
                | ViewportEvent::Top
                | ViewportEvent::JumpTo(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    auto_follow: bool,
    offset: u16,
    max_offset: u16,
    threshold: u16,
}

impl Default for ScrollCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_THRESHOLD)
    }
}

impl ScrollCoordinator {
    pub fn new(threshold: u16) -> Self {
        Self {
            auto_follow: true,
            offset: 0,
            max_offset: 0,
            threshold,
        }
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn max_offset(&self) -> u16 {
        self.max_offset
    }

    /// Start of a new send: follow new content again.
    pub fn reset(&mut self) {
        self.auto_follow = true;
        self.offset = self.max_offset;
    }

    pub fn is_near_bottom(&self) -> bool {
        self.max_offset.saturating_sub(self.offset) <= self.threshold
    }

    pub fn apply(&mut self, event: ViewportEvent) {
        let target = match event {
            ViewportEvent::LineUp => self.offset.saturating_sub(1),
            ViewportEvent::LineDown => self.offset.saturating_add(1),
            ViewportEvent::WheelUp(lines) | ViewportEvent::PageUp(lines) => {
                self.offset.saturating_sub(lines)
            }
            ViewportEvent::WheelDown(lines) | ViewportEvent::PageDown(lines) => {
                self.offset.saturating_add(lines)
            }
            ViewportEvent::Top => 0,
            ViewportEvent::Bottom => self.max_offset,
            ViewportEvent::JumpTo(offset) | ViewportEvent::Scrolled(offset) => offset,
        };
        self.offset = target.min(self.max_offset);

        if event.is_upward_intent() {
            self.auto_follow = false;
        } else if event == ViewportEvent::Bottom || (!self.auto_follow && self.is_near_bottom()) {
            self.auto_follow = true;
        }
    }

    /// Content or viewport size changed. Returns true when the view was pinned to
    /// the bottom.
    pub fn content_changed(&mut self, content_height: u16, viewport_height: u16) -> bool {
        self.max_offset = content_height.saturating_sub(viewport_height);
        if self.auto_follow {
            self.offset = self.max_offset;
            true
        } else {
            self.offset = self.offset.min(self.max_offset);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator_with_content(content: u16, viewport: u16) -> ScrollCoordinator {
        let mut scroll = ScrollCoordinator::new(2);
        scroll.content_changed(content, viewport);
        scroll
    }

    #[test]
    fn follows_new_content_by_default() {
        let mut scroll = coordinator_with_content(30, 10);
        assert!(scroll.auto_follow());
        assert_eq!(scroll.offset(), 20);

        assert!(scroll.content_changed(35, 10));
        assert_eq!(scroll.offset(), 25);
    }

    #[test]
    fn upward_scroll_holds_position_until_near_bottom() {
        let mut scroll = coordinator_with_content(30, 10);
        scroll.apply(ViewportEvent::WheelUp(3));
        assert!(!scroll.auto_follow());
        assert_eq!(scroll.offset(), 17);

        assert!(!scroll.content_changed(40, 10));
        assert_eq!(scroll.offset(), 17);

        scroll.apply(ViewportEvent::PageDown(10));
        assert_eq!(scroll.offset(), 27);
        assert!(!scroll.auto_follow());

        scroll.apply(ViewportEvent::LineDown);
        assert_eq!(scroll.offset(), 28);
        assert!(scroll.auto_follow());
        assert!(scroll.content_changed(45, 10));
        assert_eq!(scroll.offset(), 35);
    }

    #[test]
    fn small_upward_step_near_bottom_still_disables_follow() {
        let mut scroll = coordinator_with_content(30, 10);
        scroll.apply(ViewportEvent::LineUp);
        assert!(!scroll.auto_follow());
        assert!(!scroll.content_changed(31, 10));
        assert_eq!(scroll.offset(), 19);
    }

    #[test]
    fn jump_to_question_disables_follow() {
        let mut scroll = coordinator_with_content(50, 10);
        scroll.apply(ViewportEvent::JumpTo(12));
        assert_eq!(scroll.offset(), 12);
        assert!(!scroll.auto_follow());
    }

    #[test]
    fn position_report_near_bottom_resumes_follow() {
        let mut scroll = coordinator_with_content(50, 10);
        scroll.apply(ViewportEvent::Top);
        assert!(!scroll.auto_follow());

        scroll.apply(ViewportEvent::Scrolled(20));
        assert!(!scroll.auto_follow());

        scroll.apply(ViewportEvent::Scrolled(39));
        assert!(scroll.auto_follow());
    }

    #[test]
    fn bottom_and_reset_always_resume_follow() {
        let mut scroll = coordinator_with_content(50, 10);
        scroll.apply(ViewportEvent::Top);
        scroll.apply(ViewportEvent::Bottom);
        assert!(scroll.auto_follow());
        assert_eq!(scroll.offset(), 40);

        scroll.apply(ViewportEvent::Top);
        scroll.reset();
        assert!(scroll.auto_follow());
        assert_eq!(scroll.offset(), 40);
    }

    #[test]
    fn offsets_are_clamped_to_content() {
        let mut scroll = coordinator_with_content(5, 10);
        assert_eq!(scroll.max_offset(), 0);
        scroll.apply(ViewportEvent::WheelDown(3));
        assert_eq!(scroll.offset(), 0);
        scroll.apply(ViewportEvent::JumpTo(99));
        assert_eq!(scroll.offset(), 0);
    }
}
