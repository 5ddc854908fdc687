use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::InputConfig;
use crate::environment::Trigger;

/// A click or double-click at a viewport position.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerGesture {
    pub position: Vec2,
    pub kind: Trigger,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    dragged: bool,
}

/// Turns raw primary-button presses and releases into clicks and
/// double-clicks. Every click is reported; the second click of a pair is
/// additionally reported as a double-click.
#[derive(Resource, Debug, Clone)]
pub struct ClickTracker {
    double_click_secs: f64,
    double_click_slop: f32,
    drag_threshold: f32,
    press: Option<Press>,
    last_click: Option<(Vec2, f64)>,
}

impl ClickTracker {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            double_click_secs: config.double_click_ms as f64 / 1000.0,
            double_click_slop: config.double_click_slop,
            drag_threshold: config.drag_threshold,
            press: None,
            last_click: None,
        }
    }

    pub fn press(&mut self, position: Vec2) {
        self.press = Some(Press {
            origin: position,
            dragged: false,
        });
    }

    pub fn moved(&mut self, position: Vec2) {
        if let Some(press) = &mut self.press {
            if press.origin.distance(position) > self.drag_threshold {
                press.dragged = true;
            }
        }
    }

    /// Whether the current press has turned into a drag.
    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|press| press.dragged)
    }

    pub fn release(&mut self, position: Vec2, now: f64) -> Vec<Trigger> {
        self.moved(position);
        let Some(press) = self.press.take() else {
            return Vec::new();
        };
        if press.dragged {
            return Vec::new();
        }

        let mut gestures = vec![Trigger::Click];
        match self.last_click {
            Some((last, at))
                if now - at <= self.double_click_secs
                    && last.distance(position) <= self.double_click_slop =>
            {
                gestures.push(Trigger::DoubleClick);
                self.last_click = None;
            }
            _ => self.last_click = Some((position, now)),
        }
        gestures
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

pub fn recognise_gestures(
    mouse_input: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time<Real>>,
    mut tracker: ResMut<ClickTracker>,
    mut gestures: EventWriter<PointerGesture>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(position) = window.cursor_position() else {
        return;
    };

    if mouse_input.just_pressed(MouseButton::Left) {
        tracker.press(position);
    } else if mouse_input.pressed(MouseButton::Left) {
        tracker.moved(position);
    }

    if mouse_input.just_released(MouseButton::Left) {
        for kind in tracker.release(position, time.elapsed_secs_f64()) {
            gestures.send(PointerGesture { position, kind });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(tracker: &mut ClickTracker, position: Vec2, now: f64) -> Vec<Trigger> {
        tracker.press(position);
        tracker.release(position, now)
    }

    #[test]
    fn single_click() {
        let mut tracker = ClickTracker::default();
        assert_eq!(click(&mut tracker, Vec2::new(10.0, 10.0), 1.0), vec![Trigger::Click]);
    }

    #[test]
    fn two_quick_clicks_make_a_double_click() {
        let mut tracker = ClickTracker::default();
        let at = Vec2::new(300.0, 200.0);
        click(&mut tracker, at, 1.0);
        assert_eq!(
            click(&mut tracker, at + Vec2::new(2.0, 1.0), 1.2),
            vec![Trigger::Click, Trigger::DoubleClick]
        );
        // A third click starts a new pair.
        assert_eq!(click(&mut tracker, at, 1.3), vec![Trigger::Click]);
    }

    #[test]
    fn slow_or_distant_clicks_stay_single() {
        let mut tracker = ClickTracker::default();
        click(&mut tracker, Vec2::ZERO, 1.0);
        assert_eq!(click(&mut tracker, Vec2::ZERO, 2.0), vec![Trigger::Click]);
        assert_eq!(
            click(&mut tracker, Vec2::new(50.0, 0.0), 2.1),
            vec![Trigger::Click]
        );
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut tracker = ClickTracker::default();
        tracker.press(Vec2::ZERO);
        tracker.moved(Vec2::new(30.0, 0.0));
        assert!(tracker.is_dragging());
        assert!(tracker.release(Vec2::ZERO, 1.0).is_empty());
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut tracker = ClickTracker::default();
        assert!(tracker.release(Vec2::ZERO, 1.0).is_empty());
    }
}
