//! Hover and selection tracking.
//!
//! Pointer handling turns into [`CountryEvent`]s that are dispatched to a
//! single [`SelectionController`]. The controller is the only code that
//! retargets the camera.

use crate::camera::CameraTransitionEngine;
use crate::geo::CountryId;
use glam::Vec3;

/// Pointer interaction with a country, or a request to deselect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountryEvent {
    PointerEnter(CountryId),
    PointerLeave(CountryId),
    /// `center` is the mesh's bounding-sphere center, `None` for an empty
    /// mesh
    Click {
        id: CountryId,
        center: Option<Vec3>,
    },
    ClearSelection,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    hovered: Option<CountryId>,
    selected: Option<CountryId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<CountryId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<CountryId> {
        self.selected
    }

    /// Applies an event. Returns true when the camera was retargeted.
    pub fn handle(&mut self, event: CountryEvent, engine: &mut CameraTransitionEngine) -> bool {
        match event {
            CountryEvent::PointerEnter(id) => {
                self.hovered = Some(id);
                false
            }
            CountryEvent::PointerLeave(id) => {
                if self.hovered == Some(id) {
                    self.hovered = None;
                }
                false
            }
            CountryEvent::Click { id, center } => {
                let Some(center) = center else {
                    log::debug!("Ignoring click on country {} without a mesh", id.0);
                    return false;
                };
                if !engine.set_target(Some(center)) {
                    return false;
                }
                self.selected = Some(id);
                true
            }
            CountryEvent::ClearSelection => {
                self.selected = None;
                engine.set_target(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraSettings, CameraTarget};

    fn engine() -> CameraTransitionEngine {
        CameraTransitionEngine::new(CameraSettings {
            intro: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_hover() {
        let mut engine = engine();
        let mut controller = SelectionController::new();

        controller.handle(CountryEvent::PointerEnter(CountryId(1)), &mut engine);
        assert_eq!(controller.hovered(), Some(CountryId(1)));

        // Moving straight onto a neighbour may deliver its enter first
        controller.handle(CountryEvent::PointerEnter(CountryId(2)), &mut engine);
        controller.handle(CountryEvent::PointerLeave(CountryId(1)), &mut engine);
        assert_eq!(controller.hovered(), Some(CountryId(2)));

        controller.handle(CountryEvent::PointerLeave(CountryId(2)), &mut engine);
        assert_eq!(controller.hovered(), None);
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn test_click_focuses() {
        let mut engine = engine();
        let mut controller = SelectionController::new();

        let retargeted = controller.handle(
            CountryEvent::Click {
                id: CountryId(3),
                center: Some(Vec3::X),
            },
            &mut engine,
        );
        assert!(retargeted);
        assert_eq!(controller.selected(), Some(CountryId(3)));
        assert_eq!(engine.target(), CameraTarget::Focused(Vec3::X));
    }

    #[test]
    fn test_click_without_center_is_noop() {
        let mut engine = engine();
        let mut controller = SelectionController::new();

        let retargeted = controller.handle(
            CountryEvent::Click {
                id: CountryId(3),
                center: None,
            },
            &mut engine,
        );
        assert!(!retargeted);
        assert_eq!(controller.selected(), None);
        assert_eq!(engine.target(), CameraTarget::Overview);
    }

    #[test]
    fn test_clear_selection() {
        let mut engine = engine();
        let mut controller = SelectionController::new();
        controller.handle(
            CountryEvent::Click {
                id: CountryId(0),
                center: Some(Vec3::Y),
            },
            &mut engine,
        );

        assert!(controller.handle(CountryEvent::ClearSelection, &mut engine));
        assert_eq!(controller.selected(), None);
        assert_eq!(engine.target(), CameraTarget::Overview);

        // Already in overview
        assert!(!controller.handle(CountryEvent::ClearSelection, &mut engine));
    }

    #[test]
    fn test_reclick_selected_country() {
        let mut engine = engine();
        let mut controller = SelectionController::new();
        let click = CountryEvent::Click {
            id: CountryId(5),
            center: Some(Vec3::new(0.0, 0.6, 0.8)),
        };
        assert!(controller.handle(click, &mut engine));
        engine.tick(0.1);
        let elapsed = engine.transition().unwrap().elapsed();

        assert!(!controller.handle(click, &mut engine));
        assert_eq!(engine.transition().unwrap().elapsed(), elapsed);
        assert_eq!(controller.selected(), Some(CountryId(5)));
    }
}
