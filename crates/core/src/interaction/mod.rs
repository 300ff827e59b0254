//! Pointer-driven editing over the annotation store.
//!
//! Every event is handled to completion against a borrowed store. Exactly one
//! [`InteractionState`] is active at a time; entering a new one drops whatever
//! selection, picker or editor was open before.

mod resize;

pub use hit_test::{hit_test, Hit, HIT_PADDING};
pub use resize::{resize_rect, ResizeHandle, HANDLE_HIT_HALF, MIN_IMAGE_SIZE};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::annotation::{
    AnnotationId, AnnotationKind, AnnotationRef, ImageAnnotation, RedactionBox, TextAnnotation,
};
use crate::geometry::{Point, Rect};
use crate::store::{AnnotationStore, ImagePatch, TextPatch};
use crate::text_layout::{text_bounds, TextMeasure};
use crate::{CoreError, Result};

/// Active editing tool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Redact,
    Text,
    Image,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Settings panel open for one annotation
    Selected(AnnotationRef),
    DraggingNewRedaction {
        anchor: Point,
        current: Point,
    },
    DraggingAnnotation {
        target: AnnotationRef,
        grab_offset: (f32, f32),
    },
    ResizingImage {
        id: AnnotationId,
        handle: ResizeHandle,
        start_rect: Rect,
        start: Point,
    },
    EditingText(AnnotationId),
    /// Waiting for a template choice for text placed at the point
    ShowingTemplatePicker(Point),
    /// Waiting for image bytes to place centered on the point
    AwaitingImage(Point),
}

/// What the UI should react to after an event
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Nothing,
    Selected(AnnotationRef),
    SelectionCleared,
    /// The store changed in place (move, resize) or the drag preview moved
    Changed,
    RedactionCommitted(AnnotationId),
    /// Drag ended below the minimum size, nothing was added
    RedactionRejected,
    EditingStarted(AnnotationId),
    EditingEnded { id: AnnotationId, removed: bool },
    OpenTemplatePicker(Point),
    OpenImagePicker(Point),
    Deleted(AnnotationRef),
}

/// The interaction state machine for the page being edited.
#[derive(Debug, Default)]
pub struct Interaction {
    state: InteractionState,
    tool: Tool,
    page_number: u32,
    gesture_moved: bool,
}

impl Interaction {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Annotation currently highlighted in preview, if any
    pub fn selection(&self) -> Option<AnnotationRef> {
        match &self.state {
            InteractionState::Selected(target) => Some(target.clone()),
            InteractionState::DraggingAnnotation { target, .. } => Some(target.clone()),
            InteractionState::ResizingImage { id, .. } => {
                Some(AnnotationRef::new(AnnotationKind::Image, id.clone()))
            }
            InteractionState::EditingText(id) => {
                Some(AnnotationRef::new(AnnotationKind::Text, id.clone()))
            }
            _ => None,
        }
    }

    /// Rectangle of the redaction being drawn, for preview
    pub fn pending_redaction(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::DraggingNewRedaction { anchor, current } => {
                Some(Rect::from_corners(*anchor, *current))
            }
            _ => None,
        }
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.state, InteractionState::ResizingImage { .. })
    }

    pub fn set_tool(&mut self, store: &mut AnnotationStore, tool: Tool) -> Outcome {
        self.tool = tool;
        self.reset(store)
    }

    /// Switch pages; whatever was open belongs to the old page
    pub fn set_page(&mut self, store: &mut AnnotationStore, page_number: u32) -> Outcome {
        self.page_number = page_number;
        self.reset(store)
    }

    pub fn pointer_down(
        &mut self,
        store: &mut AnnotationStore,
        p: Point,
        measure: &dyn TextMeasure,
    ) -> Outcome {
        self.gesture_moved = false;

        // Clicking inside the text being edited keeps the editor open
        if let InteractionState::EditingText(id) = &self.state {
            let inside = store
                .text(id)
                .map(|t| text_bounds(t, measure).contains_with_padding(p, HIT_PADDING))
                .unwrap_or(false);
            if inside {
                return Outcome::Nothing;
            }
        }
        let ended = self.finish_editing(store);

        let hit = hit_test(&store.on_page(self.page_number), p, measure);
        let outcome = match hit {
            Some(Hit::Redaction(id)) => {
                let target = AnnotationRef::new(AnnotationKind::Redaction, id);
                self.state = InteractionState::Selected(target.clone());
                Outcome::Selected(target)
            }
            Some(Hit::Handle { id, handle }) => match store.image(&id) {
                Some(image) => {
                    self.state = InteractionState::ResizingImage {
                        id: id.clone(),
                        handle,
                        start_rect: image.rect,
                        start: p,
                    };
                    Outcome::Selected(AnnotationRef::new(AnnotationKind::Image, id))
                }
                None => self.clear(),
            },
            Some(hit @ (Hit::Text(_) | Hit::Image(_))) => {
                let target = hit.target();
                match origin_of(store, &target) {
                    Some(origin) => {
                        self.state = InteractionState::DraggingAnnotation {
                            target: target.clone(),
                            grab_offset: p.offset_from(origin),
                        };
                        Outcome::Selected(target)
                    }
                    None => self.clear(),
                }
            }
            None if self.tool == Tool::Redact => {
                self.state = InteractionState::DraggingNewRedaction {
                    anchor: p,
                    current: p,
                };
                Outcome::Changed
            }
            None => self.clear(),
        };

        match ended {
            Some(ended) if outcome == Outcome::SelectionCleared => ended,
            _ => outcome,
        }
    }

    pub fn pointer_move(&mut self, store: &mut AnnotationStore, p: Point) -> Outcome {
        match &mut self.state {
            InteractionState::DraggingNewRedaction { current, .. } => {
                *current = p;
                self.gesture_moved = true;
                Outcome::Changed
            }
            InteractionState::DraggingAnnotation {
                target,
                grab_offset,
            } => {
                let origin = Point::new(p.x - grab_offset.0, p.y - grab_offset.1);
                let moved = match target.kind {
                    AnnotationKind::Text => store.update_text(&target.id, TextPatch::position(origin)),
                    AnnotationKind::Image => {
                        let rect = store.image(&target.id).map(|i| i.rect.with_origin(origin));
                        rect.is_some_and(|rect| store.update_image(&target.id, ImagePatch::rect(rect)))
                    }
                    AnnotationKind::Redaction => false,
                };
                self.gesture_moved |= moved;
                if moved {
                    Outcome::Changed
                } else {
                    Outcome::Nothing
                }
            }
            InteractionState::ResizingImage {
                id,
                handle,
                start_rect,
                start,
            } => {
                let lock = store.image(id).map(|i| i.lock_aspect_ratio).unwrap_or(true);
                let (dx, dy) = p.offset_from(*start);
                let rect = resize_rect(*handle, *start_rect, dx, dy, lock);
                self.gesture_moved = true;
                if store.update_image(id, ImagePatch::rect(rect)) {
                    Outcome::Changed
                } else {
                    Outcome::Nothing
                }
            }
            _ => Outcome::Nothing,
        }
    }

    pub fn pointer_up(&mut self, store: &mut AnnotationStore) -> Outcome {
        match std::mem::take(&mut self.state) {
            InteractionState::DraggingNewRedaction { anchor, current } => {
                // The redact tool is one-shot either way
                self.tool = Tool::Select;
                match RedactionBox::from_drag(self.page_number, Rect::from_corners(anchor, current)) {
                    Some(redaction) => {
                        let id = store.add_redaction(redaction);
                        debug!("[Interaction] committed redaction {id} on page {}", self.page_number);
                        Outcome::RedactionCommitted(id)
                    }
                    None => {
                        debug!("[Interaction] drag too small, no redaction");
                        Outcome::RedactionRejected
                    }
                }
            }
            InteractionState::DraggingAnnotation { .. } | InteractionState::ResizingImage { .. } => {
                Outcome::Nothing
            }
            other => {
                self.state = other;
                Outcome::Nothing
            }
        }
    }

    /// A click that follows a pointer-down/up pair without movement.
    ///
    /// Only the text and image tools act on clicks, and only when the
    /// pointer-down did not already open something.
    pub fn click(&mut self, store: &mut AnnotationStore, p: Point, measure: &dyn TextMeasure) -> Outcome {
        if self.gesture_moved || self.state != InteractionState::Idle {
            return Outcome::Nothing;
        }
        let page = store.on_page(self.page_number);
        match self.tool {
            Tool::Text => match hit_test::text_at(&page.texts, p, measure) {
                Some(text) => {
                    let id = text.id.clone();
                    self.state = InteractionState::EditingText(id.clone());
                    Outcome::EditingStarted(id)
                }
                None => {
                    self.state = InteractionState::ShowingTemplatePicker(p);
                    Outcome::OpenTemplatePicker(p)
                }
            },
            Tool::Image => match hit_test::image_at(&page.images, p) {
                Some(image) => {
                    let target = AnnotationRef::new(AnnotationKind::Image, image.id.clone());
                    self.state = InteractionState::Selected(target.clone());
                    Outcome::Selected(target)
                }
                None => {
                    self.state = InteractionState::AwaitingImage(p);
                    Outcome::OpenImagePicker(p)
                }
            },
            Tool::Select => {
                let hit = hit_test::text_at(&page.texts, p, measure)
                    .map(|t| AnnotationRef::new(AnnotationKind::Text, t.id.clone()))
                    .or_else(|| {
                        hit_test::image_at(&page.images, p)
                            .map(|i| AnnotationRef::new(AnnotationKind::Image, i.id.clone()))
                    });
                match hit {
                    Some(target) => {
                        self.state = InteractionState::Selected(target.clone());
                        Outcome::Selected(target)
                    }
                    None => Outcome::Nothing,
                }
            }
            Tool::Redact => Outcome::Nothing,
        }
    }

    /// Create text from a template at the remembered picker position and open
    /// it for editing.
    pub fn choose_template(&mut self, store: &mut AnnotationStore, template: &str) -> Result<AnnotationId> {
        let InteractionState::ShowingTemplatePicker(at) = self.state else {
            return Err(CoreError::Validation("no template picker is open".to_string()));
        };
        let id = store.add_text(TextAnnotation::new(self.page_number, at, template));
        self.tool = Tool::Select;
        self.state = InteractionState::EditingText(id.clone());
        Ok(id)
    }

    /// Skip the templates and start with an empty text at the picker position
    pub fn begin_text_entry(&mut self, store: &mut AnnotationStore) -> Result<AnnotationId> {
        self.choose_template(store, "")
    }

    pub fn update_editing_text(&mut self, store: &mut AnnotationStore, text: &str) -> bool {
        match &self.state {
            InteractionState::EditingText(id) => store.update_text(id, TextPatch::text(text)),
            _ => false,
        }
    }

    /// Editor lost focus; blank text is deleted
    pub fn end_text_editing(&mut self, store: &mut AnnotationStore) -> Outcome {
        self.finish_editing(store).unwrap_or(Outcome::Nothing)
    }

    /// Escape: closes the editor, a picker, or the current selection
    pub fn cancel(&mut self, store: &mut AnnotationStore) -> Outcome {
        self.reset(store)
    }

    /// Place picked image bytes at the remembered position and select it
    pub fn place_image(&mut self, store: &mut AnnotationStore, data: Vec<u8>) -> Result<AnnotationId> {
        let InteractionState::AwaitingImage(at) = self.state else {
            return Err(CoreError::Validation("no image placement is pending".to_string()));
        };
        let image = match ImageAnnotation::centered_at(self.page_number, at, data) {
            Ok(image) => image,
            Err(err) => {
                self.state = InteractionState::Idle;
                return Err(err);
            }
        };
        let id = store.add_image(image);
        self.tool = Tool::Select;
        self.state = InteractionState::Selected(AnnotationRef::new(AnnotationKind::Image, id.clone()));
        Ok(id)
    }

    /// Select an annotation directly, e.g. from a sidebar list
    pub fn select(&mut self, store: &mut AnnotationStore, target: AnnotationRef) -> Outcome {
        if !store.contains(&target) {
            return Outcome::Nothing;
        }
        self.finish_editing(store);
        self.state = InteractionState::Selected(target.clone());
        Outcome::Selected(target)
    }

    pub fn delete_selected(&mut self, store: &mut AnnotationStore) -> Outcome {
        let Some(target) = self.selection() else {
            return Outcome::Nothing;
        };
        self.state = InteractionState::Idle;
        if store.remove(&target) {
            Outcome::Deleted(target)
        } else {
            Outcome::SelectionCleared
        }
    }

    /// Drop every open selection, picker and editor
    fn reset(&mut self, store: &mut AnnotationStore) -> Outcome {
        let ended = self.finish_editing(store);
        let cleared = self.clear();
        ended.unwrap_or(cleared)
    }

    fn clear(&mut self) -> Outcome {
        self.state = InteractionState::Idle;
        Outcome::SelectionCleared
    }

    fn finish_editing(&mut self, store: &mut AnnotationStore) -> Option<Outcome> {
        let InteractionState::EditingText(id) = &self.state else {
            return None;
        };
        let id = id.clone();
        self.state = InteractionState::Idle;
        let blank = store.text(&id).map(TextAnnotation::is_blank).unwrap_or(false);
        if blank {
            store.remove_text(&id);
            debug!("[Interaction] removed blank text {id}");
        }
        Some(Outcome::EditingEnded { id, removed: blank })
    }
}

fn origin_of(store: &AnnotationStore, target: &AnnotationRef) -> Option<Point> {
    match target.kind {
        AnnotationKind::Text => store.text(&target.id).map(|t| t.position),
        AnnotationKind::Image => store.image(&target.id).map(|i| i.rect.origin()),
        AnnotationKind::Redaction => store.redaction(&target.id).map(|r| r.rect.origin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::FillColor;
    use crate::text_layout::ApproxMeasure;
    use pretty_assertions::assert_eq;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn drag(interaction: &mut Interaction, store: &mut AnnotationStore, from: Point, to: Point) -> Outcome {
        interaction.pointer_down(store, from, &ApproxMeasure);
        interaction.pointer_move(store, to);
        interaction.pointer_up(store)
    }

    #[test]
    fn test_small_drag_is_rejected() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(1);

        interaction.set_tool(&mut store, Tool::Redact);
        let outcome = drag(&mut interaction, &mut store, Point::new(50.0, 50.0), Point::new(58.0, 58.0));
        assert_eq!(outcome, Outcome::RedactionRejected);
        assert!(store.redactions().is_empty());
        assert_eq!(interaction.tool(), Tool::Select);

        interaction.set_tool(&mut store, Tool::Redact);
        let outcome = drag(&mut interaction, &mut store, Point::new(62.0, 62.0), Point::new(50.0, 50.0));
        assert!(matches!(outcome, Outcome::RedactionCommitted(_)));
        assert_eq!(store.redactions().len(), 1);
        assert_eq!(store.redactions()[0].rect, Rect::new(50.0, 50.0, 12.0, 12.0));
        assert_eq!(interaction.tool(), Tool::Select);
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_pending_redaction_is_normalized() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(1);
        interaction.set_tool(&mut store, Tool::Redact);
        interaction.pointer_down(&mut store, Point::new(300.0, 150.0), &ApproxMeasure);
        interaction.pointer_move(&mut store, Point::new(100.0, 100.0));
        assert_eq!(
            interaction.pending_redaction(),
            Some(Rect::new(100.0, 100.0, 200.0, 50.0))
        );
    }

    #[test]
    fn test_redaction_selected_before_text() {
        let mut store = AnnotationStore::new();
        store.add_text(TextAnnotation::new(1, Point::new(100.0, 100.0), "secret"));
        let id = store.add_redaction(RedactionBox::new(1, Rect::new(95.0, 95.0, 80.0, 30.0), FillColor::Black));
        let mut interaction = Interaction::new(1);

        let outcome = interaction.pointer_down(&mut store, Point::new(105.0, 105.0), &ApproxMeasure);
        let target = AnnotationRef::new(AnnotationKind::Redaction, id);
        assert_eq!(outcome, Outcome::Selected(target.clone()));
        assert_eq!(interaction.state(), &InteractionState::Selected(target));
    }

    #[test]
    fn test_drag_text_keeps_grab_offset() {
        let mut store = AnnotationStore::new();
        let id = store.add_text(TextAnnotation::new(1, Point::new(100.0, 100.0), "move me"));
        let mut interaction = Interaction::new(1);

        interaction.pointer_down(&mut store, Point::new(110.0, 105.0), &ApproxMeasure);
        interaction.pointer_move(&mut store, Point::new(210.0, 305.0));
        assert_eq!(store.text(&id).map(|t| t.position), Some(Point::new(200.0, 300.0)));
        interaction.pointer_up(&mut store);
        assert_eq!(interaction.state(), &InteractionState::Idle);

        // a moved gesture is not a click
        assert_eq!(
            interaction.click(&mut store, Point::new(210.0, 305.0), &ApproxMeasure),
            Outcome::Nothing
        );
    }

    #[test]
    fn test_resize_through_handle() {
        let mut store = AnnotationStore::new();
        let image = ImageAnnotation::new(1, Rect::new(0.0, 0.0, 200.0, 100.0), PNG_MAGIC.to_vec()).unwrap();
        let id = store.add_image(image);
        let mut interaction = Interaction::new(1);

        interaction.pointer_down(&mut store, Point::new(200.0, 100.0), &ApproxMeasure);
        assert!(interaction.is_resizing());
        interaction.pointer_move(&mut store, Point::new(300.0, 110.0));
        assert_eq!(store.image(&id).map(|i| i.rect), Some(Rect::new(0.0, 0.0, 300.0, 150.0)));

        // deltas are measured from the gesture start, not the last move
        interaction.pointer_move(&mut store, Point::new(250.0, 110.0));
        assert_eq!(store.image(&id).map(|i| i.rect), Some(Rect::new(0.0, 0.0, 250.0, 125.0)));
        interaction.pointer_up(&mut store);
        assert!(!interaction.is_resizing());
    }

    #[test]
    fn test_template_flow() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(2);
        interaction.set_tool(&mut store, Tool::Text);

        let at = Point::new(110.0, 110.0);
        interaction.pointer_down(&mut store, at, &ApproxMeasure);
        interaction.pointer_up(&mut store);
        assert_eq!(interaction.click(&mut store, at, &ApproxMeasure), Outcome::OpenTemplatePicker(at));

        let id = interaction.choose_template(&mut store, "REDACTED").unwrap();
        let text = store.text(&id).unwrap();
        assert_eq!(text.position, at);
        assert_eq!(text.page_number, 2);
        assert_eq!(text.font_size, 14.0);
        assert!(!text.bold);
        assert_eq!(interaction.state(), &InteractionState::EditingText(id.clone()));
        assert_eq!(interaction.tool(), Tool::Select);

        // the picker position was consumed
        assert!(interaction.choose_template(&mut store, "again").is_err());
        assert_eq!(store.texts().len(), 1);
    }

    #[test]
    fn test_blank_text_removed_when_editing_ends() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(1);
        interaction.set_tool(&mut store, Tool::Text);
        let at = Point::new(40.0, 40.0);
        interaction.pointer_down(&mut store, at, &ApproxMeasure);
        interaction.pointer_up(&mut store);
        interaction.click(&mut store, at, &ApproxMeasure);

        let id = interaction.begin_text_entry(&mut store).unwrap();
        assert!(interaction.update_editing_text(&mut store, "   \n "));
        let outcome = interaction.end_text_editing(&mut store);
        assert_eq!(outcome, Outcome::EditingEnded { id, removed: true });
        assert!(store.texts().is_empty());
    }

    #[test]
    fn test_cancel_keeps_non_blank_text() {
        let mut store = AnnotationStore::new();
        let id = store.add_text(TextAnnotation::new(1, Point::new(10.0, 10.0), "keep"));
        let mut interaction = Interaction::new(1);
        interaction.set_tool(&mut store, Tool::Text);

        let inside = Point::new(12.0, 12.0);
        interaction.pointer_down(&mut store, inside, &ApproxMeasure);
        interaction.pointer_up(&mut store);
        assert_eq!(
            interaction.click(&mut store, inside, &ApproxMeasure),
            Outcome::EditingStarted(id.clone())
        );
        assert_eq!(
            interaction.cancel(&mut store),
            Outcome::EditingEnded { id, removed: false }
        );
        assert_eq!(store.texts().len(), 1);
    }

    #[test]
    fn test_clicking_away_ends_editing() {
        let mut store = AnnotationStore::new();
        let id = store.add_text(TextAnnotation::new(1, Point::new(10.0, 10.0), "x"));
        let mut interaction = Interaction::new(1);
        interaction.select(&mut store, AnnotationRef::new(AnnotationKind::Text, id.clone()));
        interaction.state = InteractionState::EditingText(id.clone());
        store.update_text(&id, TextPatch::text(""));

        let outcome = interaction.pointer_down(&mut store, Point::new(400.0, 400.0), &ApproxMeasure);
        assert_eq!(outcome, Outcome::EditingEnded { id, removed: true });
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_place_image_centered_and_selected() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(3);
        interaction.set_tool(&mut store, Tool::Image);

        let at = Point::new(50.0, 300.0);
        interaction.pointer_down(&mut store, at, &ApproxMeasure);
        interaction.pointer_up(&mut store);
        assert_eq!(interaction.click(&mut store, at, &ApproxMeasure), Outcome::OpenImagePicker(at));

        let id = interaction.place_image(&mut store, PNG_MAGIC.to_vec()).unwrap();
        let image = store.image(&id).unwrap();
        assert_eq!(image.rect, Rect::new(0.0, 225.0, 150.0, 150.0));
        assert!(image.lock_aspect_ratio);
        assert_eq!(image.page_number, 3);
        assert_eq!(interaction.tool(), Tool::Select);
        assert_eq!(
            interaction.selection(),
            Some(AnnotationRef::new(AnnotationKind::Image, id))
        );
    }

    #[test]
    fn test_place_image_rejects_unknown_bytes() {
        let mut store = AnnotationStore::new();
        let mut interaction = Interaction::new(1);
        interaction.set_tool(&mut store, Tool::Image);
        let at = Point::new(200.0, 200.0);
        interaction.pointer_down(&mut store, at, &ApproxMeasure);
        interaction.pointer_up(&mut store);
        interaction.click(&mut store, at, &ApproxMeasure);

        assert!(interaction.place_image(&mut store, b"GIF89a".to_vec()).is_err());
        assert!(store.images().is_empty());
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_delete_selected() {
        let mut store = AnnotationStore::new();
        let id = store.add_redaction(RedactionBox::new(1, Rect::new(0.0, 0.0, 50.0, 50.0), FillColor::White));
        let mut interaction = Interaction::new(1);
        interaction.pointer_down(&mut store, Point::new(10.0, 10.0), &ApproxMeasure);
        interaction.pointer_up(&mut store);

        let outcome = interaction.delete_selected(&mut store);
        assert_eq!(outcome, Outcome::Deleted(AnnotationRef::new(AnnotationKind::Redaction, id)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_page_change_clears_selection() {
        let mut store = AnnotationStore::new();
        store.add_redaction(RedactionBox::new(1, Rect::new(0.0, 0.0, 50.0, 50.0), FillColor::Black));
        let mut interaction = Interaction::new(1);
        interaction.pointer_down(&mut store, Point::new(10.0, 10.0), &ApproxMeasure);
        assert!(interaction.selection().is_some());

        interaction.set_page(&mut store, 2);
        assert_eq!(interaction.selection(), None);
        // nothing on page 2 to hit
        interaction.pointer_down(&mut store, Point::new(10.0, 10.0), &ApproxMeasure);
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }
}
