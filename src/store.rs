use crate::annotation::{FontSize, Point, TextAnnotation};

/// Field-wise patch for `update`; unset fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct AnnotationPatch {
    pub text: Option<String>,
    pub position: Option<Point>,
    pub font_size: Option<FontSize>,
    pub color: Option<[u8; 4]>,
}

impl AnnotationPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Ordered text annotations plus the selection for one editing surface.
///
/// Invariant: `selected` is always `None` or a valid index into
/// `annotations`; every removal re-validates it.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<TextAnnotation>,
    selected: Option<usize>,
}

impl AnnotationStore {
    pub fn annotations(&self) -> &[TextAnnotation] {
        &self.annotations
    }

    pub fn get(&self, index: usize) -> Option<&TextAnnotation> {
        self.annotations.get(index)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&TextAnnotation> {
        self.selected.and_then(|index| self.annotations.get(index))
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.annotations.len());
    }

    /// Appends and selects the new annotation. The caller has already
    /// validated the text as non-empty.
    pub fn add(
        &mut self,
        text: String,
        position: Point,
        font_size: FontSize,
        color: [u8; 4],
    ) -> usize {
        self.annotations.push(TextAnnotation {
            text,
            position,
            font_size,
            color,
        });
        let index = self.annotations.len() - 1;
        self.selected = Some(index);
        index
    }

    /// Merges `patch` into the annotation at `index`; no-op out of range.
    pub fn update(&mut self, index: usize, patch: AnnotationPatch) {
        let Some(annotation) = self.annotations.get_mut(index) else {
            return;
        };
        if let Some(text) = patch.text {
            annotation.text = text;
        }
        if let Some(position) = patch.position {
            annotation.position = position;
        }
        if let Some(font_size) = patch.font_size {
            annotation.font_size = font_size;
        }
        if let Some(color) = patch.color {
            annotation.color = color;
        }
    }

    /// Removes the annotation at `index`; no-op out of range. Clears the
    /// selection if it pointed at the removed annotation, and shifts it
    /// down when a lower index was removed so it keeps referencing the
    /// same logical annotation.
    pub fn remove(&mut self, index: usize) {
        if index >= self.annotations.len() {
            return;
        }
        self.annotations.remove(index);
        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
    }

    pub fn remove_selected(&mut self) {
        if let Some(index) = self.selected {
            self.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
    }

    /// Topmost-first hit test: overlapping annotations resolve to the one
    /// drawn last, which is the one the user sees on top.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.annotations
            .iter()
            .enumerate()
            .rev()
            .find(|(_, annotation)| annotation.contains(point))
            .map(|(index, _)| index)
    }
}
