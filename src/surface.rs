use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Size};
use ratatui::style::Style;

/// The rendering collaborator a [`Doodad::view`](crate::doodad::Doodad::view) draws onto.
pub trait Surface {
    /// Write `text` starting at (`x`, `y`), clipped to the viewport.
    ///
    /// Returns the cell position just past the last written character, so
    /// calls can be chained along a line.
    fn write_text(&mut self, x: u16, y: u16, text: &str, style: Style) -> Position;

    /// The size of the viewport in cells.
    fn size(&self) -> Size;
}

impl Surface for Buffer {
    fn write_text(&mut self, x: u16, y: u16, text: &str, style: Style) -> Position {
        let area = self.area;
        if x < area.left() || x >= area.right() || y < area.top() || y >= area.bottom() {
            return Position::new(x, y);
        }

        let (x, y) = self.set_stringn(x, y, text, usize::from(area.right() - x), style);
        Position::new(x, y)
    }

    fn size(&self) -> Size {
        Size::new(self.area.width, self.area.height)
    }
}

/// A view of another surface shifted by a fixed origin.
///
/// Containers hand this to a child's `view` so the child can keep drawing
/// from (0, 0).
pub struct Offset<'a> {
    inner: &'a mut dyn Surface,
    origin: Position,
}

impl<'a> Offset<'a> {
    pub fn new(inner: &'a mut dyn Surface, x: u16, y: u16) -> Self {
        Self {
            inner,
            origin: Position::new(x, y),
        }
    }
}

impl Surface for Offset<'_> {
    fn write_text(&mut self, x: u16, y: u16, text: &str, style: Style) -> Position {
        let at = self.inner.write_text(
            x.saturating_add(self.origin.x),
            y.saturating_add(self.origin.y),
            text,
            style,
        );
        Position::new(at.x.saturating_sub(self.origin.x), at.y.saturating_sub(self.origin.y))
    }

    fn size(&self) -> Size {
        let size = self.inner.size();
        Size::new(
            size.width.saturating_sub(self.origin.x),
            size.height.saturating_sub(self.origin.y),
        )
    }
}
