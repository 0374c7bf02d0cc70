use crate::error::CardstockError;
use crate::paginate::{GridSpec, Slot};
use crate::types::{Margins, Pt, Rect, Size};

/// Spacing subtracted from each card's share of the usable page area, on both
/// axes. A design constant of the sheet format, not a user knob.
fn card_gap() -> Pt {
    Pt::from_f32(4.0)
}

/// Physical page with print margins. Width and height minus the opposing
/// margins must stay positive; a page that fails this is misconfigured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub size: Size,
    pub margins: Margins,
}

impl PageSpec {
    pub fn new(size: Size, margins: Margins) -> Self {
        Self { size, margins }
    }

    pub fn usable_width(&self) -> Pt {
        self.size.width - self.margins.left - self.margins.right
    }

    pub fn usable_height(&self) -> Pt {
        self.size.height - self.margins.top - self.margins.bottom
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        // A4 with the sheet format's 0.8 cm print margins.
        Self {
            size: Size::a4(),
            margins: Margins::all_cm(0.8),
        }
    }
}

/// Per-card dimensions, fixed once derived from a (page, grid) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardGeometry {
    pub width: Pt,
    pub height: Pt,
}

/// Derive card dimensions from page size, margins and grid shape.
///
/// Each card receives an equal share of the usable area minus the fixed gap.
/// Dimensions that come out non-positive mean the grid is too dense for the
/// page; no rendering may be attempted with such a geometry.
pub fn compute_card_geometry(
    page: &PageSpec,
    grid: &GridSpec,
) -> Result<CardGeometry, CardstockError> {
    grid.validate()?;
    let width = page.usable_width() / grid.cols as i32 - card_gap();
    let height = page.usable_height() / grid.rows as i32 - card_gap();
    if width <= Pt::ZERO || height <= Pt::ZERO {
        return Err(CardstockError::InvalidGeometry {
            width_milli: width.to_milli_i64(),
            height_milli: height.to_milli_i64(),
        });
    }
    Ok(CardGeometry { width, height })
}

/// Validated layout of one sheet: page, grid and the card geometry they
/// imply. Construction fails rather than producing an unrenderable layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    pub page: PageSpec,
    pub grid: GridSpec,
    pub card: CardGeometry,
}

impl SheetLayout {
    pub fn new(page: PageSpec, grid: GridSpec) -> Result<Self, CardstockError> {
        let card = compute_card_geometry(&page, &grid)?;
        Ok(Self { page, grid, card })
    }

    /// Cell pitch on the horizontal axis: card width plus the gap.
    fn cell_width(&self) -> Pt {
        self.page.usable_width() / self.grid.cols as i32
    }

    fn cell_height(&self) -> Pt {
        self.page.usable_height() / self.grid.rows as i32
    }

    /// Top-left-origin rectangle of `slot`'s card on its page.
    pub fn slot_rect(&self, slot: &Slot) -> Rect {
        Rect {
            x: self.page.margins.left + self.cell_width() * slot.col as i32,
            y: self.page.margins.top + self.cell_height() * slot.row as i32,
            width: self.card.width,
            height: self.card.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4_sheet() -> PageSpec {
        PageSpec::new(Size::a4(), Margins::all(22.68))
    }

    #[test]
    fn a4_4x2_reproduces_reference_arithmetic() {
        let grid = GridSpec::new(4, 2);
        let card = compute_card_geometry(&a4_sheet(), &grid).unwrap();
        // usable width 595.28 - 2*22.68 = 549.92; 549.92/2 - 4 = 270.96
        assert_eq!(card.width.to_milli_i64(), 270_960);
        // usable height 841.89 - 2*22.68 = 796.53; 796.53/4 - 4 = 195.1325 -> 195.133
        assert_eq!(card.height.to_milli_i64(), 195_133);
    }

    #[test]
    fn geometry_shrinks_strictly_as_grid_densifies() {
        let page = a4_sheet();
        let mut last_height = Pt::from_f32(10_000.0);
        for rows in 1..12 {
            let card = compute_card_geometry(&page, &GridSpec::new(rows, 2)).unwrap();
            assert!(card.height < last_height);
            last_height = card.height;
        }
        let mut last_width = Pt::from_f32(10_000.0);
        for cols in 1..12 {
            let card = compute_card_geometry(&page, &GridSpec::new(4, cols)).unwrap();
            assert!(card.width < last_width);
            last_width = card.width;
        }
    }

    #[test]
    fn too_dense_grid_is_invalid_geometry() {
        // 549.92 usable pt across 200 columns leaves less than the 4pt gap.
        let err = compute_card_geometry(&a4_sheet(), &GridSpec::new(4, 200)).unwrap_err();
        assert!(matches!(err, CardstockError::InvalidGeometry { .. }));
    }

    #[test]
    fn zero_axis_grid_is_invalid_grid_not_geometry() {
        let err = compute_card_geometry(&a4_sheet(), &GridSpec::new(0, 2)).unwrap_err();
        assert!(matches!(err, CardstockError::InvalidGrid { .. }));
    }

    #[test]
    fn slot_rects_tile_the_usable_area() {
        let layout = SheetLayout::new(a4_sheet(), GridSpec::new(4, 2)).unwrap();
        let top_left = layout.slot_rect(&Slot {
            page_index: 0,
            row: 0,
            col: 0,
        });
        assert_eq!(top_left.x, layout.page.margins.left);
        assert_eq!(top_left.y, layout.page.margins.top);

        let next_col = layout.slot_rect(&Slot {
            page_index: 0,
            row: 0,
            col: 1,
        });
        assert_eq!(next_col.x - top_left.x, layout.page.usable_width() / 2);

        // Page index does not shift the on-page rectangle.
        let later_page = layout.slot_rect(&Slot {
            page_index: 7,
            row: 0,
            col: 0,
        });
        assert_eq!(later_page, top_left);
    }

    #[test]
    fn default_page_is_a4_with_cm_margins() {
        let page = PageSpec::default();
        assert_eq!(page.size, Size::a4());
        assert_eq!(page.margins.left.to_milli_i64(), 22_677);
    }
}
