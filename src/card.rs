use crate::canvas::Canvas;
use crate::error::CardstockError;
use crate::font;
use crate::images::ImageItem;
use crate::ingest::{COLUMN_AREA, COLUMN_CONTACT, COLUMN_GROUP, COLUMN_NAME, Record};
use crate::paginate::Slot;
use crate::types::{Color, Pt, Rect};

/// Draws one item into its slot rectangle. Invoked exactly once per item;
/// a returned error marks that single card as failed and leaves the rest of
/// the sheet intact.
pub trait CardRenderer<T> {
    fn render(
        &self,
        item: &T,
        rect: Rect,
        slot: Slot,
        canvas: &mut Canvas,
    ) -> Result<(), CardstockError>;
}

const GOLD: Color = Color {
    r: 192.0 / 255.0,
    g: 155.0 / 255.0,
    b: 85.0 / 255.0,
};
const CREAM: Color = Color {
    r: 1.0,
    g: 249.0 / 255.0,
    b: 231.0 / 255.0,
};

// Border is three times the field rule, as in the reference card.
const BORDER_WIDTH: f32 = 1.5;
const RULE_WIDTH: f32 = 0.5;

const PAD_X: f32 = 4.0;
const PAD_Y: f32 = 3.0;
const LABEL_SIZE: f32 = 8.5;
const VALUE_SIZE: f32 = 8.0;
const NAME_SIZE: f32 = 10.0;
const AMOUNT_SIZE: f32 = 8.0;
const LEFT_COLUMN_SHARE: f32 = 0.55;
const LOGO_MAX_SIDE: f32 = 108.0;
const AMOUNT_GAP: f32 = 20.0;

const REGULAR: &str = "Helvetica";
const BOLD: &str = "Helvetica-Bold";

/// The beneficiary card face: bordered cream panel, four labeled fields in
/// the left column, logo and amount line in the right column.
pub struct BeneficiaryCard {
    logo_resource: String,
    amount_text: String,
}

impl BeneficiaryCard {
    pub fn new(logo_resource: impl Into<String>) -> Self {
        Self {
            logo_resource: logo_resource.into(),
            amount_text: "Amount Rs. 1000/-".to_string(),
        }
    }

    fn field_rows(record: &Record) -> [(&'static str, &str, f32); 4] {
        [
            ("LAABHARTHI NAME", record.get(COLUMN_NAME).unwrap_or(""), NAME_SIZE),
            ("CONTACT NUMBER", record.get(COLUMN_CONTACT).unwrap_or(""), VALUE_SIZE),
            (
                "ARPIT GROUP (if applicable)",
                record.get(COLUMN_GROUP).unwrap_or(""),
                VALUE_SIZE,
            ),
            ("AREA", record.get(COLUMN_AREA).unwrap_or(""), VALUE_SIZE),
        ]
    }
}

impl CardRenderer<Record> for BeneficiaryCard {
    fn render(
        &self,
        record: &Record,
        rect: Rect,
        _slot: Slot,
        canvas: &mut Canvas,
    ) -> Result<(), CardstockError> {
        canvas.save_state();

        canvas.set_fill_color(CREAM);
        canvas.draw_rect(rect.x, rect.y, rect.width, rect.height);
        canvas.set_stroke_color(GOLD);
        canvas.set_line_width(Pt::from_f32(BORDER_WIDTH));
        canvas.stroke_rect(rect.x, rect.y, rect.width, rect.height);

        canvas.set_fill_color(GOLD);

        let left_width = rect.width * LEFT_COLUMN_SHARE;
        let text_x = rect.x + Pt::from_f32(PAD_X);
        let rule_end_x = rect.x + left_width - Pt::from_f32(PAD_X);
        let mut cursor_y = rect.y + Pt::from_f32(PAD_Y);

        let rows = Self::field_rows(record);
        let last = rows.len() - 1;
        for (index, (label, value, value_size)) in rows.iter().enumerate() {
            canvas.set_font_name(BOLD);
            canvas.set_font_size(Pt::from_f32(LABEL_SIZE));
            canvas.draw_string(text_x, cursor_y, *label);
            cursor_y += Pt::from_f32(LABEL_SIZE + 1.5);

            canvas.set_font_name(REGULAR);
            canvas.set_font_size(Pt::from_f32(*value_size));
            canvas.draw_string(text_x, cursor_y, *value);
            cursor_y += Pt::from_f32(value_size + 2.5);

            // No rule under the last field.
            if index < last {
                canvas.set_line_width(Pt::from_f32(RULE_WIDTH));
                canvas.move_to(text_x, cursor_y);
                canvas.line_to(rule_end_x, cursor_y);
                canvas.stroke();
                cursor_y += Pt::from_f32(4.0);
            }
        }

        let right_x = rect.x + left_width;
        let right_width = rect.width - left_width;
        let logo_side = Pt::from_f32(LOGO_MAX_SIDE)
            .min(right_width - Pt::from_f32(2.0 * PAD_X))
            .min(rect.height - Pt::from_f32(40.0))
            .max(Pt::ZERO);
        let logo_x = right_x + (right_width - logo_side) / 2;
        let logo_y = rect.y + Pt::from_f32(PAD_Y);
        canvas.draw_image(logo_x, logo_y, logo_side, logo_side, self.logo_resource.clone());

        canvas.set_font_name(BOLD);
        canvas.set_font_size(Pt::from_f32(AMOUNT_SIZE));
        let amount_width =
            font::measure_text_width(BOLD, Pt::from_f32(AMOUNT_SIZE), &self.amount_text);
        let amount_x = right_x + (right_width - amount_width) / 2;
        let amount_y = logo_y + logo_side + Pt::from_f32(AMOUNT_GAP);
        canvas.draw_string(amount_x, amount_y, self.amount_text.clone());

        canvas.restore_state();
        Ok(())
    }
}

/// Borderless card that centers a pre-rendered image in its slot, scaled to
/// fit while preserving aspect ratio.
pub struct ImageCard;

impl CardRenderer<ImageItem> for ImageCard {
    fn render(
        &self,
        item: &ImageItem,
        rect: Rect,
        _slot: Slot,
        canvas: &mut Canvas,
    ) -> Result<(), CardstockError> {
        let (px_width, px_height) = image::image_dimensions(&item.path).map_err(|err| {
            CardstockError::Asset(format!("{}: {}", item.path.display(), err))
        })?;
        if px_width == 0 || px_height == 0 {
            return Err(CardstockError::Asset(format!(
                "{}: empty image",
                item.path.display()
            )));
        }

        let avail_w = rect.width.to_milli_i64();
        let avail_h = rect.height.to_milli_i64();
        // Fit: scale by the tighter axis, exact in millipoint space.
        let by_width_h = avail_w * px_height as i64 / px_width as i64;
        let (draw_w, draw_h) = if by_width_h <= avail_h {
            (avail_w, by_width_h)
        } else {
            (avail_h * px_width as i64 / px_height as i64, avail_h)
        };
        let draw_w = Pt::from_milli_i64(draw_w);
        let draw_h = Pt::from_milli_i64(draw_h);

        let x = rect.x + (rect.width - draw_w) / 2;
        let y = rect.y + (rect.height - draw_h) / 2;
        let resource = item.path.to_string_lossy().into_owned();
        canvas.draw_image(x, y, draw_w, draw_h, resource);
        Ok(())
    }
}
