use crate::canvas::{Canvas, Document};
use crate::card::CardRenderer;
use crate::debug::{DebugLogger, json_escape};
use crate::error::CardstockError;
use crate::geometry::SheetLayout;
use crate::metrics::SheetMetrics;
use crate::paginate::{SheetPage, paginate};
use rayon::prelude::*;

/// Render every item into its slot and group the cards into pages.
///
/// Fatal layout errors have already been ruled out by `SheetLayout`; the only
/// errors that can arise here are per-item render failures, which follow the
/// skip policy: the card is omitted, counted, and logged, and the run
/// continues. Zero input items produce a zero-page document.
pub(crate) fn assemble<T, R>(
    items: &[T],
    layout: &SheetLayout,
    renderer: &R,
    debug: Option<&DebugLogger>,
    parallel: bool,
) -> Result<(Document, SheetMetrics), CardstockError>
where
    T: Sync,
    R: CardRenderer<T> + Sync,
{
    let pages: Vec<SheetPage<'_, T>> = paginate(items, layout.grid)?.collect();

    let rendered: Vec<(crate::canvas::Page, usize, usize)> = if parallel {
        pages
            .par_iter()
            .map(|page| render_page(page, layout, renderer, debug))
            .collect()
    } else {
        pages
            .iter()
            .map(|page| render_page(page, layout, renderer, debug))
            .collect()
    };

    let mut canvas_pages = Vec::with_capacity(rendered.len());
    let mut metrics = SheetMetrics::default();
    for (page, cards, skipped) in rendered {
        canvas_pages.push(page);
        metrics.cards += cards;
        metrics.skipped += skipped;
    }
    metrics.pages = canvas_pages.len();

    if let Some(logger) = debug {
        logger.increment("sheet.pages", metrics.pages as u64);
        logger.increment("sheet.cards", metrics.cards as u64);
    }

    Ok((
        Document {
            page_size: layout.page.size,
            pages: canvas_pages,
        },
        metrics,
    ))
}

/// Render one page worth of cards in row-major slot order. Always yields a
/// page, even when every card on it was skipped; later page indices depend
/// on it existing.
fn render_page<T, R>(
    page: &SheetPage<'_, T>,
    layout: &SheetLayout,
    renderer: &R,
    debug: Option<&DebugLogger>,
) -> (crate::canvas::Page, usize, usize)
where
    R: CardRenderer<T>,
{
    let mut canvas = Canvas::new(layout.page.size);
    let mut cards = 0usize;
    let mut skipped = 0usize;

    for (slot, item) in page.slots() {
        let rect = layout.slot_rect(&slot);
        match renderer.render(item, rect, slot, &mut canvas) {
            Ok(()) => cards += 1,
            Err(err) => {
                skipped += 1;
                if let Some(logger) = debug {
                    logger.log_json(&format!(
                        "{{\"type\":\"sheet.card_skipped\",\"page\":{},\"row\":{},\"col\":{},\"error\":\"{}\"}}",
                        slot.page_index,
                        slot.row,
                        slot.col,
                        json_escape(&err.to_string())
                    ));
                    logger.increment("sheet.card.skipped", 1);
                }
            }
        }
    }

    let mut document = canvas.finish();
    let rendered = document.pages.remove(0);
    (rendered, cards, skipped)
}
