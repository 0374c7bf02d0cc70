mod assets;
mod canvas;
mod card;
mod debug;
mod error;
mod flate;
mod font;
mod geometry;
mod images;
mod ingest;
mod inspect;
mod metrics;
mod paginate;
mod pdf;
mod sheet;
mod types;

pub use canvas::{Canvas, Command, Document, Page};
pub use card::{BeneficiaryCard, CardRenderer, ImageCard};
use debug::DebugLogger;
pub use error::CardstockError;
pub use geometry::{CardGeometry, PageSpec, SheetLayout, compute_card_geometry};
pub use images::{ImageItem, scan_image_folder};
pub use ingest::{
    COLUMN_AREA, COLUMN_CONTACT, COLUMN_GROUP, COLUMN_NAME, ColumnMap, ColumnOverrides,
    REQUIRED_COLUMNS, Record, read_records, reconcile_columns,
};
pub use inspect::{
    SheetInspectError, SheetInspectErrorCode, SheetInspectReport, inspect_sheet_bytes,
    inspect_sheet_path,
};
pub use metrics::SheetMetrics;
pub use paginate::{GridSpec, Pages, SheetPage, Slot, page_count, paginate, slot_for_index};
pub use pdf::document_to_pdf;
pub use types::{Color, Margins, Pt, Rect, Size};

use std::path::{Path, PathBuf};

/// Card sheet engine. Holds the validated layout and run-wide assets; each
/// generate call paginates fresh input and emits one PDF.
#[derive(Debug)]
pub struct Cardstock {
    layout: SheetLayout,
    logo_resource: String,
    overrides: ColumnOverrides,
    parallel: bool,
    debug: Option<DebugLogger>,
}

#[derive(Clone)]
pub struct CardstockBuilder {
    page_size: Size,
    margins: Margins,
    grid: GridSpec,
    logo_path: Option<PathBuf>,
    overrides: ColumnOverrides,
    parallel: bool,
    debug_path: Option<PathBuf>,
}

impl Default for CardstockBuilder {
    fn default() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all_cm(0.8),
            grid: GridSpec::default(),
            logo_path: None,
            overrides: ColumnOverrides::new(),
            parallel: false,
            debug_path: None,
        }
    }
}

impl CardstockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for pre-rendered image sheets: same A4 grid, slimmer 0.25 cm
    /// margins so the images fill the page.
    pub fn for_image_sheets() -> Self {
        Self {
            margins: Margins::all_cm(0.25),
            ..Self::default()
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid = GridSpec::new(rows, cols);
        self
    }

    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Pin a CSV header to a required column, bypassing fuzzy matching.
    pub fn column_override(mut self, required: &str, header: &str) -> Self {
        self.overrides = self.overrides.assign(required, header);
        self
    }

    pub fn parallel_rendering(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Write JSON-lines debug events to `path` during generation.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    /// Validate the configuration and produce the engine. Grid and geometry
    /// errors surface here, before any input is read or rendered.
    pub fn build(self) -> Result<Cardstock, CardstockError> {
        let layout = SheetLayout::new(PageSpec::new(self.page_size, self.margins), self.grid)?;
        let debug = match &self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(Cardstock {
            layout,
            logo_resource: assets::resolve_logo(self.logo_path.as_deref()),
            overrides: self.overrides,
            parallel: self.parallel,
            debug,
        })
    }
}

impl Cardstock {
    pub fn builder() -> CardstockBuilder {
        CardstockBuilder::new()
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Render `items` with a caller-supplied card renderer and serialize the
    /// sheet to PDF bytes. This is the seam the built-in record and image
    /// paths go through.
    pub fn render_with<T, R>(
        &self,
        items: &[T],
        renderer: &R,
    ) -> Result<(Vec<u8>, SheetMetrics), CardstockError>
    where
        T: Sync,
        R: CardRenderer<T> + Sync,
    {
        let (document, metrics) = sheet::assemble(
            items,
            &self.layout,
            renderer,
            self.debug.as_ref(),
            self.parallel,
        )?;
        let bytes = pdf::document_to_pdf(&document)?;
        if let Some(logger) = &self.debug {
            logger.log_json(&format!(
                "{{\"type\":\"sheet.done\",\"pages\":{},\"cards\":{},\"skipped\":{},\"bytes\":{}}}",
                metrics.pages,
                metrics.cards,
                metrics.skipped,
                bytes.len()
            ));
            logger.emit_summary("sheet");
            logger.flush();
        }
        Ok((bytes, metrics))
    }

    pub fn render_records(
        &self,
        records: &[Record],
    ) -> Result<(Vec<u8>, SheetMetrics), CardstockError> {
        let renderer = BeneficiaryCard::new(self.logo_resource.clone());
        self.render_with(records, &renderer)
    }

    pub fn render_images(
        &self,
        items: &[ImageItem],
    ) -> Result<(Vec<u8>, SheetMetrics), CardstockError> {
        self.render_with(items, &ImageCard)
    }

    /// Beneficiary cards from a CSV file, written to `output`. Unmatched
    /// required columns are logged and filled empty; nothing is written when
    /// a fatal error occurs.
    pub fn generate_from_csv(
        &self,
        csv_path: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<SheetMetrics, CardstockError> {
        let (records, columns) = ingest::read_records(csv_path.as_ref(), &self.overrides)?;
        if let Some(logger) = &self.debug
            && !columns.missing.is_empty()
        {
            logger.log_json(&format!(
                "{{\"type\":\"ingest.columns_missing\",\"columns\":\"{}\"}}",
                debug::json_escape(&columns.missing.join(","))
            ));
        }
        let (bytes, metrics) = self.render_records(&records)?;
        std::fs::write(output.as_ref(), &bytes)?;
        Ok(metrics)
    }

    /// Image sheet from a folder of pre-rendered card images, written to
    /// `output`. Scan order is file-name order; undecodable files are not
    /// items.
    pub fn generate_from_image_folder(
        &self,
        folder: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<SheetMetrics, CardstockError> {
        let items = images::scan_image_folder(folder.as_ref())?;
        let (bytes, metrics) = self.render_images(&items)?;
        std::fs::write(output.as_ref(), &bytes)?;
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_path(tag: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cardstock_{}_{}_{}.{}",
            tag,
            std::process::id(),
            std::thread::current().name().unwrap_or("t").replace("::", "_"),
            ext
        ))
    }

    fn sample_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::from_pairs([
                    (COLUMN_NAME, format!("Person {i}")),
                    (COLUMN_CONTACT, format!("90000000{i:02}")),
                    (COLUMN_GROUP, "Group A".to_string()),
                    (COLUMN_AREA, "Rajkot".to_string()),
                ])
            })
            .collect()
    }

    #[test]
    fn seventeen_records_produce_a_three_page_pdf() {
        let engine = Cardstock::builder().build().unwrap();
        let (bytes, metrics) = engine.render_records(&sample_records(17)).unwrap();
        assert_eq!(metrics.pages, 3);
        assert_eq!(metrics.cards, 17);
        assert_eq!(metrics.skipped, 0);

        let report = inspect_sheet_bytes(&bytes).unwrap();
        assert_eq!(report.page_count, 3);
        let (width, height) = report.media_box.unwrap();
        assert!((width - 595.28).abs() < 0.01);
        assert!((height - 841.89).abs() < 0.01);
    }

    #[test]
    fn page_count_tracks_grid_capacity() {
        for (rows, cols, records, expected) in
            [(4, 2, 8, 1), (4, 2, 9, 2), (2, 2, 10, 3), (1, 1, 3, 3)]
        {
            let engine = Cardstock::builder().grid(rows, cols).build().unwrap();
            let (bytes, metrics) = engine.render_records(&sample_records(records)).unwrap();
            assert_eq!(metrics.pages, expected, "{rows}x{cols} with {records}");
            assert_eq!(inspect_sheet_bytes(&bytes).unwrap().page_count, expected);
        }
    }

    #[test]
    fn empty_record_list_is_a_valid_zero_page_run() {
        let engine = Cardstock::builder().build().unwrap();
        let (bytes, metrics) = engine.render_records(&[]).unwrap();
        assert_eq!(metrics, SheetMetrics::default());
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn invalid_grid_fails_at_build_time() {
        let err = Cardstock::builder().grid(0, 2).build().unwrap_err();
        assert!(matches!(
            err,
            CardstockError::InvalidGrid { rows: 0, cols: 2 }
        ));
    }

    #[test]
    fn dense_grid_fails_geometry_at_build_time() {
        let err = Cardstock::builder().grid(4, 200).build().unwrap_err();
        assert!(matches!(err, CardstockError::InvalidGeometry { .. }));
    }

    #[test]
    fn csv_round_trip_writes_a_sheet() {
        let csv = temp_path("csv", "csv");
        let out = temp_path("csv_out", "pdf");
        let mut file = std::fs::File::create(&csv).unwrap();
        writeln!(file, "Beneficiary,Mobile,Team,City").unwrap();
        for i in 0..9 {
            writeln!(file, "Person {i},900{i},G,Rajkot").unwrap();
        }
        drop(file);

        let engine = Cardstock::builder().build().unwrap();
        let metrics = engine.generate_from_csv(&csv, &out).unwrap();
        std::fs::remove_file(&csv).ok();

        assert_eq!(metrics.pages, 2);
        assert_eq!(metrics.cards, 9);
        let report = inspect_sheet_path(&out).unwrap();
        std::fs::remove_file(&out).ok();
        assert_eq!(report.page_count, 2);
    }

    #[test]
    fn fatal_csv_error_writes_no_output() {
        let csv = temp_path("ambig", "csv");
        let out = temp_path("ambig_out", "pdf");
        let mut file = std::fs::File::create(&csv).unwrap();
        writeln!(file, "NAME,CONTACT_NUMBER,ARPIT_GROUP,AREA_CODE,PLACE_AREA").unwrap();
        writeln!(file, "A,1,G,X,Y").unwrap();
        drop(file);

        let engine = Cardstock::builder().build().unwrap();
        let err = engine.generate_from_csv(&csv, &out).unwrap_err();
        std::fs::remove_file(&csv).ok();
        assert!(matches!(err, CardstockError::ColumnAmbiguous { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn unreadable_image_is_skipped_and_counted() {
        let dir = std::env::temp_dir().join(format!("cardstock_skip_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("a.png");
        image::RgbImage::from_pixel(6, 4, image::Rgb([1, 2, 3]))
            .save(&good)
            .unwrap();

        let items = vec![
            ImageItem { path: good.clone() },
            ImageItem {
                path: dir.join("vanished.png"),
            },
            ImageItem { path: good },
        ];
        let engine = CardstockBuilder::for_image_sheets().build().unwrap();
        let (bytes, metrics) = engine.render_images(&items).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(metrics.cards, 2);
        assert_eq!(metrics.skipped, 1);
        assert_eq!(metrics.pages, 1);
        assert_eq!(inspect_sheet_bytes(&bytes).unwrap().page_count, 1);
    }

    #[test]
    fn image_folder_round_trip() {
        let dir = std::env::temp_dir().join(format!("cardstock_folder_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["one.png", "two.png", "three.png"] {
            image::RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9]))
                .save(dir.join(name))
                .unwrap();
        }
        let out = temp_path("folder_out", "pdf");

        let engine = CardstockBuilder::for_image_sheets().build().unwrap();
        let metrics = engine.generate_from_image_folder(&dir, &out).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(metrics.cards, 3);
        assert_eq!(metrics.pages, 1);
        let report = inspect_sheet_path(&out).unwrap();
        std::fs::remove_file(&out).ok();
        assert_eq!(report.page_count, 1);
    }

    #[test]
    fn parallel_and_serial_runs_emit_identical_bytes() {
        let records = sample_records(25);
        let serial = Cardstock::builder().build().unwrap();
        let parallel = Cardstock::builder()
            .parallel_rendering(true)
            .build()
            .unwrap();
        let (serial_bytes, _) = serial.render_records(&records).unwrap();
        let (parallel_bytes, _) = parallel.render_records(&records).unwrap();
        assert_eq!(serial_bytes, parallel_bytes);
    }

    #[test]
    fn rendering_is_deterministic_across_runs() {
        let records = sample_records(10);
        let engine = Cardstock::builder().build().unwrap();
        let (first, _) = engine.render_records(&records).unwrap();
        let (second, _) = engine.render_records(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn debug_log_records_a_summary() {
        let log = temp_path("debug", "jsonl");
        let engine = Cardstock::builder().debug_log(&log).build().unwrap();
        engine.render_records(&sample_records(3)).unwrap();
        let text = std::fs::read_to_string(&log).unwrap();
        std::fs::remove_file(&log).ok();
        assert!(text.contains("\"type\":\"sheet.done\""));
        assert!(text.contains("\"type\":\"debug.summary\""));
        assert!(text.contains("sheet.cards"));
    }

    #[test]
    fn custom_renderer_goes_through_the_same_seam() {
        struct Numbered;
        impl CardRenderer<u32> for Numbered {
            fn render(
                &self,
                item: &u32,
                rect: Rect,
                _slot: Slot,
                canvas: &mut Canvas,
            ) -> Result<(), CardstockError> {
                canvas.draw_string(rect.x, rect.y, format!("#{item}"));
                Ok(())
            }
        }

        let engine = Cardstock::builder().grid(2, 2).build().unwrap();
        let items: Vec<u32> = (0..5).collect();
        let (bytes, metrics) = engine.render_with(&items, &Numbered).unwrap();
        assert_eq!(metrics.pages, 2);
        assert_eq!(inspect_sheet_bytes(&bytes).unwrap().page_count, 2);
    }
}
