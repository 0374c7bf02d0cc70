/// Outcome counts for one generated sheet. `skipped` counts items omitted
/// under the per-item skip policy; fatal errors never produce metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetMetrics {
    pub pages: usize,
    pub cards: usize,
    pub skipped: usize,
}
