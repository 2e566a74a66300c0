use crate::gridchart::chart::{ChartBounds, ChartModel};
use crate::gridcommon::{ChartConfig, GridDataset, TimeWindow};
use crate::griddata::{FetchTermination, GridSnapshot};

/// Fetch result of one dataset as shown in the status bar
#[derive(Debug, Clone)]
pub struct SeriesSummary {
    pub dataset: GridDataset,
    pub rows: usize,
    pub rate_limit_retries: u32,
    /// Reason the fetch stopped early, if it did
    pub aborted: Option<String>,
}

/// Application state for the chart view
#[derive(Debug)]
pub struct App {
    pub model: ChartModel,
    pub window: TimeWindow,
    pub summaries: Vec<SeriesSummary>,
    /// Visibility per dataset, indexed by [`GridDataset::index`]
    pub visible: [bool; 4],
    pub show_markers: bool,
    pub show_help: bool,
    pub running: bool,
}

impl App {
    pub fn new(snapshot: &GridSnapshot, config: &ChartConfig) -> Self {
        let summaries = snapshot
            .series
            .iter()
            .map(|outcome| SeriesSummary {
                dataset: outcome.dataset,
                rows: outcome.observations.len(),
                rate_limit_retries: outcome.rate_limit_retries,
                aborted: match &outcome.termination {
                    FetchTermination::Exhausted => None,
                    FetchTermination::Aborted(reason) => Some(reason.clone()),
                },
            })
            .collect();

        Self {
            model: ChartModel::from_snapshot(snapshot),
            window: snapshot.window,
            summaries,
            visible: [true; 4],
            show_markers: config.show_markers,
            show_help: false,
            running: true,
        }
    }

    pub fn is_visible(&self, dataset: GridDataset) -> bool {
        self.visible[dataset.index()]
    }

    /// Show or hide one series
    pub fn toggle(&mut self, dataset: GridDataset) {
        let slot = &mut self.visible[dataset.index()];
        *slot = !*slot;
    }

    pub fn show_all(&mut self) {
        self.visible = [true; 4];
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_markers(&mut self) {
        self.show_markers = !self.show_markers;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Axis bounds for what is currently shown
    pub fn bounds(&self) -> ChartBounds {
        self.model.bounds(&self.visible)
    }

    pub fn summary(&self, dataset: GridDataset) -> Option<&SeriesSummary> {
        self.summaries.iter().find(|s| s.dataset == dataset)
    }
}
