use serde::Serialize;

use super::charts::{ChartKind, ChartSpec};
use crate::models::{Cell, Dataset, SummaryStat};
use crate::services::analysis::columns::plotted_series;
use crate::services::analysis::{project, summarize, Projection, STAT_CARD_LIMIT};

const BAR_SERIES_LIMIT: usize = 3;
const PIE_POINT_LIMIT: usize = 6;
const PREVIEW_COLUMNS: usize = 4;
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub column: String,
    pub average: String,
    pub range: String,
}

impl From<&SummaryStat> for StatCard {
    fn from(stat: &SummaryStat) -> Self {
        Self {
            column: stat.column.clone(),
            average: format!("{:.2}", stat.average),
            range: format!("{:.1} - {:.1}", stat.min, stat.max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything the results page shows for one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub file_name: String,
    pub row_count: usize,
    pub stat_cards: Vec<StatCard>,
    pub bar_chart: ChartSpec,
    pub line_chart: Option<ChartSpec>,
    pub pie_chart: Option<ChartSpec>,
    pub preview: PreviewTable,
}

impl Dashboard {
    /// `None` for an empty dataset: there is nothing to show.
    pub fn build(file_name: &str, dataset: &Dataset) -> Option<Self> {
        let stats = summarize(dataset);
        let projection = project(dataset);
        Self::from_parts(file_name, dataset, &stats, &projection)
    }

    pub fn from_parts(
        file_name: &str,
        dataset: &Dataset,
        stats: &[SummaryStat],
        projection: &Projection,
    ) -> Option<Self> {
        if dataset.is_empty() {
            return None;
        }

        let series = plotted_series(&projection.numeric_columns, BAR_SERIES_LIMIT);

        let bar_chart = ChartSpec {
            kind: ChartKind::Bar,
            title: "Bar Chart Analysis".to_string(),
            description: "Comparative view of numeric values".to_string(),
            series: series.clone(),
            points: projection.points.clone(),
        };

        let line_chart = projection.time_based.then(|| ChartSpec {
            kind: ChartKind::Line,
            title: "Trend Analysis".to_string(),
            description: "Time series or sequential data view".to_string(),
            series: series.clone(),
            points: projection.points.clone(),
        });

        let pie_chart = projection.numeric_columns.first().map(|first| ChartSpec {
            kind: ChartKind::Pie,
            title: "Distribution Analysis".to_string(),
            description: format!("Proportion of {}", first),
            series: plotted_series(&projection.numeric_columns, 1),
            points: projection.points.iter().take(PIE_POINT_LIMIT).cloned().collect(),
        });

        Some(Self {
            file_name: file_name.to_string(),
            row_count: dataset.len(),
            stat_cards: stats.iter().take(STAT_CARD_LIMIT).map(StatCard::from).collect(),
            bar_chart,
            line_chart,
            pie_chart,
            preview: preview_table(dataset),
        })
    }

    /// Charts in display order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        std::iter::once(&self.bar_chart)
            .chain(self.line_chart.as_ref())
            .chain(self.pie_chart.as_ref())
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&ChartSpec> {
        self.charts().find(|chart| chart.kind == kind)
    }
}

fn preview_table(dataset: &Dataset) -> PreviewTable {
    let headers: Vec<String> = dataset.columns.iter().take(PREVIEW_COLUMNS).cloned().collect();
    let rows = dataset
        .rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            headers
                .iter()
                .map(|column| match row.get(column) {
                    Some(Cell::Number(n)) => format!("{:.2}", n),
                    Some(Cell::Text(s)) => s.clone(),
                    None => String::new(),
                })
                .collect()
        })
        .collect();
    PreviewTable { headers, rows }
}
