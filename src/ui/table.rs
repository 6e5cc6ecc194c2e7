use tabled::{settings::Style, Table, Tabled};

use crate::storage::DbStats;
use crate::study::Study;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Render store statistics, one row per counter
pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Studies", &stats.studies.to_string());
    builder.add_row("Trials", &stats.trials.to_string());
    for (state, count) in &stats.trials_by_state {
        builder.add_row(&format!("  {}", state), &count.to_string());
    }
    builder.add_row("Study attributes", &stats.study_attributes.to_string());
    builder.add_row("Trial user attributes", &stats.trial_user_attributes.to_string());
    builder.add_row("Trial system attributes", &stats.trial_system_attributes.to_string());
    builder.build()
}

#[derive(Tabled)]
struct StudyRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Trials")]
    trials: usize,
    #[tabled(rename = "Created (UTC)")]
    created: String,
}

/// Render studies with their trial counts, in the order given
pub fn studies_table(studies: &[(Study, usize)]) -> String {
    if studies.is_empty() {
        return String::new();
    }

    let rows: Vec<StudyRow> = studies
        .iter()
        .map(|(study, trials)| StudyRow {
            id: study.study_id,
            name: study.study_name.clone(),
            direction: study.direction.to_string(),
            trials: *trials,
            created: study.datetime_create.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::StudyDirection;
    use crate::trial::TrialState;

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_stats_table_lists_states() {
        let stats = DbStats {
            studies: 2,
            trials: 3,
            trials_by_state: vec![(TrialState::Running, 1), (TrialState::Complete, 2)],
            study_attributes: 0,
            trial_user_attributes: 4,
            trial_system_attributes: 5,
        };
        let rendered = stats_table(&stats);
        assert!(rendered.contains("Studies"));
        assert!(rendered.contains("COMPLETE"));
        assert!(rendered.contains("Trial system attributes"));
    }

    #[test]
    fn test_studies_table() {
        assert!(studies_table(&[]).is_empty());

        let study = Study {
            study_id: 4,
            study_name: "lr-sweep".to_string(),
            direction: StudyDirection::Maximize,
            datetime_create: chrono::Utc::now(),
        };
        let rendered = studies_table(&[(study, 12)]);
        assert!(rendered.contains("lr-sweep"));
        assert!(rendered.contains("MAXIMIZE"));
        assert!(rendered.contains("12"));
    }
}
