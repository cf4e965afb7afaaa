use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::models::{ClassType, GridEntry, ScenarioInputs, ScheduleGrid};
use crate::rates::RateTable;

pub fn load_inputs(path: &Path) -> anyhow::Result<ScenarioInputs> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let inputs = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;
    debug!(path = %path.display(), "loaded scenario inputs");
    Ok(inputs)
}

pub fn save_inputs(path: &Path, inputs: &ScenarioInputs) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(inputs)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write scenario {}", path.display()))?;
    Ok(())
}

/// Loads a rate table and rejects it if it is malformed.
pub fn load_rates(path: &Path) -> anyhow::Result<RateTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rate table {}", path.display()))?;
    let rates: RateTable = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse rate table {}", path.display()))?;
    rates
        .validate()
        .with_context(|| format!("invalid rate table {}", path.display()))?;
    info!(path = %path.display(), "using custom rate table");
    Ok(rates)
}

/// Reads a schedule grid from `.json` (a list of entries) or CSV with columns
/// `room,day_pattern,time_slot,class_type,student_count`.
pub fn load_grid(path: &Path) -> anyhow::Result<ScheduleGrid> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let grid = if is_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grid {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse grid {}", path.display()))?
    } else {
        load_grid_csv(path)?
    };
    debug!(path = %path.display(), cells = grid.len(), "loaded schedule grid");
    Ok(grid)
}

fn load_grid_csv(path: &Path) -> anyhow::Result<ScheduleGrid> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        room: String,
        day_pattern: String,
        time_slot: usize,
        class_type: ClassType,
        student_count: i64,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open grid {}", path.display()))?;
    let mut entries = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result
            .with_context(|| format!("bad grid row {} in {}", line + 1, path.display()))?;
        entries.push(GridEntry {
            room: row.room,
            day_pattern: row.day_pattern,
            time_slot: row.time_slot,
            class_type: row.class_type,
            student_count: row.student_count.clamp(0, i64::from(u32::MAX)) as u32,
        });
    }

    Ok(entries.into_iter().collect())
}

pub fn save_grid_csv(path: &Path, grid: &ScheduleGrid) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create grid {}", path.display()))?;
    for entry in Vec::<GridEntry>::from(grid.clone()) {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}
