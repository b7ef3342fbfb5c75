mod html;

use std::fs;
use std::path::Path;
use anyhow::Context;
use comfy_table::{Table, TableComponent};
use log::info;
use crate::query::Bucket;

pub(crate) use html::render_html;

const MONTH_NAMES: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль",
    "Август", "Сентябрь", "Октябрь", "Ноябрь", "Декабрь",
];

/// Axis label of a bucket, e.g. `Март'24`
pub(crate) fn period_label(bucket: &Bucket) -> String {
    let month = (bucket.month as usize).checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i))
        .copied()
        .unwrap_or("?");
    format!("{}'{:02}", month, bucket.year.rem_euclid(100))
}

pub(crate) fn render_json(buckets: &[Bucket]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(buckets)?)
}

pub(crate) fn render_table(buckets: &[Bucket], fields: &[String]) -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);

    let mut header = vec!["Period".to_string()];
    header.extend(fields.iter().cloned());
    table.set_header(header);

    for bucket in buckets {
        let mut row = vec![period_label(bucket)];
        row.extend(bucket.values.iter().map(|v| format!("{:.2}", v)));
        table.add_row(row);
    }
    table
}

pub(crate) fn save(file_path: &Path, content: &str) -> anyhow::Result<()> {
    fs::write(file_path, content).with_context(|| format!("Unable to write {}", file_path.display()))?;
    info!("Saved {}", file_path.display());
    Ok(())
}
