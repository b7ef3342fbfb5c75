use serde_json::{json, Value};
use crate::chart::period_label;
use crate::query::Bucket;

const DATA_MARKER: &str = "%DATA%";
const TITLE_MARKER: &str = "%TITLE%";

const HTML_TEMPLATE: &str = r#"<html>
    <meta charset='UTF-8' name='viewport' content='width=device-width, initial-scale=1.0, maximum-scale=1.0, minimum-scale=1.0, user-scalable=no, target-densityDpi=device-dpi' />
    <head>
        <script type='text/javascript' src='https://www.gstatic.com/charts/loader.js'></script>
        <script type='text/javascript'>
            google.charts.load('current', {packages:['corechart']});
            google.charts.setOnLoadCallback(drawChart);

            function drawChart() {
              var data = google.visualization.arrayToDataTable(%DATA%);
              var options = {
                title: %TITLE%,
                legend: {position: 'top'},
                colors: ['#1b9e77', '#d95f02', '#39648c', '#6d398c', '#8c3939'],
                vAxis: {
                  viewWindow: {
                    min: 0
                  }
                }
              };
              var chart = new google.visualization.ColumnChart(
                document.getElementById('chart_div'));
              chart.draw(data, options);
            };

            window.onresize = drawChart;
        </script>
    </head>
    <body>
        <div id='chart_div' style='width: 100%; height: 100%;'></div>
    </body>
</html>"#;

/// Google Charts data table: a header row with an annotation column after every field,
/// then one row per bucket with whole values and `<thousands>k` annotations.
pub(crate) fn chart_data(buckets: &[Bucket], fields: &[String]) -> Value {
    let mut header = vec![json!("Месяц")];
    for field in fields {
        header.push(json!(field));
        header.push(json!({"role": "annotation"}));
    }

    let mut rows = vec![Value::Array(header)];
    for bucket in buckets {
        let mut row = vec![json!(period_label(bucket))];
        for value in &bucket.values {
            row.push(json!(value.round_ties_even() as i64));
            row.push(json!(format!("{}k", (value / 1000.0).round_ties_even() as i64)));
        }
        rows.push(Value::Array(row));
    }

    Value::Array(rows)
}

pub(crate) fn render_html(buckets: &[Bucket], fields: &[String], title: &str) -> String {
    // Title goes in first so that text inside the data is never scanned for markers
    HTML_TEMPLATE
        .replace(TITLE_MARKER, &ascii_json(&Value::String(title.to_string())))
        .replace(DATA_MARKER, &ascii_json(&chart_data(buckets, fields)))
}

/// JSON text with every non-ASCII character written as a `\uXXXX` escape
fn ascii_json(value: &Value) -> String {
    let mut out = String::new();
    for c in value.to_string().chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
