use dioxus::prelude::*;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use directories::ProjectDirs;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;

const COLOR_COLUMN: &str = "Color";
const SHAPE_COLUMN: &str = "Shape";
const SIZE_COLUMN: &str = "Size";
const DIMENSION_X_COLUMN: &str = "Dimension X";
const DIMENSION_Y_COLUMN: &str = "Dimension Y";
const DIMENSION_Z_COLUMN: &str = "Size-Z";
const RECOMMENDED_SIZE_COLUMN: &str = "Recommended Size";
const UNKNOWN_KEY: &str = "unknown";

const SAMPLE_HEADERS: [&str; 12] = [
    "Order Date",
    "Week",
    "Year",
    "Customer Purchase Order WO",
    "Shape",
    "Dimension X",
    "Dimension Y",
    "Size-Z",
    "Skirt",
    "Color",
    "Foam Taper",
    "Foam Density",
];

const SAMPLE_SHEET_NAME: &str = "Orders";
const SUMMARY_FILE_NAME: &str = "Summary_Sheet.xlsx";
const SAMPLE_FILE_NAME: &str = "Sample_Excel.xlsx";
const RECOMMENDED_FILE_PREFIX: &str = "Recommended_";

fn main() {
    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Order Summary"))
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}

#[component]
fn App() -> Element {
    let mut workbook = use_signal(|| None::<LoadedWorkbook>);
    let mut active_sheet = use_signal(|| SheetKeyword::Sales);
    let mut sort_order = use_signal(|| SortOrder::Unsorted);
    let mut selected_sizes = use_signal(Vec::<String>::new);
    let mut show_charts = use_signal(|| false);
    let mut busy = use_signal(|| false);
    let mut status = use_signal(|| "Ready".to_string());
    let mut load_token = use_signal(|| 0_u64);

    // Derived state is recomputed from the base signals on every render, so a
    // sheet switch always re-runs enrichment.
    let view = workbook().and_then(|wb| derive_view(&wb, active_sheet(), sort_order()));
    let size_options: Vec<SizeOption> = view
        .as_ref()
        .map(|v| {
            v.size_counts
                .iter()
                .map(|(key, count)| SizeOption {
                    label: key.clone(),
                    value: key.clone(),
                    count: *count,
                })
                .collect()
        })
        .unwrap_or_default();
    let total_selected = view
        .as_ref()
        .map(|v| selection_total(&v.size_counts, &selected_sizes()))
        .unwrap_or(0);
    let sheet_tabs: Vec<(SheetKeyword, String)> = SheetKeyword::ALL
        .iter()
        .map(|sheet| {
            let label = if *sheet == active_sheet() {
                format!("[{}]", sheet.label())
            } else {
                sheet.label().to_string()
            };
            (*sheet, label)
        })
        .collect();

    rsx! {
        div { style: "font-family: sans-serif; padding: 16px; max-width: 1100px;",
            div { style: "display: flex; gap: 12px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        if busy() {
                            return;
                        }

                        let Some(file_path) = FileDialog::new()
                            .add_filter("Spreadsheets", &["xls", "xlsx"])
                            .pick_file() else {
                            *status.write() = "Import cancelled".to_string();
                            return;
                        };

                        *show_charts.write() = false;
                        let token = load_token() + 1;
                        *load_token.write() = token;
                        *busy.write() = true;
                        *status.write() = format!("Loading {}", file_path.display());

                        spawn(async move {
                            let loaded = load_workbook(&file_path);
                            if load_token() != token {
                                // A newer pick owns the session state now.
                                return;
                            }

                            match loaded {
                                Ok(wb) => {
                                    *active_sheet.write() = SheetKeyword::Sales;
                                    *sort_order.write() = SortOrder::Unsorted;
                                    *selected_sizes.write() = Vec::new();
                                    *status.write() = format!(
                                        "Loaded {} ({} sheets)",
                                        wb.file_name,
                                        wb.sheets.len()
                                    );
                                    *workbook.write() = Some(wb);
                                }
                                Err(err) => {
                                    show_error("Failed to load the file", &err);
                                    *status.write() = format!("Import failed: {err:#}");
                                }
                            }

                            *busy.write() = false;
                        });
                    },
                    "Import Orders"
                }

                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(path) = FileDialog::new()
                            .set_file_name(SAMPLE_FILE_NAME)
                            .save_file() else {
                            *status.write() = "Export cancelled".to_string();
                            return;
                        };

                        match export_sample_template(&path) {
                            Ok(()) => {
                                *status.write() = format!("Exported {}", path.display());
                            }
                            Err(err) => {
                                show_error("Export failed", &err);
                                *status.write() = format!("Export failed: {err:#}");
                            }
                        }
                    },
                    "Sample Excel"
                }

                button {
                    disabled: busy() || workbook().is_none(),
                    onclick: move |_| {
                        if workbook().is_some() {
                            *show_charts.write() = true;
                        }
                    },
                    if busy() { "Processing file" } else { "View Charts" }
                }

                span { " {status}" }
            }

            if show_charts() {
                if let Some(view) = view {
                    div { style: "display: flex; gap: 12px; align-items: center; justify-content: space-between; flex-wrap: wrap; padding: 8px 0;",
                        div { style: "display: flex; gap: 6px;",
                            for (sheet, label) in sheet_tabs {
                                button {
                                    disabled: busy(),
                                    onclick: move |_| {
                                        if workbook().is_none() {
                                            return;
                                        }
                                        *active_sheet.write() = sheet;
                                        *selected_sizes.write() = Vec::new();
                                        *status.write() = format!("Switched to {}", sheet.label());
                                    },
                                    "{label}"
                                }
                            }
                        }

                        div { style: "display: flex; gap: 8px; align-items: center;",
                            button {
                                disabled: busy(),
                                onclick: move |_| {
                                    let Some(wb) = workbook() else {
                                        return;
                                    };
                                    let Some(current) =
                                        derive_view(&wb, active_sheet(), sort_order()) else {
                                        show_alert("Failed to show the data");
                                        return;
                                    };
                                    let Some(path) = FileDialog::new()
                                        .set_file_name(SUMMARY_FILE_NAME)
                                        .save_file() else {
                                        *status.write() = "Export cancelled".to_string();
                                        return;
                                    };

                                    match export_summary(&path, &current) {
                                        Ok(()) => {
                                            *status.write() =
                                                format!("Exported {}", path.display());
                                        }
                                        Err(err) => {
                                            show_error("Export failed", &err);
                                            *status.write() = format!("Export failed: {err:#}");
                                        }
                                    }
                                },
                                "Export"
                            }

                            button {
                                disabled: busy(),
                                onclick: move |_| {
                                    let Some(wb) = workbook() else {
                                        return;
                                    };
                                    let Some(table) =
                                        find_sheet(&wb.sheets, active_sheet().keyword()) else {
                                        show_alert("Failed to show the data");
                                        return;
                                    };
                                    let default_name =
                                        format!("{RECOMMENDED_FILE_PREFIX}{}", wb.file_name);
                                    let Some(path) = FileDialog::new()
                                        .set_file_name(default_name.as_str())
                                        .save_file() else {
                                        *status.write() = "Export cancelled".to_string();
                                        return;
                                    };

                                    match export_recommended(&path, table) {
                                        Ok(()) => {
                                            *status.write() =
                                                format!("Exported {}", path.display());
                                        }
                                        Err(err) => {
                                            show_error("Export failed", &err);
                                            *status.write() = format!("Export failed: {err:#}");
                                        }
                                    }
                                },
                                "Export Recommended Sizes"
                            }

                            select {
                                disabled: busy(),
                                value: sort_order().select_value(),
                                onchange: move |event| {
                                    *sort_order.write() =
                                        SortOrder::from_select_value(&event.value());
                                },
                                option { value: "", "Order by" }
                                option { value: "asc", "Asc" }
                                option { value: "desc", "Desc" }
                            }
                        }
                    }

                    div { style: "display: flex; flex-direction: column; gap: 24px;",
                        ChartPanel {
                            title: "Color Counts".to_string(),
                            counts: view.color_counts.clone(),
                            column_note: COLOR_COLUMN.to_string(),
                        }

                        ChartPanel {
                            title: "Shape Counts".to_string(),
                            counts: view.shape_counts.clone(),
                            column_note: SHAPE_COLUMN.to_string(),
                        }

                        div { style: "display: flex; gap: 12px; align-items: center; justify-content: flex-end;",
                            span { "Count : {total_selected}" }
                            SizeMultiSelect {
                                options: size_options.clone(),
                                selected: selected_sizes(),
                                on_change: move |next: Vec<String>| {
                                    *selected_sizes.write() = next;
                                },
                            }
                        }

                        ChartPanel {
                            title: "Size Counts".to_string(),
                            counts: view.size_counts.clone(),
                            column_note: format!(
                                "{DIMENSION_X_COLUMN}, {DIMENSION_Y_COLUMN} and {DIMENSION_Z_COLUMN}"
                            ),
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ChartPanel(title: String, counts: Vec<(String, u64)>, column_note: String) -> Element {
    rsx! {
        div {
            div { style: "display: flex; gap: 16px; align-items: flex-start; flex-wrap: wrap;",
                BarChart { title: title.clone(), counts: counts.clone() }
                CountList { counts: counts.clone() }
            }
            p { style: "text-align: left; font-size: 11px; color: #555;",
                "*Note: column name should be {column_note} for {title} data."
            }
        }
    }
}

struct ChartBar {
    x: f64,
    y: f64,
    height: f64,
    center: f64,
    count_y: f64,
    label: String,
    count: u64,
}

#[component]
fn BarChart(title: String, counts: Vec<(String, u64)>) -> Element {
    const BAR_WIDTH: f64 = 36.0;
    const BAR_GAP: f64 = 14.0;
    const BAR_AREA_HEIGHT: f64 = 150.0;
    const LABEL_BAND_HEIGHT: f64 = 30.0;

    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let width = BAR_GAP + counts.len() as f64 * (BAR_WIDTH + BAR_GAP);
    let height = BAR_AREA_HEIGHT + LABEL_BAND_HEIGHT;
    let label_y = BAR_AREA_HEIGHT + 14.0;
    let bars: Vec<ChartBar> = counts
        .iter()
        .enumerate()
        .map(|(idx, (key, count))| {
            let bar_height = if max_count == 0 {
                0.0
            } else {
                round1((*count as f64 / max_count as f64) * (BAR_AREA_HEIGHT - 20.0))
            };
            let x = BAR_GAP + idx as f64 * (BAR_WIDTH + BAR_GAP);
            let y = round1(BAR_AREA_HEIGHT - bar_height);
            ChartBar {
                x,
                y,
                height: bar_height,
                center: x + BAR_WIDTH / 2.0,
                count_y: y - 4.0,
                label: key.clone(),
                count: *count,
            }
        })
        .collect();

    rsx! {
        div { style: "flex: 1; min-width: 320px; overflow-x: auto;",
            p { style: "text-align: left; font-weight: bold;", "{title}" }
            if bars.is_empty() {
                p { style: "text-align: left; font-size: 13px;", "No data" }
            } else {
                svg {
                    width: "{width}",
                    height: "{height}",
                    view_box: "0 0 {width} {height}",
                    for bar in bars {
                        rect {
                            x: "{bar.x}",
                            y: "{bar.y}",
                            width: "{BAR_WIDTH}",
                            height: "{bar.height}",
                            fill: "#5470c6",
                        }
                        text {
                            x: "{bar.center}",
                            y: "{bar.count_y}",
                            font_size: "10",
                            text_anchor: "middle",
                            "{bar.count}"
                        }
                        text {
                            x: "{bar.center}",
                            y: "{label_y}",
                            font_size: "9",
                            text_anchor: "middle",
                            "{bar.label}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CountList(counts: Vec<(String, u64)>) -> Element {
    rsx! {
        div { style: "max-height: 200px; overflow-y: auto; min-width: 180px; border: 1px solid #ccc; border-radius: 4px; padding: 10px; text-align: left;",
            for (key, count) in counts {
                p { style: "margin: 2px 0; font-size: 13px;", "{key}: {count}" }
            }
        }
    }
}

#[component]
fn SizeMultiSelect(
    options: Vec<SizeOption>,
    selected: Vec<String>,
    on_change: EventHandler<Vec<String>>,
) -> Element {
    let mut search = use_signal(String::new);

    let filter = search().to_lowercase();
    let visible: Vec<SizeOption> = options
        .iter()
        .filter(|option| option.label.to_lowercase().contains(&filter))
        .cloned()
        .collect();

    rsx! {
        div { style: "width: 340px; border: 1px solid #ccc; border-radius: 4px; padding: 8px; text-align: left;",
            input {
                style: "width: 95%; margin-bottom: 6px;",
                value: search(),
                placeholder: "Search sizes",
                oninput: move |event| {
                    *search.write() = event.value();
                },
            }
            div { style: "max-height: 160px; overflow-y: auto;",
                for option in visible {
                    label { style: "display: block; font-size: 13px;",
                        input {
                            r#type: "checkbox",
                            checked: selected.contains(&option.value),
                            onchange: {
                                let value = option.value.clone();
                                let selected = selected.clone();
                                move |event: FormEvent| {
                                    let checked =
                                        event.value().parse::<bool>().unwrap_or(false);
                                    let mut next = selected.clone();
                                    if checked {
                                        if !next.contains(&value) {
                                            next.push(value.clone());
                                        }
                                    } else {
                                        next.retain(|key| key != &value);
                                    }
                                    on_change.call(next);
                                }
                            },
                        }
                        " {option.label} ({option.count})"
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SizeOption {
    label: String,
    value: String,
    count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetKeyword {
    Sales,
    Amazon,
}

impl SheetKeyword {
    const ALL: [SheetKeyword; 2] = [SheetKeyword::Sales, SheetKeyword::Amazon];

    fn keyword(self) -> &'static str {
        match self {
            SheetKeyword::Sales => "sale",
            SheetKeyword::Amazon => "amazon",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SheetKeyword::Sales => "Sales Reports",
            SheetKeyword::Amazon => "Amazon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Unsorted,
    Ascending,
    Descending,
}

impl SortOrder {
    fn from_select_value(value: &str) -> SortOrder {
        match value {
            "asc" => SortOrder::Ascending,
            "desc" => SortOrder::Descending,
            _ => SortOrder::Unsorted,
        }
    }

    fn select_value(self) -> &'static str {
        match self {
            SortOrder::Unsorted => "",
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SheetTable {
    name: String,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
struct LoadedWorkbook {
    file_name: String,
    sheets: Vec<SheetTable>,
}

#[derive(Debug, Clone, PartialEq)]
struct SessionView {
    sheet_name: String,
    rows: Vec<Vec<String>>,
    color_counts: Vec<(String, u64)>,
    shape_counts: Vec<(String, u64)>,
    size_counts: Vec<(String, u64)>,
}

/// Column positions resolved once per header row. First match wins for
/// duplicated names; a missing column is `None`, never a sentinel index.
struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(header: &[String]) -> HeaderIndex {
        let mut positions = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            positions.entry(name.clone()).or_insert(idx);
        }
        HeaderIndex { positions }
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DimensionColumns {
    x: &'static str,
    y: &'static str,
    z: &'static str,
    shape: &'static str,
}

const ORDER_COLUMNS: DimensionColumns = DimensionColumns {
    x: DIMENSION_X_COLUMN,
    y: DIMENSION_Y_COLUMN,
    z: DIMENSION_Z_COLUMN,
    shape: SHAPE_COLUMN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SizeSpec {
    shape: &'static str,
    size: &'static str,
    variation_sizes: &'static [&'static str],
}

// Standard cover sizes per shape. Order is significant: lookup returns the
// first record whose shape matches and whose variation set holds the triple.
const SIZE_SPECS: &[SizeSpec] = &[
    SizeSpec {
        shape: "round",
        size: "Small",
        variation_sizes: &["60x60", "60x60x4", "64x64", "64x64x4"],
    },
    SizeSpec {
        shape: "round",
        size: "Medium",
        variation_sizes: &["70x70", "70x70x4", "74x74", "74x74x4"],
    },
    SizeSpec {
        shape: "round",
        size: "Large",
        variation_sizes: &["78x78", "78x78x4", "84x84", "84x84x4"],
    },
    SizeSpec {
        shape: "square",
        size: "Small",
        variation_sizes: &["60x60", "60x60x4", "64x64", "64x64x4"],
    },
    SizeSpec {
        shape: "square",
        size: "Medium",
        variation_sizes: &["72x72", "72x72x4", "76x76", "76x76x4"],
    },
    SizeSpec {
        shape: "square",
        size: "Large",
        variation_sizes: &["84x84", "84x84x4", "88x88", "88x88x4"],
    },
    SizeSpec {
        shape: "rectangle",
        size: "Medium",
        variation_sizes: &["72x60", "72x60x4", "78x66", "78x66x4"],
    },
    SizeSpec {
        shape: "rectangle",
        size: "Large",
        variation_sizes: &["84x66", "84x66x4", "90x72", "90x72x4"],
    },
    SizeSpec {
        shape: "oval",
        size: "Medium",
        variation_sizes: &["72x60", "72x60x4"],
    },
    SizeSpec {
        shape: "oval",
        size: "Large",
        variation_sizes: &["84x66", "84x66x4"],
    },
];

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn cell_at<'a>(row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| row.get(i)).map(String::as_str)
}

fn clean_dimension(value: &str) -> String {
    value.replace('?', "").trim().to_string()
}

fn dimension_triple(x: &str, y: &str, z: &str) -> String {
    let parts = [clean_dimension(x), clean_dimension(y), clean_dimension(z)];
    let non_empty: Vec<&str> = parts
        .iter()
        .map(String::as_str)
        .filter(|part| !part.is_empty())
        .collect();
    non_empty.join("x")
}

fn normalize_key(value: Option<&str>) -> String {
    let normalized = value.unwrap_or("").replace('\r', "").trim().to_lowercase();
    if normalized.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        normalized
    }
}

fn count_occurrences(rows: &[Vec<String>], column: Option<usize>) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let key = normalize_key(cell_at(row, column));
        match positions.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                positions.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

fn sort_counts(counts: &[(String, u64)], order: SortOrder) -> Vec<(String, u64)> {
    let mut sorted = counts.to_vec();
    match order {
        SortOrder::Unsorted => {}
        // sort_by is stable, so ties keep the input order.
        SortOrder::Ascending => sorted.sort_by(|a, b| a.1.cmp(&b.1)),
        SortOrder::Descending => sorted.sort_by(|a, b| b.1.cmp(&a.1)),
    }
    sorted
}

fn selection_total(counts: &[(String, u64)], selected: &[String]) -> u64 {
    counts
        .iter()
        .filter(|(key, _)| selected.iter().any(|s| s == key))
        .map(|(_, count)| *count)
        .sum()
}

fn find_sheet<'a>(sheets: &'a [SheetTable], keyword: &str) -> Option<&'a SheetTable> {
    let keyword = keyword.to_lowercase();
    sheets
        .iter()
        .find(|sheet| sheet.name.to_lowercase().contains(&keyword))
        .or_else(|| sheets.first())
}

fn recommended_size<'a>(table: &'a [SizeSpec], shape: &str, triple: &str) -> Option<&'a str> {
    let triple = triple.trim().to_lowercase();
    if triple.is_empty() {
        return None;
    }
    let shape = shape.trim();
    table
        .iter()
        .find(|spec| {
            spec.shape.eq_ignore_ascii_case(shape)
                && spec.variation_sizes.contains(&triple.as_str())
        })
        .map(|spec| spec.size)
}

fn append_size_column(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let index = HeaderIndex::new(header);
    let dim_x = index.resolve(DIMENSION_X_COLUMN);
    let dim_y = index.resolve(DIMENSION_Y_COLUMN);
    let dim_z = index.resolve(DIMENSION_Z_COLUMN);

    let mut output = Vec::with_capacity(rows.len());
    let mut enriched_header = header.clone();
    enriched_header.push(SIZE_COLUMN.to_string());
    output.push(enriched_header);

    for row in data {
        let triple = dimension_triple(
            cell_at(row, dim_x).unwrap_or(""),
            cell_at(row, dim_y).unwrap_or(""),
            cell_at(row, dim_z).unwrap_or(""),
        );
        let mut enriched = row.clone();
        enriched.push(triple);
        output.push(enriched);
    }

    output
}

fn append_recommended_column(
    rows: &[Vec<String>],
    columns: &DimensionColumns,
    table: &[SizeSpec],
) -> Vec<Vec<String>> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let index = HeaderIndex::new(header);
    let dim_x = index.resolve(columns.x);
    let dim_y = index.resolve(columns.y);
    let dim_z = index.resolve(columns.z);
    let shape_col = index.resolve(columns.shape);

    let mut output = Vec::with_capacity(rows.len());
    let mut enriched_header = header.clone();
    enriched_header.push(RECOMMENDED_SIZE_COLUMN.to_string());
    output.push(enriched_header);

    for row in data {
        let triple = dimension_triple(
            cell_at(row, dim_x).unwrap_or(""),
            cell_at(row, dim_y).unwrap_or(""),
            cell_at(row, dim_z).unwrap_or(""),
        );
        let shape = cell_at(row, shape_col).unwrap_or("");
        let recommendation = recommended_size(table, shape, &triple).unwrap_or("");
        let mut enriched = row.clone();
        enriched.push(recommendation.to_string());
        output.push(enriched);
    }

    output
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn summary_rows(label: &str, counts: &[(String, u64)]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![label.to_string(), "Count".to_string()]];
    for (key, count) in counts {
        rows.push(vec![key.clone(), count.to_string()]);
    }
    rows
}

fn derive_view(
    workbook: &LoadedWorkbook,
    sheet: SheetKeyword,
    order: SortOrder,
) -> Option<SessionView> {
    let table = find_sheet(&workbook.sheets, sheet.keyword())?;
    let enriched = append_size_column(&table.rows);

    let (color_counts, shape_counts, size_counts) = match enriched.split_first() {
        Some((header, data)) => {
            let index = HeaderIndex::new(header);
            (
                sort_counts(&count_occurrences(data, index.resolve(COLOR_COLUMN)), order),
                sort_counts(&count_occurrences(data, index.resolve(SHAPE_COLUMN)), order),
                sort_counts(&count_occurrences(data, index.resolve(SIZE_COLUMN)), order),
            )
        }
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    Some(SessionView {
        sheet_name: table.name.clone(),
        rows: enriched,
        color_counts,
        shape_counts,
        size_counts,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| dt.format("%-d/%-m/%Y").to_string())
            .unwrap_or_else(|| v.to_string()),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

fn load_workbook(path: &Path) -> Result<LoadedWorkbook> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open spreadsheet: {}", path.display()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        bail!("workbook has no sheets: {}", path.display());
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet: {name}"))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        sheets.push(SheetTable { name, rows });
    }

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("orders.xlsx")
        .to_string();

    Ok(LoadedWorkbook { file_name, sheets })
}

fn write_sheets_workbook(path: &Path, sheets: &[(&str, Vec<Vec<String>>)]) -> Result<()> {
    let mut workbook = Workbook::new();

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(*name)
            .with_context(|| format!("invalid sheet name: {name}"))?;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                worksheet
                    .write_string(row_idx as u32, col_idx as u16, value)
                    .with_context(|| {
                        format!("failed to write cell ({row_idx}, {col_idx}) in sheet: {name}")
                    })?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook: {}", path.display()))?;

    Ok(())
}

fn export_summary(path: &Path, view: &SessionView) -> Result<()> {
    let sheets = vec![
        ("Color", summary_rows(COLOR_COLUMN, &view.color_counts)),
        ("Shape", summary_rows(SHAPE_COLUMN, &view.shape_counts)),
        ("Size", summary_rows(SIZE_COLUMN, &view.size_counts)),
    ];
    write_sheets_workbook(path, &sheets)
}

fn export_sample_template(path: &Path) -> Result<()> {
    let header: Vec<String> = SAMPLE_HEADERS.iter().map(|name| name.to_string()).collect();
    write_sheets_workbook(path, &[(SAMPLE_SHEET_NAME, vec![header])])
}

fn export_recommended(path: &Path, table: &SheetTable) -> Result<()> {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .filter(|row| !is_blank_row(row))
        .cloned()
        .collect();
    let enriched = append_recommended_column(&rows, &ORDER_COLUMNS, SIZE_SPECS);
    write_sheets_workbook(path, &[(table.name.as_str(), enriched)])
}

fn show_alert(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Order Summary")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn show_error(title: &str, err: &anyhow::Error) {
    let description = format!("{err:#}");
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description.as_str())
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "ordersummary", "order-summary")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}
